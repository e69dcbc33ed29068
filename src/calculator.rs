//! Real-time balance projection and buffer arithmetic for continuous flows.
//!
//! Every function here is pure. Wei amounts are 256-bit signed integers and
//! saturate at the `I256` bounds rather than wrapping, so a projection far
//! into the future never flips sign.

use alloy::primitives::{I256, U256};
use tracing::debug;

use crate::models::{FlowRate, RealtimeBalance, Stream, StreamPreview, UnitOfTime};

/// Latest timestamp a projection will report: 9999-12-31T23:59:59Z.
pub const MAX_TIMESTAMP: u64 = 253_402_300_799;

fn signed_seconds(seconds: u64) -> I256 {
    I256::from_raw(U256::from(seconds))
}

/// `to - from` as a signed wei multiplier.
fn elapsed_between(from: u64, to: u64) -> I256 {
    let magnitude = signed_seconds(to.abs_diff(from));
    if to < from {
        -magnitude
    } else {
        magnitude
    }
}

fn clamp_to_signed(value: U256) -> I256 {
    if value > I256::MAX.into_raw() {
        I256::MAX
    } else {
        I256::from_raw(value)
    }
}

/// Balance at `at_timestamp`, which may lie before the snapshot.
///
/// The result goes negative once the account would be insolvent.
pub fn project_balance(balance: &RealtimeBalance, at_timestamp: u64) -> I256 {
    let elapsed = elapsed_between(balance.balance_timestamp, at_timestamp);
    balance
        .balance_wei
        .saturating_add(balance.net_flow_rate_wei.saturating_mul(elapsed))
}

/// Collateral the protocol locks for a stream of `flow_rate_per_second_wei`.
///
/// The rate is taken by magnitude: an outgoing net rate (negative) and the
/// positive rate of the stream itself require the same buffer, and the
/// buffer is never negative.
pub fn compute_buffer_amount(flow_rate_per_second_wei: I256, buffer_time_seconds: u64) -> I256 {
    let magnitude = flow_rate_per_second_wei
        .unsigned_abs()
        .saturating_mul(U256::from(buffer_time_seconds));
    clamp_to_signed(magnitude)
}

/// Extra buffer needed (negative: released) when a stream moves from
/// `old_flow_rate_per_second_wei` to `new_flow_rate_per_second_wei`.
/// Pass zero as the old rate for a new stream.
pub fn compute_buffer_delta(
    old_flow_rate_per_second_wei: I256,
    new_flow_rate_per_second_wei: I256,
    buffer_time_seconds: u64,
) -> I256 {
    // both buffers lie in [0, I256::MAX] so the difference cannot overflow
    compute_buffer_amount(new_flow_rate_per_second_wei, buffer_time_seconds)
        - compute_buffer_amount(old_flow_rate_per_second_wei, buffer_time_seconds)
}

/// When a depleting balance reaches `minimum_balance_wei`.
///
/// Returns `None` for a non-negative net flow. An account already at or below
/// the minimum is critical at its own snapshot time; any other account gets a
/// time after its snapshot, capped at [`MAX_TIMESTAMP`] unless the snapshot
/// itself lies beyond it.
pub fn compute_critical_timestamp(
    balance: &RealtimeBalance,
    minimum_balance_wei: I256,
) -> Option<u64> {
    if !balance.net_flow_rate_wei.is_negative() {
        return None;
    }
    if balance.balance_wei <= minimum_balance_wei {
        return Some(balance.balance_timestamp);
    }

    // balance > minimum, so the two's-complement difference is exact in U256
    let headroom = balance
        .balance_wei
        .into_raw()
        .wrapping_sub(minimum_balance_wei.into_raw());
    let outflow = balance.net_flow_rate_wei.unsigned_abs();

    let mut seconds = headroom / outflow;
    if !(headroom % outflow).is_zero() {
        seconds += U256::from(1);
    }

    let seconds = u64::try_from(seconds).unwrap_or(u64::MAX);
    let critical = balance.balance_timestamp.saturating_add(seconds);
    // a snapshot already past the cap keeps its real, later, critical time
    if critical > MAX_TIMESTAMP && balance.balance_timestamp < MAX_TIMESTAMP {
        debug!(
            "critical timestamp {} beyond cap, reporting {}",
            critical, MAX_TIMESTAMP
        );
        return Some(MAX_TIMESTAMP);
    }
    Some(critical)
}

/// [`compute_critical_timestamp`] against a zero balance.
pub fn compute_critical_timestamp_default(balance: &RealtimeBalance) -> Option<u64> {
    compute_critical_timestamp(balance, I256::ZERO)
}

/// Wei per second, truncated the way the protocol truncates flow rates.
pub fn to_per_second_rate(flow_rate: &FlowRate) -> I256 {
    flow_rate.amount_wei() / flow_rate.unit_of_time().as_wei_divisor()
}

/// The per-unit figure for a per-second rate, e.g. wei per month.
pub fn from_per_second_rate(flow_rate_per_second_wei: I256, unit: UnitOfTime) -> I256 {
    flow_rate_per_second_wei.saturating_mul(unit.as_wei_divisor())
}

/// Total streamed by `stream` as of `at_timestamp`.
pub fn streamed_amount(stream: &Stream, at_timestamp: u64) -> I256 {
    let running = RealtimeBalance::new(
        stream.streamed_until_updated_at_wei,
        stream.flow_rate_wei,
        stream.updated_at_timestamp,
    );
    project_balance(&running, at_timestamp)
}

/// Effect on the sender of changing an outgoing stream from `old` to `new`
/// wei per second, evaluated at `at_timestamp`.
pub fn preview_stream_change(
    balance: &RealtimeBalance,
    old_flow_rate_per_second_wei: I256,
    new_flow_rate_per_second_wei: I256,
    buffer_time_seconds: u64,
    at_timestamp: u64,
    minimum_balance_wei: I256,
) -> StreamPreview {
    let buffer_delta_wei = compute_buffer_delta(
        old_flow_rate_per_second_wei,
        new_flow_rate_per_second_wei,
        buffer_time_seconds,
    );
    let rate_change =
        new_flow_rate_per_second_wei.saturating_sub(old_flow_rate_per_second_wei);
    let new_net_flow_rate_wei = balance.net_flow_rate_wei.saturating_sub(rate_change);
    let balance_after_buffer_wei =
        project_balance(balance, at_timestamp).saturating_sub(buffer_delta_wei);

    let after = RealtimeBalance::new(balance_after_buffer_wei, new_net_flow_rate_wei, at_timestamp);
    let critical_timestamp = compute_critical_timestamp(&after, minimum_balance_wei);

    debug!(
        "stream preview: buffer delta {}, net rate {} -> {}, critical at {:?}",
        buffer_delta_wei, balance.net_flow_rate_wei, new_net_flow_rate_wei, critical_timestamp
    );

    StreamPreview {
        buffer_delta_wei,
        new_net_flow_rate_wei,
        balance_after_buffer_wei,
        critical_timestamp,
    }
}
