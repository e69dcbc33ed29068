// src/units.rs
use alloy::primitives::{I256, U256};
use rust_decimal::prelude::FromStr;
use rust_decimal::Decimal;

use crate::error::{FlowError, Result};

/// Decimals of every Superfluid super token.
pub const SUPER_TOKEN_DECIMALS: u32 = 18;

// Decimal carries at most 28 fractional digits
const MAX_DECIMAL_SCALE: u32 = 28;

fn ten_pow(exp: u32) -> Option<U256> {
    (0..exp).try_fold(U256::from(1), |acc, _| acc.checked_mul(U256::from(10)))
}

/// Parse a user-entered token amount such as `"1.5"` into wei.
pub fn parse_token_amount(text: &str, decimals: u32) -> Result<I256> {
    let amount = Decimal::from_str(text.trim())
        .map_err(|e| FlowError::InvalidAmount(format!("{:?}: {}", text, e)))?
        .normalize();

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(FlowError::InvalidAmount(format!("{:?} is negative", text)));
    }
    if amount.scale() > decimals {
        return Err(FlowError::InvalidAmount(format!(
            "{:?} has more than {} decimals",
            text, decimals
        )));
    }

    let mantissa = U256::from(amount.mantissa().unsigned_abs());
    let factor = ten_pow(decimals - amount.scale()).ok_or(FlowError::AmountOutOfRange)?;
    let wei = mantissa
        .checked_mul(factor)
        .ok_or(FlowError::AmountOutOfRange)?;

    if wei > I256::MAX.into_raw() {
        return Err(FlowError::AmountOutOfRange);
    }
    Ok(I256::from_raw(wei))
}

/// Wei as a token amount, e.g. `1500000000000000000` -> `1.5`.
pub fn format_token_amount(wei: I256, decimals: u32) -> Result<Decimal> {
    if decimals > MAX_DECIMAL_SCALE {
        return Err(FlowError::AmountOutOfRange);
    }
    let raw = i128::try_from(wei).map_err(|_| FlowError::AmountOutOfRange)?;
    let amount = Decimal::try_from_i128_with_scale(raw, decimals)
        .map_err(|_| FlowError::AmountOutOfRange)?;
    Ok(amount.normalize())
}
