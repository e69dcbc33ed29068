// src/models.rs
use alloy::primitives::{I256, U256};
use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};

/// A token balance snapshot with a constant rate of change attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealtimeBalance {
    pub balance_wei: I256,
    pub net_flow_rate_wei: I256, // wei per second, negative when depleting
    pub balance_timestamp: u64,  // unix seconds
}

impl RealtimeBalance {
    pub fn new(balance_wei: I256, net_flow_rate_wei: I256, balance_timestamp: u64) -> Self {
        Self {
            balance_wei,
            net_flow_rate_wei,
            balance_timestamp,
        }
    }
}

/// Units a human-entered flow rate can be expressed in.
///
/// A month is a fixed 30 days and a year 365 days, matching what the
/// dashboard forms offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum UnitOfTime {
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl UnitOfTime {
    pub const ALL: [UnitOfTime; 6] = [
        UnitOfTime::Second,
        UnitOfTime::Minute,
        UnitOfTime::Hour,
        UnitOfTime::Day,
        UnitOfTime::Month,
        UnitOfTime::Year,
    ];

    pub const fn seconds(self) -> u64 {
        match self {
            UnitOfTime::Second => 1,
            UnitOfTime::Minute => 60,
            UnitOfTime::Hour => 3_600,
            UnitOfTime::Day => 86_400,
            UnitOfTime::Month => 2_592_000,
            UnitOfTime::Year => 31_536_000,
        }
    }

    pub fn as_wei_divisor(self) -> I256 {
        I256::from_raw(U256::from(self.seconds()))
    }
}

impl TryFrom<u64> for UnitOfTime {
    type Error = FlowError;

    fn try_from(seconds: u64) -> Result<Self> {
        UnitOfTime::ALL
            .into_iter()
            .find(|unit| unit.seconds() == seconds)
            .ok_or(FlowError::InvalidUnitOfTime(seconds))
    }
}

impl From<UnitOfTime> for u64 {
    fn from(unit: UnitOfTime) -> u64 {
        unit.seconds()
    }
}

/// A flow rate as entered by a user: an amount of wei per unit of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowRate {
    amount_wei: I256,
    unit_of_time: UnitOfTime,
}

impl FlowRate {
    pub fn new(amount_wei: I256, unit_of_time: UnitOfTime) -> Result<Self> {
        if amount_wei.is_negative() {
            return Err(FlowError::NegativeAmount);
        }
        Ok(Self {
            amount_wei,
            unit_of_time,
        })
    }

    /// Builds a flow rate from a raw unit length in seconds, rejecting any
    /// length outside [`UnitOfTime`].
    pub fn from_parts(amount_wei: I256, unit_seconds: u64) -> Result<Self> {
        let unit = UnitOfTime::try_from(unit_seconds)?;
        Self::new(amount_wei, unit)
    }

    pub fn amount_wei(&self) -> I256 {
        self.amount_wei
    }

    pub fn unit_of_time(&self) -> UnitOfTime {
        self.unit_of_time
    }

    /// Wei lost to floor division when normalising to a per-second rate.
    pub fn truncation_remainder(&self) -> I256 {
        self.amount_wei % self.unit_of_time.as_wei_divisor()
    }

    pub fn is_exact(&self) -> bool {
        self.truncation_remainder().is_zero()
    }
}

/// An outgoing or incoming stream as reported by the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stream {
    pub flow_rate_wei: I256,
    pub streamed_until_updated_at_wei: I256,
    pub updated_at_timestamp: u64,
}

impl Stream {
    pub fn streamed_at(&self, at_timestamp: u64) -> I256 {
        crate::calculator::streamed_amount(self, at_timestamp)
    }
}

/// What modifying a stream would do to the sender's account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamPreview {
    pub buffer_delta_wei: I256,
    pub new_net_flow_rate_wei: I256,
    pub balance_after_buffer_wei: I256,
    pub critical_timestamp: Option<u64>,
}
