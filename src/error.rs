use thiserror::Error;

/// Errors produced by the flow calculator and its helpers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("invalid unit of time: {0} seconds")]
    InvalidUnitOfTime(u64),

    #[error("flow rate amount must not be negative")]
    NegativeAmount,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("amount out of representable range")]
    AmountOutOfRange,

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("invalid accounting period: {0}")]
    InvalidPeriod(String),

    #[error("range spans more than {0} accounting periods")]
    TooManyPeriods(usize),

    #[error("invalid time range: start {start} is after end {end}")]
    InvalidTimeRange { start: u64, end: u64 },
}

pub type Result<T> = std::result::Result<T, FlowError>;
