//! Streaming balance and buffer arithmetic for Superfluid-style token flows,
//! with a small JSON API around it.

pub mod accounting;
pub mod api;
pub mod calculator;
pub mod config;
pub mod error;
pub mod models;
pub mod networks;
pub mod units;

pub use calculator::{
    compute_buffer_amount, compute_buffer_delta, compute_critical_timestamp,
    compute_critical_timestamp_default, from_per_second_rate, preview_stream_change,
    project_balance, streamed_amount, to_per_second_rate, MAX_TIMESTAMP,
};
pub use error::{FlowError, Result};
pub use models::{FlowRate, RealtimeBalance, Stream, StreamPreview, UnitOfTime};
