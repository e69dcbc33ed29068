use alloy::primitives::{I256, U256};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::error::{FlowError, Result};

/// Upper bound on periods produced for a single stream.
pub const MAX_PERIODS: usize = 5_000;

/// Calendar buckets for accounting exports. All boundaries are UTC midnight;
/// weeks start on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountingPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl FromStr for AccountingPeriod {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(AccountingPeriod::Day),
            "week" => Ok(AccountingPeriod::Week),
            "month" => Ok(AccountingPeriod::Month),
            "year" => Ok(AccountingPeriod::Year),
            other => Err(FlowError::InvalidPeriod(other.to_string())),
        }
    }
}

/// Wei streamed inside one calendar period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodAmount {
    pub period_start: i64,
    pub period_end: i64,
    pub amount_wei: I256,
}

fn midnight(date: NaiveDate) -> Option<i64> {
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

/// `[start, end)` of the period containing `timestamp`.
fn period_bounds(timestamp: u64, period: AccountingPeriod) -> Option<(i64, i64)> {
    let date = DateTime::<Utc>::from_timestamp(i64::try_from(timestamp).ok()?, 0)?.date_naive();

    let (first, next) = match period {
        AccountingPeriod::Day => (date, date.checked_add_signed(Duration::days(1))?),
        AccountingPeriod::Week => {
            let monday = date.checked_sub_signed(Duration::days(
                i64::from(date.weekday().num_days_from_monday()),
            ))?;
            (monday, monday.checked_add_signed(Duration::days(7))?)
        }
        AccountingPeriod::Month => {
            let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?;
            (first, first.checked_add_months(Months::new(1))?)
        }
        AccountingPeriod::Year => {
            let first = NaiveDate::from_ymd_opt(date.year(), 1, 1)?;
            (first, first.checked_add_months(Months::new(12))?)
        }
    };

    Some((midnight(first)?, midnight(next)?))
}

/// Split a constant stream over `[start, end)` into calendar periods.
///
/// The amounts add up to `flow_rate_wei * (end - start)`. The first and last
/// periods only count the seconds the stream was actually open.
pub fn split_stream_into_periods(
    flow_rate_wei: I256,
    start: u64,
    end: u64,
    period: AccountingPeriod,
) -> Result<Vec<PeriodAmount>> {
    if end < start {
        return Err(FlowError::InvalidTimeRange { start, end });
    }

    let mut periods = Vec::new();
    let mut cursor = start;

    while cursor < end {
        if periods.len() == MAX_PERIODS {
            return Err(FlowError::TooManyPeriods(MAX_PERIODS));
        }

        let (period_start, period_end) =
            period_bounds(cursor, period).ok_or(FlowError::InvalidTimeRange { start, end })?;
        // period_end > cursor >= 0 so the cast is lossless
        let slice_end = (period_end as u64).min(end);
        let seconds = I256::from_raw(U256::from(slice_end - cursor));

        periods.push(PeriodAmount {
            period_start,
            period_end,
            amount_wei: flow_rate_wei.saturating_mul(seconds),
        });
        cursor = slice_end;
    }

    debug!(
        "split stream {}..{} into {} {:?} periods",
        start,
        end,
        periods.len(),
        period
    );
    Ok(periods)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAN_1_2024: u64 = 1_704_067_200;
    const DAY: u64 = 86_400;

    fn wei(v: i128) -> I256 {
        I256::try_from(v).unwrap()
    }

    #[test]
    fn parses_period_names() {
        assert_eq!("Month".parse::<AccountingPeriod>().unwrap(), AccountingPeriod::Month);
        assert_eq!(
            "fortnight".parse::<AccountingPeriod>(),
            Err(FlowError::InvalidPeriod("fortnight".to_string()))
        );
    }

    #[test]
    fn daily_split_counts_partial_days() {
        let start = JAN_1_2024 + DAY / 2;
        let end = JAN_1_2024 + 2 * DAY + DAY / 4;
        let periods = split_stream_into_periods(wei(2), start, end, AccountingPeriod::Day).unwrap();

        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].period_start, JAN_1_2024 as i64);
        assert_eq!(periods[0].amount_wei, wei(86_400));
        assert_eq!(periods[1].amount_wei, wei(172_800));
        assert_eq!(periods[2].amount_wei, wei(43_200));

        let total = periods
            .iter()
            .fold(I256::ZERO, |acc, p| acc + p.amount_wei);
        assert_eq!(total, wei(2 * (end - start) as i128));
    }

    #[test]
    fn monthly_split_follows_calendar() {
        let start = JAN_1_2024 + 30 * DAY; // 2024-01-31
        let end = JAN_1_2024 + 60 * DAY; // 2024-03-01, leap year
        let periods = split_stream_into_periods(wei(1), start, end, AccountingPeriod::Month).unwrap();

        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].period_end, (JAN_1_2024 + 31 * DAY) as i64);
        assert_eq!(periods[0].amount_wei, wei(DAY as i128));
        assert_eq!(periods[1].period_start, (JAN_1_2024 + 31 * DAY) as i64);
        assert_eq!(periods[1].amount_wei, wei(29 * DAY as i128));
    }

    #[test]
    fn weeks_start_on_monday() {
        // 2024-01-01 is a Monday
        let start = JAN_1_2024 + 2 * DAY;
        let end = JAN_1_2024 + 7 * DAY;
        let periods = split_stream_into_periods(wei(1), start, end, AccountingPeriod::Week).unwrap();

        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].period_start, JAN_1_2024 as i64);
        assert_eq!(periods[0].period_end, end as i64);
        assert_eq!(periods[0].amount_wei, wei(5 * DAY as i128));
    }

    #[test]
    fn empty_and_reversed_ranges() {
        assert!(split_stream_into_periods(wei(1), 10, 10, AccountingPeriod::Year)
            .unwrap()
            .is_empty());
        assert_eq!(
            split_stream_into_periods(wei(1), 10, 5, AccountingPeriod::Year),
            Err(FlowError::InvalidTimeRange { start: 10, end: 5 })
        );
    }

    #[test]
    fn refuses_unbounded_exports() {
        let result = split_stream_into_periods(wei(1), 0, 20_000 * DAY, AccountingPeriod::Day);
        assert_eq!(result, Err(FlowError::TooManyPeriods(MAX_PERIODS)));
    }
}
