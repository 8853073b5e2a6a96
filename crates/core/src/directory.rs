//! Device Directory seam: device enumeration and per-device record pages.
//!
//! Implemented over HTTP by the client crate and by in-memory stubs in
//! tests. A failed fetch must surface as an error, never as an empty page.

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};

use crate::device::{Device, DeviceState, RawEvent};
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// DateRange
// ---------------------------------------------------------------------------

/// Inclusive range of calendar days to fetch records for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::Validation(format!(
                "Date range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Today plus the `lookback_days` before it, in the host's local time.
    pub fn ending_today(lookback_days: u32) -> Self {
        let today = Local::now().date_naive();
        Self::ending_on(today, lookback_days)
    }

    pub fn ending_on(end: NaiveDate, lookback_days: u32) -> Self {
        let start = end
            .checked_sub_days(Days::new(u64::from(lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every day in the range, oldest first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

// ---------------------------------------------------------------------------
// DeviceDirectory
// ---------------------------------------------------------------------------

/// Read access to the account's devices and their telemetry.
#[async_trait]
pub trait DeviceDirectory: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn list_devices(&mut self) -> Result<Vec<Device>, Self::Error>;

    /// All raw events `device` reported on the days in `range`.
    async fn fetch_records(
        &mut self,
        device: &Device,
        range: &DateRange,
    ) -> Result<Vec<RawEvent>, Self::Error>;

    async fn device_state(&mut self, device: &Device) -> Result<DeviceState, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_rejects_reversed_bounds() {
        assert!(DateRange::new(day(2024, 3, 2), day(2024, 3, 1)).is_err());
    }

    #[test]
    fn days_are_inclusive_and_ordered() {
        let range = DateRange::new(day(2024, 2, 28), day(2024, 3, 1)).unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(days, vec![day(2024, 2, 28), day(2024, 2, 29), day(2024, 3, 1)]);
    }

    #[test]
    fn zero_lookback_is_a_single_day() {
        let range = DateRange::ending_on(day(2024, 5, 10), 0);
        assert_eq!(range, DateRange::single(day(2024, 5, 10)));
        assert_eq!(range.days().count(), 1);
    }

    #[test]
    fn lookback_extends_start() {
        let range = DateRange::ending_on(day(2024, 5, 10), 2);
        assert_eq!(range.start(), day(2024, 5, 8));
        assert_eq!(range.end(), day(2024, 5, 10));
    }
}
