use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::reading::ParsedReading;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Which readings a chart should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRequest {
    /// Trailing window ending at the newest reading.
    Latest,
    /// Whole calendar days, both ends inclusive.
    Range { start: NaiveDate, end: NaiveDate },
}

impl WindowRequest {
    /// Build a range request, rejecting `start > end`.
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::InvertedRange { start, end });
        }
        Ok(Self::Range { start, end })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    pub lookback: Duration,
    pub cap: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            lookback: Duration::hours(4),
            cap: 24,
        }
    }
}

/// First instant of `start` and last millisecond of `end`.
#[must_use]
pub fn day_bounds(start: NaiveDate, end: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    (start.and_time(NaiveTime::MIN), end.and_time(end_of_day))
}

/// Pick the readings for `request`, returned oldest-first.
///
/// The input order is not trusted. An empty result is a normal outcome.
#[must_use]
pub fn select(
    readings: &[ParsedReading],
    request: WindowRequest,
    config: &WindowConfig,
) -> Vec<ParsedReading> {
    match request {
        WindowRequest::Latest => select_latest(readings, config),
        WindowRequest::Range { start, end } => select_range(readings, start, end),
    }
}

fn select_latest(readings: &[ParsedReading], config: &WindowConfig) -> Vec<ParsedReading> {
    let mut newest_first = readings.to_vec();
    newest_first.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));

    let Some(anchor) = newest_first.first().map(|r| r.captured_at) else {
        return Vec::new();
    };
    let cutoff = anchor
        .checked_sub_signed(config.lookback)
        .unwrap_or(NaiveDateTime::MIN);

    let mut window: Vec<ParsedReading> = newest_first
        .into_iter()
        .take_while(|r| r.captured_at >= cutoff)
        .take(config.cap)
        .collect();
    window.reverse();
    window
}

fn select_range(readings: &[ParsedReading], start: NaiveDate, end: NaiveDate) -> Vec<ParsedReading> {
    let (from, to) = day_bounds(start, end);
    let mut window: Vec<ParsedReading> = readings
        .iter()
        .filter(|r| r.captured_at >= from && r.captured_at <= to)
        .cloned()
        .collect();
    window.sort_by_key(|r| r.captured_at);
    window
}
