//! Sparse x-axis labels for a dense timestamp axis.
//!
//! A step size is picked so that roughly [`TARGET_LABELS`] labels fit the
//! covered duration. Labels are then placed where the wall clock crosses a
//! step boundary (an hour or day divisible by the step), so irregular gaps
//! between samples do not shift them.

use crate::timeutils::utc_from_timestamp;
use anyhow::Result;
use std::collections::BTreeMap;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Timestamp index to display string. Only labelled indices are present.
pub type LabelMap = BTreeMap<usize, String>;

pub const TARGET_LABELS: i64 = 12;

/// Candidate label spacings, in hours.
pub const STEP_CANDIDATES_HOURS: [i64; 8] = [1, 2, 4, 8, 12, 24, 48, 168];

const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// `14:05`
    TimeOnly,
    /// `05-01 14:05`
    DateTime,
    /// `05-01`
    DateOnly,
}

impl TimeFormat {
    pub fn format(self, at: OffsetDateTime) -> String {
        let formatted = match self {
            TimeFormat::TimeOnly => at.format(format_description!("[hour]:[minute]")),
            TimeFormat::DateTime => {
                at.format(format_description!("[month]-[day] [hour]:[minute]"))
            }
            TimeFormat::DateOnly => at.format(format_description!("[month]-[day]")),
        };
        formatted.unwrap_or_default()
    }
}

/// Smallest candidate step covering `duration_secs / TARGET_LABELS`, or one
/// hour when the range is too long for every candidate.
pub fn select_step_hours(duration_secs: i64) -> i64 {
    let ideal = duration_secs as f64 / TARGET_LABELS as f64;
    STEP_CANDIDATES_HOURS
        .iter()
        .copied()
        .find(|hours| (hours * SECONDS_PER_HOUR) as f64 >= ideal)
        .unwrap_or(1)
}

pub fn select_format(step_hours: i64, duration_secs: i64) -> TimeFormat {
    if step_hours >= 24 {
        TimeFormat::DateOnly
    } else if duration_secs > SECONDS_PER_DAY {
        TimeFormat::DateTime
    } else {
        TimeFormat::TimeOnly
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TimeAxisLabeler {
    offset: UtcOffset,
}

impl Default for TimeAxisLabeler {
    fn default() -> Self {
        Self::new(UtcOffset::UTC)
    }
}

impl TimeAxisLabeler {
    /// Hour and day boundaries are evaluated in `offset`.
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn with_offset_hours(hours: i8) -> Result<Self> {
        Ok(Self::new(crate::timeutils::utc_offset(hours)?))
    }

    pub fn labels(&self, timestamps: &[i64]) -> LabelMap {
        let mut labels = LabelMap::new();
        let (Some(&first), Some(&last)) = (timestamps.first(), timestamps.last()) else {
            return labels;
        };
        let duration = last - first;
        let step_hours = select_step_hours(duration);
        let format = select_format(step_hours, duration);
        let last_idx = timestamps.len() - 1;

        labels.insert(0, format.format(self.local(first)));
        labels.insert(last_idx, format.format(self.local(last)));

        let mut prev = self.local(first);
        for (idx, &ts) in timestamps.iter().enumerate().skip(1) {
            let current = self.local(ts);
            if idx != last_idx && crosses_boundary(prev, current, step_hours) {
                labels.insert(idx, format.format(current));
            }
            prev = current;
        }
        labels
    }

    fn local(&self, ts: i64) -> OffsetDateTime {
        utc_from_timestamp(ts).to_offset(self.offset)
    }
}

fn crosses_boundary(prev: OffsetDateTime, current: OffsetDateTime, step_hours: i64) -> bool {
    if step_hours < 24 {
        current.hour() != prev.hour() && i64::from(current.hour()) % step_hours == 0
    } else {
        let step_days = step_hours / 24;
        current.day() != prev.day() && i64::from(current.day()) % step_days == 0
    }
}

/// Labels in UTC.
pub fn labels(timestamps: &[i64]) -> LabelMap {
    TimeAxisLabeler::default().labels(timestamps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_follows_duration() {
        assert_eq!(select_step_hours(0), 1);
        assert_eq!(select_step_hours(6 * 3600), 1);
        assert_eq!(select_step_hours(24 * 3600), 2);
        assert_eq!(select_step_hours(2 * 86_400), 4);
        assert_eq!(select_step_hours(7 * 86_400), 24);
        assert_eq!(select_step_hours(30 * 86_400), 168);
        assert_eq!(select_step_hours(365 * 86_400), 1);
    }

    #[test]
    fn format_depends_on_step_and_duration() {
        assert_eq!(select_format(1, 3600), TimeFormat::TimeOnly);
        assert_eq!(select_format(4, 2 * 86_400), TimeFormat::DateTime);
        assert_eq!(select_format(24, 7 * 86_400), TimeFormat::DateOnly);
    }

    #[test]
    fn formats_render() {
        let at = utc_from_timestamp(1_714_572_300); // 2024-05-01 14:05 UTC
        assert_eq!(TimeFormat::TimeOnly.format(at), "14:05");
        assert_eq!(TimeFormat::DateTime.format(at), "05-01 14:05");
        assert_eq!(TimeFormat::DateOnly.format(at), "05-01");
    }
}
