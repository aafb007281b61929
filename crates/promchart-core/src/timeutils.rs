use anyhow::{Context, Result};
use std::time::Duration as StdDuration;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime, UtcOffset};

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub fn utc_from_timestamp(ts: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(ts).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

pub fn parse_range(spec: &str) -> Result<Duration> {
    let std = humantime::parse_duration(spec).context("invalid duration format")?;
    Ok(duration_from_std(std))
}

/// Parses a query resolution such as `5m`. Sub-second steps are rejected
/// because the backend works in whole seconds.
pub fn parse_step(spec: &str) -> Result<StdDuration> {
    let step = humantime::parse_duration(spec).context("invalid step format")?;
    if step.as_secs() == 0 {
        anyhow::bail!("step must be at least one second, got {spec:?}");
    }
    Ok(step)
}

/// Accepts RFC 3339 (`2024-05-01T12:00:00Z`) or integer unix seconds.
pub fn parse_instant(spec: &str) -> Result<OffsetDateTime> {
    let spec = spec.trim();
    if let Ok(secs) = spec.parse::<i64>() {
        return OffsetDateTime::from_unix_timestamp(secs)
            .with_context(|| format!("unix timestamp {secs} out of range"));
    }
    OffsetDateTime::parse(spec, &Rfc3339).with_context(|| format!("invalid timestamp {spec:?}"))
}

pub fn utc_offset(hours: i8) -> Result<UtcOffset> {
    UtcOffset::from_hms(hours, 0, 0).with_context(|| format!("invalid utc offset {hours}h"))
}

pub fn duration_from_std(std: StdDuration) -> Duration {
    Duration::new(std.as_secs() as i64, std.subsec_nanos() as i32)
}
