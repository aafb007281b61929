use crate::error::ChartError;
use crate::timeutils::now_utc;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use time::{Duration, OffsetDateTime};

/// Tag Prometheus uses to carry the metric name.
pub const NAME_TAG: &str = "__name__";
pub const INSTANCE_TAG: &str = "instance";

/// Value stored for a sample that is not a finite number.
pub const MALFORMED_POINT_SENTINEL: f64 = 0.0;

/// Label set attached to one backend row, kept sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Human readable name for the row: the `instance` tag when present,
    /// otherwise every tag but the metric name as `key=value` joined by commas.
    pub fn series_label(&self) -> String {
        if let Some(instance) = self.get(INSTANCE_TAG) {
            return instance.to_string();
        }
        self.0
            .iter()
            .filter(|(key, _)| key.as_str() != NAME_TAG)
            .map(|(key, value)| format!("{key}={value}"))
            .join(",")
    }
}

impl From<BTreeMap<String, String>> for TagSet {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

pub fn prefixed_label(prefix: &str, label: &str) -> String {
    match (prefix.is_empty(), label.is_empty()) {
        (true, _) => label.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix} {label}"),
    }
}

/// A sample as the backend reported it. Prometheus sends values as strings.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Number(f64),
    Text(String),
}

impl SampleValue {
    /// The sample as a finite float, `None` for NaN, infinities and garbage.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            SampleValue::Number(v) => *v,
            SampleValue::Text(raw) => raw.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for SampleValue {
    fn from(value: f64) -> Self {
        SampleValue::Number(value)
    }
}

impl From<&str> for SampleValue {
    fn from(value: &str) -> Self {
        SampleValue::Text(value.to_string())
    }
}

impl From<String> for SampleValue {
    fn from(value: String) -> Self {
        SampleValue::Text(value)
    }
}

/// One result row of a range query.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub tags: TagSet,
    pub points: Vec<(i64, SampleValue)>,
}

impl RawSeries {
    pub fn new(tags: TagSet) -> Self {
        Self {
            tags,
            points: Vec::new(),
        }
    }

    pub fn push<V: Into<SampleValue>>(&mut self, timestamp: i64, value: V) {
        self.points.push((timestamp, value.into()));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new<L: Into<String>>(label: L, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }
}

/// Series sharing one timestamp axis.
///
/// Timestamps are unix seconds, strictly increasing, and every series holds
/// exactly one value per timestamp. A dataset always has at least one series.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    timestamps: Vec<i64>,
    series: Vec<Series>,
}

impl Dataset {
    pub fn new(timestamps: Vec<i64>, series: Vec<Series>) -> Result<Self, ChartError> {
        if series.is_empty() {
            return Err(ChartError::InvalidDataset("dataset has no series".into()));
        }
        if let Some(pair) = timestamps.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ChartError::InvalidDataset(format!(
                "timestamps not strictly increasing at {} -> {}",
                pair[0], pair[1]
            )));
        }
        if let Some(bad) = series.iter().find(|s| s.values.len() != timestamps.len()) {
            return Err(ChartError::InvalidDataset(format!(
                "series {:?} has {} values for {} timestamps",
                bad.label,
                bad.values.len(),
                timestamps.len()
            )));
        }
        Ok(Self { timestamps, series })
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedQuery {
    #[serde(default)]
    pub prefix: String,
    pub query: String,
}

/// Ordered `(prefix, query)` pairs. A bare query is a single pair with an
/// empty prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pairs: Vec<NamedQuery>,
}

impl QuerySpec {
    pub fn single<Q: Into<String>>(query: Q) -> Self {
        Self {
            pairs: vec![NamedQuery {
                prefix: String::new(),
                query: query.into(),
            }],
        }
    }

    /// Builds a multi-query spec, keeping insertion order. Prefixes must be unique.
    pub fn named<I, P, Q>(pairs: I) -> Result<Self, ChartError>
    where
        I: IntoIterator<Item = (P, Q)>,
        P: Into<String>,
        Q: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (prefix, query) in pairs {
            let prefix: String = prefix.into();
            if !seen.insert(prefix.clone()) {
                return Err(ChartError::DuplicatePrefix(prefix));
            }
            out.push(NamedQuery {
                prefix,
                query: query.into(),
            });
        }
        Ok(Self { pairs: out })
    }

    pub fn pairs(&self) -> &[NamedQuery] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl From<&str> for QuerySpec {
    fn from(query: &str) -> Self {
        QuerySpec::single(query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl RangeSpec {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, ChartError> {
        if start >= end {
            return Err(ChartError::InvalidRange {
                start: start.unix_timestamp(),
                end: end.unix_timestamp(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn ending_now(duration: Duration) -> Self {
        let end = now_utc();
        let start = end.checked_sub(duration).unwrap_or(OffsetDateTime::UNIX_EPOCH);
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
