use thiserror::Error;

/// Failures raised while turning sub-queries into a chart.
///
/// Only `NoData` stops a render. The others are collected as warnings by the
/// aggregator and the affected sub-query or series is left out.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("query {query:?} (prefix {prefix:?}) returned no data")]
    EmptyResult { prefix: String, query: String },
    #[error("series {label:?} from query {query:?} has no samples")]
    EmptySeries { label: String, query: String },
    #[error("no data to render")]
    NoData,
    #[error("series {label:?} from query {query:?} has {dropped} samples off the shared timestamp axis")]
    MisalignedSeries {
        label: String,
        query: String,
        dropped: usize,
    },
    #[error("query {query:?} failed")]
    Backend {
        query: String,
        #[source]
        source: BackendError,
    },
    #[error("duplicate query prefix {0:?}")]
    DuplicatePrefix(String),
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("invalid time range: start {start} is not before end {end}")]
    InvalidRange { start: i64, end: i64 },
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("http request failed")]
    Http(#[from] reqwest::Error),
    #[error("backend answered with http status {0}")]
    Status(u16),
    #[error("backend rejected the query ({error_type}): {message}")]
    Api { error_type: String, message: String },
    #[error("decoding backend response")]
    Decode(#[from] serde_json::Error),
    #[error("unsupported result type {0:?}, expected a range matrix")]
    ResultType(String),
}
