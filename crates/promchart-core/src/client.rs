use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::models::{RawSeries, RangeSpec, SampleValue, TagSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Source of range-query results. An empty vector means the query matched nothing.
pub trait QueryBackend {
    fn query_range(
        &self,
        query: &str,
        range: &RangeSpec,
        step: Duration,
    ) -> Result<Vec<RawSeries>, BackendError>;
}

impl<T: QueryBackend + ?Sized> QueryBackend for &T {
    fn query_range(
        &self,
        query: &str,
        range: &RangeSpec,
        step: Duration,
    ) -> Result<Vec<RawSeries>, BackendError> {
        (**self).query_range(query, range, step)
    }
}

/// Blocking client for the Prometheus HTTP API.
#[derive(Debug, Clone)]
pub struct PromClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl PromClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

impl QueryBackend for PromClient {
    fn query_range(
        &self,
        query: &str,
        range: &RangeSpec,
        step: Duration,
    ) -> Result<Vec<RawSeries>, BackendError> {
        let url = format!("{}/api/v1/query_range", self.base_url);
        let params = [
            ("query", query.to_string()),
            ("start", range.start.unix_timestamp().to_string()),
            ("end", range.end.unix_timestamp().to_string()),
            ("step", step.as_secs().max(1).to_string()),
        ];
        debug!(%url, query, "executing range query");
        let response = self.http.get(&url).query(&params).send()?;
        let status = response.status();
        let body = response.text()?;
        match parse_response(&body) {
            Ok(rows) => {
                debug!(query, rows = rows.len(), "range query finished");
                Ok(rows)
            }
            // Prometheus reports bad queries as 4xx with an error payload.
            Err(err @ BackendError::Api { .. }) => Err(err),
            Err(_) if !status.is_success() => Err(BackendError::Status(status.as_u16())),
            Err(err) => Err(err),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    data: Option<ApiData>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiData {
    result_type: String,
    #[serde(default)]
    result: Vec<ApiSeries>,
}

#[derive(Debug, Deserialize)]
struct ApiSeries {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    #[serde(default)]
    values: Vec<(f64, String)>,
}

/// Decodes a `/api/v1/query_range` response body into rows.
pub fn parse_response(body: &str) -> Result<Vec<RawSeries>, BackendError> {
    let response: ApiResponse = serde_json::from_str(body)?;
    if response.status != "success" {
        return Err(BackendError::Api {
            error_type: response.error_type.unwrap_or_else(|| "unknown".into()),
            message: response.error.unwrap_or_default(),
        });
    }
    let Some(data) = response.data else {
        return Ok(Vec::new());
    };
    if data.result_type != "matrix" {
        return Err(BackendError::ResultType(data.result_type));
    }
    Ok(data
        .result
        .into_iter()
        .map(|series| RawSeries {
            tags: TagSet::from(series.metric),
            points: series
                .values
                .into_iter()
                .map(|(ts, value)| (ts.trunc() as i64, SampleValue::Text(value)))
                .collect(),
        })
        .collect())
}
