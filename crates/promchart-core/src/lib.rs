pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod humanize;
pub mod labels;
pub mod markers;
pub mod models;
pub mod request;
pub mod theme;
pub mod timeutils;

pub use aggregate::{Aggregation, SeriesAggregator};
pub use client::{parse_response, PromClient, QueryBackend};
pub use config::{BackendConfig, ChartConfig, Config, LoggingConfig, Preset};
pub use error::{BackendError, ChartError};
pub use humanize::{auto_scale, ScaledDataset, UNITS};
pub use labels::{LabelMap, TimeAxisLabeler, TimeFormat};
pub use markers::marker_indices;
pub use models::{Dataset, NamedQuery, QuerySpec, RangeSpec, RawSeries, SampleValue, Series, TagSet};
pub use request::{Chart, ChartRequest, PreparedChart, RenderOutcome, RenderRequest, RenderSink};
pub use theme::{Theme, ThemeKind};
pub use timeutils::{now_utc, parse_instant, parse_range, parse_step, utc_from_timestamp};
