use crate::aggregate::SeriesAggregator;
use crate::client::QueryBackend;
use crate::config::Config;
use crate::error::ChartError;
use crate::humanize::{auto_scale, ScaledDataset};
use crate::labels::{LabelMap, TimeAxisLabeler};
use crate::markers::marker_indices;
use crate::models::{Dataset, QuerySpec, RangeSpec, Series};
use crate::theme::{Theme, ThemeKind};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, info};

/// One render: what to query, over which window, and where to put the result.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub title: String,
    pub queries: QuerySpec,
    pub range: RangeSpec,
    pub step: Duration,
    pub output: PathBuf,
    pub theme: ThemeKind,
    /// Instants to highlight with a vertical line.
    pub markers: Vec<OffsetDateTime>,
}

impl RenderRequest {
    /// A request built from the `[chart]` defaults, ending now.
    pub fn from_config(config: &Config) -> Self {
        let chart = &config.chart;
        Self {
            title: chart.title.clone(),
            queries: QuerySpec::single(chart.query.clone()),
            range: RangeSpec::ending_now(crate::timeutils::duration_from_std(chart.range)),
            step: chart.step,
            output: chart.output.clone(),
            theme: chart.theme,
            markers: Vec::new(),
        }
    }
}

/// Everything a sink needs to draw one chart.
#[derive(Debug, Clone, Copy)]
pub struct Chart<'a> {
    pub title: &'a str,
    pub series: &'a [Series],
    pub unit: &'a str,
    pub labels: &'a LabelMap,
    pub theme: &'a Theme,
    pub markers: &'a [usize],
    pub output: &'a Path,
    pub width: u32,
    pub height: u32,
}

impl Chart<'_> {
    pub fn point_count(&self) -> usize {
        self.series.first().map(|s| s.values.len()).unwrap_or(0)
    }
}

pub trait RenderSink {
    fn render(&mut self, chart: &Chart<'_>) -> Result<()>;
}

/// Normalised data for one render, before it reaches a sink.
#[derive(Debug)]
pub struct PreparedChart {
    pub dataset: Dataset,
    pub scaled: ScaledDataset,
    pub labels: LabelMap,
    pub markers: Vec<usize>,
    pub warnings: Vec<ChartError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered { series: usize, unit: &'static str },
    NoData,
}

/// Binds a configuration and a query backend to render calls.
pub struct ChartRequest<'a, B> {
    config: &'a Config,
    aggregator: SeriesAggregator<B>,
    labeler: TimeAxisLabeler,
}

impl<'a, B: QueryBackend> ChartRequest<'a, B> {
    pub fn new(config: &'a Config, backend: B) -> Result<Self> {
        let labeler = TimeAxisLabeler::with_offset_hours(config.chart.utc_offset_hours)?;
        Ok(Self {
            config,
            aggregator: SeriesAggregator::new(backend),
            labeler,
        })
    }

    /// Queries, merges, scales and labels. Fails only with `ChartError::NoData`.
    pub fn prepare(&self, request: &RenderRequest) -> Result<PreparedChart, ChartError> {
        let aggregation = self
            .aggregator
            .aggregate(&request.queries, &request.range, request.step);
        let dataset = aggregation.dataset.ok_or(ChartError::NoData)?;
        let scaled = auto_scale(dataset.series());
        debug!(unit = scaled.unit, divisor = scaled.divisor, "scaled series");
        let labels = self.labeler.labels(dataset.timestamps());
        let instants: Vec<i64> = request.markers.iter().map(|m| m.unix_timestamp()).collect();
        let markers = marker_indices(dataset.timestamps(), &instants);
        Ok(PreparedChart {
            dataset,
            scaled,
            labels,
            markers,
            warnings: aggregation.warnings,
        })
    }

    pub fn render<S: RenderSink + ?Sized>(
        &self,
        request: &RenderRequest,
        sink: &mut S,
    ) -> Result<RenderOutcome> {
        let prepared = match self.prepare(request) {
            Ok(prepared) => prepared,
            Err(ChartError::NoData) => {
                info!(title = %request.title, "no data to render");
                return Ok(RenderOutcome::NoData);
            }
            Err(err) => return Err(err.into()),
        };

        let theme = Theme::for_kind(request.theme);
        let chart = Chart {
            title: &request.title,
            series: &prepared.scaled.series,
            unit: prepared.scaled.unit,
            labels: &prepared.labels,
            theme: &theme,
            markers: &prepared.markers,
            output: &request.output,
            width: self.config.chart.width,
            height: self.config.chart.height,
        };
        sink.render(&chart)?;
        info!(
            output = %request.output.display(),
            series = chart.series.len(),
            unit = chart.unit,
            "chart rendered"
        );
        Ok(RenderOutcome::Rendered {
            series: prepared.scaled.series.len(),
            unit: prepared.scaled.unit,
        })
    }
}
