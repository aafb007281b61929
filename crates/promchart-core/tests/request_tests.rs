use anyhow::Result;
use promchart_core::error::BackendError;
use promchart_core::{
    Chart, ChartError, ChartRequest, Config, QueryBackend, QuerySpec, RangeSpec, RawSeries,
    RenderOutcome, RenderRequest, RenderSink, TagSet, ThemeKind,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use time::OffsetDateTime;

// 2024-05-01 00:00:00 UTC
const MAY_FIRST: i64 = 1_714_521_600;

struct StaticBackend(HashMap<&'static str, Vec<RawSeries>>);

impl QueryBackend for StaticBackend {
    fn query_range(
        &self,
        query: &str,
        _range: &RangeSpec,
        _step: Duration,
    ) -> Result<Vec<RawSeries>, BackendError> {
        Ok(self.0.get(query).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct RecordingSink {
    calls: Vec<Recorded>,
}

struct Recorded {
    title: String,
    labels: Vec<String>,
    values: Vec<Vec<f64>>,
    unit: String,
    axis: Vec<usize>,
    markers: Vec<usize>,
    background: String,
    size: (u32, u32),
}

impl RenderSink for RecordingSink {
    fn render(&mut self, chart: &Chart<'_>) -> Result<()> {
        self.calls.push(Recorded {
            title: chart.title.to_string(),
            labels: chart.series.iter().map(|s| s.label.clone()).collect(),
            values: chart.series.iter().map(|s| s.values.clone()).collect(),
            unit: chart.unit.to_string(),
            axis: chart.labels.keys().copied().collect(),
            markers: chart.markers.to_vec(),
            background: chart.theme.background_color.to_string(),
            size: (chart.width, chart.height),
        });
        Ok(())
    }
}

fn throughput_row(instance: &str, base: f64) -> RawSeries {
    let mut row = RawSeries::new([("instance", instance)].into_iter().collect::<TagSet>());
    for i in 0..4 {
        row.push(MAY_FIRST + i * 3_600, (base * (i + 1) as f64).to_string());
    }
    row
}

fn request(queries: QuerySpec) -> RenderRequest {
    RenderRequest {
        title: "Network".into(),
        queries,
        range: RangeSpec::new(
            OffsetDateTime::from_unix_timestamp(MAY_FIRST).unwrap(),
            OffsetDateTime::from_unix_timestamp(MAY_FIRST + 3 * 3_600).unwrap(),
        )
        .unwrap(),
        step: Duration::from_secs(3_600),
        output: PathBuf::from("unused.svg"),
        theme: ThemeKind::Dark,
        markers: vec![OffsetDateTime::from_unix_timestamp(MAY_FIRST + 7_000).unwrap()],
    }
}

#[test]
fn renders_scaled_multi_query_chart() {
    let backend = StaticBackend(HashMap::from([
        ("in", vec![throughput_row("fw1", 250_000_000.0)]),
        ("out", vec![throughput_row("fw1", 100_000_000.0)]),
    ]));
    let config = Config::default();
    let charts = ChartRequest::new(&config, backend).unwrap();
    let mut sink = RecordingSink::default();

    let spec = QuerySpec::named([("Inbound", "in"), ("Outbound", "out")]).unwrap();
    let outcome = charts.render(&request(spec), &mut sink).unwrap();

    assert_eq!(outcome, RenderOutcome::Rendered { series: 2, unit: "Gb/s" });
    assert_eq!(sink.calls.len(), 1);
    let call = &sink.calls[0];
    assert_eq!(call.title, "Network");
    assert_eq!(call.labels, ["Inbound fw1", "Outbound fw1"]);
    assert_eq!(call.unit, "Gb/s");
    assert!((call.values[0][3] - 1.0).abs() < 1e-9);
    assert!((call.values[1][0] - 0.1).abs() < 1e-9);
    assert_eq!(call.axis, vec![0, 1, 2, 3]);
    assert_eq!(call.markers, vec![2]);
    assert_eq!(call.background, "#1e1e1e");
    assert_eq!(call.size, (800, 600));
}

#[test]
fn no_data_skips_the_sink() {
    let backend = StaticBackend(HashMap::new());
    let config = Config::default();
    let charts = ChartRequest::new(&config, backend).unwrap();
    let mut sink = RecordingSink::default();

    let spec = QuerySpec::named([("Inbound", "in"), ("Outbound", "out")]).unwrap();
    let outcome = charts.render(&request(spec), &mut sink).unwrap();
    assert_eq!(outcome, RenderOutcome::NoData);
    assert!(sink.calls.is_empty());
}

#[test]
fn prepare_reports_no_data() {
    let config = Config::default();
    let charts = ChartRequest::new(&config, StaticBackend(HashMap::new())).unwrap();
    let err = charts.prepare(&request(QuerySpec::single("missing"))).unwrap_err();
    assert!(matches!(err, ChartError::NoData));
}

#[test]
fn prepare_keeps_warnings() {
    let backend = StaticBackend(HashMap::from([("in", vec![throughput_row("fw1", 5.0)])]));
    let config = Config::default();
    let charts = ChartRequest::new(&config, backend).unwrap();
    let spec = QuerySpec::named([("Inbound", "in"), ("Outbound", "out")]).unwrap();
    let prepared = charts.prepare(&request(spec)).unwrap();
    assert_eq!(prepared.dataset.series().len(), 1);
    assert_eq!(prepared.scaled.unit, "b/s");
    assert_eq!(prepared.warnings.len(), 1);
}

#[test]
fn invalid_utc_offset_is_rejected() {
    let mut config = Config::default();
    config.chart.utc_offset_hours = 40;
    assert!(ChartRequest::new(&config, StaticBackend(HashMap::new())).is_err());
}
