use crate::client::QueryBackend;
use crate::error::ChartError;
use crate::models::{
    prefixed_label, Dataset, NamedQuery, QuerySpec, RangeSpec, RawSeries, Series,
    MALFORMED_POINT_SENTINEL,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Result of running every sub-query of a [`QuerySpec`].
#[derive(Debug)]
pub struct Aggregation {
    /// `None` when no sub-query produced a usable series.
    pub dataset: Option<Dataset>,
    /// Non-fatal problems, in the order they were hit.
    pub warnings: Vec<ChartError>,
}

/// Runs sub-queries in order and merges their rows onto one timestamp axis.
///
/// The axis comes from the first sub-query that returns data. Rows from
/// later sub-queries are re-indexed onto it. Samples at timestamps the axis
/// does not know are discarded with a warning, and a row left with none is
/// dropped. Rows without samples are skipped. Points missing from a row hold
/// [`MALFORMED_POINT_SENTINEL`].
#[derive(Debug, Clone)]
pub struct SeriesAggregator<B> {
    backend: B,
}

impl<B: QueryBackend> SeriesAggregator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn aggregate(&self, queries: &QuerySpec, range: &RangeSpec, step: Duration) -> Aggregation {
        let mut axis: Option<Vec<i64>> = None;
        let mut series = Vec::new();
        let mut warnings = Vec::new();

        for pair in queries.pairs() {
            let rows = match self.backend.query_range(&pair.query, range, step) {
                Ok(rows) => rows,
                Err(source) => {
                    warn!(prefix = %pair.prefix, query = %pair.query, "query failed: {source}");
                    warnings.push(ChartError::Backend {
                        query: pair.query.clone(),
                        source,
                    });
                    continue;
                }
            };
            if rows.iter().all(|row| row.points.is_empty()) {
                warn!(prefix = %pair.prefix, query = %pair.query, "query returned no data, skipping");
                warnings.push(ChartError::EmptyResult {
                    prefix: pair.prefix.clone(),
                    query: pair.query.clone(),
                });
                continue;
            }

            let shared: &[i64] = axis.get_or_insert_with(|| baseline_axis(&rows));
            for row in rows {
                self.merge_row(pair, shared, row, &mut series, &mut warnings);
            }
        }

        let dataset = match axis {
            Some(timestamps) if !series.is_empty() => match Dataset::new(timestamps, series) {
                Ok(dataset) => Some(dataset),
                Err(err) => {
                    warn!("discarding merged data: {err}");
                    warnings.push(err);
                    None
                }
            },
            _ => None,
        };
        Aggregation { dataset, warnings }
    }

    fn merge_row(
        &self,
        pair: &NamedQuery,
        axis: &[i64],
        row: RawSeries,
        series: &mut Vec<Series>,
        warnings: &mut Vec<ChartError>,
    ) {
        let label = prefixed_label(&pair.prefix, &row.tags.series_label());
        if row.points.is_empty() {
            warn!(%label, query = %pair.query, "series has no samples, skipping");
            warnings.push(ChartError::EmptySeries {
                label,
                query: pair.query.clone(),
            });
            return;
        }

        let aligned = align_row(axis, &row);
        if aligned.malformed > 0 {
            debug!(%label, malformed = aligned.malformed, "replaced non-numeric samples with {MALFORMED_POINT_SENTINEL}");
        }
        if aligned.off_axis > 0 {
            warn!(
                %label,
                query = %pair.query,
                dropped = aligned.off_axis,
                "samples off the shared timestamps, discarding them"
            );
            warnings.push(ChartError::MisalignedSeries {
                label: label.clone(),
                query: pair.query.clone(),
                dropped: aligned.off_axis,
            });
        }
        if aligned.off_axis < row.points.len() {
            series.push(Series::new(label, aligned.values));
        }
    }
}

/// Sorted, de-duplicated union of every row's timestamps.
fn baseline_axis(rows: &[RawSeries]) -> Vec<i64> {
    let mut axis: Vec<i64> = rows
        .iter()
        .flat_map(|row| row.points.iter().map(|(ts, _)| *ts))
        .collect();
    axis.sort_unstable();
    axis.dedup();
    axis
}

/// A row placed on the shared axis.
#[derive(Debug)]
struct AlignedRow {
    values: Vec<f64>,
    malformed: usize,
    off_axis: usize,
}

fn align_row(axis: &[i64], row: &RawSeries) -> AlignedRow {
    let mut aligned = AlignedRow {
        values: vec![MALFORMED_POINT_SENTINEL; axis.len()],
        malformed: 0,
        off_axis: 0,
    };
    for (ts, value) in &row.points {
        let Ok(idx) = axis.binary_search(ts) else {
            aligned.off_axis += 1;
            continue;
        };
        match value.as_f64() {
            Some(v) => aligned.values[idx] = v,
            None => aligned.malformed += 1,
        }
    }
    aligned
}
