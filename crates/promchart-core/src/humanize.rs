use crate::models::Series;

/// Unit names, each step 1000x the previous.
pub const UNITS: [&str; 6] = ["b/s", "Kb/s", "Mb/s", "Gb/s", "Tb/s", "Pb/s"];

/// Series rescaled by one shared divisor so they stay comparable on one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledDataset {
    pub series: Vec<Series>,
    pub unit: &'static str,
    pub exponent: usize,
    pub divisor: f64,
}

/// Largest absolute finite value across all series, 0 when there is none.
pub fn max_magnitude(series: &[Series]) -> f64 {
    series
        .iter()
        .flat_map(|s| s.values.iter())
        .filter(|v| v.is_finite())
        .fold(0.0_f64, |max, v| max.max(v.abs()))
}

/// Power-of-1000 exponent with `1000^e <= max_val < 1000^(e+1)`, clamped to
/// the available units.
pub fn exponent_for(max_val: f64) -> usize {
    let mut exponent = 0;
    let mut next = 1000.0_f64;
    while exponent < UNITS.len() - 1 && max_val >= next {
        exponent += 1;
        next *= 1000.0;
    }
    exponent
}

pub fn auto_scale(series: &[Series]) -> ScaledDataset {
    let exponent = exponent_for(max_magnitude(series));
    let divisor = 1000.0_f64.powi(exponent as i32);
    let scaled = series
        .iter()
        .map(|s| Series {
            label: s.label.clone(),
            values: s.values.iter().map(|v| v / divisor).collect(),
        })
        .collect();
    ScaledDataset {
        series: scaled,
        unit: UNITS[exponent],
        exponent,
        divisor,
    }
}
