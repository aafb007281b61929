use promchart_core::humanize::{exponent_for, max_magnitude};
use promchart_core::{auto_scale, Series, UNITS};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn gigabits_are_detected() {
    let series = vec![Series::new("link", vec![500_000_000.0, 1_200_000_000.0])];
    let scaled = auto_scale(&series);
    assert_eq!(scaled.exponent, 3);
    assert_eq!(scaled.unit, "Gb/s");
    assert!(approx(scaled.series[0].values[0], 0.5));
    assert!(approx(scaled.series[0].values[1], 1.2));
}

#[test]
fn all_series_share_one_divisor() {
    let series = vec![
        Series::new("small", vec![2_000.0]),
        Series::new("large", vec![3_000_000.0]),
    ];
    let scaled = auto_scale(&series);
    assert_eq!(scaled.unit, "Mb/s");
    assert_eq!(scaled.exponent, 2);
    assert!(approx(scaled.divisor, 1_000_000.0));
    assert!(approx(scaled.series[0].values[0], 0.002));
    assert!(approx(scaled.series[1].values[0], 3.0));
}

#[test]
fn labels_and_order_are_preserved() {
    let series = vec![
        Series::new("b", vec![1.0, 2.0]),
        Series::new("a", vec![3.0, 4.0]),
    ];
    let scaled = auto_scale(&series);
    let labels: Vec<_> = scaled.series.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["b", "a"]);
    assert_eq!(scaled.series[0].values.len(), 2);
}

#[test]
fn exponent_brackets_the_maximum() {
    for max_val in [1.0, 999.0, 1_000.0, 45_000.0, 7.5e8, 1e12, 3.3e14] {
        let e = exponent_for(max_val);
        let lower = 1000f64.powi(e as i32);
        assert!(lower <= max_val, "{max_val} below 1000^{e}");
        assert!(max_val < lower * 1000.0, "{max_val} above 1000^{}", e + 1);
    }
}

#[test]
fn exponent_is_clamped() {
    assert_eq!(exponent_for(0.0), 0);
    assert_eq!(exponent_for(0.25), 0);
    assert_eq!(exponent_for(1e30), UNITS.len() - 1);
}

#[test]
fn negative_values_count_by_magnitude() {
    let series = vec![Series::new("delta", vec![-4_000.0, 10.0, f64::NAN])];
    assert!(approx(max_magnitude(&series), 4_000.0));
    assert_eq!(auto_scale(&series).unit, "Kb/s");
}

#[test]
fn empty_input_stays_in_base_unit() {
    let scaled = auto_scale(&[]);
    assert_eq!(scaled.unit, "b/s");
    assert!(scaled.series.is_empty());
}
