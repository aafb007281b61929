use anyhow::{Context, Result};
use plotters::coord::combinators::BindKeyPoints;
use plotters::prelude::*;
use promchart_core::{Chart, RenderSink, Series};
use std::fs;

/// Writes charts as SVG files with plotters.
///
/// The x axis is the sample index; only indices present in the label map get
/// a tick, showing the label map's string.
#[derive(Debug, Default)]
pub struct SvgSink;

impl RenderSink for SvgSink {
    fn render(&mut self, chart: &Chart<'_>) -> Result<()> {
        if let Some(parent) = chart.output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory {parent:?}"))?;
            }
        }

        let theme = chart.theme;
        let background = parse_hex(theme.background_color)?;
        let font_color = parse_hex(theme.font_color)?;
        let marker_color = parse_hex(theme.marker_color)?;
        let text_style = ("sans-serif", 14).into_font().color(&font_color);

        let last = chart.point_count().saturating_sub(1).max(1) as i32;
        let key_points: Vec<i32> = chart.labels.keys().map(|&idx| idx as i32).collect();
        let (y_min, y_max) = y_bounds(chart.series);

        let root = SVGBackend::new(chart.output, (chart.width, chart.height)).into_drawing_area();
        root.fill(&background)?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(chart.title, ("sans-serif", 24).into_font().color(&font_color))
            .margin(10)
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d((0..last).with_key_points(key_points), y_min..y_max)?;

        ctx.configure_mesh()
            .x_labels(chart.labels.len().max(2))
            .x_label_formatter(&|idx| {
                chart
                    .labels
                    .get(&(*idx as usize))
                    .cloned()
                    .unwrap_or_default()
            })
            .y_desc(chart.unit)
            .axis_style(font_color)
            .light_line_style(font_color.mix(0.05))
            .bold_line_style(font_color.mix(0.15))
            .label_style(text_style.clone())
            .axis_desc_style(text_style.clone())
            .draw()?;

        for &idx in chart.markers {
            let x = idx as i32;
            ctx.draw_series(LineSeries::new(
                [(x, y_min), (x, y_max)],
                marker_color.stroke_width(1),
            ))?;
        }

        for (idx, series) in chart.series.iter().enumerate() {
            let color = parse_hex(theme.series_color(idx))?;
            ctx.draw_series(LineSeries::new(
                series
                    .values
                    .iter()
                    .enumerate()
                    .map(|(x, y)| (x as i32, *y)),
                color.stroke_width(2),
            ))?
            .label(series.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        // A lone series is already named by the title.
        if chart.series.len() > 1 {
            ctx.configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .border_style(font_color)
                .background_style(background.mix(0.8))
                .label_font(text_style)
                .draw()?;
        }

        root.present()
            .with_context(|| format!("writing chart to {:?}", chart.output))?;
        Ok(())
    }
}

/// Y range covering every value and zero, never empty.
fn y_bounds(series: &[Series]) -> (f64, f64) {
    let (min, max) = series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let headroom = (max - min) * 0.05;
    if headroom == 0.0 {
        (min, min + 1.0)
    } else {
        (min, max + headroom)
    }
}

fn parse_hex(hex: &str) -> Result<RGBColor> {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        anyhow::bail!("invalid colour {hex:?}, expected #rrggbb");
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).with_context(|| format!("invalid colour {hex:?}"))
    };
    Ok(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use promchart_core::{LabelMap, Theme, ThemeKind};

    #[test]
    fn hex_colours_parse() {
        let RGBColor(r, g, b) = parse_hex("#1f77b4").unwrap();
        assert_eq!((r, g, b), (0x1f, 0x77, 0xb4));
        assert!(parse_hex("#fff").is_err());
        assert!(parse_hex("#zzzzzz").is_err());
        // six bytes, but not six characters
        assert!(parse_hex("#fé111").is_err());
    }

    #[test]
    fn bounds_include_zero_and_headroom() {
        let series = vec![Series::new("a", vec![2.0, 10.0])];
        let (lo, hi) = y_bounds(&series);
        assert_eq!(lo, 0.0);
        assert!(hi > 10.0);
        assert_eq!(y_bounds(&[Series::new("flat", vec![0.0])]), (0.0, 1.0));
    }

    #[test]
    fn writes_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("chart.svg");
        let series = vec![
            Series::new("Inbound fw1", vec![0.5, 1.2, 0.9]),
            Series::new("Outbound fw1", vec![0.1, 0.3, 0.2]),
        ];
        let labels: LabelMap = [(0, "00:00".to_string()), (2, "02:00".to_string())]
            .into_iter()
            .collect();
        let theme = Theme::for_kind(ThemeKind::Light);
        let chart = Chart {
            title: "Throughput",
            series: &series,
            unit: "Gb/s",
            labels: &labels,
            theme: &theme,
            markers: &[1],
            output: &output,
            width: 400,
            height: 300,
        };
        SvgSink.render(&chart).unwrap();
        let svg = std::fs::read_to_string(&output).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Throughput"));
    }
}
