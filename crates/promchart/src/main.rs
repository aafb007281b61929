mod render;

use anyhow::{Context, Result};
use clap::Parser;
use once_cell::sync::OnceCell;
use promchart_core::timeutils::duration_from_std;
use promchart_core::{
    parse_instant, parse_range, parse_step, ChartError, ChartRequest, Config, PreparedChart,
    PromClient, QuerySpec, RangeSpec, RenderOutcome, RenderRequest,
};
use render::SvgSink;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(author, version, about = "promchart: render Prometheus range queries as line charts")]
struct Args {
    /// Path to config TOML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Prometheus base URL
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    title: Option<String>,
    /// Single PromQL query
    #[arg(long, conflicts_with = "series")]
    query: Option<String>,
    /// Prefixed sub-query, one line set per flag, in order
    #[arg(long = "series", value_name = "PREFIX=QUERY")]
    series: Vec<String>,
    /// Named preset from the config file
    #[arg(long)]
    preset: Option<String>,
    /// Window ending now, e.g. 6h or 2d
    #[arg(long, conflicts_with = "start")]
    range: Option<String>,
    /// Window start, RFC 3339 or unix seconds
    #[arg(long, requires = "end")]
    start: Option<String>,
    /// Window end, RFC 3339 or unix seconds
    #[arg(long, requires = "start")]
    end: Option<String>,
    /// Query resolution, e.g. 5m
    #[arg(long)]
    step: Option<String>,
    /// light or dark
    #[arg(long)]
    theme: Option<String>,
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Instant to highlight with a vertical line; repeatable
    #[arg(long = "marker", value_name = "TIME")]
    markers: Vec<String>,
    /// Print the scaled data as CSV instead of drawing
    #[arg(long)]
    csv: bool,
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    init_logging(&config)?;

    let request = build_request(&config, &args)?;
    debug!(queries = request.queries.len(), step = ?request.step, "request ready");
    let client = PromClient::new(&config.backend).context("building http client")?;
    let charts = ChartRequest::new(&config, client)?;

    if args.csv {
        match charts.prepare(&request) {
            Ok(prepared) => {
                let stdout = io::stdout();
                export_csv(&prepared, stdout.lock())?;
            }
            Err(ChartError::NoData) => eprintln!("No data to render"),
            Err(err) => return Err(err.into()),
        }
        return Ok(());
    }

    match charts.render(&request, &mut SvgSink)? {
        RenderOutcome::Rendered { .. } => println!("{}", request.output.display()),
        RenderOutcome::NoData => eprintln!("No data to render"),
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(url) = &args.url {
        config.backend.url = url.clone();
    }
    if args.verbose {
        config.logging.level = "debug".into();
    }
}

fn build_request(config: &Config, args: &Args) -> Result<RenderRequest> {
    let mut request = RenderRequest::from_config(config);
    let mut window = duration_from_std(config.chart.range);

    if let Some(name) = &args.preset {
        let preset = config
            .presets
            .get(name)
            .with_context(|| format!("unknown preset {name:?}"))?;
        request.queries = preset.query_spec()?;
        if let Some(title) = &preset.title {
            request.title = title.clone();
        }
        window = preset.range(config.chart.range)?;
        request.step = preset.step(config.chart.step)?;
    }

    if let Some(query) = &args.query {
        request.queries = QuerySpec::single(query.clone());
    }
    if !args.series.is_empty() {
        request.queries = parse_series(&args.series)?;
    }
    if let Some(title) = &args.title {
        request.title = title.clone();
    }
    if let Some(range) = &args.range {
        window = parse_range(range)?;
    }
    request.range = match (&args.start, &args.end) {
        (Some(start), Some(end)) => RangeSpec::new(parse_instant(start)?, parse_instant(end)?)?,
        _ => RangeSpec::ending_now(window),
    };
    if let Some(step) = &args.step {
        request.step = parse_step(step)?;
    }
    if let Some(theme) = &args.theme {
        request.theme = theme.parse()?;
    }
    if let Some(output) = &args.output {
        request.output = output.clone();
    }
    request.markers = args
        .markers
        .iter()
        .map(|m| parse_instant(m))
        .collect::<Result<_>>()?;
    Ok(request)
}

/// `PREFIX=QUERY` flags, split at the first `=` since queries contain `=` themselves.
fn parse_series(specs: &[String]) -> Result<QuerySpec> {
    let pairs = specs
        .iter()
        .map(|spec| {
            spec.split_once('=')
                .map(|(prefix, query)| (prefix.trim().to_string(), query.trim().to_string()))
                .with_context(|| format!("expected PREFIX=QUERY, got {spec:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(QuerySpec::named(pairs)?)
}

fn export_csv<W: Write>(prepared: &PreparedChart, mut writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(&mut writer);
    csv_writer.write_record(["timestamp", "label", "value", "unit"])?;
    let timestamps = prepared.dataset.timestamps();
    for series in &prepared.scaled.series {
        for (ts, value) in timestamps.iter().zip(&series.values) {
            csv_writer.write_record([
                ts.to_string().as_str(),
                series.label.as_str(),
                format!("{value:.3}").as_str(),
                prepared.scaled.unit,
            ])?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let writer: BoxMakeWriter = if let Some(path) = &config.logging.file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file at {:?}", path))?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        static LOG_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();
        let _ = LOG_GUARD.set(guard);
        BoxMakeWriter::new(writer)
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };

    tracing_subscriber::fmt()
        .with_env_filter(config.logging.level.clone())
        .with_ansi(config.logging.file.is_none() && atty::is(atty::Stream::Stderr))
        .with_target(false)
        .with_level(true)
        .with_writer(writer)
        .finish()
        .try_init()
        .ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use promchart_core::{Dataset, Series, ThemeKind};

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["promchart"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn series_flags_keep_order_and_split_once() {
        let spec = parse_series(&[
            "Outbound=rate(tx{device=\"eth0\"}[5m])".into(),
            "Inbound=rate(rx[5m])".into(),
        ])
        .unwrap();
        assert_eq!(spec.pairs()[0].prefix, "Outbound");
        assert_eq!(spec.pairs()[0].query, "rate(tx{device=\"eth0\"}[5m])");
        assert_eq!(spec.pairs()[1].prefix, "Inbound");
        assert!(parse_series(&["no-separator".into()]).is_err());
    }

    #[test]
    fn preset_then_flags() {
        let config = Config::default();
        let request = build_request(
            &config,
            &args(&["--preset", "network", "--step", "1m", "--theme", "dark"]),
        )
        .unwrap();
        assert_eq!(request.title, "Network throughput");
        assert_eq!(request.queries.len(), 2);
        assert_eq!(request.step.as_secs(), 60);
        assert_eq!(request.theme, ThemeKind::Dark);
        assert_eq!(request.range.duration().whole_hours(), 48);
    }

    #[test]
    fn explicit_window_and_markers() {
        let config = Config::default();
        let request = build_request(
            &config,
            &args(&[
                "--query",
                "up",
                "--start",
                "1000",
                "--end",
                "2000",
                "--marker",
                "1500",
            ]),
        )
        .unwrap();
        assert_eq!(request.queries, QuerySpec::single("up"));
        assert_eq!(request.range.start.unix_timestamp(), 1000);
        assert_eq!(request.markers[0].unix_timestamp(), 1500);
        assert!(build_request(&config, &args(&["--start", "2000", "--end", "1000"])).is_err());
    }

    #[test]
    fn unknown_preset_fails() {
        let config = Config::default();
        assert!(build_request(&config, &args(&["--preset", "nope"])).is_err());
    }

    #[test]
    fn csv_export_writes_rows() {
        let dataset = Dataset::new(vec![100, 200], vec![Series::new("a", vec![1500.0, 2500.0])])
            .unwrap();
        let scaled = promchart_core::auto_scale(dataset.series());
        let prepared = PreparedChart {
            dataset,
            scaled,
            labels: Default::default(),
            markers: vec![],
            warnings: vec![],
        };
        let mut buf = Vec::new();
        export_csv(&prepared, &mut buf).unwrap();
        let content = String::from_utf8(buf).unwrap();
        assert!(content.starts_with("timestamp,label,value,unit"));
        assert!(content.contains("100,a,1.500,Kb/s"));
        assert!(content.contains("200,a,2.500,Kb/s"));
    }
}
