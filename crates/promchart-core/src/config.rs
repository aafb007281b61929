use crate::models::{NamedQuery, QuerySpec};
use crate::theme::ThemeKind;
use crate::timeutils::{duration_from_std, parse_range, parse_step};
use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::Duration as TimeDuration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "Preset::default_presets")]
    pub presets: HashMap<String, Preset>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            chart: ChartConfig::default(),
            logging: LoggingConfig::default(),
            presets: Preset::default_presets(),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "promchart", "promchart")
            .context("cannot locate config directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(PathBuf::from).unwrap_or_else(|| {
            Config::default_path().unwrap_or_else(|_| PathBuf::from("./config.toml"))
        });
        let mut cfg = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading config at {:?}", path))?;
            Config::from_toml(&content)?
        } else {
            Config::default()
        };
        cfg.expand_paths();
        Ok(cfg)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("parsing config")
    }

    pub fn expand_paths(&mut self) {
        self.chart.output = expand_tilde(&self.chart.output);
        if let Some(file) = &self.logging.file {
            self.logging.file = Some(expand_tilde(file));
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "BackendConfig::default_url")]
    pub url: String,
    #[serde(default = "BackendConfig::default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            timeout: Self::default_timeout(),
        }
    }
}

impl BackendConfig {
    fn default_url() -> String {
        "http://127.0.0.1:9090".into()
    }

    fn default_timeout() -> Duration {
        Duration::from_secs(30)
    }
}

/// Defaults for a render when the caller does not override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "ChartConfig::default_title")]
    pub title: String,
    #[serde(default = "ChartConfig::default_query")]
    pub query: String,
    #[serde(default = "ChartConfig::default_range", with = "humantime_serde")]
    pub range: Duration,
    #[serde(default = "ChartConfig::default_step", with = "humantime_serde")]
    pub step: Duration,
    #[serde(default)]
    pub theme: ThemeKind,
    #[serde(default = "ChartConfig::default_width")]
    pub width: u32,
    #[serde(default = "ChartConfig::default_height")]
    pub height: u32,
    #[serde(default = "ChartConfig::default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub utc_offset_hours: i8,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            query: Self::default_query(),
            range: Self::default_range(),
            step: Self::default_step(),
            theme: ThemeKind::default(),
            width: Self::default_width(),
            height: Self::default_height(),
            output: Self::default_output(),
            utc_offset_hours: 0,
        }
    }
}

impl ChartConfig {
    fn default_title() -> String {
        "Prometheus Metrics".into()
    }

    fn default_query() -> String {
        "process_cpu_seconds_total".into()
    }

    fn default_range() -> Duration {
        Duration::from_secs(24 * 3600)
    }

    fn default_step() -> Duration {
        Duration::from_secs(300)
    }

    fn default_width() -> u32 {
        800
    }

    fn default_height() -> u32 {
        600
    }

    fn default_output() -> PathBuf {
        PathBuf::from("output/line_chart.svg")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".into()
    }
}

/// A named chart: either one `query` or an ordered list of prefixed `queries`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub queries: Vec<NamedQuery>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub step: Option<String>,
}

impl Preset {
    pub fn default_presets() -> HashMap<String, Preset> {
        let mut map = HashMap::new();
        map.insert(
            "cpu".into(),
            Preset {
                title: Some("CPU seconds".into()),
                query: Some("rate(process_cpu_seconds_total[5m])".into()),
                queries: vec![],
                range: Some("1d".into()),
                step: Some("5m".into()),
            },
        );
        map.insert(
            "network".into(),
            Preset {
                title: Some("Network throughput".into()),
                query: None,
                queries: vec![
                    NamedQuery {
                        prefix: "Inbound".into(),
                        query: "rate(node_network_receive_bytes_total[5m]) * 8".into(),
                    },
                    NamedQuery {
                        prefix: "Outbound".into(),
                        query: "rate(node_network_transmit_bytes_total[5m]) * 8".into(),
                    },
                ],
                range: Some("2d".into()),
                step: Some("5m".into()),
            },
        );
        map
    }

    pub fn query_spec(&self) -> Result<QuerySpec> {
        if !self.queries.is_empty() {
            let pairs = self
                .queries
                .iter()
                .map(|q| (q.prefix.clone(), q.query.clone()));
            return Ok(QuerySpec::named(pairs)?);
        }
        match &self.query {
            Some(query) => Ok(QuerySpec::single(query.clone())),
            None => anyhow::bail!("preset defines neither `query` nor `queries`"),
        }
    }

    pub fn range(&self, default: Duration) -> Result<TimeDuration> {
        if let Some(r) = &self.range {
            Ok(parse_range(r)?)
        } else {
            Ok(duration_from_std(default))
        }
    }

    pub fn step(&self, default: Duration) -> Result<Duration> {
        match &self.step {
            Some(s) => parse_step(s),
            None => Ok(default),
        }
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if !path_str.starts_with('~') {
        return path.to_path_buf();
    }

    let home = BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    if path_str == "~" {
        home
    } else {
        let mut expanded = home;
        expanded.push(path_str.trim_start_matches("~/"));
        expanded
    }
}
