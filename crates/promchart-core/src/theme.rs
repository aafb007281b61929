use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    #[default]
    Light,
    Dark,
}

impl FromStr for ThemeKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeKind::Light),
            "dark" => Ok(ThemeKind::Dark),
            _ => anyhow::bail!("unknown theme: {s}"),
        }
    }
}

impl fmt::Display for ThemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeKind::Light => f.write_str("light"),
            ThemeKind::Dark => f.write_str("dark"),
        }
    }
}

/// Colours handed to the renderer. Values are `#rrggbb` strings; the theme
/// is built once per render and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub kind: ThemeKind,
    pub palette: &'static [&'static str],
    pub marker_color: &'static str,
    pub font_color: &'static str,
    pub background_color: &'static str,
}

const LIGHT: Theme = Theme {
    kind: ThemeKind::Light,
    palette: &[
        "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
    ],
    marker_color: "#999999",
    font_color: "#333333",
    background_color: "#ffffff",
};

const DARK: Theme = Theme {
    kind: ThemeKind::Dark,
    palette: &[
        "#4fc3f7", "#ffb74d", "#81c784", "#e57373", "#ba68c8", "#fff176", "#4db6ac",
    ],
    marker_color: "#666666",
    font_color: "#eeeeee",
    background_color: "#1e1e1e",
};

impl Theme {
    pub fn for_kind(kind: ThemeKind) -> Theme {
        match kind {
            ThemeKind::Light => LIGHT,
            ThemeKind::Dark => DARK,
        }
    }

    /// Colour for the series at `index`, cycling through the palette.
    pub fn series_color(&self, index: usize) -> &'static str {
        self.palette[index % self.palette.len()]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::for_kind(ThemeKind::default())
    }
}
