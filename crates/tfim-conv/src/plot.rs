use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tfim_core::{stable_hash_string, ErrorInfo, TfimError};

/// Canvas settings for rendered figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureConfig {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Inner margin in pixels.
    pub margin: u32,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 480,
            height: 320,
            margin: 48,
        }
    }
}

/// One line of `(x, y)` points with labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSeries {
    /// Figure title, also used to derive the file name.
    pub title: String,
    /// Horizontal axis label.
    pub x_label: String,
    /// Vertical axis label.
    pub y_label: String,
    /// Points in drawing order.
    pub points: Vec<(f64, f64)>,
}

/// Destination for convergence figures.
pub trait PlotSink {
    /// Renders `series` and returns where it went.
    fn plot(&self, series: &PlotSeries) -> Result<String, TfimError>;
}

/// Writes SVG line charts into a directory.
///
/// Files are named after the title plus a hash of the series, so different
/// data never share a file and identical data always lands on the same one.
#[derive(Debug, Clone)]
pub struct SvgPlotSink {
    dir: PathBuf,
    config: FigureConfig,
}

impl SvgPlotSink {
    /// Sink writing into `dir`, created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            config: FigureConfig::default(),
        }
    }

    /// Overrides the canvas settings.
    pub fn with_config(mut self, config: FigureConfig) -> Self {
        self.config = config;
        self
    }
}

impl PlotSink for SvgPlotSink {
    fn plot(&self, series: &PlotSeries) -> Result<String, TfimError> {
        let io_error = |code: &str, err: std::io::Error| {
            TfimError::Io(
                ErrorInfo::new(code, err.to_string())
                    .with_context("dir", self.dir.display().to_string()),
            )
        };
        fs::create_dir_all(&self.dir).map_err(|err| io_error("plot.create_dir", err))?;
        let digest = stable_hash_string(series)?;
        let name = format!("{}-{}.svg", slug(&series.title), &digest[..12]);
        let path = self.dir.join(name);
        fs::write(&path, render_line_svg(series, &self.config))
            .map_err(|err| io_error("plot.write", err))?;
        let path = fs::canonicalize(&path).map_err(|err| io_error("plot.resolve", err))?;
        Ok(path.display().to_string())
    }
}

fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "figure".to_string()
    } else {
        trimmed.to_string()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if (max - min).abs() < 1e-12 {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

/// Renders a polyline chart with point markers. Output depends only on the
/// inputs.
pub fn render_line_svg(series: &PlotSeries, config: &FigureConfig) -> String {
    let (w, h) = (f64::from(config.width), f64::from(config.height));
    let m = f64::from(config.margin).min(w / 3.0).min(h / 3.0);
    let mut parts = vec![format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{}' height='{}'>",
        config.width, config.height
    )];
    parts.push(format!(
        "<text x='{:.2}' y='{:.2}' text-anchor='middle' font-size='14'>{}</text>",
        w / 2.0,
        m / 2.0,
        escape(&series.title)
    ));
    parts.push(format!(
        "<line x1='{m:.2}' y1='{y:.2}' x2='{x:.2}' y2='{y:.2}' stroke='#111827' />\
         <line x1='{m:.2}' y1='{m:.2}' x2='{m:.2}' y2='{y:.2}' stroke='#111827' />",
        x = w - m,
        y = h - m,
    ));
    parts.push(format!(
        "<text x='{:.2}' y='{:.2}' text-anchor='middle' font-size='12'>{}</text>",
        w / 2.0,
        h - m / 4.0,
        escape(&series.x_label)
    ));
    parts.push(format!(
        "<text x='{:.2}' y='{:.2}' font-size='12' transform='rotate(-90 {:.2} {:.2})'>{}</text>",
        m / 3.0,
        h / 2.0,
        m / 3.0,
        h / 2.0,
        escape(&series.y_label)
    ));

    let finite: Vec<(f64, f64)> = series
        .points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if !finite.is_empty() {
        let (x_min, x_max) = bounds(finite.iter().map(|p| p.0));
        let (y_min, y_max) = bounds(finite.iter().map(|p| p.1));
        let project = |(x, y): (f64, f64)| {
            (
                m + (x - x_min) / (x_max - x_min) * (w - 2.0 * m),
                h - m - (y - y_min) / (y_max - y_min) * (h - 2.0 * m),
            )
        };
        let coords: Vec<String> = finite
            .iter()
            .map(|&p| {
                let (px, py) = project(p);
                format!("{px:.2},{py:.2}")
            })
            .collect();
        parts.push(format!(
            "<polyline points='{}' fill='none' stroke='#3b82f6' stroke-width='2' />",
            coords.join(" ")
        ));
        for &p in &finite {
            let (px, py) = project(p);
            parts.push(format!(
                "<circle cx='{px:.2}' cy='{py:.2}' r='3' fill='#1d4ed8' />"
            ));
        }
        parts.push(format!(
            "<text x='{m:.2}' y='{:.2}' font-size='10'>{x_min}</text>\
             <text x='{:.2}' y='{:.2}' font-size='10' text-anchor='end'>{x_max}</text>",
            h - m + 14.0,
            w - m,
            h - m + 14.0,
        ));
    }
    parts.push("</svg>".into());
    parts.join("")
}
