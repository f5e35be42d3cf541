pub mod bar;
pub mod heatmap;
pub mod map;

use thiserror::Error as ThisError;

/// Series color used across every chart, matching the report style.
pub const BAR_COLOR: &str = "#2a87c8";

#[derive(Debug, ThisError)]
pub enum Error {
    /// The aggregate for this chart matched no records. Recoverable: the
    /// caller skips the chart instead of writing an empty image.
    #[error("nothing to render: empty input aggregate")]
    EmptyInput,

    #[error("geometry: {0}")]
    Geometry(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// How axis tick labels and bar annotations print the metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// US dollars rendered in millions, e.g. "$25m"
    Currency,
    /// plain integer, e.g. organization counts
    Count,
}

impl ValueFormat {
    pub fn tick(&self, v: i64) -> String {
        match self {
            ValueFormat::Currency => format_millions(v),
            ValueFormat::Count => v.to_string(),
        }
    }
}

/// Static styling for one chart; the data arrives already aggregated and
/// sorted, so rendering is presentation only.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub orientation: Orientation,
    pub format: ValueFormat,
}

/// "$25m" style currency tick, rounded to whole millions.
pub fn format_millions(v: i64) -> String {
    let millions = ((v as f64) / 1_000_000.0).round() as i64;
    format!("${}m", group_digits(millions))
}

/// "$1,065,123,456" style full-dollar figure for summary lines.
pub fn format_dollars(v: i64) -> String {
    format!("${}", group_digits(v))
}

pub fn group_digits(v: i64) -> String {
    let digits = v.abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if v < 0 {
        format!("-{out}")
    } else {
        out
    }
}

pub(crate) fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
