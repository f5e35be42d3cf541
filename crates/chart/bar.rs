use crate::{xml_escape, ChartSpec, Error, Orientation, BAR_COLOR};
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const WIDTH: f64 = 1280.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;
const TICKS: i64 = 4;

/// Render one bar chart from (label, value) rows, already sorted by the
/// caller. Empty rows are an `EmptyInput` error so the caller can skip the
/// artifact.
pub fn render<P: AsRef<Path>>(
    spec: &ChartSpec,
    rows: &[(String, i64)],
    path: P,
) -> Result<(), Error> {
    if rows.is_empty() {
        return Err(Error::EmptyInput);
    }
    let svg = match spec.orientation {
        Orientation::Vertical => vertical(spec, rows),
        Orientation::Horizontal => horizontal(spec, rows),
    };
    let mut file = File::create(&path)?;
    file.write_all(svg.as_bytes())?;
    info!("chart written: {}", path.as_ref().display());
    Ok(())
}

fn max_value(rows: &[(String, i64)]) -> i64 {
    rows.iter().map(|r| r.1).max().unwrap_or(0).max(1)
}

fn vertical(spec: &ChartSpec, rows: &[(String, i64)]) -> String {
    let height = 720.0;
    let margin_left = 110.0;
    let plot_w = WIDTH - margin_left - 30.0;
    let plot_h = height - MARGIN_TOP - MARGIN_BOTTOM;
    let max = max_value(rows);
    let slot = plot_w / rows.len() as f64;
    let bar_w = slot * 0.8;

    let mut svg = header(WIDTH, height, &spec.title);
    // y axis ticks and gridlines
    for i in 0..=TICKS {
        let v = max * i / TICKS;
        let y = MARGIN_TOP + plot_h - (v as f64 / max as f64) * plot_h;
        svg.push_str(&format!(
            "<line x1=\"{margin_left}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#dddddd\"/>\n",
            margin_left + plot_w
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"15\">{}</text>\n",
            margin_left - 8.0,
            y + 5.0,
            xml_escape(&spec.format.tick(v))
        ));
    }
    for (i, (label, value)) in rows.iter().enumerate() {
        let h = (*value as f64 / max as f64) * plot_h;
        let x = margin_left + i as f64 * slot + (slot - bar_w) / 2.0;
        let y = MARGIN_TOP + plot_h - h;
        svg.push_str(&format!(
            "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{bar_w:.1}\" height=\"{h:.1}\" fill=\"{BAR_COLOR}\"/>\n"
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"14\">{}</text>\n",
            x + bar_w / 2.0,
            MARGIN_TOP + plot_h + 22.0,
            xml_escape(label)
        ));
    }
    svg.push_str(&axis_labels(
        &spec.x_label,
        &spec.y_label,
        WIDTH,
        height,
        margin_left,
    ));
    svg.push_str("</svg>\n");
    svg
}

fn horizontal(spec: &ChartSpec, rows: &[(String, i64)]) -> String {
    let margin_left = 430.0;
    let slot = 34.0;
    let height = MARGIN_TOP + rows.len() as f64 * slot + MARGIN_BOTTOM;
    let plot_w = WIDTH - margin_left - 40.0;
    let max = max_value(rows);
    let bar_h = slot * 0.8;

    let mut svg = header(WIDTH, height, &spec.title);
    for i in 0..=TICKS {
        let v = max * i / TICKS;
        let x = margin_left + (v as f64 / max as f64) * plot_w;
        svg.push_str(&format!(
            "<line x1=\"{x:.1}\" y1=\"{MARGIN_TOP}\" x2=\"{x:.1}\" y2=\"{:.1}\" stroke=\"#dddddd\"/>\n",
            height - MARGIN_BOTTOM
        ));
        svg.push_str(&format!(
            "<text x=\"{x:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"15\">{}</text>\n",
            height - MARGIN_BOTTOM + 24.0,
            xml_escape(&spec.format.tick(v))
        ));
    }
    for (i, (label, value)) in rows.iter().enumerate() {
        let w = (*value as f64 / max as f64) * plot_w;
        let y = MARGIN_TOP + i as f64 * slot + (slot - bar_h) / 2.0;
        svg.push_str(&format!(
            "<rect x=\"{margin_left}\" y=\"{y:.1}\" width=\"{w:.1}\" height=\"{bar_h:.1}\" fill=\"{BAR_COLOR}\"/>\n"
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"14\">{}</text>\n",
            margin_left - 8.0,
            y + bar_h - 6.0,
            xml_escape(label)
        ));
    }
    svg.push_str(&axis_labels(
        &spec.x_label,
        &spec.y_label,
        WIDTH,
        height,
        margin_left,
    ));
    svg.push_str("</svg>\n");
    svg
}

fn header(width: f64, height: f64, title: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" \
         viewBox=\"0 0 {width:.0} {height:.0}\" font-family=\"sans-serif\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n\
         <text x=\"{:.1}\" y=\"34\" text-anchor=\"middle\" font-size=\"24\">{}</text>\n",
        width / 2.0,
        xml_escape(title)
    )
}

fn axis_labels(x_label: &str, y_label: &str, width: f64, height: f64, margin_left: f64) -> String {
    format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"17\">{}</text>\n\
         <text x=\"20\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"17\" \
         transform=\"rotate(-90 20 {:.1})\">{}</text>\n",
        margin_left + (width - margin_left) / 2.0,
        height - 14.0,
        xml_escape(x_label),
        height / 2.0,
        height / 2.0,
        xml_escape(y_label)
    )
}
