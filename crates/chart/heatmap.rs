use crate::{format_millions, xml_escape, Error};
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Color stops from the report style: white through blues, saturating at $20m.
const STOPS: [(i64, [u8; 3]); 5] = [
    (0, [0xff, 0xff, 0xff]),
    (500_000, [0xef, 0xf3, 0xff]),
    (2_500_000, [0xbd, 0xd7, 0xe7]),
    (5_000_000, [0x6b, 0xae, 0xd6]),
    (20_000_000, [0x21, 0x71, 0xb5]),
];

const MARGIN_LEFT: f64 = 330.0;
const MARGIN_TOP: f64 = 60.0;
const CELL_H: f64 = 24.0;
const PLOT_W: f64 = 1050.0;

/// Piecewise-linear interpolation over the stops, clamped above the last one.
fn color(v: i64) -> String {
    let mut rgb = STOPS[STOPS.len() - 1].1;
    for window in STOPS.windows(2) {
        let (lo, lo_rgb) = window[0];
        let (hi, hi_rgb) = window[1];
        if v <= hi {
            let t = (v - lo) as f64 / (hi - lo) as f64;
            rgb = [0, 1, 2].map(|i| {
                (lo_rgb[i] as f64 + t * (hi_rgb[i] as f64 - lo_rgb[i] as f64)).round() as u8
            });
            break;
        }
    }
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// Render the dense year x country matrix as a heatmap. Every cell must be
/// present (the caller zero-fills absent combinations), so intensity is
/// defined everywhere.
pub fn render<P: AsRef<Path>>(
    title: &str,
    years: &[i32],
    countries: &[String],
    values: &[Vec<i64>],
    path: P,
) -> Result<(), Error> {
    if years.is_empty() || countries.is_empty() {
        return Err(Error::EmptyInput);
    }

    let cell_w = PLOT_W / years.len() as f64;
    let height = MARGIN_TOP + countries.len() as f64 * CELL_H + 60.0;
    let width = MARGIN_LEFT + PLOT_W + 170.0;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" \
         viewBox=\"0 0 {width:.0} {height:.0}\" font-family=\"sans-serif\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n\
         <text x=\"{:.1}\" y=\"34\" text-anchor=\"middle\" font-size=\"24\">{}</text>\n",
        width / 2.0,
        xml_escape(title)
    );

    for (ci, country) in countries.iter().enumerate() {
        let y = MARGIN_TOP + ci as f64 * CELL_H;
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"14\">{}</text>\n",
            MARGIN_LEFT - 8.0,
            y + CELL_H - 7.0,
            xml_escape(country)
        ));
        for (yi, _) in years.iter().enumerate() {
            let x = MARGIN_LEFT + yi as f64 * cell_w;
            svg.push_str(&format!(
                "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{cell_w:.1}\" height=\"{CELL_H:.1}\" \
                 fill=\"{}\" stroke=\"#cccccc\" stroke-width=\"0.5\"/>\n",
                color(values[ci][yi])
            ));
        }
    }
    for (yi, year) in years.iter().enumerate() {
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"14\">{year}</text>\n",
            MARGIN_LEFT + yi as f64 * cell_w + cell_w / 2.0,
            MARGIN_TOP + countries.len() as f64 * CELL_H + 24.0,
        ));
    }
    // legend: one swatch per stop
    for (i, (v, _)) in STOPS.iter().enumerate() {
        let x = MARGIN_LEFT + PLOT_W + 30.0;
        let y = MARGIN_TOP + i as f64 * 30.0;
        svg.push_str(&format!(
            "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"22\" height=\"22\" fill=\"{}\" \
             stroke=\"#cccccc\" stroke-width=\"0.5\"/>\n\
             <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"14\">{}</text>\n",
            color(*v),
            x + 30.0,
            y + 16.0,
            xml_escape(&format_millions(*v))
        ));
    }
    svg.push_str("</svg>\n");

    let mut file = File::create(&path)?;
    file.write_all(svg.as_bytes())?;
    info!("heatmap written: {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_at_stops() {
        assert_eq!(color(0), "#ffffff");
        assert_eq!(color(500_000), "#eff3ff");
        assert_eq!(color(5_000_000), "#6baed6");
        assert_eq!(color(20_000_000), "#2171b5");
        // clamped above the last stop
        assert_eq!(color(113_593_430), "#2171b5");
    }

    #[test]
    fn test_color_interpolates_between_stops() {
        let mid = color(250_000);
        assert_ne!(mid, "#ffffff");
        assert_ne!(mid, "#eff3ff");
    }

    #[test]
    fn test_empty_axes_are_recoverable_error() {
        let err = render("t", &[], &[], &[], std::env::temp_dir().join("hm.svg")).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn test_render_one_cell_per_combination() {
        let years = vec![2019, 2020];
        let countries = vec!["Chad".to_string(), "Yemen".to_string()];
        let values = vec![vec![50, 0], vec![100, 75]];
        let path = std::env::temp_dir().join("fts-heatmap.svg");
        render("CCCM funding by year and country", &years, &countries, &values, &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        // 4 matrix cells + 5 legend swatches + background
        assert_eq!(svg.matches("<rect").count(), 4 + 5 + 1);
        assert!(svg.contains(">2019<"));
        assert!(svg.contains(">Yemen<"));
        std::fs::remove_file(&path).unwrap();
    }
}
