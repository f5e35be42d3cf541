use crate::{xml_escape, Error, BAR_COLOR};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const WIDTH: f64 = 1600.0;
const MAP_TOP: f64 = 60.0;
const MAP_HEIGHT: f64 = 800.0;
const BASE_COLOR: &str = "#A6A6A6";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: Properties,
    geometry: Option<Geom>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    #[serde(rename = "NAME")]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum Geom {
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

#[derive(Debug, Clone)]
struct Country {
    name: String,
    /// outer rings and holes alike; rendered with the evenodd fill rule
    rings: Vec<Vec<(f64, f64)>>,
}

/// World polygons keyed by country name, loaded from a GeoJSON file with a
/// NAME property per feature.
#[derive(Debug, Clone)]
pub struct World {
    countries: Vec<Country>,
}

fn ring_points(ring: &[Vec<f64>]) -> Vec<(f64, f64)> {
    ring.iter()
        .filter(|pt| pt.len() >= 2)
        .map(|pt| (pt[0], pt[1]))
        .collect()
}

fn aliased<'a>(name: &'a str, aliases: &'a [(String, String)]) -> &'a str {
    for (from, to) in aliases {
        if from == name {
            return to;
        }
    }
    name
}

impl World {
    pub fn load(path: &str) -> Result<World, Error> {
        let file = File::open(path)?;
        let collection: FeatureCollection = serde_json::from_reader(file)?;
        let mut countries = Vec::new();
        for feature in collection.features {
            let Some(geom) = feature.geometry else {
                debug!("feature without geometry: {}", feature.properties.name);
                continue;
            };
            let rings: Vec<Vec<(f64, f64)>> = match geom {
                Geom::Polygon(rings) => rings.iter().map(|r| ring_points(r)).collect(),
                Geom::MultiPolygon(polys) => polys
                    .iter()
                    .flat_map(|rings| rings.iter().map(|r| ring_points(r)))
                    .collect(),
            };
            countries.push(Country {
                name: feature.properties.name,
                rings,
            });
        }
        if countries.is_empty() {
            return Err(Error::Geometry(format!("{path}: no polygon features")));
        }
        info!("geometry loaded: {} countries from {}", countries.len(), path);
        Ok(World { countries })
    }

    /// Number of distinct geometry countries whose (aliased) name appears in
    /// the funded set. Countries the join misses are excluded, not an error.
    pub fn matched(&self, funded: &HashSet<String>, aliases: &[(String, String)]) -> usize {
        let names: HashSet<&str> = self
            .countries
            .iter()
            .map(|c| aliased(&c.name, aliases))
            .filter(|n| funded.contains(*n))
            .collect();
        names.len()
    }

    /// Choropleth: grey basemap, funded countries in the series color.
    pub fn render<P: AsRef<Path>>(
        &self,
        funded: &HashSet<String>,
        aliases: &[(String, String)],
        title: &str,
        path: P,
    ) -> Result<(), Error> {
        if funded.is_empty() {
            return Err(Error::EmptyInput);
        }

        let geometry_names: HashSet<&str> = self
            .countries
            .iter()
            .map(|c| aliased(&c.name, aliases))
            .collect();
        for name in funded {
            if !geometry_names.contains(name.as_str()) {
                debug!("no geometry for funded country: {name}");
            }
        }

        let height = MAP_TOP + MAP_HEIGHT;
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH:.0}\" height=\"{height:.0}\" \
             viewBox=\"0 0 {WIDTH:.0} {height:.0}\" font-family=\"sans-serif\">\n\
             <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n\
             <text x=\"{:.1}\" y=\"38\" text-anchor=\"middle\" font-size=\"24\">{}</text>\n",
            WIDTH / 2.0,
            xml_escape(title)
        );
        for country in &self.countries {
            let fill = if funded.contains(aliased(&country.name, aliases)) {
                BAR_COLOR
            } else {
                BASE_COLOR
            };
            let mut d = String::new();
            for ring in &country.rings {
                for (i, (lon, lat)) in ring.iter().enumerate() {
                    let (x, y) = project(*lon, *lat);
                    if i == 0 {
                        d.push_str(&format!("M{x:.1} {y:.1}"));
                    } else {
                        d.push_str(&format!("L{x:.1} {y:.1}"));
                    }
                }
                d.push('Z');
            }
            svg.push_str(&format!(
                "<path d=\"{d}\" fill=\"{fill}\" fill-rule=\"evenodd\" stroke=\"white\" \
                 stroke-opacity=\"0.3\" stroke-width=\"0.5\"/>\n"
            ));
        }
        svg.push_str("</svg>\n");

        let mut file = File::create(&path)?;
        file.write_all(svg.as_bytes())?;
        info!("map written: {}", path.as_ref().display());
        Ok(())
    }
}

/// Equirectangular projection onto the map band below the title.
fn project(lon: f64, lat: f64) -> (f64, f64) {
    let x = (lon + 180.0) / 360.0 * WIDTH;
    let y = MAP_TOP + (90.0 - lat) / 180.0 * MAP_HEIGHT;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"NAME": "Yemen"},
                "geometry": {"type": "Polygon", "coordinates": [[[44.0, 15.0], [45.0, 15.0], [45.0, 16.0], [44.0, 15.0]]]}
            },
            {
                "type": "Feature",
                "properties": {"NAME": "Democratic Republic of the Congo"},
                "geometry": {"type": "MultiPolygon", "coordinates": [[[[22.0, -3.0], [24.0, -3.0], [24.0, 1.0], [22.0, -3.0]]]]}
            },
            {
                "type": "Feature",
                "properties": {"NAME": "Chad"},
                "geometry": {"type": "Polygon", "coordinates": [[[15.0, 12.0], [18.0, 12.0], [18.0, 15.0], [15.0, 12.0]]]}
            }
        ]
    }"#;

    fn world() -> World {
        let path = std::env::temp_dir().join(format!("fts-map-{}.geojson", std::process::id()));
        std::fs::write(&path, GEOJSON).unwrap();
        World::load(path.to_str().unwrap()).unwrap()
    }

    fn drc_alias() -> Vec<(String, String)> {
        vec![(
            "Democratic Republic of the Congo".to_string(),
            "Congo, The Democratic Republic of the".to_string(),
        )]
    }

    #[test]
    fn test_load_parses_polygon_and_multipolygon() {
        let w = world();
        assert_eq!(w.countries.len(), 3);
        assert_eq!(w.countries[1].rings.len(), 1);
    }

    #[test]
    fn test_matched_applies_alias() {
        let w = world();
        let funded: HashSet<String> = [
            "Yemen".to_string(),
            "Congo, The Democratic Republic of the".to_string(),
        ]
        .into();
        // without the alias the DRC silently drops out of the join
        assert_eq!(w.matched(&funded, &[]), 1);
        assert_eq!(w.matched(&funded, &drc_alias()), 2);
    }

    #[test]
    fn test_unmatched_funded_country_is_not_an_error() {
        let w = world();
        let funded: HashSet<String> = ["Atlantis".to_string(), "Chad".to_string()].into();
        assert_eq!(w.matched(&funded, &[]), 1);
        let path = std::env::temp_dir().join("fts-map-out.svg");
        w.render(&funded, &[], "funded countries", &path).unwrap();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_render_empty_funded_set() {
        let w = world();
        let err = w
            .render(&HashSet::new(), &[], "t", std::env::temp_dir().join("x.svg"))
            .unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn test_render_colors_funded_countries() {
        let w = world();
        let funded: HashSet<String> = ["Yemen".to_string()].into();
        let path = std::env::temp_dir().join("fts-map-color.svg");
        w.render(&funded, &[], "1 country", &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert_eq!(svg.matches(BAR_COLOR).count(), 1);
        assert_eq!(svg.matches(BASE_COLOR).count(), 2);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_project_corners() {
        assert_eq!(project(-180.0, 90.0), (0.0, MAP_TOP));
        assert_eq!(project(180.0, -90.0), (WIDTH, MAP_TOP + MAP_HEIGHT));
    }
}
