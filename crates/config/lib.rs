use serde::Deserialize;
use std::error::Error;
use std::fs::File;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// multi-year archive extract, e.g. FTS2005-2019.csv
    pub archive: String,
    /// current-year extract, e.g. FTS2020.csv
    pub extract: String,
    /// world polygons, GeoJSON with a NAME property per feature
    pub geometry: String,
    pub output_dir: String,
    #[serde(default = "Alias::defaults")]
    pub aliases: Vec<Alias>,
}

/// Geometry-side country name rewritten to the name FTS reports use.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Alias {
    pub from: String,
    pub to: String,
}

impl Alias {
    /// The one mismatch known from the source data: the GeoJSON spells the DRC
    /// differently than FTS does. Without the rewrite the country silently
    /// drops out of every map.
    pub fn defaults() -> Vec<Alias> {
        vec![Alias {
            from: "Democratic Republic of the Congo".to_string(),
            to: "Congo, The Democratic Republic of the".to_string(),
        }]
    }

    pub fn apply(aliases: &[Alias], name: &str) -> String {
        for alias in aliases {
            if alias.from == name {
                return alias.to.clone();
            }
        }
        name.to_string()
    }
}

impl Config {
    pub fn new(filename: &str) -> Result<Config, Box<dyn Error>> {
        let reader = File::open(filename)?;
        let config: Config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }
}
