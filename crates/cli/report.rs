use fts::record::FlowVec;
use polars::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;

/// Base DataFrame for every report view, read from the in-memory CSV the
/// domain crate serializes.
pub fn base_frame(flows: &FlowVec) -> Result<DataFrame, Box<dyn Error>> {
    let file = flows.file_cursor()?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(file)
        .finish()?;
    Ok(df)
}

/// Total funding per year, chronological.
pub fn sum_by_year(df: &DataFrame) -> PolarsResult<DataFrame> {
    df.clone()
        .lazy()
        .group_by([col("year")])
        .agg([col("amount").sum().alias("funding")])
        .sort(["year"], SortMultipleOptions::default())
        .collect()
}

/// Total funding per `key` (location or donor), optionally restricted to one
/// year. Ascending by funding with the key as explicit tie-break, so output
/// order is fully determined. A year matching no records yields an empty
/// frame, not an error.
pub fn sum_by(df: &DataFrame, key: &str, year: Option<i32>) -> PolarsResult<DataFrame> {
    let mut q = df.clone().lazy();
    if let Some(y) = year {
        q = q.filter(col("year").eq(lit(y)));
    }
    q.group_by([col(key)])
        .agg([col("amount").sum().alias("funding")])
        .sort(["funding", key], SortMultipleOptions::default())
        .collect()
}

/// Distinct count of `field` (donor or organization) per year, chronological.
pub fn distinct_by_year(df: &DataFrame, field: &str) -> PolarsResult<DataFrame> {
    df.clone()
        .lazy()
        .group_by([col("year")])
        .agg([col(field).n_unique().alias("count")])
        .sort(["year"], SortMultipleOptions::default())
        .collect()
}

/// Per-(year, country) sums feeding the dense heatmap pivot.
pub fn year_country_sums(df: &DataFrame) -> PolarsResult<DataFrame> {
    df.clone()
        .lazy()
        .group_by([col("year"), col("location")])
        .agg([col("amount").sum().alias("funding")])
        .sort(["year", "location"], SortMultipleOptions::default())
        .collect()
}

/// Ungrouped total over the whole frame.
pub fn total(df: &DataFrame) -> PolarsResult<i64> {
    let out = df
        .clone()
        .lazy()
        .select([col("amount").sum()])
        .collect()?;
    Ok(out.column("amount")?.i64()?.get(0).unwrap_or(0))
}

fn deserialize_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
    if let serde_json::Value::String(s) = value {
        Ok(s)
    } else if let serde_json::Value::Number(s) = value {
        Ok(s.to_string())
    } else {
        Err(serde::de::Error::custom("Expected string|number"))
    }
}

/// One aggregate row as the renderer sees it: group key label plus metric.
#[derive(Debug, Serialize, Deserialize)]
pub struct Row {
    #[serde(deserialize_with = "deserialize_string")]
    pub key: String,
    pub value: i64,
}

/// Extract (key, value) rows from an aggregate frame through the JSON writer.
pub fn rows(df: &DataFrame, key: &str, value: &str) -> Result<Vec<Row>, Box<dyn Error>> {
    let mut d = df
        .clone()
        .lazy()
        .select([col(key).alias("key"), col(value).alias("value")])
        .collect()?;
    let mut j = Vec::<u8>::new();
    JsonWriter::new(&mut j)
        .with_json_format(JsonFormat::Json)
        .finish(&mut d)?;
    Ok(serde_json::from_slice::<Vec<Row>>(&j)?)
}

#[derive(Debug, Serialize, Deserialize)]
struct YearCountryRow {
    year: i32,
    location: String,
    funding: i64,
}

/// (year, country, sum) tuples for the dense pivot.
pub fn year_country_rows(df: &DataFrame) -> Result<Vec<(i32, String, i64)>, Box<dyn Error>> {
    let mut d = year_country_sums(df)?;
    let mut j = Vec::<u8>::new();
    JsonWriter::new(&mut j)
        .with_json_format(JsonFormat::Json)
        .finish(&mut d)?;
    let parsed = serde_json::from_slice::<Vec<YearCountryRow>>(&j)?;
    Ok(parsed
        .into_iter()
        .map(|r| (r.year, r.location, r.funding))
        .collect())
}
