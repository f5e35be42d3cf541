use crate::error::Error;
use crate::record::{FlowRecord, FlowVec};
use log::{debug, info};
use serde::Deserialize;
use std::fs::File;

/// Fixed column schema shared by both FTS extracts. Aggregation downstream
/// keys on these fields, so a source missing any of them is rejected outright.
pub const SCHEMA: [&str; 5] = [
    "Destination Usage year",
    "Source Organization",
    "Destination Organization",
    "Destination Location",
    "Amount (USD)",
];

#[derive(Debug, Deserialize)]
struct RawFlow {
    #[serde(rename = "Destination Usage year")]
    year: i32,
    #[serde(rename = "Source Organization")]
    donor: String,
    #[serde(rename = "Destination Organization")]
    organization: String,
    #[serde(rename = "Destination Location")]
    location: String,
    #[serde(rename = "Amount (USD)")]
    amount: f64,
}

/// Read one extract. Fails fast on a missing file or a header set that does
/// not carry the full schema; never proceeds with misaligned columns.
pub fn read_source(path: &str) -> Result<Vec<FlowRecord>, Error> {
    let file = File::open(path).map_err(|e| Error::SourceUnavailable {
        path: path.to_string(),
        source: e,
    })?;
    let mut rdr = csv::Reader::from_reader(file);

    let headers = rdr.headers()?.clone();
    for column in SCHEMA {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::SchemaMismatch {
                path: path.to_string(),
                column: column.to_string(),
            });
        }
    }

    let mut records = Vec::new();
    for row in rdr.deserialize::<RawFlow>() {
        let raw = row?;
        if raw.amount < 0.0 {
            return Err(Error::Malformed(format!(
                "{}: negative amount {} for {} / {}",
                path, raw.amount, raw.donor, raw.location
            )));
        }
        records.push(FlowRecord::new(
            raw.year,
            raw.donor,
            raw.organization,
            raw.location,
            raw.amount.round() as i64,
        ));
    }
    debug!("{}: {} records", path, records.len());
    Ok(records)
}

/// Combine the current-year extract and the multi-year archive, extract first
/// (row order is unobservable downstream; aggregation is order-independent).
/// Every input record appears exactly once in the output: no filtering and no
/// deduplication across the two files, so a flow reported in both sources
/// double-counts in every sum.
pub fn load(archive: &str, extract: &str) -> Result<FlowVec, Error> {
    let mut records = read_source(extract)?;
    records.extend(read_source(archive)?);
    info!("loaded {} flow records from {} and {}", records.len(), extract, archive);
    Ok(FlowVec::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Agency;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_tmp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("fts-loader-{}-{}", std::process::id(), name));
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    const HEADER: &str = "Destination Usage year,Source Organization,Destination Organization,Destination Location,Amount (USD)\n";

    #[test]
    fn test_read_source_missing_file() {
        let err = read_source("/nonexistent/fts.csv").unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
    }

    #[test]
    fn test_read_source_schema_mismatch() {
        let path = write_tmp(
            "badschema.csv",
            "Year,Donor,Org,Country,Amount\n2019,ECHO,UNHCR,Yemen,100\n",
        );
        let err = read_source(path.to_str().unwrap()).unwrap_err();
        match err {
            Error::SchemaMismatch { column, .. } => {
                assert_eq!(column, "Destination Usage year")
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_read_source_parses_and_classifies() {
        let content = format!(
            "{HEADER}2019,ECHO,International Organization for Migration,Yemen,100\n\
             2019,USA,UNHCR,Chad,50\n"
        );
        let path = write_tmp("ok.csv", &content);
        let records = read_source(path.to_str().unwrap()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].agency, Agency::Iom);
        assert_eq!(records[0].amount, 100);
        assert_eq!(records[1].agency, Agency::OtherAgencies);
        assert_eq!(records[1].location, "Chad");
    }

    #[test]
    fn test_load_concatenates_without_dedup() {
        // The same flow sits in both files; current behavior is to keep both
        // copies, doubling its contribution to every sum.
        let shared = "2019,ECHO,UNHCR,Yemen,100\n";
        let archive = write_tmp("archive.csv", &format!("{HEADER}{shared}"));
        let extract = write_tmp(
            "extract.csv",
            &format!("{HEADER}{shared}2020,USA,UNHCR,Chad,50\n"),
        );
        let flows = load(archive.to_str().unwrap(), extract.to_str().unwrap()).unwrap();
        assert_eq!(flows.len(), 3);
        assert_eq!(flows.total_amount(), 250);
    }

    #[test]
    fn test_load_extract_rows_come_first() {
        let archive = write_tmp("order-a.csv", &format!("{HEADER}2005,ECHO,UNHCR,Sudan,10\n"));
        let extract = write_tmp("order-e.csv", &format!("{HEADER}2020,USA,UNHCR,Chad,50\n"));
        let flows = load(archive.to_str().unwrap(), extract.to_str().unwrap()).unwrap();
        assert_eq!(flows.flow_vec[0].year, 2020);
        assert_eq!(flows.flow_vec[1].year, 2005);
    }

    #[test]
    fn test_read_source_rejects_negative_amount() {
        let path = write_tmp(
            "negative.csv",
            &format!("{HEADER}2019,ECHO,UNHCR,Yemen,-5\n"),
        );
        let err = read_source(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }
}
