use crate::error::Error;
use std::io::Cursor;

/// Exact destination organization string FTS uses for IOM flows.
pub const IOM_ORG: &str = "International Organization for Migration";

/// Binary agency classification of the destination organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agency {
    Iom,
    OtherAgencies,
}

impl Agency {
    pub fn classify(destination_org: &str) -> Agency {
        if destination_org == IOM_ORG {
            Agency::Iom
        } else {
            Agency::OtherAgencies
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Agency::Iom => "IOM",
            Agency::OtherAgencies => "Other agencies",
        }
    }
}

/// One reported funding flow: donor -> recipient agency, for a year/location.
/// Amounts are whole US dollars; totals reach ~10^9 so they stay in i64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRecord {
    pub year: i32,
    pub donor: String,
    pub organization: String,
    pub location: String,
    pub amount: i64,
    pub agency: Agency,
}

impl FlowRecord {
    pub fn new(year: i32, donor: String, organization: String, location: String, amount: i64) -> Self {
        let agency = Agency::classify(&organization);
        FlowRecord {
            year,
            donor,
            organization,
            location,
            amount,
            agency,
        }
    }
}

/// The combined dataset: archive plus current-year extract, concatenated with
/// no deduplication. A flow reported in both files double-counts; see the
/// limitations section of the README.
#[derive(Debug, Clone)]
pub struct FlowVec {
    pub flow_vec: Vec<FlowRecord>,
}

impl FlowVec {
    pub fn new(flow_vec: Vec<FlowRecord>) -> Self {
        FlowVec { flow_vec }
    }

    pub fn len(&self) -> usize {
        self.flow_vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flow_vec.is_empty()
    }

    /// Ungrouped total, used for the summary line and for cross-checking
    /// grouped sums.
    pub fn total_amount(&self) -> i64 {
        self.flow_vec.iter().map(|r| r.amount).sum()
    }

    /// Serialize the records to an in-memory CSV for the DataFrame reader.
    pub fn file_cursor(&self) -> Result<Cursor<Vec<u8>>, Error> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["year", "donor", "organization", "location", "amount", "agency"])?;
        for r in &self.flow_vec {
            wtr.write_record([
                r.year.to_string(),
                r.donor.clone(),
                r.organization.clone(),
                r.location.clone(),
                r.amount.to_string(),
                r.agency.as_str().to_string(),
            ])?;
        }
        let buf = wtr
            .into_inner()
            .map_err(|e| Error::Malformed(e.to_string()))?;
        Ok(Cursor::new(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agency_classify_exact_match_only() {
        assert_eq!(Agency::classify(IOM_ORG), Agency::Iom);
        assert_eq!(
            Agency::classify("International Organization for Migration "),
            Agency::OtherAgencies
        );
        assert_eq!(Agency::classify("UNHCR"), Agency::OtherAgencies);
        assert_eq!(Agency::classify(""), Agency::OtherAgencies);
    }

    #[test]
    fn test_record_derives_agency() {
        let r = FlowRecord::new(
            2020,
            "ECHO".into(),
            IOM_ORG.into(),
            "Yemen".into(),
            1_000,
        );
        assert_eq!(r.agency, Agency::Iom);
        let r = FlowRecord::new(2020, "ECHO".into(), "UNHCR".into(), "Yemen".into(), 1_000);
        assert_eq!(r.agency, Agency::OtherAgencies);
    }

    #[test]
    fn test_total_amount() {
        let flows = FlowVec::new(vec![
            FlowRecord::new(2019, "a".into(), "b".into(), "Yemen".into(), 100),
            FlowRecord::new(2020, "a".into(), "b".into(), "Chad".into(), 50),
        ]);
        assert_eq!(flows.total_amount(), 150);
    }

    #[test]
    fn test_file_cursor_round_trips_header_and_rows() {
        let flows = FlowVec::new(vec![FlowRecord::new(
            2019,
            "ECHO".into(),
            IOM_ORG.into(),
            "Yemen".into(),
            100,
        )]);
        let cursor = flows.file_cursor().unwrap();
        let text = String::from_utf8(cursor.into_inner()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "year,donor,organization,location,amount,agency"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2019,ECHO,International Organization for Migration,Yemen,100,IOM"
        );
        assert_eq!(lines.next(), None);
    }
}
