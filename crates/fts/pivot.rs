use std::collections::{BTreeMap, BTreeSet};

/// Complete year x country matrix of funding sums. Grouped aggregation never
/// emits a group with zero matching records, so combinations a country was not
/// funded in must be filled with 0 here for the heatmap to be well-defined in
/// every cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseMatrix {
    /// ascending
    pub years: Vec<i32>,
    /// lexical order
    pub countries: Vec<String>,
    /// values[country_idx][year_idx]
    pub values: Vec<Vec<i64>>,
}

impl DenseMatrix {
    /// Build from per-(year, country) sums. Axes span every year and every
    /// country observed anywhere in the rows; duplicate keys accumulate.
    pub fn from_rows(rows: &[(i32, String, i64)]) -> DenseMatrix {
        let years: BTreeSet<i32> = rows.iter().map(|r| r.0).collect();
        let countries: BTreeSet<&str> = rows.iter().map(|r| r.1.as_str()).collect();

        let mut cells: BTreeMap<(i32, &str), i64> = BTreeMap::new();
        for (year, country, amount) in rows {
            *cells.entry((*year, country.as_str())).or_insert(0) += amount;
        }

        let years: Vec<i32> = years.into_iter().collect();
        let countries: Vec<String> = countries.iter().map(|c| c.to_string()).collect();
        let values = countries
            .iter()
            .map(|country| {
                years
                    .iter()
                    .map(|year| cells.get(&(*year, country.as_str())).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        DenseMatrix {
            years,
            countries,
            values,
        }
    }

    pub fn get(&self, country: &str, year: i32) -> Option<i64> {
        let ci = self.countries.iter().position(|c| c == country)?;
        let yi = self.years.iter().position(|y| *y == year)?;
        Some(self.values[ci][yi])
    }

    pub fn max_value(&self) -> i64 {
        self.values
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
    }

    pub fn cell_count(&self) -> usize {
        self.values.iter().map(|row| row.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<(i32, String, i64)> {
        vec![
            (2019, "Yemen".to_string(), 100),
            (2019, "Chad".to_string(), 50),
            (2020, "Yemen".to_string(), 75),
        ]
    }

    #[test]
    fn test_zero_fill_completeness() {
        let m = DenseMatrix::from_rows(&sample());
        assert_eq!(m.years, vec![2019, 2020]);
        assert_eq!(m.countries, vec!["Chad".to_string(), "Yemen".to_string()]);
        assert_eq!(m.cell_count(), m.years.len() * m.countries.len());
        // the combination absent from the input is present and zero
        assert_eq!(m.get("Chad", 2020), Some(0));
        assert_eq!(m.get("Yemen", 2019), Some(100));
        assert_eq!(m.get("Chad", 2019), Some(50));
        assert_eq!(m.get("Yemen", 2020), Some(75));
    }

    #[test]
    fn test_sum_conservation() {
        let m = DenseMatrix::from_rows(&sample());
        let total: i64 = m.values.iter().flatten().sum();
        assert_eq!(total, 225);
    }

    #[test]
    fn test_duplicate_keys_accumulate() {
        let rows = vec![
            (2019, "Yemen".to_string(), 100),
            (2019, "Yemen".to_string(), 25),
        ];
        let m = DenseMatrix::from_rows(&rows);
        assert_eq!(m.get("Yemen", 2019), Some(125));
    }

    #[test]
    fn test_empty_rows() {
        let m = DenseMatrix::from_rows(&[]);
        assert!(m.years.is_empty());
        assert!(m.countries.is_empty());
        assert_eq!(m.cell_count(), 0);
        assert_eq!(m.max_value(), 0);
    }

    #[test]
    fn test_max_value() {
        assert_eq!(DenseMatrix::from_rows(&sample()).max_value(), 100);
    }
}
