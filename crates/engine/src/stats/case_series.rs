//! Case-series analysis: share of cases exposed to each item.
//!
//! Only case rows (`isPatient == "1"`) take part; there is no comparison
//! group, so no test or ratio is computed.

use serde::Serialize;

use super::contingency::{case_status, exposure};
use super::{format_percent, AnalysisResult};
use crate::row::Row;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSeriesResult {
    pub item: String,
    pub exposed_cases: u64,
    pub unexposed_cases: u64,
    /// Cases with a recorded "0" or "1" for the item.
    pub total_cases: u64,
    pub proportion: String,
}

impl AnalysisResult for CaseSeriesResult {
    fn item(&self) -> &str {
        &self.item
    }

    fn p_value(&self) -> Option<f64> {
        None
    }
}

pub fn analyze_case_series(rows: &[Row], diet_headers: &[String]) -> Vec<CaseSeriesResult> {
    diet_headers
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let (mut exposed, mut unexposed) = (0u64, 0u64);
            for row in rows.iter().filter(|r| case_status(r) == Some(true)) {
                match exposure(row, i) {
                    Some(true) => exposed += 1,
                    Some(false) => unexposed += 1,
                    None => {}
                }
            }
            let total = exposed + unexposed;
            CaseSeriesResult {
                item: label.clone(),
                exposed_cases: exposed,
                unexposed_cases: unexposed,
                total_cases: total,
                proportion: format_percent(exposed, total),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Headers;

    fn row(patient: &str, diet: [&str; 2]) -> Row {
        let mut row = Row::empty(&Headers::blank(1, 1, 2));
        row.is_patient = patient.to_string();
        row.diet_info = diet.iter().map(|s| s.to_string()).collect();
        row
    }

    #[test]
    fn test_cases_only() {
        let rows = vec![
            row("1", ["1", "0"]),
            row("1", ["1", ""]),
            row("1", ["0", "0"]),
            row("0", ["1", "1"]),
            row("", ["1", "1"]),
        ];
        let results = analyze_case_series(&rows, &["rice".into(), "soup".into()]);
        assert_eq!(results[0].exposed_cases, 2);
        assert_eq!(results[0].total_cases, 3);
        assert_eq!(results[0].proportion, "66.7%");
        assert_eq!(results[1].exposed_cases, 0);
        assert_eq!(results[1].total_cases, 2);
        assert_eq!(results[1].proportion, "0.0%");
    }

    #[test]
    fn test_no_cases() {
        let rows = vec![row("0", ["1", "1"])];
        let results = analyze_case_series(&rows, &["rice".into(), "soup".into()]);
        assert_eq!(results[0].proportion, "N/A");
        assert_eq!(results[0].total_cases, 0);
    }
}
