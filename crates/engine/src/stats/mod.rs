//! Outbreak statistics over the line list.
//!
//! Every analysis is a pure function of `(rows, diet headers, options)`
//! returning one result per diet column in header order:
//! - case-control: odds ratio with 95% CI
//! - cohort: attack rates and relative risk with 95% CI
//! - case-series: proportion of cases exposed
//!
//! The significance test per item is chosen from the 2x2 table: none for a
//! zero margin, Fisher's exact test when any expected count is below 5,
//! otherwise chi-square (optionally Yates-corrected).

mod case_control;
mod case_series;
mod cohort;
pub mod contingency;
pub mod distribution;
pub mod estimate;

use std::cmp::Ordering;
use std::str::FromStr;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

pub use case_control::{analyze_case_control, case_control_result, CaseControlResult};
pub use case_series::{analyze_case_series, CaseSeriesResult};
pub use cohort::{analyze_cohort, cohort_result, CohortResult};
pub use contingency::{Significance, TestMethod, TwoByTwo};
pub use estimate::{Estimate, RatioEstimate, RatioKind};

/// Toggles shared by the analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsOptions {
    /// Continuity correction for the chi-square test.
    pub yates_correction: bool,
    /// +0.5 on every cell of a table with a zero cell before estimating ratios.
    pub haldane_correction: bool,
}

impl Default for StatisticsOptions {
    fn default() -> Self {
        Self { yates_correction: false, haldane_correction: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StudyDesign {
    CaseControl,
    Cohort,
    CaseSeries,
}

impl FromStr for StudyDesign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "case-control" => Ok(StudyDesign::CaseControl),
            "cohort" => Ok(StudyDesign::Cohort),
            "case-series" => Ok(StudyDesign::CaseSeries),
            other => Err(format!("unknown study design: {other}")),
        }
    }
}

/// Common view of a per-item result.
pub trait AnalysisResult {
    fn item(&self) -> &str;
    fn p_value(&self) -> Option<f64>;
}

/// Results ordered by ascending p-value, untested items last. Ties keep
/// header order. The input is left untouched.
pub fn sort_by_p_value<R: AnalysisResult>(results: &[R]) -> Vec<&R> {
    let mut view: Vec<&R> = results.iter().collect();
    view.sort_by(|a, b| match (a.p_value(), b.p_value()) {
        (Some(x), Some(y)) => OrderedFloat(x).cmp(&OrderedFloat(y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    view
}

/// `part / whole` as a percentage with one decimal, `"N/A"` for an empty whole.
pub(crate) fn format_percent(part: u64, whole: u64) -> String {
    if whole == 0 {
        return "N/A".to_string();
    }
    format!("{:.1}%", part as f64 * 100.0 / whole as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_p_value_keeps_canonical_order() {
        let options = StatisticsOptions::default();
        let results = vec![
            case_control_result("a", &TwoByTwo::new(5, 5, 0, 0), &options),
            case_control_result("b", &TwoByTwo::new(30, 10, 10, 30), &options),
            case_control_result("c", &TwoByTwo::new(20, 20, 20, 20), &options),
            case_control_result("d", &TwoByTwo::new(42, 2, 24, 92), &options),
            case_control_result("e", &TwoByTwo::default(), &options),
        ];
        let sorted: Vec<&str> = sort_by_p_value(&results).iter().map(|r| r.item()).collect();
        assert_eq!(sorted, vec!["d", "b", "c", "a", "e"]);
        assert_eq!(results[0].item, "a");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(1, 3), "33.3%");
        assert_eq!(format_percent(0, 0), "N/A");
        assert_eq!(format_percent(7, 7), "100.0%");
    }

    #[test]
    fn test_study_design_parse() {
        assert_eq!("cohort".parse::<StudyDesign>(), Ok(StudyDesign::Cohort));
        assert!("cross-sectional".parse::<StudyDesign>().is_err());
    }
}
