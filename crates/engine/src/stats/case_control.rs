//! Case-control analysis: odds ratio per exposure item.

use serde::Serialize;

use super::contingency::{significance, TwoByTwo};
use super::estimate::{check_p_value, ratio_estimate, Estimate, RatioKind};
use super::{AnalysisResult, StatisticsOptions};
use crate::row::Row;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseControlResult {
    pub item: String,
    pub case_exposed: u64,
    pub case_unexposed: u64,
    pub case_total: u64,
    pub control_exposed: u64,
    pub control_unexposed: u64,
    pub control_total: u64,
    pub p_value: Option<f64>,
    #[serde(rename = "adj_chi")]
    pub adj_chi: Option<f64>,
    pub odds_ratio: Estimate,
    #[serde(rename = "ci_lower")]
    pub ci_lower: Estimate,
    #[serde(rename = "ci_upper")]
    pub ci_upper: Estimate,
    pub has_correction: bool,
}

impl AnalysisResult for CaseControlResult {
    fn item(&self) -> &str {
        &self.item
    }

    fn p_value(&self) -> Option<f64> {
        self.p_value
    }
}

/// One result per diet column, in header order.
pub fn analyze_case_control(
    rows: &[Row],
    diet_headers: &[String],
    options: &StatisticsOptions,
) -> Vec<CaseControlResult> {
    diet_headers
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let table = TwoByTwo::from_rows(rows, i);
            case_control_result(label, &table, options)
        })
        .collect()
}

pub fn case_control_result(
    item: &str,
    table: &TwoByTwo,
    options: &StatisticsOptions,
) -> CaseControlResult {
    let test = significance(table, options.yates_correction);
    check_p_value(test.p_value);
    let estimate = ratio_estimate(table, RatioKind::OddsRatio, options.haldane_correction);

    CaseControlResult {
        item: item.to_string(),
        case_exposed: table.a,
        case_unexposed: table.c,
        case_total: table.case_total(),
        control_exposed: table.b,
        control_unexposed: table.d,
        control_total: table.non_case_total(),
        p_value: test.p_value,
        adj_chi: test.chi_square,
        odds_ratio: estimate.ratio,
        ci_lower: estimate.ci_lower,
        ci_upper: estimate.ci_upper,
        has_correction: estimate.has_correction,
    }
}
