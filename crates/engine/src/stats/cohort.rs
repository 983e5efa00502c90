//! Cohort analysis: attack rates and relative risk per exposure item.

use serde::Serialize;

use super::contingency::{significance, TwoByTwo};
use super::estimate::{check_p_value, ratio_estimate, Estimate, RatioKind};
use super::{format_percent, AnalysisResult, StatisticsOptions};
use crate::row::Row;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortResult {
    pub item: String,
    pub exposed_cases: u64,
    pub exposed_non_cases: u64,
    pub exposed_total: u64,
    /// Attack rate among the exposed, e.g. `"95.5%"`.
    pub exposed_incidence: String,
    pub unexposed_cases: u64,
    pub unexposed_non_cases: u64,
    pub unexposed_total: u64,
    pub unexposed_incidence: String,
    pub p_value: Option<f64>,
    #[serde(rename = "adj_chi")]
    pub adj_chi: Option<f64>,
    pub relative_risk: Estimate,
    #[serde(rename = "ci_lower")]
    pub ci_lower: Estimate,
    #[serde(rename = "ci_upper")]
    pub ci_upper: Estimate,
    pub has_correction: bool,
}

impl AnalysisResult for CohortResult {
    fn item(&self) -> &str {
        &self.item
    }

    fn p_value(&self) -> Option<f64> {
        self.p_value
    }
}

pub fn analyze_cohort(
    rows: &[Row],
    diet_headers: &[String],
    options: &StatisticsOptions,
) -> Vec<CohortResult> {
    diet_headers
        .iter()
        .enumerate()
        .map(|(i, label)| cohort_result(label, &TwoByTwo::from_rows(rows, i), options))
        .collect()
}

pub fn cohort_result(item: &str, table: &TwoByTwo, options: &StatisticsOptions) -> CohortResult {
    let test = significance(table, options.yates_correction);
    check_p_value(test.p_value);
    let estimate = ratio_estimate(table, RatioKind::RelativeRisk, options.haldane_correction);

    CohortResult {
        item: item.to_string(),
        exposed_cases: table.a,
        exposed_non_cases: table.b,
        exposed_total: table.exposed_total(),
        exposed_incidence: format_percent(table.a, table.exposed_total()),
        unexposed_cases: table.c,
        unexposed_non_cases: table.d,
        unexposed_total: table.unexposed_total(),
        unexposed_incidence: format_percent(table.c, table.unexposed_total()),
        p_value: test.p_value,
        adj_chi: test.chi_square,
        relative_risk: estimate.ratio,
        ci_lower: estimate.ci_lower,
        ci_upper: estimate.ci_upper,
        has_correction: estimate.has_correction,
    }
}
