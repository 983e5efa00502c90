//! Ratio estimates (odds ratio, relative risk) with 95% confidence intervals.

use std::fmt;

use serde::{Serialize, Serializer};

use super::contingency::TwoByTwo;
use super::distribution::z_critical;

/// A point estimate or interval bound as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Estimate {
    Value(f64),
    /// Zero denominator with a positive numerator.
    Infinite,
    /// Undefined: empty comparison group, or 0/0.
    NotAvailable,
}

impl Estimate {
    pub fn value(&self) -> Option<f64> {
        match self {
            Estimate::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Estimate::Value(v) if v.is_finite())
    }
}

/// Three decimals, `"Inf"` or `"N/A"`.
impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimate::Value(v) => write!(f, "{v:.3}"),
            Estimate::Infinite => f.write_str("Inf"),
            Estimate::NotAvailable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Estimate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Which ratio to estimate from a [`TwoByTwo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioKind {
    /// `(a·d) / (b·c)`; comparison groups are cases and non-cases.
    OddsRatio,
    /// `[a/(a+b)] / [c/(c+d)]`; comparison groups are exposed and unexposed.
    RelativeRisk,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioEstimate {
    pub ratio: Estimate,
    pub ci_lower: Estimate,
    pub ci_upper: Estimate,
    /// +0.5 was added to every cell.
    pub has_correction: bool,
}

impl RatioEstimate {
    fn uniform(estimate: Estimate, has_correction: bool) -> Self {
        Self { ratio: estimate, ci_lower: estimate, ci_upper: estimate, has_correction }
    }
}

/// Estimate a ratio and its 95% CI on the log scale.
///
/// When any cell is zero and `haldane` is set, 0.5 is added to all four
/// cells first. Without the correction a zero cell can leave the ratio
/// infinite (reported as [`Estimate::Infinite`] for the ratio and both bounds)
/// or zero (interval not available).
pub fn ratio_estimate(table: &TwoByTwo, kind: RatioKind, haldane: bool) -> RatioEstimate {
    let (group1, group2) = match kind {
        RatioKind::OddsRatio => (table.case_total(), table.non_case_total()),
        RatioKind::RelativeRisk => (table.exposed_total(), table.unexposed_total()),
    };
    if group1 == 0 || group2 == 0 {
        return RatioEstimate::uniform(Estimate::NotAvailable, false);
    }

    let has_correction = haldane && table.has_zero_cell();
    let shift = if has_correction { 0.5 } else { 0.0 };
    let [a, b, c, d] = table.cells().map(|x| x + shift);

    let (num, den) = match kind {
        RatioKind::OddsRatio => (a * d, b * c),
        RatioKind::RelativeRisk => (a * (c + d), c * (a + b)),
    };

    if den == 0.0 {
        let estimate = if num > 0.0 { Estimate::Infinite } else { Estimate::NotAvailable };
        return RatioEstimate::uniform(estimate, has_correction);
    }

    let ratio = num / den;
    if ratio == 0.0 {
        return RatioEstimate {
            ratio: Estimate::Value(0.0),
            ci_lower: Estimate::NotAvailable,
            ci_upper: Estimate::NotAvailable,
            has_correction,
        };
    }

    let se = match kind {
        RatioKind::OddsRatio => (1.0 / a + 1.0 / b + 1.0 / c + 1.0 / d).sqrt(),
        RatioKind::RelativeRisk => (1.0 / a - 1.0 / (a + b) + 1.0 / c - 1.0 / (c + d)).sqrt(),
    };
    let z = z_critical(0.95);
    let log_ratio = ratio.ln();

    let estimate = RatioEstimate {
        ratio: Estimate::Value(ratio),
        ci_lower: Estimate::Value((log_ratio - z * se).exp()),
        ci_upper: Estimate::Value((log_ratio + z * se).exp()),
        has_correction,
    };
    check_estimate(&estimate);
    estimate
}

/// Sanity checks on computed results. Failures are logged, never raised.
pub fn check_estimate(estimate: &RatioEstimate) {
    if let Some(r) = estimate.ratio.value() {
        if !(r >= 0.0) {
            log::warn!("ratio estimate out of range: {r}");
        }
    }
    if let (Some(lo), Some(hi)) = (estimate.ci_lower.value(), estimate.ci_upper.value()) {
        if !(lo <= hi) {
            log::warn!("confidence interval inverted: [{lo}, {hi}]");
        }
    }
}

pub fn check_p_value(p: Option<f64>) {
    if let Some(p) = p {
        if !(0.0..=1.0).contains(&p) {
            log::warn!("p-value out of range: {p}");
        }
    }
}
