//! 2x2 contingency tables and the choice of significance test.

use serde::{Deserialize, Serialize};

use super::distribution::{chi_square_p_value, fisher_exact_two_sided};
use crate::row::Row;

/// Exposure-by-outcome counts for one diet item.
///
/// ```text
///              case   non-case
/// exposed        a       b
/// unexposed      c       d
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TwoByTwo {
    pub a: u64,
    pub b: u64,
    pub c: u64,
    pub d: u64,
}

/// Case status from `isPatient`: `Some(true)` for "1", `Some(false)` for "0".
pub fn case_status(row: &Row) -> Option<bool> {
    binary(&row.is_patient)
}

/// Exposure from a diet cell: `Some(true)` for "1", `Some(false)` for "0".
pub fn exposure(row: &Row, diet_index: usize) -> Option<bool> {
    row.diet_info.get(diet_index).and_then(|v| binary(v))
}

fn binary(value: &str) -> Option<bool> {
    match value.trim() {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

impl TwoByTwo {
    pub fn new(a: u64, b: u64, c: u64, d: u64) -> Self {
        Self { a, b, c, d }
    }

    /// Classify every row by `(isPatient, diet[diet_index])`. Rows with a
    /// missing or unrecognized value in either field are left out.
    pub fn from_rows(rows: &[Row], diet_index: usize) -> Self {
        let mut table = Self::default();
        for row in rows {
            let (Some(case), Some(exposed)) = (case_status(row), exposure(row, diet_index)) else {
                continue;
            };
            match (exposed, case) {
                (true, true) => table.a += 1,
                (true, false) => table.b += 1,
                (false, true) => table.c += 1,
                (false, false) => table.d += 1,
            }
        }
        table
    }

    pub fn total(&self) -> u64 {
        self.a + self.b + self.c + self.d
    }

    pub fn exposed_total(&self) -> u64 {
        self.a + self.b
    }

    pub fn unexposed_total(&self) -> u64 {
        self.c + self.d
    }

    pub fn case_total(&self) -> u64 {
        self.a + self.c
    }

    pub fn non_case_total(&self) -> u64 {
        self.b + self.d
    }

    pub fn has_zero_cell(&self) -> bool {
        self.a == 0 || self.b == 0 || self.c == 0 || self.d == 0
    }

    fn has_zero_margin(&self) -> bool {
        self.exposed_total() == 0
            || self.unexposed_total() == 0
            || self.case_total() == 0
            || self.non_case_total() == 0
    }

    pub fn cells(&self) -> [f64; 4] {
        [self.a as f64, self.b as f64, self.c as f64, self.d as f64]
    }

    /// Expected counts `[a, b, c, d]` under independence.
    pub fn expected(&self) -> [f64; 4] {
        let n = self.total() as f64;
        if n == 0.0 {
            return [0.0; 4];
        }
        let (r1, r2) = (self.exposed_total() as f64, self.unexposed_total() as f64);
        let (c1, c2) = (self.case_total() as f64, self.non_case_total() as f64);
        [r1 * c1 / n, r1 * c2 / n, r2 * c1 / n, r2 * c2 / n]
    }
}

/// Which test produced a p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestMethod {
    /// A margin is zero: no test.
    None,
    ChiSquare,
    /// Pearson chi-square with Yates' continuity correction.
    ChiSquareYates,
    FisherExact,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Significance {
    pub method: TestMethod,
    /// Chi-square statistic; `None` under Fisher or when untested.
    pub chi_square: Option<f64>,
    pub p_value: Option<f64>,
}

/// Pick and run the significance test for a table.
///
/// Any zero margin: no test. Any expected cell below 5: Fisher's exact test,
/// which takes precedence over the Yates option. Otherwise Pearson
/// chi-square with one degree of freedom, continuity-corrected if `yates`.
pub fn significance(table: &TwoByTwo, yates: bool) -> Significance {
    if table.total() == 0 || table.has_zero_margin() {
        return Significance { method: TestMethod::None, chi_square: None, p_value: None };
    }

    let expected = table.expected();
    if expected.iter().any(|&e| e < 5.0) {
        let p = fisher_exact_two_sided(table.a, table.b, table.c, table.d);
        return Significance { method: TestMethod::FisherExact, chi_square: None, p_value: Some(p) };
    }

    let chi: f64 = table
        .cells()
        .iter()
        .zip(expected.iter())
        .map(|(&o, &e)| {
            let diff = if yates {
                ((o - e).abs() - 0.5).max(0.0)
            } else {
                (o - e).abs()
            };
            diff * diff / e
        })
        .sum();

    Significance {
        method: if yates { TestMethod::ChiSquareYates } else { TestMethod::ChiSquare },
        chi_square: Some(chi),
        p_value: Some(chi_square_p_value(chi)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Headers;

    fn row(patient: &str, diet: &str) -> Row {
        let mut row = Row::empty(&Headers::blank(1, 1, 1));
        row.is_patient = patient.to_string();
        row.diet_info[0] = diet.to_string();
        row
    }

    #[test]
    fn test_classification_skips_unknowns() {
        let rows = vec![
            row("1", "1"),
            row("1", "1"),
            row("0", "1"),
            row("1", "0"),
            row("0", "0"),
            row("", "1"),
            row("1", ""),
            row("1", "yes"),
            row(" 0 ", " 0"),
        ];
        let table = TwoByTwo::from_rows(&rows, 0);
        assert_eq!(table, TwoByTwo::new(2, 1, 1, 2));
        assert_eq!(TwoByTwo::from_rows(&rows, 5), TwoByTwo::default());
    }

    #[test]
    fn test_expected_counts() {
        let table = TwoByTwo::new(42, 2, 24, 92);
        let e = table.expected();
        let n = 160.0;
        assert!((e[0] - 44.0 * 66.0 / n).abs() < 1e-12);
        assert!((e.iter().sum::<f64>() - n).abs() < 1e-9);
    }

    #[test]
    fn test_chi_square_for_large_counts() {
        let table = TwoByTwo::new(42, 2, 24, 92);
        let plain = significance(&table, false);
        assert_eq!(plain.method, TestMethod::ChiSquare);
        let chi = plain.chi_square.unwrap();
        // Hand-computed Pearson statistic
        assert!((chi - 73.579).abs() < 0.01);
        assert!(plain.p_value.unwrap() < 1e-6);

        let yates = significance(&table, true);
        assert_eq!(yates.method, TestMethod::ChiSquareYates);
        assert!(yates.chi_square.unwrap() < chi);
    }

    #[test]
    fn test_small_expected_uses_fisher() {
        let table = TwoByTwo::new(3, 1, 1, 3);
        let result = significance(&table, true);
        assert_eq!(result.method, TestMethod::FisherExact);
        assert_eq!(result.chi_square, None);
        let p = result.p_value.unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_zero_margin_has_no_test() {
        let table = TwoByTwo::new(5, 7, 0, 0);
        let result = significance(&table, false);
        assert_eq!(result.method, TestMethod::None);
        assert_eq!(result.p_value, None);
        assert_eq!(significance(&TwoByTwo::default(), false).p_value, None);
    }
}
