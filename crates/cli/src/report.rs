// Tabular output for analysis results, value lists and incubation summaries.

use linelist_engine::filter::ValueCount;
use linelist_engine::incubation::IncubationSummary;
use linelist_engine::stats::{CaseControlResult, CaseSeriesResult, CohortResult};
use serde::Serialize;

use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Tsv,
    Json,
}

/// One TSV line per value, under a fixed header.
pub trait TsvRecord {
    const HEADER: &'static [&'static str];

    fn record(&self) -> Vec<String>;
}

fn opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "N/A".to_string(),
    }
}

impl TsvRecord for CaseControlResult {
    const HEADER: &'static [&'static str] = &[
        "item", "case_exposed", "case_unexposed", "case_total",
        "control_exposed", "control_unexposed", "control_total",
        "odds_ratio", "ci_lower", "ci_upper", "chi_square", "p_value", "corrected",
    ];

    fn record(&self) -> Vec<String> {
        vec![
            self.item.clone(),
            self.case_exposed.to_string(),
            self.case_unexposed.to_string(),
            self.case_total.to_string(),
            self.control_exposed.to_string(),
            self.control_unexposed.to_string(),
            self.control_total.to_string(),
            self.odds_ratio.to_string(),
            self.ci_lower.to_string(),
            self.ci_upper.to_string(),
            opt(self.adj_chi, 3),
            opt(self.p_value, 4),
            self.has_correction.to_string(),
        ]
    }
}

impl TsvRecord for CohortResult {
    const HEADER: &'static [&'static str] = &[
        "item", "exposed_cases", "exposed_non_cases", "exposed_total", "exposed_incidence",
        "unexposed_cases", "unexposed_non_cases", "unexposed_total", "unexposed_incidence",
        "relative_risk", "ci_lower", "ci_upper", "chi_square", "p_value", "corrected",
    ];

    fn record(&self) -> Vec<String> {
        vec![
            self.item.clone(),
            self.exposed_cases.to_string(),
            self.exposed_non_cases.to_string(),
            self.exposed_total.to_string(),
            self.exposed_incidence.clone(),
            self.unexposed_cases.to_string(),
            self.unexposed_non_cases.to_string(),
            self.unexposed_total.to_string(),
            self.unexposed_incidence.clone(),
            self.relative_risk.to_string(),
            self.ci_lower.to_string(),
            self.ci_upper.to_string(),
            opt(self.adj_chi, 3),
            opt(self.p_value, 4),
            self.has_correction.to_string(),
        ]
    }
}

impl TsvRecord for CaseSeriesResult {
    const HEADER: &'static [&'static str] =
        &["item", "exposed_cases", "unexposed_cases", "total_cases", "proportion"];

    fn record(&self) -> Vec<String> {
        vec![
            self.item.clone(),
            self.exposed_cases.to_string(),
            self.unexposed_cases.to_string(),
            self.total_cases.to_string(),
            self.proportion.clone(),
        ]
    }
}

impl TsvRecord for ValueCount {
    const HEADER: &'static [&'static str] = &["value", "count"];

    fn record(&self) -> Vec<String> {
        vec![self.value.clone(), self.count.to_string()]
    }
}

/// Render records as TSV (with header) or as a pretty JSON array.
pub fn render<R>(records: &[&R], format: OutputFormat) -> Result<String, CliError>
where
    R: TsvRecord + Serialize,
{
    match format {
        OutputFormat::Json => to_json(&records),
        OutputFormat::Tsv => {
            let lines = records.iter().map(|r| r.record());
            write_tsv(R::HEADER, lines)
        }
    }
}

pub fn render_incubation(summary: &IncubationSummary, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => to_json(summary),
        OutputFormat::Tsv => {
            let hours = |v: Option<f64>| opt(v, 2);
            let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
            let lines = vec![
                vec!["count".to_string(), summary.count.to_string()],
                vec!["min_hours".to_string(), hours(summary.min_hours)],
                vec!["max_hours".to_string(), hours(summary.max_hours)],
                vec!["mean_hours".to_string(), hours(summary.mean_hours)],
                vec!["median_hours".to_string(), hours(summary.median_hours)],
                vec!["first_onset".to_string(), text(&summary.first_onset)],
                vec!["last_onset".to_string(), text(&summary.last_onset)],
            ];
            write_tsv(&["field", "value"], lines.into_iter())
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    let mut json = serde_json::to_string_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    json.push('\n');
    Ok(json)
}

fn write_tsv<I>(header: &[&str], lines: I) -> Result<String, CliError>
where
    I: Iterator<Item = Vec<String>>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(Vec::new());

    writer.write_record(header).map_err(|e| CliError::io(e.to_string()))?;
    for line in lines {
        writer.write_record(&line).map_err(|e| CliError::io(e.to_string()))?;
    }

    let bytes = writer.into_inner().map_err(|e| CliError::io(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CliError::io(e.to_string()))
}
