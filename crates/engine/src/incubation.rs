//! Incubation period summary for case rows.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::stats::contingency::case_status;
use crate::row::Row;
use crate::timestamp::{format_timestamp, hours_between, parse_timestamp};

/// Where each case's exposure time comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureSource {
    /// One exposure event for everybody.
    Global(NaiveDateTime),
    /// Each row's `individualExposureTime`.
    Individual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncubationSummary {
    /// Cases with a usable, non-negative incubation period.
    pub count: usize,
    pub min_hours: Option<f64>,
    pub max_hours: Option<f64>,
    pub mean_hours: Option<f64>,
    pub median_hours: Option<f64>,
    /// Earliest onset among cases, `YYYY-MM-DD HH:mm`.
    pub first_onset: Option<String>,
    pub last_onset: Option<String>,
}

/// Summarize incubation periods of case rows. Rows without a parseable onset
/// or exposure, and periods that come out negative, are skipped. The onset
/// range covers every case with a parseable onset.
pub fn summarize_incubation(rows: &[Row], source: ExposureSource) -> IncubationSummary {
    let onsets: Vec<(&Row, NaiveDateTime)> = rows
        .iter()
        .filter(|r| case_status(r) == Some(true))
        .filter_map(|r| parse_timestamp(&r.symptom_onset).map(|t| (r, t)))
        .collect();

    let mut hours: Vec<f64> = onsets
        .iter()
        .filter_map(|(row, onset)| {
            let exposure = match source {
                ExposureSource::Global(t) => t,
                ExposureSource::Individual => {
                    parse_timestamp(row.individual_exposure_time.as_deref().unwrap_or(""))?
                }
            };
            let h = hours_between(&exposure, onset);
            (h >= 0.0).then_some(h)
        })
        .collect();
    hours.sort_by(f64::total_cmp);

    let count = hours.len();
    let median = match count {
        0 => None,
        n if n % 2 == 1 => Some(hours[n / 2]),
        n => Some((hours[n / 2 - 1] + hours[n / 2]) / 2.0),
    };

    IncubationSummary {
        count,
        min_hours: hours.first().copied(),
        max_hours: hours.last().copied(),
        mean_hours: (count > 0).then(|| hours.iter().sum::<f64>() / count as f64),
        median_hours: median,
        first_onset: onsets.iter().map(|(_, t)| *t).min().map(|t| format_timestamp(&t)),
        last_onset: onsets.iter().map(|(_, t)| *t).max().map(|t| format_timestamp(&t)),
    }
}
