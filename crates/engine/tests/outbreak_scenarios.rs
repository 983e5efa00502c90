//! End-to-end outbreak scenarios through the session API.

use linelist_core::CellPos;
use linelist_engine::column::{find_column, ColumnType};
use linelist_engine::filter::{ColumnFilter, FilterKey, ValueCount};
use linelist_engine::stats::{sort_by_p_value, AnalysisResult, Estimate, StatisticsOptions};
use linelist_engine::{DataKey, Session, SessionConfig, TableTemplate};

/// Build a session whose rows carry `(isPatient, diet values)`.
fn outbreak(items: &[&str], rows: &[(&str, Vec<&str>)]) -> Session {
    let config = SessionConfig {
        template: TableTemplate {
            basic_columns: 1,
            clinical_columns: 1,
            diet_columns: items.len(),
            row_count: rows.len(),
        },
        ..SessionConfig::default()
    };
    let mut session = Session::create(config);
    for (i, item) in items.iter().enumerate() {
        session.update_cell(-1, DataKey::DietInfo, Some(i), item);
    }
    for (r, (patient, diet)) in rows.iter().enumerate() {
        session.update_cell(r as isize, DataKey::IsPatient, None, patient);
        for (i, value) in diet.iter().enumerate() {
            session.update_cell(r as isize, DataKey::DietInfo, Some(i), value);
        }
    }
    session
}

fn repeat<'a>(n: usize, patient: &'a str, diet: Vec<&'a str>) -> Vec<(&'a str, Vec<&'a str>)> {
    (0..n).map(|_| (patient, diet.clone())).collect()
}

fn two_by_two(a: usize, b: usize, c: usize, d: usize) -> Vec<(&'static str, Vec<&'static str>)> {
    let mut rows = repeat(a, "1", vec!["1"]);
    rows.extend(repeat(b, "0", vec!["1"]));
    rows.extend(repeat(c, "1", vec!["0"]));
    rows.extend(repeat(d, "0", vec!["0"]));
    rows
}

#[test]
fn rice_outbreak_is_zero_cell_corrected() {
    // 40 cases all ate rice, 80 controls none did
    let session = outbreak(&["rice"], &two_by_two(40, 0, 0, 80));
    assert_eq!(session.table().row_count(), 120);

    let cc = &session.case_control()[0];
    assert_eq!(cc.item, "rice");
    assert_eq!((cc.case_exposed, cc.control_exposed, cc.case_unexposed, cc.control_unexposed), (40, 0, 0, 80));
    assert!(cc.has_correction);
    // (40.5 * 80.5) / (0.5 * 0.5)
    assert_eq!(cc.odds_ratio.to_string(), "13041.000");
    assert!(cc.ci_lower.is_finite() && cc.ci_upper.is_finite());
    assert!(cc.adj_chi.is_some());
    assert!(cc.p_value.unwrap() < 1e-10);

    let cohort = &session.cohort()[0];
    assert!(cohort.has_correction);
    // (40.5 / 41) / (0.5 / 81)
    assert_eq!(cohort.relative_risk.to_string(), "160.024");
    assert_eq!(cohort.exposed_incidence, "100.0%");
    assert_eq!(cohort.unexposed_incidence, "0.0%");
}

#[test]
fn known_table_has_finite_odds_ratio_inside_interval() {
    let session = outbreak(&["salad"], &two_by_two(42, 2, 24, 92));
    let r = &session.case_control()[0];
    assert!(!r.has_correction);
    let or = r.odds_ratio.value().unwrap();
    let (lo, hi) = (r.ci_lower.value().unwrap(), r.ci_upper.value().unwrap());
    assert!(or.is_finite());
    assert!(lo <= or && or <= hi);
    let p = r.p_value.unwrap();
    assert!((0.0..=1.0).contains(&p));
}

#[test]
fn small_counts_fall_back_to_fisher() {
    let session = outbreak(&["soup"], &two_by_two(3, 1, 1, 3));
    let r = &session.case_control()[0];
    assert_eq!(r.adj_chi, None);
    let p = r.p_value.unwrap();
    assert!(p.is_finite() && (0.0..=1.0).contains(&p));
}

#[test]
fn infinite_ratio_sentinel_without_correction() {
    let mut session = outbreak(&["egg"], &two_by_two(10, 0, 5, 8));
    session.set_options(StatisticsOptions { haldane_correction: false, ..StatisticsOptions::default() });
    let r = &session.case_control()[0];
    assert_eq!(r.odds_ratio, Estimate::Infinite);
    let json = serde_json::to_value(r).unwrap();
    assert_eq!(json["oddsRatio"], "Inf");
    assert_eq!(json["ci_lower"], "Inf");
    assert_eq!(json["ci_upper"], "Inf");
}

#[test]
fn results_follow_header_order_and_sort_by_p_on_request() {
    let mut rows = Vec::new();
    rows.extend(repeat(30, "1", vec!["1", "0"]));
    rows.extend(repeat(10, "1", vec!["0", "1"]));
    rows.extend(repeat(10, "0", vec!["1", "1"]));
    rows.extend(repeat(30, "0", vec!["0", "0"]));
    let session = outbreak(&["water", "rice"], &rows);

    let results = session.case_control();
    let items: Vec<&str> = results.iter().map(|r| r.item()).collect();
    assert_eq!(items, vec!["water", "rice"]);

    let sorted = sort_by_p_value(&results);
    assert!(sorted[0].p_value() <= sorted[1].p_value());
    assert_eq!(results[0].item, "water");
}

#[test]
fn case_series_counts_cases_only() {
    let mut rows = repeat(3, "1", vec!["1"]);
    rows.extend(repeat(1, "1", vec!["0"]));
    rows.extend(repeat(5, "0", vec!["1"]));
    let session = outbreak(&["cake"], &rows);
    let r = &session.case_series()[0];
    assert_eq!((r.exposed_cases, r.total_cases), (3, 4));
    assert_eq!(r.proportion, "75.0%");
}

#[test]
fn dependent_filter_resolution() {
    let mut rows = repeat(4, "1", vec!["1", "1"]);
    rows.extend(repeat(2, "1", vec!["0", "1"]));
    rows.extend(repeat(3, "0", vec!["1", "0"]));
    rows.extend(repeat(1, "", vec!["", "0"]));
    let mut session = outbreak(&["rice", "soup"], &rows);

    let patient = FilterKey::scalar(DataKey::IsPatient);
    let rice = FilterKey::indexed(DataKey::DietInfo, 0);
    session.set_filter(patient, ColumnFilter::values(["1"]));
    session.set_filter(rice, ColumnFilter::values(["1"]));
    assert_eq!(session.visible_rows().len(), 4);

    // rice's own filter is ignored, the patient filter is not
    assert_eq!(
        session.available_values(&rice),
        vec![
            ValueCount { value: "0".into(), count: 2 },
            ValueCount { value: "1".into(), count: 4 },
        ]
    );
    // patient's own filter is ignored
    assert_eq!(
        session.available_values(&patient),
        vec![
            ValueCount { value: "0".into(), count: 3 },
            ValueCount { value: "1".into(), count: 4 },
        ]
    );

    session.clear_filters();
    assert_eq!(
        session.available_values(&patient),
        vec![
            ValueCount { value: "0".into(), count: 3 },
            ValueCount { value: "1".into(), count: 6 },
            ValueCount { value: "".into(), count: 1 },
        ]
    );
}

#[test]
fn structural_edits_keep_analyses_aligned() {
    let mut session = outbreak(&["rice", "soup"], &two_by_two(5, 5, 5, 5));
    let before = session.case_control()[0].clone();

    assert!(session.insert_columns(linelist_engine::ColumnGroup::Diet, 0, 1));
    let results = session.case_control();
    assert_eq!(results.len(), 3);
    assert_eq!(results[1], before);

    assert!(session.undo());
    assert_eq!(session.case_control()[0], before);
}

#[test]
fn pasted_block_feeds_statistics() {
    let mut session = Session::create(SessionConfig::default());
    let rice = find_column(session.table().columns(), ColumnType::Diet, Some(0)).unwrap().index;
    session.selection_mut().select_cell(CellPos::header(rice));
    session.paste_text("rice\n1\n1\n0\n");

    session.selection_mut().select_cell(CellPos::new(0, 1));
    session.paste_text("1\n0\n1\n");

    let r = &session.case_control()[0];
    assert_eq!(r.item, "rice");
    assert_eq!((r.case_exposed, r.control_exposed, r.case_unexposed), (1, 1, 1));
}
