//! Integration test: pattern sensitivity search end-to-end

use kolosal_robust::data::{table_from_dataframe, Table};
use kolosal_robust::fairness::FairnessMetric;
use kolosal_robust::patterns::{
    find_important_patterns, PatternSensitivityScanner, SensitivityConfig,
};
use kolosal_robust::robustness::{RadiusSpec, RobustnessCertifier, RobustnessConfig};
use kolosal_robust::training::LogisticRegression;
use kolosal_robust::RobustError;
use ndarray::Array1;
use polars::prelude::*;
use std::collections::HashSet;

fn classification_data() -> (Table, Array1<f64>) {
    let df = df!(
        "group" => &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0,
                     0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
        "f1" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0,
                  1.5, 2.5, 3.5, 4.5, 5.5, 6.5, 7.5, 8.5, 9.5, 10.5],
        "f2" => &[0.3, 0.9, 0.1, 0.7, 0.4, 0.8, 0.2, 0.6, 0.5, 1.0,
                  0.35, 0.85, 0.15, 0.75, 0.45, 0.95, 0.25, 0.65, 0.55, 0.05]
    )
    .unwrap();
    let x = table_from_dataframe(&df).unwrap();
    let y = Array1::from(vec![
        0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0,
        0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0,
    ]);
    (x, y)
}

fn fitted(x: &Table, y: &Array1<f64>) -> LogisticRegression {
    let mut clf = LogisticRegression::new().with_max_iter(500);
    clf.fit(&x.to_matrix().unwrap(), y).unwrap();
    clf
}

#[test]
fn test_scan_is_deterministic() {
    let (x, y) = classification_data();
    let clf = fitted(&x, &y);
    let config = SensitivityConfig::new(FairnessMetric::StatisticalParity).with_threshold(0.01);

    let a = PatternSensitivityScanner::new(&clf, config.clone()).scan(&x, &y).unwrap();
    let b = PatternSensitivityScanner::new(&clf, config).scan(&x, &y).unwrap();

    assert_eq!(a.indices, b.indices);
    let bits = |s: &[f64]| s.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a.scores), bits(&b.scores));
}

#[test]
fn test_parallel_matches_sequential() {
    let (x, y) = classification_data();
    let clf = fitted(&x, &y);
    for metric in [
        FairnessMetric::StatisticalParity,
        FairnessMetric::TprParity,
        FairnessMetric::PredictiveParity,
    ] {
        let config = SensitivityConfig::new(metric)
            .with_threshold(0.0)
            .with_decision_threshold(0.5);
        let sequential = PatternSensitivityScanner::new(&clf, config.clone()).scan(&x, &y).unwrap();
        let parallel = PatternSensitivityScanner::new(&clf, config.with_parallel(true))
            .scan(&x, &y)
            .unwrap();
        assert_eq!(sequential.indices, parallel.indices, "metric {}", metric);
        assert_eq!(sequential.pattern_scores.len(), parallel.pattern_scores.len());
    }
}

#[test]
fn test_ranking_respects_threshold_and_is_deduplicated() {
    let (x, y) = classification_data();
    let clf = fitted(&x, &y);
    let threshold = 0.02;
    let ranking = PatternSensitivityScanner::new(
        &clf,
        SensitivityConfig::new(FairnessMetric::StatisticalParity).with_threshold(threshold),
    )
    .scan(&x, &y)
    .unwrap();

    let unique: HashSet<_> = ranking.indices.iter().collect();
    assert_eq!(unique.len(), ranking.indices.len());
    assert!(ranking.scores.iter().all(|&s| s > threshold));
    assert!(ranking.scores.windows(2).all(|w| w[0] >= w[1]));

    // Rows are ranked iff some pattern above the threshold touched them
    let touched: HashSet<usize> = ranking
        .pattern_scores
        .iter()
        .filter(|s| s.sensitivity > threshold)
        .flat_map(|s| s.rows.iter().copied())
        .collect();
    assert_eq!(touched, ranking.indices.iter().copied().collect());

    // Each score is the best over the passing patterns touching the row
    for (id, score) in ranking.indices.iter().zip(&ranking.scores) {
        let best = ranking
            .pattern_scores
            .iter()
            .filter(|s| s.rows.contains(id))
            .map(|s| s.sensitivity)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(*score, best);
    }
}

#[test]
fn test_zero_threshold_ranks_perturbed_rows() {
    let (x, y) = classification_data();
    let clf = fitted(&x, &y);
    let indices = find_important_patterns(&x, &y, &clf, 0, 0.0).unwrap();
    assert!(!indices.is_empty());
    assert!(indices.iter().all(|&id| id < x.n_rows()));
}

#[test]
fn test_stale_row_ids_are_dropped() {
    let (x, y) = classification_data();
    let clf = fitted(&x, &y);
    let shifted = x.with_row_ids((100..120).collect()).unwrap();
    let indices = find_important_patterns(&shifted, &y, &clf, 0, 0.0).unwrap();
    assert!(indices.is_empty());
}

#[test]
fn test_invalid_metric_selector() {
    let (x, y) = classification_data();
    let clf = fitted(&x, &y);
    assert!(matches!(
        find_important_patterns(&x, &y, &clf, 3, 0.05),
        Err(RobustError::InvalidParameter { .. })
    ));
}

#[test]
fn test_ranking_feeds_boundary_certification() {
    let (x, y) = classification_data();
    let clf = fitted(&x, &y);
    let ranked = find_important_patterns(&x, &y, &clf, 0, 0.0).unwrap();
    let k = ranked.len().min(3);

    let config = RobustnessConfig::new()
        .with_uncertain_num(k)
        .with_radius(RadiusSpec::RangeFraction(0.1))
        .with_ranked_rows(ranked.clone());
    let report = RobustnessCertifier::new(config).certify(&x, &y, &x).unwrap();

    assert_eq!(report.perturbed_rows, ranked[..k].to_vec());
    assert!((0.0..=1.0).contains(&report.robust_ratio));
}
