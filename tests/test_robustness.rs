//! Integration test: robustness certification end-to-end

use kolosal_robust::data::{table_from_dataframe, Table};
use kolosal_robust::preprocessing::StandardScaler;
use kolosal_robust::robustness::{
    compute_robustness_ratio, compute_robustness_ratio_ranked, RadiusSpec, RobustnessCertifier,
    RobustnessConfig,
};
use kolosal_robust::training::LinearRegression;
use kolosal_robust::RobustError;
use ndarray::{array, Array1};
use polars::prelude::*;

const X2: [f64; 20] = [
    3.1, 0.4, 2.2, 5.0, 1.7, 4.4, 0.9, 3.8, 2.6, 4.9,
    1.2, 0.3, 3.3, 2.0, 4.1, 0.7, 2.9, 1.5, 3.6, 0.2,
];

fn regression_data() -> (Table, Array1<f64>, Table) {
    let df = df!(
        "x1" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0,
                   11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0, 20.0],
        "x2" => &X2
    )
    .unwrap();
    let x = table_from_dataframe(&df).unwrap();
    // y = 2*x1 - 1.5*x2 + 4 + small deterministic noise
    let y: Array1<f64> = X2
        .iter()
        .enumerate()
        .map(|(i, x2)| 2.0 * (i + 1) as f64 - 1.5 * x2 + 4.0 + 0.1 * (i as f64 * 1.7).sin())
        .collect();

    let test_df = df!(
        "x1" => &[0.5, 4.5, 9.5, 14.5, 19.5, 25.0],
        "x2" => &[1.0, 2.0, 3.0, 4.0, 0.5, 6.0]
    )
    .unwrap();
    let x_test = table_from_dataframe(&test_df).unwrap();
    (x, y, x_test)
}

fn label_config(num: usize, radius: f64, robustness_radius: f64) -> RobustnessConfig {
    RobustnessConfig::new()
        .with_uncertain_num(num)
        .with_radius(RadiusSpec::Absolute(radius))
        .with_robustness_radius(robustness_radius)
        .with_seed(7)
}

#[test]
fn test_certification_is_deterministic() {
    let (x, y, x_test) = regression_data();
    let config = label_config(5, 2.0, 0.8);

    let a = RobustnessCertifier::new(config.clone()).certify(&x, &y, &x_test).unwrap();
    let b = RobustnessCertifier::new(config).certify(&x, &y, &x_test).unwrap();

    assert_eq!(a.robust_ratio.to_bits(), b.robust_ratio.to_bits());
    assert_eq!(a.perturbed_rows, b.perturbed_rows);
    assert_eq!(a.parameters, b.parameters);
    assert_eq!(a.predictions, b.predictions);
}

#[test]
fn test_ratio_non_increasing_in_count() {
    let (x, y, x_test) = regression_data();
    for interval in [true, false] {
        let mut previous = 1.0;
        for num in 0..=20 {
            let config = label_config(num, 3.0, 1.0).with_interval(interval);
            let ratio = compute_robustness_ratio(&x, &y, &x_test, &config).unwrap();
            assert!(
                ratio <= previous,
                "ratio rose from {} to {} at num = {} (interval = {})",
                previous, ratio, num, interval
            );
            previous = ratio;
        }
    }
}

#[test]
fn test_ratio_non_increasing_in_radius() {
    let (x, y, x_test) = regression_data();
    let mut previous = 1.0;
    for radius in [0.0, 0.5, 1.0, 2.0, 4.0, 8.0] {
        let ratio = compute_robustness_ratio(&x, &y, &x_test, &label_config(6, radius, 1.0)).unwrap();
        assert!(ratio <= previous, "ratio rose at radius {}", radius);
        previous = ratio;
    }
}

#[test]
fn test_ratio_non_decreasing_in_robustness_radius() {
    let (x, y, x_test) = regression_data();
    let mut previous = 0.0;
    for robustness_radius in [0.0, 0.25, 0.5, 1.0, 2.0, 1e6] {
        let config = label_config(8, 3.0, robustness_radius);
        let ratio = compute_robustness_ratio(&x, &y, &x_test, &config).unwrap();
        assert!(ratio >= previous, "ratio fell at robustness radius {}", robustness_radius);
        previous = ratio;
    }
    // A generous threshold certifies everything
    assert_eq!(previous, 1.0);
}

#[test]
fn test_no_perturbation_matches_ols() {
    let (x, y, x_test) = regression_data();
    let report = RobustnessCertifier::new(label_config(0, 1.0, 1e-9))
        .certify(&x, &y, &x_test)
        .unwrap();

    assert_eq!(report.robust_ratio, 1.0);
    assert_eq!(report.n_symbols, 0);
    assert!(report.parameters.iter().all(|p| p.radius == 0.0));

    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&x.to_matrix().unwrap()).unwrap();
    let mut ols = LinearRegression::new();
    ols.fit(&scaled, &y).unwrap();

    let coefficients = ols.coefficients.as_ref().unwrap();
    assert!((report.parameters[0].center - ols.intercept.unwrap()).abs() < 1e-8);
    for (param, coef) in report.parameters[1..].iter().zip(coefficients.iter()) {
        assert!((param.center - coef).abs() < 1e-8, "{} vs {}", param.center, coef);
    }

    let expected = ols
        .predict(&scaler.transform(&x_test.to_matrix().unwrap()).unwrap())
        .unwrap();
    for (bound, e) in report.predictions.iter().zip(expected.iter()) {
        assert!((bound.center - e).abs() < 1e-8);
    }
}

#[test]
fn test_interval_never_beats_symbolic() {
    let (x, y, x_test) = regression_data();
    for num in [1, 3, 6, 10] {
        for robustness_radius in [0.2, 0.5, 1.0] {
            let config = label_config(num, 2.0, robustness_radius);
            let interval = compute_robustness_ratio(&x, &y, &x_test, &config.clone().with_interval(true)).unwrap();
            let raw = compute_robustness_ratio(&x, &y, &x_test, &config.with_interval(false)).unwrap();
            assert!(interval <= raw, "interval {} > raw {} at num {}", interval, raw, num);
        }
    }
}

#[test]
fn test_ten_row_scenario() {
    let x = Table::from_matrix(
        vec!["x".into()],
        &array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0], [9.0]],
    )
    .unwrap();
    let y = array![1.1, 2.9, 5.2, 6.8, 9.1, 10.9, 13.2, 14.8, 17.1, 19.0];
    let x_test = Table::from_matrix(
        vec!["x".into()],
        &array![[0.5], [1.5], [2.5], [3.5], [4.5], [5.5], [6.5], [7.5], [8.5], [9.5]],
    )
    .unwrap();

    let config = RobustnessConfig::new()
        .with_uncertain_num(2)
        .with_radius(RadiusSpec::Absolute(0.5))
        .with_interval(true)
        .with_robustness_radius(1.0);
    let ratio = compute_robustness_ratio(&x, &y, &x_test, &config).unwrap();
    assert!(ratio >= 0.8, "expected at least 0.8, got {}", ratio);
}

#[test]
fn test_ranked_rows_drive_selection() {
    let (x, y, x_test) = regression_data();
    let ranked = vec![19, 0, 7, 3];
    let config = label_config(3, 1.0, 1.0).with_ranked_rows(ranked);
    let report = RobustnessCertifier::new(config).certify(&x, &y, &x_test).unwrap();
    assert_eq!(report.perturbed_rows, vec![19, 0, 7]);

    let ratio = compute_robustness_ratio_ranked(&x, &y, &x_test, &[19, 0, 7, 3], &label_config(3, 1.0, 1.0)).unwrap();
    assert_eq!(ratio, report.robust_ratio);
}

#[test]
fn test_label_range_fraction() {
    let (x, y, x_test) = regression_data();
    let config = RobustnessConfig::new()
        .with_uncertain_num(1)
        .with_radius(RadiusSpec::RangeFraction(0.1));
    let report = RobustnessCertifier::new(config).certify(&x, &y, &x_test).unwrap();

    let range = y.fold(f64::NEG_INFINITY, |a, &b| a.max(b)) - y.fold(f64::INFINITY, |a, &b| a.min(b));
    assert!((report.uncertain_radius - 0.1 * range).abs() < 1e-12);
}

#[test]
fn test_unknown_feature_is_fatal() {
    let (x, y, x_test) = regression_data();
    let config = label_config(1, 1.0, 1.0)
        .with_target(kolosal_robust::robustness::UncertainTarget::Feature("x3".into()));
    assert!(matches!(
        compute_robustness_ratio(&x, &y, &x_test, &config),
        Err(RobustError::FeatureNotFound(_))
    ));
}

#[test]
fn test_nan_training_values_are_rejected() {
    let x = Table::from_matrix(vec!["x".into()], &array![[0.0], [1.0], [f64::NAN], [3.0]]).unwrap();
    let y = array![0.0, 1.0, 2.0, 3.0];
    let x_test = Table::from_matrix(vec!["x".into()], &array![[0.5], [2.5]]).unwrap();

    let config = RobustnessConfig::new()
        .with_uncertain_num(0)
        .with_radius(RadiusSpec::Absolute(0.5));
    assert!(matches!(
        compute_robustness_ratio(&x, &y, &x_test, &config),
        Err(RobustError::DataError(_))
    ));

    // A NaN label slips past the table checks but not the solver
    let x = Table::from_matrix(vec!["x".into()], &array![[0.0], [1.0], [2.0], [3.0]]).unwrap();
    let y = array![0.0, f64::NAN, 2.0, 3.0];
    assert!(matches!(
        compute_robustness_ratio(&x, &y, &x_test, &config),
        Err(RobustError::ComputationError(_))
    ));
}
