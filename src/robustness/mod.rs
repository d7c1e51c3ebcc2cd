//! Robustness certification for closed-form linear regression
//!
//! Injects bounded uncertainty into training labels or features, propagates
//! it through the normal equations with affine arithmetic, and reports the
//! fraction of test predictions whose worst-case deviation stays within a
//! robustness radius.
//!
//! Pipeline: [`UncertaintyInjector`] → [`solve_closed_form`] →
//! optional [`tighten_intervals`] → [`predict_affine`] / [`classify`].

mod evaluator;
mod injector;
mod solver;

pub use evaluator::{classify, predict_affine, robust_fraction, PredictionBound};
pub use injector::{InjectedData, UncertaintyInjector};
pub use solver::{solve_closed_form, tighten_intervals};

use crate::data::Table;
use crate::error::{Result, RobustError};
use crate::preprocessing::design_matrix;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Which training values receive uncertainty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UncertainTarget {
    /// The label column
    Label,
    /// A named feature column
    Feature(String),
}

/// Perturbation radius, either absolute or relative to the observed range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RadiusSpec {
    Absolute(f64),
    /// Fraction of `max - min` of the target values. Feature ranges are
    /// measured after standardization, label ranges before.
    RangeFraction(f64),
}

impl RadiusSpec {
    fn value(&self) -> f64 {
        match self {
            RadiusSpec::Absolute(v) | RadiusSpec::RangeFraction(v) => *v,
        }
    }
}

/// How rows are picked for perturbation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowSelection {
    /// Uniformly at random without replacement, seeded
    Random,
    /// The first `uncertain_num` row ids of a caller-ranked list
    Ranked(Vec<usize>),
}

/// Configuration for one certification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobustnessConfig {
    pub target: UncertainTarget,
    /// Number of rows to perturb
    pub uncertain_num: usize,
    pub radius: RadiusSpec,
    pub selection: RowSelection,
    pub seed: u64,
    /// Collapse parameters to intervals before predicting
    pub interval: bool,
    /// Maximum tolerated prediction radius
    pub robustness_radius: f64,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            target: UncertainTarget::Label,
            uncertain_num: 0,
            radius: RadiusSpec::Absolute(1.0),
            selection: RowSelection::Random,
            seed: 42,
            interval: true,
            robustness_radius: 1.0,
        }
    }
}

impl RobustnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: UncertainTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_uncertain_num(mut self, uncertain_num: usize) -> Self {
        self.uncertain_num = uncertain_num;
        self
    }

    pub fn with_radius(mut self, radius: RadiusSpec) -> Self {
        self.radius = radius;
        self
    }

    /// Perturb the first rows of `ranked` instead of random rows
    pub fn with_ranked_rows(mut self, ranked: Vec<usize>) -> Self {
        self.selection = RowSelection::Ranked(ranked);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_interval(mut self, interval: bool) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_robustness_radius(mut self, robustness_radius: f64) -> Self {
        self.robustness_radius = robustness_radius;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let r = self.radius.value();
        if !r.is_finite() || r < 0.0 {
            return Err(RobustError::invalid_parameter(
                "uncertain_radius",
                r,
                "must be finite and non-negative",
            ));
        }
        if !self.robustness_radius.is_finite() || self.robustness_radius < 0.0 {
            return Err(RobustError::invalid_parameter(
                "robustness_radius",
                self.robustness_radius,
                "must be finite and non-negative",
            ));
        }
        if let UncertainTarget::Feature(name) = &self.target {
            if name.is_empty() {
                return Err(RobustError::ConfigError(
                    "feature target needs a column name".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Center and worst-case radius of one model parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterBound {
    pub center: f64,
    pub radius: f64,
}

/// Outcome of a certification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobustnessReport {
    /// Fraction of test predictions within the robustness radius
    pub robust_ratio: f64,
    pub predictions: Vec<PredictionBound>,
    /// Intercept first, then one entry per feature
    pub parameters: Vec<ParameterBound>,
    pub perturbed_rows: Vec<usize>,
    /// Perturbation radius applied to each perturbed value
    pub uncertain_radius: f64,
    pub n_symbols: usize,
    pub interval: bool,
}

/// Runs injection, closed-form propagation and robustness evaluation
pub struct RobustnessCertifier {
    config: RobustnessConfig,
}

impl RobustnessCertifier {
    pub fn new(config: RobustnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RobustnessConfig {
        &self.config
    }

    /// Certify a model trained on `(x_train, y_train)` against `x_test`
    pub fn certify(&self, x_train: &Table, y_train: &Array1<f64>, x_test: &Table) -> Result<RobustnessReport> {
        if x_test.column_names() != x_train.column_names() {
            return Err(RobustError::DataError(
                "test table columns differ from training columns".to_string(),
            ));
        }

        let InjectedData {
            design,
            labels,
            symbols,
            scaler,
            mut factory,
            perturbed_rows,
            radius,
        } = UncertaintyInjector::new(&self.config).inject(x_train, y_train)?;

        let mut params = solve_closed_form(&design, &labels)?;
        if self.config.interval {
            params = tighten_intervals(&params, &mut factory)?;
        }

        let test_design = design_matrix(&scaler.transform(&x_test.to_matrix()?)?);
        let predictions = predict_affine(&test_design, &params)?;
        let bounds = classify(&predictions, self.config.robustness_radius);
        let robust_ratio = robust_fraction(&bounds)?;

        info!(
            robust_ratio,
            uncertain_num = self.config.uncertain_num,
            uncertain_radius = radius,
            robustness_radius = self.config.robustness_radius,
            interval = self.config.interval,
            "Robustness certification complete"
        );

        Ok(RobustnessReport {
            robust_ratio,
            predictions: bounds,
            parameters: params
                .iter()
                .map(|p| ParameterBound {
                    center: p.center(),
                    radius: p.radius(),
                })
                .collect(),
            perturbed_rows,
            uncertain_radius: radius,
            n_symbols: symbols.len(),
            interval: self.config.interval,
        })
    }
}

/// Robust fraction of `x_test` predictions under `config`
pub fn compute_robustness_ratio(
    x_train: &Table,
    y_train: &Array1<f64>,
    x_test: &Table,
    config: &RobustnessConfig,
) -> Result<f64> {
    RobustnessCertifier::new(config.clone())
        .certify(x_train, y_train, x_test)
        .map(|r| r.robust_ratio)
}

/// Like [`compute_robustness_ratio`], perturbing the leading rows of
/// `boundary_rows` (e.g. a sensitivity ranking) instead of random rows
pub fn compute_robustness_ratio_ranked(
    x_train: &Table,
    y_train: &Array1<f64>,
    x_test: &Table,
    boundary_rows: &[usize],
    config: &RobustnessConfig,
) -> Result<f64> {
    let config = config.clone().with_ranked_rows(boundary_rows.to_vec());
    compute_robustness_ratio(x_train, y_train, x_test, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn line_data() -> (Table, Array1<f64>, Table) {
        let x = Table::from_matrix(
            vec!["x".into()],
            &array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0], [9.0]],
        )
        .unwrap();
        let y = array![0.1, 1.9, 4.2, 5.8, 8.1, 9.9, 12.2, 13.8, 16.1, 18.0];
        let x_test = Table::from_matrix(vec!["x".into()], &array![[0.5], [4.5], [8.5]]).unwrap();
        (x, y, x_test)
    }

    #[test]
    fn test_default_config() {
        let config = RobustnessConfig::default();
        assert_eq!(config.target, UncertainTarget::Label);
        assert_eq!(config.uncertain_num, 0);
        assert!(config.interval);
        assert_eq!(config.selection, RowSelection::Random);
    }

    #[test]
    fn test_validate_rejects_negative_radius() {
        let config = RobustnessConfig::default().with_radius(RadiusSpec::Absolute(-1.0));
        assert!(config.validate().is_err());
        let config = RobustnessConfig::default().with_robustness_radius(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serializes() {
        let config = RobustnessConfig::default()
            .with_target(UncertainTarget::Feature("age".into()))
            .with_radius(RadiusSpec::RangeFraction(0.1));
        let json = serde_json::to_string(&config).unwrap();
        let back: RobustnessConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.target, config.target);
        assert_eq!(back.radius, config.radius);
    }

    #[test]
    fn test_certify_report_shapes() {
        let (x, y, x_test) = line_data();
        let config = RobustnessConfig::default()
            .with_uncertain_num(2)
            .with_radius(RadiusSpec::Absolute(0.5));
        let report = RobustnessCertifier::new(config).certify(&x, &y, &x_test).unwrap();

        assert_eq!(report.predictions.len(), 3);
        assert_eq!(report.parameters.len(), 2);
        assert_eq!(report.perturbed_rows.len(), 2);
        assert_eq!(report.n_symbols, 2);
        assert!(report.parameters.iter().all(|p| p.radius > 0.0));
    }

    #[test]
    fn test_feature_uncertainty_does_not_cancel() {
        let (x, y, x_test) = line_data();
        let config = RobustnessConfig::default()
            .with_target(UncertainTarget::Feature("x".into()))
            .with_uncertain_num(1)
            .with_radius(RadiusSpec::Absolute(0.1));
        let err = compute_robustness_ratio(&x, &y, &x_test, &config).unwrap_err();
        assert!(matches!(err, RobustError::AlgebraicConsistency(_)));
    }

    #[test]
    fn test_mismatched_test_columns() {
        let (x, y, _) = line_data();
        let other = Table::from_matrix(vec!["z".into()], &array![[1.0]]).unwrap();
        let config = RobustnessConfig::default();
        assert!(compute_robustness_ratio(&x, &y, &other, &config).is_err());
    }
}
