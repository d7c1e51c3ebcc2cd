//! Fairness sensitivity of pattern imputations

use super::{enumerate_patterns, Pattern};
use crate::data::Table;
use crate::error::{Result, RobustError};
use crate::fairness::FairnessMetric;
use crate::training::ProbabilisticClassifier;
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Configuration for a sensitivity scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityConfig {
    /// Patterns must move the metric by strictly more than this
    pub threshold: f64,
    pub metric: FairnessMetric,
    /// Evaluate patterns on the rayon pool
    pub parallel: bool,
    /// Binarise probabilities at this cut-off before computing the metric
    pub decision_threshold: Option<f64>,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            metric: FairnessMetric::StatisticalParity,
            parallel: false,
            decision_threshold: None,
        }
    }
}

impl SensitivityConfig {
    pub fn new(metric: FairnessMetric) -> Self {
        Self {
            metric,
            ..Default::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_decision_threshold(mut self, cutoff: f64) -> Self {
        self.decision_threshold = Some(cutoff);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(RobustError::invalid_parameter(
                "sensitivity_threshold",
                self.threshold,
                "must be finite",
            ));
        }
        if let Some(cutoff) = self.decision_threshold {
            if !(0.0..=1.0).contains(&cutoff) {
                return Err(RobustError::invalid_parameter(
                    "decision_threshold",
                    cutoff,
                    "must lie in [0, 1]",
                ));
            }
        }
        Ok(())
    }
}

/// Metric movement caused by imputing one pattern's rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternScore {
    pub pattern: Pattern,
    /// Ids of the imputed rows
    pub rows: Vec<usize>,
    pub baseline: f64,
    pub updated: f64,
    /// `|updated - baseline|`, NaN when either side is undefined
    pub sensitivity: f64,
}

/// Row ids ordered by their best sensitivity, highest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityRanking {
    pub indices: Vec<usize>,
    /// Best sensitivity of each entry of `indices`
    pub scores: Vec<f64>,
    /// Every evaluated pattern that matched at least one row
    pub pattern_scores: Vec<PatternScore>,
}

impl SensitivityRanking {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Per-column state shared by all patterns on that column
struct FeatureContext {
    groups: Vec<String>,
    baseline: f64,
}

/// Scores every pattern of a table against a fitted classifier.
///
/// The sensitive attribute of each pattern is the pattern's own column,
/// grouped by the values of the unmodified table.
pub struct PatternSensitivityScanner<'a, C: ProbabilisticClassifier + ?Sized> {
    classifier: &'a C,
    config: SensitivityConfig,
}

impl<'a, C: ProbabilisticClassifier + ?Sized> PatternSensitivityScanner<'a, C> {
    pub fn new(classifier: &'a C, config: SensitivityConfig) -> Self {
        Self { classifier, config }
    }

    pub fn config(&self) -> &SensitivityConfig {
        &self.config
    }

    fn predictions(&self, x: &Table) -> Result<Array1<f64>> {
        let proba = self.classifier.predict_proba(x)?;
        if proba.len() != x.n_rows() {
            return Err(RobustError::ShapeError {
                expected: format!("{} probabilities", x.n_rows()),
                actual: format!("{} probabilities", proba.len()),
            });
        }
        Ok(match self.config.decision_threshold {
            Some(cutoff) => proba.mapv(|p| if p >= cutoff { 1.0 } else { 0.0 }),
            None => proba,
        })
    }

    fn evaluate(
        &self,
        pattern: &Pattern,
        x: &Table,
        y: &Array1<f64>,
        context: &HashMap<&str, FeatureContext>,
    ) -> Result<Option<PatternScore>> {
        let rows = pattern.matches(x)?;
        if rows.is_empty() {
            return Ok(None);
        }

        let feature = context
            .get(pattern.feature.as_str())
            .ok_or_else(|| RobustError::FeatureNotFound(pattern.feature.clone()))?;
        let fill = x
            .column(&pattern.feature)?
            .imputation_value()
            .ok_or_else(|| RobustError::DataError(format!("column '{}' is empty", pattern.feature)))?;

        let mut modified = x.clone();
        modified.set_values(&pattern.feature, &rows, &fill)?;

        let proba = self.predictions(&modified)?;
        let updated = self.config.metric.compute(y, &proba, &feature.groups)?;
        let sensitivity = (updated - feature.baseline).abs();

        debug!(pattern = %pattern, matched = rows.len(), sensitivity, "Evaluated pattern");

        Ok(Some(PatternScore {
            pattern: pattern.clone(),
            rows,
            baseline: feature.baseline,
            updated,
            sensitivity,
        }))
    }

    /// Rank the rows of `x` by how much imputing them moves the metric
    pub fn scan(&self, x: &Table, y: &Array1<f64>) -> Result<SensitivityRanking> {
        self.config.validate()?;
        if y.len() != x.n_rows() {
            return Err(RobustError::ShapeError {
                expected: format!("{} labels", x.n_rows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let baseline_proba = self.predictions(x)?;
        let context = x
            .columns()
            .map(|(name, column)| {
                let groups = column.group_labels();
                let baseline = self.config.metric.compute(y, &baseline_proba, &groups)?;
                Ok((name, FeatureContext { groups, baseline }))
            })
            .collect::<Result<HashMap<_, _>>>()?;

        let patterns = enumerate_patterns(x);
        info!(
            patterns = patterns.len(),
            metric = %self.config.metric,
            parallel = self.config.parallel,
            "Scanning pattern sensitivity"
        );

        let evaluated: Vec<Option<PatternScore>> = if self.config.parallel {
            patterns
                .par_iter()
                .map(|p| self.evaluate(p, x, y, &context))
                .collect::<Result<_>>()?
        } else {
            patterns
                .iter()
                .map(|p| self.evaluate(p, x, y, &context))
                .collect::<Result<_>>()?
        };
        let pattern_scores: Vec<PatternScore> = evaluated.into_iter().flatten().collect();

        let mut order = Vec::new();
        let mut best: HashMap<usize, f64> = HashMap::new();
        // NaN sensitivities never pass the comparison
        for score in pattern_scores
            .iter()
            .filter(|s| s.sensitivity > self.config.threshold)
        {
            for &id in &score.rows {
                match best.get_mut(&id) {
                    Some(s) => {
                        if score.sensitivity > *s {
                            *s = score.sensitivity;
                        }
                    }
                    None => {
                        best.insert(id, score.sensitivity);
                        order.push(id);
                    }
                }
            }
        }

        let n_rows = x.n_rows();
        let mut ranked: Vec<(usize, f64)> = order
            .into_iter()
            .filter(|&id| id < n_rows)
            .map(|id| (id, best[&id]))
            .collect();
        // Stable, so ties keep first-seen order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        info!(
            ranked_rows = ranked.len(),
            important_patterns = pattern_scores
                .iter()
                .filter(|s| s.sensitivity > self.config.threshold)
                .count(),
            "Pattern sensitivity scan complete"
        );

        let (indices, scores) = ranked.into_iter().unzip();
        Ok(SensitivityRanking {
            indices,
            scores,
            pattern_scores,
        })
    }
}

/// Row ids whose imputation moves the selected metric (`0` SPD, `1` TPR
/// parity, `2` predictive parity) by more than `threshold`, most sensitive
/// first
pub fn find_important_patterns<C: ProbabilisticClassifier + ?Sized>(
    x: &Table,
    y: &Array1<f64>,
    classifier: &C,
    metric: i64,
    threshold: f64,
) -> Result<Vec<usize>> {
    let metric = FairnessMetric::from_selector(metric)?;
    let config = SensitivityConfig::new(metric).with_threshold(threshold);
    PatternSensitivityScanner::new(classifier, config)
        .scan(x, y)
        .map(|r| r.indices)
}
