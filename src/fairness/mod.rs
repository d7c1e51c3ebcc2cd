//! Group fairness metrics
//!
//! Each metric partitions rows by the distinct values of a sensitive
//! attribute, computes one statistic per group and reports the spread
//! `max - min` across groups:
//! - [`FairnessMetric::StatisticalParity`] - mean prediction per group
//! - [`FairnessMetric::TprParity`] - rate of (predicted positive AND actual
//!   positive) over the whole group
//! - [`FairnessMetric::PredictiveParity`] - mean actual label among the
//!   group's predicted positives
//!
//! A group with no qualifying rows yields NaN, and NaN propagates to the
//! spread instead of raising an error.

use crate::error::{Result, RobustError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance when comparing a value against the positive label
const POSITIVE_TOLERANCE: f64 = 1e-10;

fn is_positive(v: f64) -> bool {
    (v - 1.0).abs() < POSITIVE_TOLERANCE
}

/// Selectable group fairness metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FairnessMetric {
    /// Statistical parity difference (selector 0)
    StatisticalParity,
    /// True-positive-rate parity (selector 1)
    TprParity,
    /// Predictive parity (selector 2)
    PredictiveParity,
}

impl FairnessMetric {
    /// Map the numeric selector `0 | 1 | 2` to a metric
    pub fn from_selector(selector: i64) -> Result<Self> {
        match selector {
            0 => Ok(FairnessMetric::StatisticalParity),
            1 => Ok(FairnessMetric::TprParity),
            2 => Ok(FairnessMetric::PredictiveParity),
            other => Err(RobustError::invalid_parameter(
                "metric",
                other,
                "expected 0 (SPD), 1 (TPR parity) or 2 (predictive parity)",
            )),
        }
    }

    pub fn selector(&self) -> i64 {
        match self {
            FairnessMetric::StatisticalParity => 0,
            FairnessMetric::TprParity => 1,
            FairnessMetric::PredictiveParity => 2,
        }
    }

    /// Per-group statistics in first-seen group order
    pub fn group_statistics(
        &self,
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
        groups: &[String],
    ) -> Result<Vec<GroupStatistic>> {
        validate_lengths(y_true, y_pred, groups)?;

        let stats = unique_in_order(groups)
            .into_iter()
            .map(|group| {
                let members: Vec<usize> = groups
                    .iter()
                    .enumerate()
                    .filter(|(_, g)| g.as_str() == group)
                    .map(|(i, _)| i)
                    .collect();

                let value = match self {
                    FairnessMetric::StatisticalParity => {
                        mean(members.iter().map(|&i| y_pred[i]))
                    }
                    FairnessMetric::TprParity => mean(members.iter().map(|&i| {
                        if is_positive(y_pred[i]) && is_positive(y_true[i]) {
                            1.0
                        } else {
                            0.0
                        }
                    })),
                    FairnessMetric::PredictiveParity => mean(
                        members
                            .iter()
                            .filter(|&&i| is_positive(y_pred[i]))
                            .map(|&i| y_true[i]),
                    ),
                };

                GroupStatistic {
                    group: group.to_string(),
                    size: members.len(),
                    value,
                }
            })
            .collect();

        Ok(stats)
    }

    /// Spread `max - min` of the per-group statistic
    pub fn compute(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>, groups: &[String]) -> Result<f64> {
        let stats = self.group_statistics(y_true, y_pred, groups)?;
        Ok(spread(stats.iter().map(|s| s.value)))
    }
}

impl TryFrom<i64> for FairnessMetric {
    type Error = RobustError;

    fn try_from(selector: i64) -> Result<Self> {
        FairnessMetric::from_selector(selector)
    }
}

impl fmt::Display for FairnessMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FairnessMetric::StatisticalParity => "statistical parity difference",
            FairnessMetric::TprParity => "TPR parity",
            FairnessMetric::PredictiveParity => "predictive parity",
        };
        f.write_str(name)
    }
}

/// Statistic of one group of the sensitive attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatistic {
    pub group: String,
    pub size: usize,
    pub value: f64,
}

/// Statistical parity difference
pub fn statistical_parity_difference(y_pred: &Array1<f64>, groups: &[String]) -> Result<f64> {
    // Labels are not read by this metric
    let y_true = Array1::zeros(y_pred.len());
    FairnessMetric::StatisticalParity.compute(&y_true, y_pred, groups)
}

/// TPR parity, as a joint rate over group size
pub fn tpr_parity(y_true: &Array1<f64>, y_pred: &Array1<f64>, groups: &[String]) -> Result<f64> {
    FairnessMetric::TprParity.compute(y_true, y_pred, groups)
}

pub fn predictive_parity(y_true: &Array1<f64>, y_pred: &Array1<f64>, groups: &[String]) -> Result<f64> {
    FairnessMetric::PredictiveParity.compute(y_true, y_pred, groups)
}

fn validate_lengths(y_true: &Array1<f64>, y_pred: &Array1<f64>, groups: &[String]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(RobustError::FairnessError(
            "Predictions and actuals must have the same length".to_string(),
        ));
    }
    if groups.len() != y_pred.len() {
        return Err(RobustError::FairnessError(format!(
            "Sensitive attribute has {} values, expected {}",
            groups.len(),
            y_pred.len()
        )));
    }
    Ok(())
}

fn unique_in_order(groups: &[String]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    groups
        .iter()
        .map(String::as_str)
        .filter(|g| seen.insert(*g))
        .collect()
}

/// Mean of the values, NaN when there are none
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// `max - min`, NaN if any value is NaN or there are no values
fn spread(values: impl Iterator<Item = f64>) -> f64 {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    let mut any = false;
    for v in values {
        if v.is_nan() {
            return f64::NAN;
        }
        lo = lo.min(v);
        hi = hi.max(v);
        any = true;
    }
    if any {
        hi - lo
    } else {
        f64::NAN
    }
}
