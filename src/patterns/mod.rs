//! Row-selecting patterns and fairness sensitivity search
//!
//! A [`Pattern`] selects the rows of a table whose value in one column
//! matches a predicate derived from an observed value of that column.
//! [`PatternSensitivityScanner`] imputes each pattern's rows and measures how
//! far a fairness metric moves.

mod sensitivity;

pub use sensitivity::{
    find_important_patterns, PatternScore, PatternSensitivityScanner, SensitivityConfig,
    SensitivityRanking,
};

use crate::data::{Column, ColumnValue, Table};
use crate::error::{Result, RobustError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row predicate on a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Exact equality, for categorical columns
    Equals(String),
    /// Strictly greater than, for numeric columns
    GreaterThan(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub feature: String,
    pub predicate: Predicate,
}

impl Pattern {
    pub fn equals(feature: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            predicate: Predicate::Equals(value.into()),
        }
    }

    pub fn greater_than(feature: impl Into<String>, value: f64) -> Self {
        Self {
            feature: feature.into(),
            predicate: Predicate::GreaterThan(value),
        }
    }

    /// The observed value the pattern was derived from
    pub fn split_value(&self) -> ColumnValue {
        match &self.predicate {
            Predicate::Equals(s) => ColumnValue::Category(s.clone()),
            Predicate::GreaterThan(v) => ColumnValue::Number(*v),
        }
    }

    /// Ids of the rows of `table` selected by this pattern
    pub fn matches(&self, table: &Table) -> Result<Vec<usize>> {
        let column = table.column(&self.feature)?;
        let positions: Vec<usize> = match (column, &self.predicate) {
            (Column::Categorical(values), Predicate::Equals(target)) => values
                .iter()
                .enumerate()
                .filter(|(_, v)| *v == target)
                .map(|(i, _)| i)
                .collect(),
            (Column::Numeric(values), Predicate::GreaterThan(split)) => values
                .iter()
                .enumerate()
                .filter(|(_, v)| **v > *split)
                .map(|(i, _)| i)
                .collect(),
            _ => {
                return Err(RobustError::DataError(format!(
                    "pattern '{}' does not fit the type of column '{}'",
                    self, self.feature
                )))
            }
        };

        let ids = table.row_ids();
        Ok(positions.into_iter().map(|p| ids[p]).collect())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.predicate {
            Predicate::Equals(v) => write!(f, "{} == {:?}", self.feature, v),
            Predicate::GreaterThan(v) => write!(f, "{} > {}", self.feature, v),
        }
    }
}

/// One pattern per distinct observed value of every column, in column order
/// then first-seen value order
pub fn enumerate_patterns(table: &Table) -> Vec<Pattern> {
    table
        .columns()
        .flat_map(|(name, column)| {
            column
                .unique_values()
                .into_iter()
                .map(move |value| match value {
                    ColumnValue::Category(s) => Pattern::equals(name, s),
                    ColumnValue::Number(v) => Pattern::greater_than(name, v),
                })
        })
        .collect()
}
