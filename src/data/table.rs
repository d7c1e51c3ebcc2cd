//! Column-oriented tables with stable row ids

use crate::error::{Result, RobustError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Numeric(Array1<f64>),
    Categorical(Vec<String>),
}

/// One observed cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValue {
    Number(f64),
    Category(String),
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Number(v) => write!(f, "{}", v),
            ColumnValue::Category(s) => f.write_str(s),
        }
    }
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, Column::Categorical(_))
    }

    pub fn value(&self, row: usize) -> ColumnValue {
        match self {
            Column::Numeric(v) => ColumnValue::Number(v[row]),
            Column::Categorical(v) => ColumnValue::Category(v[row].clone()),
        }
    }

    /// Distinct values in first-seen order
    pub fn unique_values(&self) -> Vec<ColumnValue> {
        match self {
            Column::Numeric(v) => {
                let mut seen = std::collections::HashSet::new();
                v.iter()
                    // -0.0 and 0.0 compare equal, so normalize before hashing bits
                    .filter(|x| seen.insert((**x + 0.0).to_bits()))
                    .map(|x| ColumnValue::Number(*x))
                    .collect()
            }
            Column::Categorical(v) => {
                let mut seen = std::collections::HashSet::new();
                v.iter()
                    .filter(|s| seen.insert(s.as_str()))
                    .map(|s| ColumnValue::Category(s.clone()))
                    .collect()
            }
        }
    }

    /// Per-row group labels, used to partition rows by this column's value
    pub fn group_labels(&self) -> Vec<String> {
        match self {
            Column::Numeric(v) => v.iter().map(|x| (x + 0.0).to_string()).collect(),
            Column::Categorical(v) => v.clone(),
        }
    }

    /// Value used to impute this column: the mean for numeric columns, the
    /// most frequent category (first seen wins ties) for categorical ones
    pub fn imputation_value(&self) -> Option<ColumnValue> {
        match self {
            Column::Numeric(v) => v.mean().map(ColumnValue::Number),
            Column::Categorical(v) => {
                let mut counts: HashMap<&str, usize> = HashMap::new();
                for s in v {
                    *counts.entry(s.as_str()).or_insert(0) += 1;
                }
                let mut best: Option<(&str, usize)> = None;
                for s in v {
                    let c = counts[s.as_str()];
                    if best.map_or(true, |(_, bc)| c > bc) {
                        best = Some((s.as_str(), c));
                    }
                }
                best.map(|(s, _)| ColumnValue::Category(s.to_string()))
            }
        }
    }

    fn select(&self, positions: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(positions.iter().map(|&i| v[i]).collect()),
            Column::Categorical(v) => {
                Column::Categorical(positions.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// Named columns with aligned rows.
///
/// Every row carries an integer id assigned once when the table is built.
/// Row selection and pattern matching refer to rows by id, never by the
/// position a row happens to occupy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    row_ids: Vec<usize>,
}

impl Table {
    /// Build a table; row ids default to `0..n_rows`
    pub fn new(names: Vec<String>, columns: Vec<Column>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(RobustError::ShapeError {
                expected: format!("{} column names", columns.len()),
                actual: format!("{} column names", names.len()),
            });
        }
        let n_rows = columns.first().map_or(0, Column::len);
        if let Some((name, col)) = names.iter().zip(&columns).find(|(_, c)| c.len() != n_rows) {
            return Err(RobustError::ShapeError {
                expected: format!("{} rows", n_rows),
                actual: format!("{} rows in column '{}'", col.len(), name),
            });
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(RobustError::DataError(format!("duplicate column name '{}'", dup)));
        }
        Ok(Self {
            names,
            columns,
            row_ids: (0..n_rows).collect(),
        })
    }

    /// Build an all-numeric table from a row-major matrix
    pub fn from_matrix(names: Vec<String>, data: &Array2<f64>) -> Result<Self> {
        let columns = data
            .columns()
            .into_iter()
            .map(|c| Column::Numeric(c.to_owned()))
            .collect();
        Self::new(names, columns)
    }

    /// Replace the default row ids
    pub fn with_row_ids(mut self, row_ids: Vec<usize>) -> Result<Self> {
        if row_ids.len() != self.n_rows() {
            return Err(RobustError::ShapeError {
                expected: format!("{} row ids", self.n_rows()),
                actual: format!("{} row ids", row_ids.len()),
            });
        }
        self.row_ids = row_ids;
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.row_ids.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn row_ids(&self) -> &[usize] {
        &self.row_ids
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> + '_ {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| RobustError::FeatureNotFound(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        Ok(&self.columns[self.column_index(name)?])
    }

    /// Positions of the rows carrying `ids`, in the order given.
    ///
    /// Builds one id lookup for the whole batch, so resolving `k` ids costs
    /// `O(n + k)` rather than a scan per id.
    pub fn positions_of(&self, ids: &[usize]) -> Result<Vec<usize>> {
        let lookup: HashMap<usize, usize> = self
            .row_ids
            .iter()
            .enumerate()
            .map(|(pos, &id)| (id, pos))
            .collect();
        ids.iter()
            .map(|id| {
                lookup
                    .get(id)
                    .copied()
                    .ok_or_else(|| RobustError::invalid_parameter("row id", id, "not in table"))
            })
            .collect()
    }

    /// Row-major numeric matrix; fails on categorical columns and on
    /// NaN or infinite cells
    pub fn to_matrix(&self) -> Result<Array2<f64>> {
        let mut out = Array2::zeros((self.n_rows(), self.n_cols()));
        for (j, (name, col)) in self.columns().enumerate() {
            match col {
                Column::Numeric(v) => {
                    if let Some(pos) = v.iter().position(|x| !x.is_finite()) {
                        return Err(RobustError::DataError(format!(
                            "column '{}' holds non-finite value {} at row {}",
                            name, v[pos], self.row_ids[pos]
                        )));
                    }
                    out.column_mut(j).assign(v)
                }
                Column::Categorical(_) => {
                    return Err(RobustError::DataError(format!(
                        "column '{}' is categorical; a numeric matrix is required",
                        name
                    )))
                }
            }
        }
        Ok(out)
    }

    /// Rows at `positions`, renumbered `0..positions.len()`
    pub fn select_rows(&self, positions: &[usize]) -> Result<Table> {
        if let Some(&bad) = positions.iter().find(|&&p| p >= self.n_rows()) {
            return Err(RobustError::invalid_parameter(
                "row position",
                bad,
                format!("table has {} rows", self.n_rows()),
            ));
        }
        Table::new(
            self.names.clone(),
            self.columns.iter().map(|c| c.select(positions)).collect(),
        )
    }

    /// Overwrite `column` at the rows carrying `ids` with `value`
    pub fn set_values(&mut self, column: &str, ids: &[usize], value: &ColumnValue) -> Result<()> {
        let j = self.column_index(column)?;
        let positions = self.positions_of(ids)?;

        match (&mut self.columns[j], value) {
            (Column::Numeric(v), ColumnValue::Number(x)) => {
                for p in positions {
                    v[p] = *x;
                }
            }
            (Column::Categorical(v), ColumnValue::Category(s)) => {
                for p in positions {
                    v[p] = s.clone();
                }
            }
            _ => {
                return Err(RobustError::DataError(format!(
                    "value '{}' does not match the type of column '{}'",
                    value, column
                )))
            }
        }
        Ok(())
    }
}
