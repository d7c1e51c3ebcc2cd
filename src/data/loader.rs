//! CSV loading via polars

use super::{train_test_split, Column, DataSource, Dataset, Table};
use crate::error::{Result, RobustError};
use ndarray::Array1;
use polars::prelude::*;
use std::fs::File;
use std::path::PathBuf;
use tracing::info;

/// Convert a polars frame into a [`Table`].
///
/// String columns become categorical; everything else is cast to `f64`.
/// Nulls are rejected since neither engine has a notion of a missing cell.
pub fn table_from_dataframe(df: &DataFrame) -> Result<Table> {
    let mut names = Vec::with_capacity(df.width());
    let mut columns = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let name = series.name().to_string();
        if series.null_count() > 0 {
            return Err(RobustError::DataError(format!(
                "column '{}' contains {} null values",
                name,
                series.null_count()
            )));
        }

        let col = match series.dtype() {
            DataType::String => {
                let values = series
                    .str()?
                    .into_iter()
                    .map(|v| v.unwrap_or_default().to_string())
                    .collect();
                Column::Categorical(values)
            }
            _ => {
                let cast = series.cast(&DataType::Float64)?;
                let values: Array1<f64> = cast
                    .f64()?
                    .into_iter()
                    .map(|v| v.unwrap_or(f64::NAN))
                    .collect();
                Column::Numeric(values)
            }
        };
        names.push(name);
        columns.push(col);
    }

    Table::new(names, columns)
}

/// Reads a CSV file, separates the label column and splits train/test
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    path: PathBuf,
    target: String,
    test_size: f64,
    seed: u64,
}

impl CsvDataSource {
    pub fn new(path: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            target: target.into(),
            test_size: 0.2,
            seed: 42,
        }
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn read_frame(&self) -> Result<DataFrame> {
        let file = File::open(&self.path)?;
        let reader = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .into_reader_with_file_handle(file);
        Ok(reader.finish()?)
    }
}

impl DataSource for CsvDataSource {
    fn load(&self) -> Result<Dataset> {
        let df = self.read_frame()?;
        let table = table_from_dataframe(&df)?;

        let label_idx = table.column_index(&self.target)?;
        let labels = match table.column(&self.target)? {
            Column::Numeric(v) => v.clone(),
            Column::Categorical(_) => {
                return Err(RobustError::DataError(format!(
                    "label column '{}' must be numeric",
                    self.target
                )))
            }
        };

        let (names, columns): (Vec<String>, Vec<Column>) = table
            .columns()
            .enumerate()
            .filter(|(j, _)| *j != label_idx)
            .map(|(_, (name, col))| (name.to_string(), col.clone()))
            .unzip();
        let features = Table::new(names, columns)?;

        info!(
            path = %self.path.display(),
            rows = features.n_rows(),
            features = features.n_cols(),
            "Loaded dataset"
        );

        train_test_split(&features, &labels, self.test_size, self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_from_dataframe_mixed_types() {
        let df = df!(
            "age" => &[25i64, 30, 35],
            "sex" => &["m", "f", "m"],
            "score" => &[0.5, 0.7, 0.9],
        )
        .unwrap();

        let table = table_from_dataframe(&df).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert!(table.column("sex").unwrap().is_categorical());
        match table.column("age").unwrap() {
            Column::Numeric(v) => assert_eq!(v[2], 35.0),
            _ => panic!("age should be numeric"),
        }
    }

    #[test]
    fn test_null_cells_rejected() {
        let df = df!("a" => &[Some(1.0), None]).unwrap();
        assert!(matches!(table_from_dataframe(&df), Err(RobustError::DataError(_))));

        let df = df!("g" => &[Some("x"), None]).unwrap();
        assert!(matches!(table_from_dataframe(&df), Err(RobustError::DataError(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = CsvDataSource::new("/nonexistent/data.csv", "target");
        assert!(matches!(source.load(), Err(RobustError::IoError(_))));
    }
}
