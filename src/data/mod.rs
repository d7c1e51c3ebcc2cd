//! Data tables, train/test splitting and data sources
//!
//! Dataset loading is an external concern of the engines; this module gives
//! it a concrete shape:
//! - [`Table`] - named numeric/categorical columns with stable row ids
//! - [`Dataset`] / [`train_test_split`] - seeded partitioning
//! - [`DataSource`] - anything that can produce a split dataset (CSV via polars)

mod loader;
mod table;

pub use loader::{table_from_dataframe, CsvDataSource};
pub use table::{Column, ColumnValue, Table};

use crate::error::{Result, RobustError};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Training and test partitions of one data snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub x_train: Table,
    pub x_test: Table,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Something that can provide a split dataset
pub trait DataSource {
    fn load(&self) -> Result<Dataset>;
}

/// Shuffle rows with a seeded generator and hold out `ceil(test_size * n)`
/// of them for testing. Both partitions get fresh row ids `0..len`.
pub fn train_test_split(x: &Table, y: &Array1<f64>, test_size: f64, seed: u64) -> Result<Dataset> {
    if x.n_rows() != y.len() {
        return Err(RobustError::ShapeError {
            expected: format!("y length = {}", x.n_rows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(RobustError::invalid_parameter(
            "test_size",
            test_size,
            "must lie strictly between 0 and 1",
        ));
    }

    let n = x.n_rows();
    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(RobustError::DataError(format!(
            "cannot split {} rows with test_size {}",
            n, test_size
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut positions: Vec<usize> = (0..n).collect();
    positions.shuffle(&mut rng);
    let (test_pos, train_pos) = positions.split_at(n_test);

    Ok(Dataset {
        x_train: x.select_rows(train_pos)?,
        x_test: x.select_rows(test_pos)?,
        y_train: train_pos.iter().map(|&i| y[i]).collect(),
        y_test: test_pos.iter().map(|&i| y[i]).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn sample() -> (Table, Array1<f64>) {
        let data = Array2::from_shape_fn((20, 2), |(i, j)| (i * 2 + j) as f64);
        let x = Table::from_matrix(vec!["a".into(), "b".into()], &data).unwrap();
        let y = Array1::from_shape_fn(20, |i| i as f64);
        (x, y)
    }

    #[test]
    fn test_split_sizes() {
        let (x, y) = sample();
        let ds = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(ds.x_test.n_rows(), 4);
        assert_eq!(ds.x_train.n_rows(), 16);
        assert_eq!(ds.y_train.len(), 16);
        assert_eq!(ds.x_train.row_ids(), (0..16).collect::<Vec<_>>().as_slice());
    }

    #[test]
    fn test_split_is_seeded() {
        let (x, y) = sample();
        let a = train_test_split(&x, &y, 0.25, 7).unwrap();
        let b = train_test_split(&x, &y, 0.25, 7).unwrap();
        assert_eq!(a.y_test, b.y_test);
        assert_eq!(a.x_train, b.x_train);
    }

    #[test]
    fn test_split_keeps_rows_aligned() {
        let (x, y) = sample();
        let ds = train_test_split(&x, &y, 0.3, 1).unwrap();
        let m = ds.x_train.to_matrix().unwrap();
        for (row, label) in m.rows().into_iter().zip(ds.y_train.iter()) {
            // a = 2i, label = i
            assert_eq!(row[0], 2.0 * label);
        }
    }

    #[test]
    fn test_invalid_test_size() {
        let (x, y) = sample();
        assert!(train_test_split(&x, &y, 0.0, 1).is_err());
        assert!(train_test_split(&x, &y, 1.5, 1).is_err());
    }
}
