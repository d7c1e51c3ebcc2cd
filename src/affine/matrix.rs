//! Matrix algebra over affine forms

use super::{AffineForm, Symbol};
use crate::error::{Result, RobustError};
use ndarray::{Array1, Array2};
use std::collections::BTreeSet;

/// Promote a plain matrix to a symbolic one
pub fn lift_matrix(m: &Array2<f64>) -> Array2<AffineForm> {
    m.mapv(AffineForm::constant)
}

/// Promote a plain vector to a symbolic one
pub fn lift_vector(v: &Array1<f64>) -> Array1<AffineForm> {
    v.mapv(AffineForm::constant)
}

/// Every symbol appearing in any entry
pub fn free_symbols<'a, I>(entries: I) -> BTreeSet<Symbol>
where
    I: IntoIterator<Item = &'a AffineForm>,
{
    entries
        .into_iter()
        .flat_map(|e| e.free_symbols())
        .collect()
}

/// Centers of a symbol-free matrix; fails if any entry is still uncertain
pub fn to_concrete(m: &Array2<AffineForm>) -> Result<Array2<f64>> {
    if let Some(((i, j), e)) = m.indexed_iter().find(|(_, e)| !e.is_constant()) {
        return Err(RobustError::AlgebraicConsistency(format!(
            "entry ({}, {}) still carries uncertainty: {}",
            i, j, e
        )));
    }
    Ok(m.map(|e| e.center()))
}

fn dot<'a, A, B>(lhs: A, rhs: B) -> Result<AffineForm>
where
    A: Iterator<Item = &'a AffineForm>,
    B: Iterator<Item = &'a AffineForm>,
{
    let mut acc = AffineForm::constant(0.0);
    for (a, b) in lhs.zip(rhs) {
        acc += &a.try_mul(b)?;
    }
    Ok(acc)
}

/// `XᵗX` for a symbolic design matrix
pub fn gram(x: &Array2<AffineForm>) -> Result<Array2<AffineForm>> {
    let p = x.ncols();
    let mut out = Array2::from_elem((p, p), AffineForm::default());
    for i in 0..p {
        for j in i..p {
            let v = dot(x.column(i).iter(), x.column(j).iter())?;
            if i != j {
                out[[j, i]] = v.clone();
            }
            out[[i, j]] = v;
        }
    }
    Ok(out)
}

/// `Xᵗy` for a symbolic design matrix and target
pub fn transpose_mul_vec(x: &Array2<AffineForm>, y: &Array1<AffineForm>) -> Result<Array1<AffineForm>> {
    if x.nrows() != y.len() {
        return Err(RobustError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    x.columns()
        .into_iter()
        .map(|col| dot(col.iter(), y.iter()))
        .collect::<Result<Vec<_>>>()
        .map(Array1::from)
}

/// `A v` for a plain matrix and a symbolic vector; always affine
pub fn concrete_mul_vec(a: &Array2<f64>, v: &Array1<AffineForm>) -> Result<Array1<AffineForm>> {
    if a.ncols() != v.len() {
        return Err(RobustError::ShapeError {
            expected: format!("vector length = {}", a.ncols()),
            actual: format!("vector length = {}", v.len()),
        });
    }
    let out = a
        .rows()
        .into_iter()
        .map(|row| {
            let mut acc = AffineForm::constant(0.0);
            for (coef, entry) in row.iter().zip(v.iter()) {
                acc += &entry.scale(*coef);
            }
            acc
        })
        .collect::<Vec<_>>();
    Ok(Array1::from(out))
}
