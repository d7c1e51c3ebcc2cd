//! Affine forms: `center + Σ weight_i * symbol_i`

use super::Symbol;
use crate::error::{Result, RobustError};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A quantity known up to a linear combination of unit-interval symbols.
///
/// The constant part is stored once, in `center`. Every other contribution
/// is a signed weight on a symbol; weights that cancel to exactly zero are
/// dropped so cancellation is observable through [`AffineForm::is_constant`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AffineForm {
    center: f64,
    terms: BTreeMap<Symbol, f64>,
}

impl AffineForm {
    /// A plain number with no uncertainty
    pub fn constant(center: f64) -> Self {
        Self {
            center,
            terms: BTreeMap::new(),
        }
    }

    /// `center + weight * symbol`
    pub fn with_symbol(center: f64, symbol: Symbol, weight: f64) -> Self {
        let mut form = Self::constant(center);
        form.add_term(symbol, weight);
        form
    }

    pub fn center(&self) -> f64 {
        self.center
    }

    /// Symbol-weighted terms in symbol order
    pub fn terms(&self) -> impl Iterator<Item = (&Symbol, f64)> + '_ {
        self.terms.iter().map(|(s, w)| (s, *w))
    }

    pub fn coefficient(&self, symbol: &Symbol) -> Option<f64> {
        self.terms.get(symbol).copied()
    }

    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        self.terms.keys().cloned().collect()
    }

    /// Worst-case deviation from the center: `Σ |weight_i|`
    pub fn radius(&self) -> f64 {
        self.terms.values().map(|w| w.abs()).sum()
    }

    /// Interval hull `[center - radius, center + radius]`
    pub fn bounds(&self) -> (f64, f64) {
        let r = self.radius();
        (self.center - r, self.center + r)
    }

    /// Accumulate `weight * symbol` into this form
    pub fn add_term(&mut self, symbol: Symbol, weight: f64) {
        match self.terms.entry(symbol) {
            Entry::Occupied(mut e) => {
                *e.get_mut() += weight;
                if *e.get() == 0.0 {
                    e.remove();
                }
            }
            Entry::Vacant(e) => {
                if weight != 0.0 {
                    e.insert(weight);
                }
            }
        }
    }

    /// Multiply by a plain number
    pub fn scale(&self, factor: f64) -> Self {
        let terms = self
            .terms
            .iter()
            .map(|(s, w)| (s.clone(), w * factor))
            .filter(|(_, w)| *w != 0.0)
            .collect();
        Self {
            center: self.center * factor,
            terms,
        }
    }

    /// Product of two forms. Only defined when at least one side is constant;
    /// a product of two uncertain quantities is quadratic in the symbols.
    pub fn try_mul(&self, other: &AffineForm) -> Result<AffineForm> {
        match (self.is_constant(), other.is_constant()) {
            (_, true) => Ok(self.scale(other.center)),
            (true, false) => Ok(other.scale(self.center)),
            (false, false) => Err(RobustError::AlgebraicConsistency(format!(
                "product of two uncertain quantities is not affine: ({}) * ({})",
                self, other
            ))),
        }
    }

    /// Split into `(constant, aggregate radius)`.
    ///
    /// Fails if the constant or any weight is not finite, which means the
    /// form no longer separates into one constant and signed symbol terms.
    pub fn split_constant(&self) -> Result<(f64, f64)> {
        if !self.center.is_finite() {
            return Err(RobustError::AlgebraicConsistency(format!(
                "constant part is not a single finite value: {}",
                self.center
            )));
        }
        if let Some((s, w)) = self.terms.iter().find(|(_, w)| !w.is_finite()) {
            return Err(RobustError::AlgebraicConsistency(format!(
                "term {} has non-finite weight {}",
                s, w
            )));
        }
        Ok((self.center, self.radius()))
    }

    /// Replace all symbol terms with a single fresh symbol weighted by the
    /// aggregate radius. Correlations between the original symbols are lost,
    /// so the result over-approximates the original.
    pub fn collapse(&self, symbol: Symbol) -> Result<AffineForm> {
        if self.is_constant() {
            return Ok(self.clone());
        }
        let (center, radius) = self.split_constant()?;
        Ok(Self::with_symbol(center, symbol, radius))
    }
}

impl From<f64> for AffineForm {
    fn from(v: f64) -> Self {
        AffineForm::constant(v)
    }
}

impl AddAssign<&AffineForm> for AffineForm {
    fn add_assign(&mut self, rhs: &AffineForm) {
        self.center += rhs.center;
        for (s, w) in &rhs.terms {
            self.add_term(s.clone(), *w);
        }
    }
}

impl Add<&AffineForm> for &AffineForm {
    type Output = AffineForm;

    fn add(self, rhs: &AffineForm) -> AffineForm {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl Add for AffineForm {
    type Output = AffineForm;

    fn add(mut self, rhs: AffineForm) -> AffineForm {
        self += &rhs;
        self
    }
}

impl Neg for &AffineForm {
    type Output = AffineForm;

    fn neg(self) -> AffineForm {
        self.scale(-1.0)
    }
}

impl Sub<&AffineForm> for &AffineForm {
    type Output = AffineForm;

    fn sub(self, rhs: &AffineForm) -> AffineForm {
        self + &(-rhs)
    }
}

impl Mul<f64> for &AffineForm {
    type Output = AffineForm;

    fn mul(self, rhs: f64) -> AffineForm {
        self.scale(rhs)
    }
}

impl fmt::Display for AffineForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.center)?;
        for (s, w) in &self.terms {
            if *w < 0.0 {
                write!(f, " - {}*{}", -w, s)?;
            } else {
                write!(f, " + {}*{}", w, s)?;
            }
        }
        Ok(())
    }
}
