//! Injection of bounded uncertainty into training rows

use super::{RadiusSpec, RobustnessConfig, RowSelection, UncertainTarget};
use crate::affine::{lift_matrix, lift_vector, AffineForm, SymbolFactory, SymbolSet};
use crate::data::Table;
use crate::error::{Result, RobustError};
use crate::preprocessing::{design_matrix, StandardScaler};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, warn};

/// Symbolic training data produced by one injection call
#[derive(Debug, Clone)]
pub struct InjectedData {
    /// Intercept column plus standardized features
    pub design: Array2<AffineForm>,
    pub labels: Array1<AffineForm>,
    pub symbols: SymbolSet,
    /// Scaler fitted on the training features; test data must go through it
    pub scaler: StandardScaler,
    /// Factory that issued `symbols`; later symbols continue its numbering
    pub factory: SymbolFactory,
    /// Row ids of the perturbed rows, in injection order
    pub perturbed_rows: Vec<usize>,
    /// Radius actually applied (after resolving a range fraction)
    pub radius: f64,
}

/// Rewrites selected training entries as `value + radius * symbol`
pub struct UncertaintyInjector<'a> {
    config: &'a RobustnessConfig,
}

impl<'a> UncertaintyInjector<'a> {
    pub fn new(config: &'a RobustnessConfig) -> Self {
        Self { config }
    }

    pub fn inject(&self, x: &Table, y: &Array1<f64>) -> Result<InjectedData> {
        self.config.validate()?;
        if x.n_rows() != y.len() {
            return Err(RobustError::ShapeError {
                expected: format!("y length = {}", x.n_rows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.n_rows() == 0 {
            return Err(RobustError::DataError("training table is empty".to_string()));
        }

        // Resolve the target column first: an unknown feature aborts the call
        let target_col = match &self.config.target {
            UncertainTarget::Label => None,
            UncertainTarget::Feature(name) => Some(x.column_index(name)? + 1),
        };

        let mut scaler = StandardScaler::new();
        let design = design_matrix(&scaler.fit_transform(&x.to_matrix()?)?);

        let radius = match self.config.radius {
            RadiusSpec::Absolute(r) => r,
            RadiusSpec::RangeFraction(pct) => {
                let observed = match target_col {
                    Some(j) => value_range(design.column(j).iter()),
                    None => value_range(y.iter()),
                };
                pct * observed
            }
        };

        let positions = self.select_positions(x)?;
        let perturbed_rows: Vec<usize> = positions.iter().map(|&p| x.row_ids()[p]).collect();
        debug!(
            rows = ?perturbed_rows,
            radius,
            target = ?self.config.target,
            "Injecting uncertainty"
        );

        let mut factory = SymbolFactory::new();
        let mut symbols = SymbolSet::new();
        let mut design_symb = lift_matrix(&design);
        let mut labels_symb = lift_vector(y);

        for &pos in &positions {
            let symbol = factory.create();
            symbols.insert(symbol.clone());
            match target_col {
                None => labels_symb[pos].add_term(symbol, radius),
                Some(j) => design_symb[[pos, j]].add_term(symbol, radius),
            }
        }

        Ok(InjectedData {
            design: design_symb,
            labels: labels_symb,
            symbols,
            scaler,
            factory,
            perturbed_rows,
            radius,
        })
    }

    /// Row positions to perturb, in injection order
    fn select_positions(&self, x: &Table) -> Result<Vec<usize>> {
        let count = self.config.uncertain_num;
        match &self.config.selection {
            RowSelection::Random => {
                if count > x.n_rows() {
                    return Err(RobustError::invalid_parameter(
                        "uncertain_num",
                        count,
                        format!("cannot pick more than {} rows without replacement", x.n_rows()),
                    ));
                }
                // Take a prefix of a full seeded shuffle: selections for
                // growing counts are nested under the same seed
                let mut rng = StdRng::seed_from_u64(self.config.seed);
                let mut positions: Vec<usize> = (0..x.n_rows()).collect();
                positions.shuffle(&mut rng);
                positions.truncate(count);
                Ok(positions)
            }
            RowSelection::Ranked(ids) => {
                if ids.len() < count {
                    warn!(
                        requested = count,
                        available = ids.len(),
                        "Ranked row list shorter than uncertain_num"
                    );
                }
                x.positions_of(&ids[..count.min(ids.len())])
            }
        }
    }
}

fn value_range<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });
    if lo.is_finite() && hi.is_finite() {
        hi - lo
    } else {
        0.0
    }
}
