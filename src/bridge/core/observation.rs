//! Observation operator of a segment — `v = L·x + η`, `η ~ N(0, Σ)`.
//!
//! Purpose
//! -------
//! Bundle the observation operator `L`, the noise covariance `Σ` and the
//! observed (or pinned) value `v` at the right endpoint of a segment, with
//! shape checks done once at construction.
//!
//! Invariants & assumptions
//! ------------------------
//! - `L` is `m × d`, `Σ` is `m × m`, `v` has length `m`, all entries finite.
//! - Positive definiteness of `Σ` is checked when the terminal condition of a
//!   bridge is formed, where the failing segment index is known.
//!
//! Conventions
//! -----------
//! - An exact pin is an observation with `L = I_d` and `Σ = ε·I_d`; blocking
//!   schedules use it to condition a block on the sampled path at a knot.
use crate::bridge::errors::{BridgeError, BridgeResult};
use nalgebra::{DMatrix, DVector};

/// Observation — `(L, Σ, v)` at the right endpoint of a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    l: DMatrix<f64>,
    sigma: DMatrix<f64>,
    v: DVector<f64>,
}

impl Observation {
    /// Construct a validated observation.
    ///
    /// Parameters
    /// ----------
    /// - `l`: `DMatrix<f64>`
    ///   Observation operator of shape `m × d` with `m, d ≥ 1`.
    /// - `sigma`: `DMatrix<f64>`
    ///   Noise covariance of shape `m × m`.
    /// - `v`: `DVector<f64>`
    ///   Observed value of length `m`.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::ObservationShape` when the shapes disagree or `L` is
    ///   empty.
    /// - `BridgeError::NonFiniteObservation` when any entry is NaN/±inf.
    pub fn new(l: DMatrix<f64>, sigma: DMatrix<f64>, v: DVector<f64>) -> BridgeResult<Self> {
        let m = l.nrows();
        if m == 0 || l.ncols() == 0 {
            return Err(BridgeError::ObservationShape { what: "operator L", expected: 1, found: 0 });
        }
        if sigma.nrows() != m {
            return Err(BridgeError::ObservationShape {
                what: "covariance rows",
                expected: m,
                found: sigma.nrows(),
            });
        }
        if sigma.ncols() != m {
            return Err(BridgeError::ObservationShape {
                what: "covariance columns",
                expected: m,
                found: sigma.ncols(),
            });
        }
        if v.len() != m {
            return Err(BridgeError::ObservationShape {
                what: "value",
                expected: m,
                found: v.len(),
            });
        }
        if l.iter().any(|x| !x.is_finite()) {
            return Err(BridgeError::NonFiniteObservation { what: "operator L" });
        }
        if sigma.iter().any(|x| !x.is_finite()) {
            return Err(BridgeError::NonFiniteObservation { what: "covariance" });
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(BridgeError::NonFiniteObservation { what: "value" });
        }
        Ok(Observation { l, sigma, v })
    }

    /// Exact pin at `v`: `L = I_d`, `Σ = ε·I_d` with `d = v.len()`.
    pub fn exact_pin(v: DVector<f64>, epsilon: f64) -> BridgeResult<Self> {
        let d = v.len();
        Observation::new(
            DMatrix::identity(d, d),
            DMatrix::from_diagonal_element(d, d, epsilon),
            v,
        )
    }

    /// Same operator and covariance, new observed value.
    pub fn with_value(&self, v: DVector<f64>) -> BridgeResult<Self> {
        Observation::new(self.l.clone(), self.sigma.clone(), v)
    }

    pub fn l(&self) -> &DMatrix<f64> {
        &self.l
    }

    pub fn sigma(&self) -> &DMatrix<f64> {
        &self.sigma
    }

    pub fn v(&self) -> &DVector<f64> {
        &self.v
    }

    /// Dimension `m` of the observation.
    pub fn obs_dim(&self) -> usize {
        self.l.nrows()
    }

    /// Dimension `d` of the state the operator acts on.
    pub fn state_dim(&self) -> usize {
        self.l.ncols()
    }
}
