//! Isotropic Ornstein–Uhlenbeck process in `d` dimensions.
//!
//! `dX = −λ (X − μ) dt + s dW` with θ = `[λ, μ, s]`. The process is linear, so
//! it serves both as a target law and as its own exact auxiliary law; this
//! makes it the reference model for checking backward recursions against
//! closed-form transition densities.
use crate::bridge::{
    core::law::{AuxiliaryLaw, DiffusionLaw, TargetLaw, validate_theta},
    errors::{BridgeError, BridgeResult},
};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView1};

/// Number of entries of θ.
pub const OU_N_PARAMS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct OrnsteinUhlenbeck {
    dim: usize,
    theta: Array1<f64>,
}

impl OrnsteinUhlenbeck {
    /// Construct a `dim`-dimensional OU law with `theta = [rate, mean, vol]`.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::InvalidDimension` if `dim == 0`.
    /// - Any error of [`DiffusionLaw::set_params`].
    pub fn new(dim: usize, theta: ArrayView1<'_, f64>) -> BridgeResult<Self> {
        if dim == 0 {
            return Err(BridgeError::InvalidDimension { dim });
        }
        let mut law = OrnsteinUhlenbeck { dim, theta: Array1::zeros(OU_N_PARAMS) };
        law.set_params(theta)?;
        Ok(law)
    }

    pub fn rate(&self) -> f64 {
        self.theta[0]
    }

    pub fn mean(&self) -> f64 {
        self.theta[1]
    }

    pub fn vol(&self) -> f64 {
        self.theta[2]
    }
}

impl DiffusionLaw for OrnsteinUhlenbeck {
    fn dim(&self) -> usize {
        self.dim
    }

    fn params(&self) -> ArrayView1<'_, f64> {
        self.theta.view()
    }

    fn set_params(&mut self, theta: ArrayView1<'_, f64>) -> BridgeResult<()> {
        validate_theta(theta, OU_N_PARAMS)?;
        if theta[2] <= 0.0 {
            return Err(BridgeError::InvalidParameter {
                index: 2,
                value: theta[2],
                reason: "volatility must be > 0.",
            });
        }
        self.theta.assign(&theta);
        Ok(())
    }
}

impl TargetLaw for OrnsteinUhlenbeck {
    fn drift(&self, _t: f64, x: &DVector<f64>) -> DVector<f64> {
        x.map(|xi| -self.rate() * (xi - self.mean()))
    }

    fn volatility(&self, _t: f64, _x: &DVector<f64>) -> DMatrix<f64> {
        DMatrix::from_diagonal_element(self.dim, self.dim, self.vol())
    }
}

impl AuxiliaryLaw for OrnsteinUhlenbeck {
    fn b(&self, _t: f64) -> DMatrix<f64> {
        DMatrix::from_diagonal_element(self.dim, self.dim, -self.rate())
    }

    fn beta(&self, _t: f64) -> DVector<f64> {
        DVector::from_element(self.dim, self.rate() * self.mean())
    }

    fn a(&self, _t: f64) -> DMatrix<f64> {
        DMatrix::from_diagonal_element(self.dim, self.dim, self.vol() * self.vol())
    }
}
