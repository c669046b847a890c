//! Diffusion laws consumed by guided bridges.
//!
//! Purpose
//! -------
//! Define the seams between the guided-bridge core and concrete diffusion
//! models: a parameterised law ([`DiffusionLaw`]), the target process whose
//! path is imputed ([`TargetLaw`]), and the linear auxiliary process whose
//! transition densities drive the backward recursion ([`AuxiliaryLaw`]).
//!
//! Key behaviors
//! -------------
//! - Laws expose their parameter vector θ and accept a replacement, which is
//!   how a Gibbs parameter update reaches every segment of a schedule.
//! - The auxiliary law is linear: `dX = (B(t) X + β(t)) dt + σ̃(t) dW`; the
//!   backward ODEs only need `B`, `β` and `ã = σ̃σ̃ᵀ`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `set_params` either replaces the whole parameter vector or leaves the
//!   law untouched and returns an error.
//! - All matrices returned are `dim() × dim()`, vectors have length `dim()`.
use crate::bridge::errors::{BridgeError, BridgeResult};
use nalgebra::{DMatrix, DVector};
use ndarray::ArrayView1;

/// A diffusion law with a replaceable parameter vector.
pub trait DiffusionLaw: Clone {
    /// State dimension `d`.
    fn dim(&self) -> usize;

    /// Current parameter vector θ.
    fn params(&self) -> ArrayView1<'_, f64>;

    /// Replace θ.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::ParamLengthMismatch` if `theta` has the wrong length.
    /// - `BridgeError::InvalidParameter` if an entry is not admissible.
    fn set_params(&mut self, theta: ArrayView1<'_, f64>) -> BridgeResult<()>;
}

/// The (possibly nonlinear) target diffusion `dX = b(t, X) dt + σ(t, X) dW`.
pub trait TargetLaw: DiffusionLaw {
    fn drift(&self, t: f64, x: &DVector<f64>) -> DVector<f64>;

    fn volatility(&self, t: f64, x: &DVector<f64>) -> DMatrix<f64>;

    /// Diffusion coefficient `a = σσᵀ`.
    fn diffusion(&self, t: f64, x: &DVector<f64>) -> DMatrix<f64> {
        let sigma = self.volatility(t, x);
        &sigma * sigma.transpose()
    }
}

/// Linear auxiliary diffusion `dX = (B(t) X + β(t)) dt + σ̃(t) dW`.
pub trait AuxiliaryLaw: DiffusionLaw {
    fn b(&self, t: f64) -> DMatrix<f64>;

    fn beta(&self, t: f64) -> DVector<f64>;

    /// `ã(t) = σ̃(t) σ̃(t)ᵀ`.
    fn a(&self, t: f64) -> DMatrix<f64>;
}

/// Check a replacement θ against the expected length and finiteness.
///
/// Shared by model implementations of [`DiffusionLaw::set_params`].
pub fn validate_theta(theta: ArrayView1<'_, f64>, expected: usize) -> BridgeResult<()> {
    if theta.len() != expected {
        return Err(BridgeError::ParamLengthMismatch { expected, found: theta.len() });
    }
    if let Some((index, value)) = theta.iter().enumerate().find(|(_, x)| !x.is_finite()) {
        return Err(BridgeError::InvalidParameter {
            index,
            value: *value,
            reason: "parameters must be finite.",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // `validate_theta` reports length problems before value problems.
    fn validate_theta_checks_length_then_values() {
        assert!(validate_theta(array![1.0, 2.0].view(), 2).is_ok());
        assert_eq!(
            validate_theta(array![1.0].view(), 2),
            Err(BridgeError::ParamLengthMismatch { expected: 2, found: 1 })
        );
        assert!(matches!(
            validate_theta(array![1.0, f64::INFINITY].view(), 2),
            Err(BridgeError::InvalidParameter { index: 1, .. })
        ));
    }
}
