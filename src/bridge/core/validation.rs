//! Validation helpers for backward statistics and segment collections.
//!
//! Purpose
//! -------
//! Centralise the numeric checks that turn a solved backward record into
//! either a usable guiding statistic or an integration failure, plus the
//! cross-segment dimension check used when a schedule is built.
//!
//! Invariants & assumptions
//! ------------------------
//! - A record is accepted only if every `H`, `Hν` and `c` entry is finite.
//! - The left-boundary `H` must be positive semi-definite up to a relative
//!   tolerance of [`PSD_TOLERANCE`]; partially observed segments legitimately
//!   produce rank-deficient `H`, so strict definiteness is not required.
use crate::bridge::{
    core::statistic::BackwardTriple,
    errors::{BridgeError, BridgeResult},
};
use nalgebra::{DMatrix, SymmetricEigen};

/// Relative tolerance on negative eigenvalues of `H`.
///
/// An eigenvalue `λ` counts as negative when `λ < −PSD_TOLERANCE · max(1, |λ|_max)`.
pub const PSD_TOLERANCE: f64 = 1e-8;

/// Check every triple of a record for NaN/±inf.
///
/// Errors
/// ------
/// - `BridgeError::NonFiniteStatistic` naming the first offending grid index
///   and quantity (`"H"`, `"Hν"` or `"c"`).
pub fn validate_record_finite(segment: usize, record: &[BackwardTriple]) -> BridgeResult<()> {
    for (grid_index, triple) in record.iter().enumerate() {
        let quantity = if triple.h.iter().any(|x| !x.is_finite()) {
            "H"
        } else if triple.hnu.iter().any(|x| !x.is_finite()) {
            "Hν"
        } else if !triple.c.is_finite() {
            "c"
        } else {
            continue;
        };
        return Err(BridgeError::NonFiniteStatistic { segment, grid_index, quantity });
    }
    Ok(())
}

/// Check that `h` is symmetric positive semi-definite within tolerance.
///
/// Errors
/// ------
/// - `BridgeError::NotPositiveSemiDefinite` carrying the smallest eigenvalue.
pub fn validate_psd(segment: usize, h: &DMatrix<f64>) -> BridgeResult<()> {
    let eigen = SymmetricEigen::new(h.clone());
    let min_eigenvalue = eigen.eigenvalues.min();
    let scale = eigen.eigenvalues.amax().max(1.0);
    if !min_eigenvalue.is_finite() || min_eigenvalue < -PSD_TOLERANCE * scale {
        return Err(BridgeError::NotPositiveSemiDefinite { segment, min_eigenvalue });
    }
    Ok(())
}

/// Check that all segments act on the same state dimension.
///
/// Parameters
/// ----------
/// - `dims`: iterator of per-segment state dimensions, in segment order.
///
/// Returns
/// -------
/// `BridgeResult<usize>`
///   The common dimension `d`.
///
/// Errors
/// ------
/// - `BridgeError::EmptyPath` for an empty iterator.
/// - `BridgeError::StateDimensionMismatch` naming the first segment whose
///   dimension differs from segment 0.
pub fn validate_state_dims<I>(dims: I) -> BridgeResult<usize>
where
    I: IntoIterator<Item = usize>,
{
    let mut iter = dims.into_iter();
    let expected = iter.next().ok_or(BridgeError::EmptyPath)?;
    for (offset, found) in iter.enumerate() {
        if found != expected {
            return Err(BridgeError::StateDimensionMismatch {
                segment: offset + 1,
                expected,
                found,
            });
        }
    }
    Ok(expected)
}
