//! Errors for guided bridges and block updating (configuration checks,
//! backward-recursion failures, and caller contract violations).
//!
//! This module defines the crate error type, [`BridgeError`], and the
//! [`ErrorClass`] taxonomy the outer MCMC loop uses to decide what to do with a
//! failure. `BridgeError` implements `Display`/`Error` and, with the
//! `python-bindings` feature, converts to `PyErr`.
//!
//! ## Conventions
//! - **Indices are 0-based** (segments, blocks, knots, grid points).
//! - Configuration errors are raised before sampling starts and are fatal to
//!   the run.
//! - Integration errors are raised by the backward recursion; the caller
//!   rejects the current sweep and keeps its previous schedule and path.
//! - State-consistency errors signal a broken caller contract.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Crate-wide result alias for operations that may produce [`BridgeError`].
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Coarse classification of a [`BridgeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed user configuration; abort before sampling.
    Configuration,
    /// Numerically invalid backward statistic; reject the sweep.
    Integration,
    /// Caller violated an interface contract.
    StateConsistency,
}

/// Unified error type for bridge statistics and blocking schedules.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    // ---- Configuration ----
    /// The path has no segments.
    EmptyPath,

    /// Knot list is not strictly increasing.
    UnsortedKnots { position: usize, previous: usize, value: usize },

    /// Knot list repeats a value.
    DuplicateKnot { position: usize, value: usize },

    /// Knot does not name a segment of the path.
    KnotOutOfRange { knot: usize, n_segments: usize },

    /// Segments disagree on the state dimension.
    StateDimensionMismatch { segment: usize, expected: usize, found: usize },

    /// Observation operator, covariance and value have inconsistent shapes.
    ObservationShape { what: &'static str, expected: usize, found: usize },

    /// Observation entries must be finite.
    NonFiniteObservation { what: &'static str },

    /// Observation noise covariance is not positive definite.
    NoiseNotPositiveDefinite { segment: usize },

    /// Artificial noise floor must be finite and > 0.
    InvalidNoiseFloor { value: f64 },

    /// Time grid is too short, non-finite or not strictly increasing.
    InvalidGrid { segment: usize, reason: &'static str },

    /// Grid step must be finite and > 0, with t0 < t1.
    InvalidStep { t0: f64, t1: f64, dt: f64 },

    /// Law parameter must be finite (and positive where required).
    InvalidParameter { index: usize, value: f64, reason: &'static str },

    /// Law dimension must be at least one.
    InvalidDimension { dim: usize },

    // ---- Backward integration ----
    /// A backward statistic became NaN/±inf.
    NonFiniteStatistic { segment: usize, grid_index: usize, quantity: &'static str },

    /// Left-boundary H is not symmetric positive semi-definite.
    NotPositiveSemiDefinite { segment: usize, min_eigenvalue: f64 },

    /// I + H·Q could not be solved in the stable solver family.
    SingularSystem { segment: usize, grid_index: usize },

    // ---- State consistency ----
    /// Block index is not a block of the targeted cover.
    BlockIndexOutOfRange { block: usize, n_blocks: usize },

    /// Path buffer holds a different number of segments than the schedule.
    PathLengthMismatch { expected: usize, found: usize },

    /// Path endpoint has the wrong dimension.
    EndpointDimensionMismatch { segment: usize, expected: usize, found: usize },

    /// Segment path is empty or its times and values disagree in length.
    InvalidSegmentPath { segment: usize, times: usize, values: usize },

    /// Parameter vector has the wrong length for the law.
    ParamLengthMismatch { expected: usize, found: usize },

    /// Segment or grid index outside the valid range.
    IndexOutOfRange { index: usize, len: usize },
}

impl BridgeError {
    /// Class of the error, used by callers to pick abort / reject behavior.
    pub fn class(&self) -> ErrorClass {
        match self {
            BridgeError::EmptyPath
            | BridgeError::UnsortedKnots { .. }
            | BridgeError::DuplicateKnot { .. }
            | BridgeError::KnotOutOfRange { .. }
            | BridgeError::StateDimensionMismatch { .. }
            | BridgeError::ObservationShape { .. }
            | BridgeError::NonFiniteObservation { .. }
            | BridgeError::NoiseNotPositiveDefinite { .. }
            | BridgeError::InvalidNoiseFloor { .. }
            | BridgeError::InvalidGrid { .. }
            | BridgeError::InvalidStep { .. }
            | BridgeError::InvalidParameter { .. }
            | BridgeError::InvalidDimension { .. } => ErrorClass::Configuration,
            BridgeError::NonFiniteStatistic { .. }
            | BridgeError::NotPositiveSemiDefinite { .. }
            | BridgeError::SingularSystem { .. } => ErrorClass::Integration,
            BridgeError::BlockIndexOutOfRange { .. }
            | BridgeError::PathLengthMismatch { .. }
            | BridgeError::EndpointDimensionMismatch { .. }
            | BridgeError::InvalidSegmentPath { .. }
            | BridgeError::ParamLengthMismatch { .. }
            | BridgeError::IndexOutOfRange { .. } => ErrorClass::StateConsistency,
        }
    }

    /// True when the outer loop should reject the sweep and carry on.
    pub fn is_recoverable(&self) -> bool {
        self.class() == ErrorClass::Integration
    }
}

impl std::error::Error for BridgeError {}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            BridgeError::EmptyPath => write!(f, "Path has no segments."),
            BridgeError::UnsortedKnots { position, previous, value } => {
                write!(
                    f,
                    "Knots must be strictly increasing: knot {value} at position {position} follows {previous}."
                )
            }
            BridgeError::DuplicateKnot { position, value } => {
                write!(f, "Knot {value} at position {position} is duplicated.")
            }
            BridgeError::KnotOutOfRange { knot, n_segments } => {
                write!(f, "Knot {knot} is out of range for a path with {n_segments} segments.")
            }
            BridgeError::StateDimensionMismatch { segment, expected, found } => {
                write!(
                    f,
                    "Segment {segment} has state dimension {found}, expected {expected}."
                )
            }
            BridgeError::ObservationShape { what, expected, found } => {
                write!(f, "Observation {what} has size {found}, expected {expected}.")
            }
            BridgeError::NonFiniteObservation { what } => {
                write!(f, "Observation {what} contains non-finite entries.")
            }
            BridgeError::NoiseNotPositiveDefinite { segment } => {
                write!(f, "Observation noise of segment {segment} is not positive definite.")
            }
            BridgeError::InvalidNoiseFloor { value } => {
                write!(f, "Artificial noise floor must be finite and > 0; got {value}.")
            }
            BridgeError::InvalidGrid { segment, reason } => {
                write!(f, "Invalid time grid for segment {segment}: {reason}")
            }
            BridgeError::InvalidStep { t0, t1, dt } => {
                write!(f, "Cannot build a grid on [{t0}, {t1}] with step {dt}.")
            }
            BridgeError::InvalidParameter { index, value, reason } => {
                write!(f, "Law parameter at index {index} is invalid ({value}): {reason}")
            }
            BridgeError::InvalidDimension { dim } => {
                write!(f, "State dimension must be at least 1; got {dim}.")
            }
            // ---- Backward integration ----
            BridgeError::NonFiniteStatistic { segment, grid_index, quantity } => {
                write!(
                    f,
                    "Backward recursion produced non-finite {quantity} in segment {segment} at grid index {grid_index}."
                )
            }
            BridgeError::NotPositiveSemiDefinite { segment, min_eigenvalue } => {
                write!(
                    f,
                    "Left-boundary H of segment {segment} is not positive semi-definite (min eigenvalue {min_eigenvalue})."
                )
            }
            BridgeError::SingularSystem { segment, grid_index } => {
                write!(
                    f,
                    "Singular system in the stable solver of segment {segment} at grid index {grid_index}."
                )
            }
            // ---- State consistency ----
            BridgeError::BlockIndexOutOfRange { block, n_blocks } => {
                write!(f, "Block index {block} is out of range for a cover with {n_blocks} blocks.")
            }
            BridgeError::PathLengthMismatch { expected, found } => {
                write!(f, "Path has {found} segments, schedule expects {expected}.")
            }
            BridgeError::EndpointDimensionMismatch { segment, expected, found } => {
                write!(
                    f,
                    "Endpoint of segment {segment} has dimension {found}, expected {expected}."
                )
            }
            BridgeError::InvalidSegmentPath { segment, times, values } => {
                write!(
                    f,
                    "Segment path {segment} has {times} time points and {values} value rows."
                )
            }
            BridgeError::ParamLengthMismatch { expected, found } => {
                write!(f, "Parameter vector has length {found}, expected {expected}.")
            }
            BridgeError::IndexOutOfRange { index, len } => {
                write!(f, "Index {index} is out of range for length {len}.")
            }
        }
    }
}

/// Convert a [`BridgeError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl std::convert::From<BridgeError> for PyErr {
    fn from(err: BridgeError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Check that each error lands in the class the outer loop relies on.
    //
    // Expect
    // ------
    // - Knot problems are configuration errors.
    // - Non-finite statistics are recoverable integration errors.
    // - Out-of-range blocks are state-consistency errors.
    fn class_matches_error_taxonomy() {
        let config = BridgeError::DuplicateKnot { position: 1, value: 2 };
        let integration =
            BridgeError::NonFiniteStatistic { segment: 3, grid_index: 0, quantity: "H" };
        let state = BridgeError::BlockIndexOutOfRange { block: 4, n_blocks: 2 };

        assert_eq!(config.class(), ErrorClass::Configuration);
        assert_eq!(integration.class(), ErrorClass::Integration);
        assert_eq!(state.class(), ErrorClass::StateConsistency);
        assert!(integration.is_recoverable());
        assert!(!config.is_recoverable());
        assert!(!state.is_recoverable());
    }

    #[test]
    // Purpose
    // -------
    // Make sure messages carry the offending index for logging.
    fn display_mentions_offending_index() {
        let err = BridgeError::NotPositiveSemiDefinite { segment: 7, min_eigenvalue: -1.0 };
        assert!(err.to_string().contains("segment 7"));

        let err = BridgeError::KnotOutOfRange { knot: 9, n_segments: 4 };
        assert!(err.to_string().contains("Knot 9"));
    }
}
