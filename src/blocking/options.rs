//! Blocking options — configuration of chequered schedules.
//!
//! Purpose
//! -------
//! Collect the two knobs of a chequered schedule besides the knot list: the
//! artificial noise floor `ε` placed on knot segments and the change-point
//! policy template they use.
//!
//! Invariants & assumptions
//! ------------------------
//! - `epsilon` is finite and strictly positive; knot segments are observed
//!   through `Σ = ε·I`, which must stay positive definite.
//!
//! Conventions
//! -----------
//! - Defaults follow common guided-bridge practice: `ε = 1e-7` and a
//!   change-point buffer of 100 grid points.
use crate::bridge::{
    core::change_point::ChangePoint,
    errors::{BridgeError, BridgeResult},
};

/// Default artificial noise on knot segments.
pub const DEFAULT_EPSILON: f64 = 1e-7;

/// Default change-point buffer on knot segments.
pub const DEFAULT_CHANGE_PT_BUFFER: usize = 100;

/// BlockingOptions — noise floor and change-point template for knots.
///
/// Fields
/// ------
/// - `epsilon`: `f64`
///   Artificial noise `ε`; knot segments get `Σ = ε·I`.
/// - `change_pt`: [`ChangePoint`]
///   Policy given to every knot segment. Stored by value; each segment owns
///   its own copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockingOptions {
    epsilon: f64,
    change_pt: ChangePoint,
}

impl BlockingOptions {
    /// Validate and bundle the options.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::InvalidNoiseFloor` unless `epsilon` is finite and
    ///   `> 0`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use guided_bridges::blocking::options::BlockingOptions;
    /// # use guided_bridges::bridge::core::change_point::ChangePoint;
    /// let opts = BlockingOptions::new(1e-6, ChangePoint::simple(20)).unwrap();
    /// assert_eq!(opts.epsilon(), 1e-6);
    /// assert!(BlockingOptions::new(0.0, ChangePoint::None).is_err());
    /// ```
    pub fn new(epsilon: f64, change_pt: ChangePoint) -> BridgeResult<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(BridgeError::InvalidNoiseFloor { value: epsilon });
        }
        Ok(BlockingOptions { epsilon, change_pt })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn change_pt(&self) -> ChangePoint {
        self.change_pt
    }
}

impl Default for BlockingOptions {
    fn default() -> Self {
        BlockingOptions {
            epsilon: DEFAULT_EPSILON,
            change_pt: ChangePoint::simple(DEFAULT_CHANGE_PT_BUFFER),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Defaults are the documented ones and validation rejects bad floors.
    fn defaults_and_validation() {
        let opts = BlockingOptions::default();
        assert_eq!(opts.epsilon(), 1e-7);
        assert_eq!(opts.change_pt(), ChangePoint::simple(100));

        for bad in [0.0, -1e-7, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                BlockingOptions::new(bad, ChangePoint::None),
                Err(BridgeError::InvalidNoiseFloor { .. })
            ));
        }
    }
}
