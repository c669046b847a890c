//! bridge — guided diffusion bridges: statistics, laws and errors.
//!
//! Purpose
//! -------
//! Provide the per-segment guided-proposal layer that blocking schedules are
//! built on: diffusion-law traits, observations, backward `(H, Hν, c)`
//! statistics, path buffers and a shared error type.
//!
//! Key behaviors
//! -------------
//! - [`core`] holds the numerics and the segment-level types.
//! - [`models`] holds concrete laws (currently the OU process).
//! - [`errors`] defines [`BridgeError`], its [`ErrorClass`] and the
//!   [`BridgeResult`] alias used across the crate, including the blocking
//!   layer.
//!
//! Downstream usage
//! ----------------
//! - Build one [`GuidedBridge`] per segment (usually through
//!   [`build_bridges`]) and hand them to a blocking scheme in
//!   `crate::blocking`.
//! - Inspect [`BridgeError::class`] to tell configuration errors from
//!   integration failures that a sampler may treat as a rejected proposal.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    AuxiliaryLaw, BackwardTriple, BufferTag, ChangePoint, DiffusionLaw, GuidedBridge, Observation,
    OdeScheme, PathBuffer, PathPair, SegmentPath, TargetLaw, backward_fold, build_bridges,
};
pub use self::errors::{BridgeError, BridgeResult, ErrorClass};
pub use self::models::OrnsteinUhlenbeck;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use guided_bridges::bridge::prelude::*;
//
// to import the main bridge surface in a single line.

pub mod prelude {
    pub use super::{
        AuxiliaryLaw, BackwardTriple, BridgeError, BridgeResult, ChangePoint, DiffusionLaw,
        GuidedBridge, Observation, OdeScheme, PathBuffer, PathPair, SegmentPath, TargetLaw,
    };
}
