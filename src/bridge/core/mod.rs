//! core — guided-proposal statistics on segments between observations.
//!
//! Purpose
//! -------
//! Collect the numerical building blocks of guided diffusion bridges: time
//! grids, diffusion-law seams, endpoint observations, the backward ODE
//! solvers, the per-segment guided statistic and the path buffers that
//! blocking schedules read endpoints from.
//!
//! Key behaviors
//! -------------
//! - Define the observation `(L, Σ, v)` at a segment's right endpoint
//!   ([`Observation`]) and the change-point policy ([`ChangePoint`]) that
//!   selects where the stable solver family takes over.
//! - Solve the backward `(H, Hν, c)` recursion on a grid ([`GuidedBridge`])
//!   and fold it strictly backward across segments ([`backward_fold`]).
//! - Validate records so that non-finite or indefinite statistics surface as
//!   integration errors instead of silently corrupting a sampler.
//!
//! Invariants & assumptions
//! ------------------------
//! - All segments of a path share one state dimension `d`.
//! - Grids are strictly increasing with at least two points.
//! - Segment `m − 1` is the last segment and is never seeded.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based for segments, grid points and blocks.
//! - Matrices and vectors in state space are `nalgebra` types; grids and
//!   parameter vectors are `ndarray` types.
//!
//! Testing notes
//! -------------
//! - Unit tests in each submodule cover grids, observation validation, the
//!   solver families against the closed-form OU transition, change-point
//!   handover and the backward fold order.

pub mod change_point;
pub mod grid;
pub mod law;
pub mod observation;
pub mod ode;
pub mod path;
pub mod statistic;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::change_point::ChangePoint;
pub use self::grid::{time_changed_grid, uniform_grid, validate_grid};
pub use self::law::{AuxiliaryLaw, DiffusionLaw, TargetLaw};
pub use self::observation::Observation;
pub use self::ode::{OdeScheme, Transition};
pub use self::path::{BufferTag, PathBuffer, PathPair, SegmentPath};
pub use self::statistic::{BackwardTriple, GuidedBridge, backward_fold, build_bridges};
pub use self::validation::{PSD_TOLERANCE, validate_psd, validate_state_dims};
