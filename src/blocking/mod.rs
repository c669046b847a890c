//! blocking — block-updating schedules for guided path imputation.
//!
//! Purpose
//! -------
//! Decide which contiguous runs of segments ("blocks") a sampler proposes on
//! in each path-update sweep, and keep every segment's guided statistic
//! consistent with that choice. This is the layer the outer MCMC loop talks
//! to; it never samples, accepts or rejects anything itself.
//!
//! Key behaviors
//! -------------
//! - [`BlockingScheme`] is the scheme-agnostic contract: advance the
//!   schedule for a path and θ, list blocks, register outcomes, report
//!   effective endpoint targets.
//! - [`ChequeredBlocking`] alternates between two interlaced covers built by
//!   [`ChequeredLayout`]; [`NoBlocking`] is the single-block identity.
//! - [`Blocking`] is the closed set of schemes, for callers that pick one at
//!   run time.
//!
//! Invariants & assumptions
//! ------------------------
//! - `advance` never mutates its receiver; a failed `advance` leaves the
//!   previous schedule as the system of record.
//! - Counters are diagnostics only.
//!
//! Downstream usage
//! ----------------
//! - Per sweep: `schedule = schedule.advance(&paths, theta)?`, then for each
//!   `(k, block)` in `schedule.blocks()` propose on `block`, accept or
//!   reject, `schedule.register_outcome(k, accepted)?` and swap the accepted
//!   path buffers. An error with `is_recoverable()` means "reject the sweep
//!   and keep the old schedule".
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each scheme; `tests/` drives a whole sweep
//!   through the public API for both schemes behind [`Blocking`].

pub mod chequered;
pub mod counters;
pub mod layout;
pub mod no_blocking;
pub mod options;

use crate::bridge::{
    core::{
        law::{AuxiliaryLaw, TargetLaw},
        path::PathBuffer,
        statistic::GuidedBridge,
    },
    errors::BridgeResult,
};
use nalgebra::DVector;
use ndarray::ArrayView1;
use std::{fmt, ops::Range};

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::chequered::{ChequeredBlocking, SegmentOverride};
pub use self::counters::AcceptanceCounters;
pub use self::layout::{ChequeredLayout, Cover};
pub use self::no_blocking::NoBlocking;
pub use self::options::BlockingOptions;

/// Effective terminal value of a segment for one sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointTarget {
    /// Pinned to the current path's endpoint (a knot of the swept cover).
    Pinned(DVector<f64>),
    /// The real observation.
    Observed(DVector<f64>),
}

impl EndpointTarget {
    pub fn value(&self) -> &DVector<f64> {
        match self {
            EndpointTarget::Pinned(v) | EndpointTarget::Observed(v) => v,
        }
    }

    pub fn is_pinned(&self) -> bool {
        matches!(self, EndpointTarget::Pinned(_))
    }
}

/// Contract between a blocking schedule and the outer sampler.
pub trait BlockingScheme: Sized {
    type Target: TargetLaw;
    type Aux: AuxiliaryLaw;

    fn n_segments(&self) -> usize;

    /// New schedule with statistics rebuilt for `path` and `theta`.
    fn advance<P: PathBuffer + ?Sized>(
        &self, path: &P, theta: ArrayView1<'_, f64>,
    ) -> BridgeResult<Self>;

    /// Blocks to propose on, in order.
    fn blocks(&self) -> &[Range<usize>];

    fn register_outcome(&mut self, block: usize, accepted: bool) -> BridgeResult<()>;

    fn endpoint_targets<P: PathBuffer + ?Sized>(
        &self, path: &P,
    ) -> BridgeResult<Vec<EndpointTarget>>;

    /// Attached statistics, one per segment.
    fn bridges(&self) -> &[GuidedBridge<Self::Target, Self::Aux>];

    /// Counters of the blocks returned by [`BlockingScheme::blocks`].
    fn counters(&self) -> &AcceptanceCounters;
}

/// Blocking — run-time choice between the two schemes.
#[derive(Debug, Clone, PartialEq)]
pub enum Blocking<T, A> {
    Unblocked(NoBlocking<T, A>),
    Chequered(ChequeredBlocking<T, A>),
}

impl<T: TargetLaw, A: AuxiliaryLaw> BlockingScheme for Blocking<T, A> {
    type Target = T;
    type Aux = A;

    fn n_segments(&self) -> usize {
        match self {
            Blocking::Unblocked(s) => s.n_segments(),
            Blocking::Chequered(s) => BlockingScheme::n_segments(s),
        }
    }

    fn advance<P: PathBuffer + ?Sized>(
        &self, path: &P, theta: ArrayView1<'_, f64>,
    ) -> BridgeResult<Self> {
        match self {
            Blocking::Unblocked(s) => s.advance(path, theta).map(Blocking::Unblocked),
            Blocking::Chequered(s) => s.advance(path, theta).map(Blocking::Chequered),
        }
    }

    fn blocks(&self) -> &[Range<usize>] {
        match self {
            Blocking::Unblocked(s) => s.blocks(),
            Blocking::Chequered(s) => s.blocks(),
        }
    }

    fn register_outcome(&mut self, block: usize, accepted: bool) -> BridgeResult<()> {
        match self {
            Blocking::Unblocked(s) => s.register_outcome(block, accepted),
            Blocking::Chequered(s) => s.register_outcome(block, accepted),
        }
    }

    fn endpoint_targets<P: PathBuffer + ?Sized>(
        &self, path: &P,
    ) -> BridgeResult<Vec<EndpointTarget>> {
        match self {
            Blocking::Unblocked(s) => s.endpoint_targets(path),
            Blocking::Chequered(s) => s.endpoint_targets(path),
        }
    }

    fn bridges(&self) -> &[GuidedBridge<T, A>] {
        match self {
            Blocking::Unblocked(s) => s.bridges(),
            Blocking::Chequered(s) => s.bridges(),
        }
    }

    fn counters(&self) -> &AcceptanceCounters {
        match self {
            Blocking::Unblocked(s) => s.counters(),
            Blocking::Chequered(s) => BlockingScheme::counters(s),
        }
    }
}

impl<T, A> From<NoBlocking<T, A>> for Blocking<T, A> {
    fn from(s: NoBlocking<T, A>) -> Self {
        Blocking::Unblocked(s)
    }
}

impl<T, A> From<ChequeredBlocking<T, A>> for Blocking<T, A> {
    fn from(s: ChequeredBlocking<T, A>) -> Self {
        Blocking::Chequered(s)
    }
}

impl<T, A> fmt::Display for Blocking<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blocking::Unblocked(s) => fmt::Display::fmt(s, f),
            Blocking::Chequered(s) => fmt::Display::fmt(s, f),
        }
    }
}
