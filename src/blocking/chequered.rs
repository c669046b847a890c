//! ChequeredBlocking — alternating block schedule for path imputation.
//!
//! Purpose
//! -------
//! Coordinate the guided-proposal statistics of a multi-segment path with a
//! chequerboard of two interlaced block covers. On each path-update sweep
//! the schedule recomputes every segment's backward statistic for one cover,
//! so that the knots of that cover become exact pins to the current path,
//! and hands the sampler that cover's blocks to propose on.
//!
//! Key behaviors
//! -------------
//! - Construction ([`ChequeredBlocking::new`]) validates knots and state
//!   dimensions, and precomputes per-cover, per-segment overrides: knot
//!   segments are observed exactly (`L = I`, `Σ = ε·I`, template change
//!   point); all others keep the reference observation.
//! - [`ChequeredBlocking::advance`] is pure: it returns a new schedule with
//!   the statistics of the cover scheduled next, recomputed strictly backward
//!   with the current path endpoints and the supplied parameters θ, and with
//!   the cover toggled. On failure `self` remains the system of record.
//! - Acceptance outcomes are recorded against the active cover, the one
//!   whose statistics are attached and whose blocks were proposed on.
//!
//! Invariants & assumptions
//! ------------------------
//! - `next` names the cover whose statistics will be built by the next
//!   `advance`; the active cover is always `next.other()`.
//! - After `advance(path, θ)`, every segment's target and auxiliary law carry
//!   exactly θ, and every segment's `(L, Σ, change_pt)` equals the newly
//!   active cover's override.
//! - Overrides, layout and real observations never change after
//!   construction; only statistics, counters and `next` evolve.
//!
//! Conventions
//! -----------
//! - A fresh schedule has `next = Cover::A`, so its attached (reference)
//!   statistics belong to cover B. Samplers call `advance` before the first
//!   proposal.
//! - Path buffers are owned and swapped by the caller; the schedule only
//!   reads endpoints through [`PathBuffer`].
//!
//! Testing notes
//! -------------
//! - Unit tests below cover override placement, the cover toggle, θ
//!   propagation, pinned versus observed endpoints in both toggle
//!   directions, counter bookkeeping, idempotence of the cover round trip,
//!   and the failure path of `advance`.
use crate::{
    blocking::{
        BlockingScheme, EndpointTarget,
        counters::AcceptanceCounters,
        layout::{ChequeredLayout, Cover},
        options::BlockingOptions,
    },
    bridge::{
        core::{
            change_point::ChangePoint,
            law::{AuxiliaryLaw, TargetLaw},
            observation::Observation,
            path::PathBuffer,
            statistic::{GuidedBridge, backward_fold},
            validation::validate_state_dims,
        },
        errors::{BridgeError, BridgeResult},
    },
};
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use ndarray::ArrayView1;
use std::{fmt, ops::Range};

/// Observation operator, noise and change-point policy of one segment in
/// one cover.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentOverride {
    l: DMatrix<f64>,
    sigma: DMatrix<f64>,
    change_pt: ChangePoint,
}

impl SegmentOverride {
    /// Exact pin on a knot: `L = I_d`, `Σ = ε·I_d`.
    fn knot(dim: usize, epsilon: f64, change_pt: ChangePoint) -> Self {
        SegmentOverride {
            l: DMatrix::identity(dim, dim),
            sigma: DMatrix::from_diagonal_element(dim, dim, epsilon),
            change_pt,
        }
    }

    fn from_reference(obs: &Observation, change_pt: ChangePoint) -> Self {
        SegmentOverride { l: obs.l().clone(), sigma: obs.sigma().clone(), change_pt }
    }

    pub fn l(&self) -> &DMatrix<f64> {
        &self.l
    }

    pub fn sigma(&self) -> &DMatrix<f64> {
        &self.sigma
    }

    pub fn change_pt(&self) -> ChangePoint {
        self.change_pt
    }

    /// Observation `(L, Σ, v)` for the effective terminal value `v`.
    pub fn observation(&self, v: DVector<f64>) -> BridgeResult<Observation> {
        Observation::new(self.l.clone(), self.sigma.clone(), v)
    }
}

/// ChequeredBlocking — two-cover block schedule with attached statistics.
///
/// Fields
/// ------
/// - `layout`: knots and blocks of both covers.
/// - `epsilon`: artificial noise placed on knot segments.
/// - `overrides`: per cover, one [`SegmentOverride`] per segment.
/// - `observations`: the real observed value `v` of every segment.
/// - `counters`: per cover, per block acceptance counters.
/// - `next`: cover scheduled for the next `advance`.
/// - `bridges`: statistics of the active cover, one per segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ChequeredBlocking<T, A> {
    layout: ChequeredLayout,
    epsilon: f64,
    overrides: [Vec<SegmentOverride>; 2],
    observations: Vec<DVector<f64>>,
    counters: [AcceptanceCounters; 2],
    next: Cover,
    bridges: Vec<GuidedBridge<T, A>>,
}

impl<T: TargetLaw, A: AuxiliaryLaw> ChequeredBlocking<T, A> {
    /// Build a schedule from knots, options and reference statistics.
    ///
    /// Parameters
    /// ----------
    /// - `knots`: `&[usize]`
    ///   Strictly increasing segment indices; see [`ChequeredLayout::new`].
    /// - `options`: `&BlockingOptions`
    ///   Noise floor `ε` and change-point template of knot segments.
    /// - `reference`: `Vec<GuidedBridge<T, A>>`
    ///   One solved statistic per segment (typically from
    ///   [`crate::bridge::build_bridges`]). Their `(L, Σ, change_pt)` feed
    ///   the non-knot overrides and their `v` is kept as the real
    ///   observation.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::EmptyPath` for an empty reference.
    /// - `BridgeError::StateDimensionMismatch` if segments disagree on `d`.
    /// - Any knot error of [`ChequeredLayout::new`].
    pub fn new(
        knots: &[usize], options: &BlockingOptions, reference: Vec<GuidedBridge<T, A>>,
    ) -> BridgeResult<Self> {
        let dim = validate_state_dims(reference.iter().map(GuidedBridge::dim))?;
        let layout = ChequeredLayout::new(knots, reference.len())?;

        let overrides = [Cover::A, Cover::B].map(|cover| {
            reference
                .iter()
                .enumerate()
                .map(|(i, bridge)| {
                    if layout.is_knot(cover, i) {
                        SegmentOverride::knot(dim, options.epsilon(), options.change_pt())
                    } else {
                        SegmentOverride::from_reference(bridge.observation(), bridge.change_pt())
                    }
                })
                .collect::<Vec<_>>()
        });
        let observations = reference.iter().map(|b| b.observation().v().clone()).collect();
        let counters =
            [Cover::A, Cover::B].map(|c| AcceptanceCounters::new(layout.blocks(c).len()));

        debug!(
            "chequered schedule over {} segments: knots A {:?}, knots B {:?}",
            layout.n_segments(),
            layout.knots(Cover::A),
            layout.knots(Cover::B)
        );
        Ok(ChequeredBlocking {
            layout,
            epsilon: options.epsilon(),
            overrides,
            observations,
            counters,
            next: Cover::A,
            bridges: reference,
        })
    }

    /// Recompute statistics for the next cover and toggle it.
    ///
    /// Parameters
    /// ----------
    /// - `path`: current accepted path; knot endpoints of the next cover are
    ///   read from it.
    /// - `theta`: parameter vector pushed into every segment's target and
    ///   auxiliary law.
    ///
    /// Returns
    /// -------
    /// `BridgeResult<Self>`
    ///   A new schedule whose active cover is the former `next`; counters,
    ///   layout and overrides are carried over unchanged.
    ///
    /// Errors
    /// ------
    /// - State consistency: `PathLengthMismatch`, `EndpointDimensionMismatch`.
    /// - Parameters: `ParamLengthMismatch`, `InvalidParameter`.
    /// - Integration: any failure of the backward recursion. The sweep's
    ///   proposal must be rejected; `self` is unchanged.
    pub fn advance<P: PathBuffer + ?Sized>(
        &self, path: &P, theta: ArrayView1<'_, f64>,
    ) -> BridgeResult<Self> {
        let cover = self.next;
        let targets = self.endpoint_targets(path)?;
        let overrides = &self.overrides[cover.index()];

        let solved = backward_fold(self.n_segments(), |i, seed| {
            let ov = &overrides[i];
            let obs = ov.observation(targets[i].value().clone())?;
            self.bridges[i].recompute(i, obs, ov.change_pt(), Some(theta), seed)
        });
        let bridges = match solved {
            Ok(bridges) => bridges,
            Err(err) => {
                if err.is_recoverable() {
                    warn!("backward recursion for cover {cover} failed, rejecting sweep: {err}");
                }
                return Err(err);
            }
        };

        debug!("cover {cover} recomputed; next cover {}", cover.other());
        Ok(ChequeredBlocking {
            layout: self.layout.clone(),
            epsilon: self.epsilon,
            overrides: self.overrides.clone(),
            observations: self.observations.clone(),
            counters: self.counters.clone(),
            next: cover.other(),
            bridges,
        })
    }

    /// Effective terminal value per segment for the next cover.
    ///
    /// Knots of the next cover are pinned to the path endpoint; every other
    /// segment keeps its real observation.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::PathLengthMismatch` if the path has a different number
    ///   of segments.
    /// - `BridgeError::EndpointDimensionMismatch` if a pinned endpoint does
    ///   not have the state dimension.
    pub fn endpoint_targets<P: PathBuffer + ?Sized>(
        &self, path: &P,
    ) -> BridgeResult<Vec<EndpointTarget>> {
        let m = self.n_segments();
        if path.n_segments() != m {
            return Err(BridgeError::PathLengthMismatch { expected: m, found: path.n_segments() });
        }
        let dim = self.bridges[0].dim();
        (0..m)
            .map(|i| {
                if !self.layout.is_knot(self.next, i) {
                    return Ok(EndpointTarget::Observed(self.observations[i].clone()));
                }
                let endpoint =
                    path.endpoint(i).ok_or(BridgeError::IndexOutOfRange { index: i, len: m })?;
                if endpoint.len() != dim {
                    return Err(BridgeError::EndpointDimensionMismatch {
                        segment: i,
                        expected: dim,
                        found: endpoint.len(),
                    });
                }
                Ok(EndpointTarget::Pinned(DVector::from_iterator(dim, endpoint.iter().copied())))
            })
            .collect()
    }
}

impl<T, A> ChequeredBlocking<T, A> {
    pub fn n_segments(&self) -> usize {
        self.layout.n_segments()
    }

    pub fn layout(&self) -> &ChequeredLayout {
        &self.layout
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Cover whose statistics the next `advance` builds.
    pub fn next_cover(&self) -> Cover {
        self.next
    }

    /// Cover whose statistics are attached and whose blocks are proposed on.
    pub fn active_cover(&self) -> Cover {
        self.next.other()
    }

    pub fn segment_override(&self, cover: Cover, segment: usize) -> Option<&SegmentOverride> {
        self.overrides[cover.index()].get(segment)
    }

    pub fn counters_of(&self, cover: Cover) -> &AcceptanceCounters {
        &self.counters[cover.index()]
    }

    /// Real observed value of every segment.
    pub fn observations(&self) -> &[DVector<f64>] {
        &self.observations
    }

    pub fn bridges(&self) -> &[GuidedBridge<T, A>] {
        &self.bridges
    }

    /// Blocks of the active cover.
    pub fn blocks(&self) -> &[Range<usize>] {
        self.layout.blocks(self.active_cover())
    }

    /// Record the outcome of a proposal on `block` of the active cover.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::BlockIndexOutOfRange` for a block the active cover
    ///   does not have.
    pub fn register_outcome(&mut self, block: usize, accepted: bool) -> BridgeResult<()> {
        let cover = self.active_cover();
        self.counters[cover.index()].register(block, accepted)
    }
}

impl<T: TargetLaw, A: AuxiliaryLaw> BlockingScheme for ChequeredBlocking<T, A> {
    type Target = T;
    type Aux = A;

    fn n_segments(&self) -> usize {
        ChequeredBlocking::n_segments(self)
    }

    fn advance<P: PathBuffer + ?Sized>(
        &self, path: &P, theta: ArrayView1<'_, f64>,
    ) -> BridgeResult<Self> {
        ChequeredBlocking::advance(self, path, theta)
    }

    fn blocks(&self) -> &[Range<usize>] {
        ChequeredBlocking::blocks(self)
    }

    fn register_outcome(&mut self, block: usize, accepted: bool) -> BridgeResult<()> {
        ChequeredBlocking::register_outcome(self, block, accepted)
    }

    fn endpoint_targets<P: PathBuffer + ?Sized>(
        &self, path: &P,
    ) -> BridgeResult<Vec<EndpointTarget>> {
        ChequeredBlocking::endpoint_targets(self, path)
    }

    fn bridges(&self) -> &[GuidedBridge<T, A>] {
        ChequeredBlocking::bridges(self)
    }

    fn counters(&self) -> &AcceptanceCounters {
        self.counters_of(self.active_cover())
    }
}

impl<T, A> fmt::Display for ChequeredBlocking<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ChequeredBlocking: {} segments, eps = {:e}, next cover {}",
            self.n_segments(),
            self.epsilon,
            self.next
        )?;
        for cover in [Cover::A, Cover::B] {
            writeln!(
                f,
                "  cover {cover}: knots {:?}, block sizes {:?}, accepted/proposed {}",
                self.layout.knots(cover),
                self.layout.block_sizes(cover),
                self.counters[cover.index()]
            )?;
        }
        Ok(())
    }
}
