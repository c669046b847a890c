//! Sampled path buffers read by blocking schedules.
//!
//! Purpose
//! -------
//! Give the outer sampler a concrete home for the two buffers it keeps per
//! segment (the accepted "current" path and the "proposal" scratch path),
//! and give schedules a read-only view of segment endpoints through the
//! [`PathBuffer`] capability.
//!
//! Key behaviors
//! -------------
//! - [`SegmentPath`] stores one segment's fine grid `tt` and states `yy`
//!   (one row per grid point) together with a [`BufferTag`] naming which of
//!   the two allocations it is.
//! - [`PathPair`] owns both buffers per segment and exchanges them on
//!   acceptance via [`PathPair::swap`], [`PathPair::swap_block`] or
//!   [`PathPair::swap_all`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `yy.nrows() == tt.len() ≥ 1` for every [`SegmentPath`].
//! - Schedules never mutate paths; swapping is driven by the caller, which
//!   alone knows which proposals were accepted.
//!
//! Conventions
//! -----------
//! - The endpoint of a segment is the last row of `yy`, i.e. the state at
//!   the segment's right observation time.
use crate::bridge::errors::{BridgeError, BridgeResult};
use ndarray::{Array1, Array2, ArrayView1};
use std::ops::Range;

/// Read access to per-segment endpoint values.
pub trait PathBuffer {
    fn n_segments(&self) -> usize;

    /// State at the right endpoint of `segment`, or `None` when out of range.
    fn endpoint(&self, segment: usize) -> Option<ArrayView1<'_, f64>>;
}

/// Which of the two per-segment allocations a [`SegmentPath`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTag {
    First,
    Second,
}

/// One segment of a sampled path.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPath {
    tag: BufferTag,
    tt: Array1<f64>,
    yy: Array2<f64>,
}

impl SegmentPath {
    /// Wrap a sampled segment.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::InvalidSegmentPath` if `yy` does not have one row per
    ///   entry of `tt`, or if `tt` is empty.
    pub fn new(
        segment: usize, tag: BufferTag, tt: Array1<f64>, yy: Array2<f64>,
    ) -> BridgeResult<Self> {
        if tt.is_empty() || yy.nrows() != tt.len() {
            return Err(BridgeError::InvalidSegmentPath {
                segment,
                times: tt.len(),
                values: yy.nrows(),
            });
        }
        Ok(SegmentPath { tag, tt, yy })
    }

    pub fn tag(&self) -> BufferTag {
        self.tag
    }

    pub fn tt(&self) -> &Array1<f64> {
        &self.tt
    }

    pub fn yy(&self) -> &Array2<f64> {
        &self.yy
    }

    /// Mutable states, for writing a proposal in place.
    pub fn yy_mut(&mut self) -> &mut Array2<f64> {
        &mut self.yy
    }

    /// State at the right endpoint.
    pub fn endpoint(&self) -> ArrayView1<'_, f64> {
        self.yy.row(self.yy.nrows() - 1)
    }

    pub fn dim(&self) -> usize {
        self.yy.ncols()
    }

    fn retagged(&self, tag: BufferTag) -> Self {
        SegmentPath { tag, ..self.clone() }
    }
}

/// Current and proposal buffers for every segment of a path.
///
/// The proposal buffers start as copies of the current ones, so a sampler
/// can overwrite only the segments of the block it proposes on.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPair {
    current: Vec<SegmentPath>,
    proposal: Vec<SegmentPath>,
}

impl PathPair {
    /// Build both buffers from the initial path.
    ///
    /// The given segments become the current buffers (tagged
    /// [`BufferTag::First`]); copies tagged [`BufferTag::Second`] become the
    /// proposal buffers.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::EmptyPath` for an empty path.
    pub fn new(initial: Vec<SegmentPath>) -> BridgeResult<Self> {
        if initial.is_empty() {
            return Err(BridgeError::EmptyPath);
        }
        let current: Vec<SegmentPath> =
            initial.iter().map(|seg| seg.retagged(BufferTag::First)).collect();
        let proposal = initial.iter().map(|seg| seg.retagged(BufferTag::Second)).collect();
        Ok(PathPair { current, proposal })
    }

    pub fn current(&self) -> &[SegmentPath] {
        &self.current
    }

    pub fn proposal(&self) -> &[SegmentPath] {
        &self.proposal
    }

    /// Proposal buffer of `segment`, for writing a proposed sub-path.
    pub fn proposal_mut(&mut self, segment: usize) -> BridgeResult<&mut SegmentPath> {
        let len = self.proposal.len();
        self.proposal.get_mut(segment).ok_or(BridgeError::IndexOutOfRange { index: segment, len })
    }

    /// Exchange current and proposal buffers of one segment.
    pub fn swap(&mut self, segment: usize) -> BridgeResult<()> {
        self.swap_block(segment..segment + 1)
    }

    /// Exchange buffers of every segment in `block`, e.g. after accepting a
    /// block proposal.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::IndexOutOfRange` if `block` reaches past the last
    ///   segment; no buffer is swapped in that case.
    pub fn swap_block(&mut self, block: Range<usize>) -> BridgeResult<()> {
        let len = self.current.len();
        if block.end > len {
            return Err(BridgeError::IndexOutOfRange { index: block.end - 1, len });
        }
        for i in block {
            std::mem::swap(&mut self.current[i], &mut self.proposal[i]);
        }
        Ok(())
    }

    pub fn swap_all(&mut self) {
        std::mem::swap(&mut self.current, &mut self.proposal);
    }
}

impl PathBuffer for [SegmentPath] {
    fn n_segments(&self) -> usize {
        self.len()
    }

    fn endpoint(&self, segment: usize) -> Option<ArrayView1<'_, f64>> {
        self.get(segment).map(SegmentPath::endpoint)
    }
}

impl PathBuffer for Vec<SegmentPath> {
    fn n_segments(&self) -> usize {
        self.as_slice().n_segments()
    }

    fn endpoint(&self, segment: usize) -> Option<ArrayView1<'_, f64>> {
        self.as_slice().endpoint(segment)
    }
}

/// Schedules read the current (accepted) buffers.
impl PathBuffer for PathPair {
    fn n_segments(&self) -> usize {
        self.current.len()
    }

    fn endpoint(&self, segment: usize) -> Option<ArrayView1<'_, f64>> {
        self.current.endpoint(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, array};

    fn segment(i: usize, end: f64) -> SegmentPath {
        let tt = Array1::linspace(i as f64, i as f64 + 1.0, 3);
        let yy = array![[0.0, 0.0], [0.5, -0.5], [end, -end]];
        SegmentPath::new(i, BufferTag::First, tt, yy).unwrap()
    }

    fn pair(m: usize) -> PathPair {
        PathPair::new((0..m).map(|i| segment(i, i as f64)).collect()).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Swapping buffers is observable through their tags.
    //
    // Given
    // -----
    // - A 3-segment pair straight after construction.
    //
    // Expect
    // ------
    // - Before the swap every segment's current tag differs from its
    //   proposal tag; after `swap_all` the tags are exchanged exactly.
    fn swap_all_exchanges_tags() {
        let mut paths = pair(3);
        for i in 0..3 {
            assert_eq!(paths.current()[i].tag(), BufferTag::First);
            assert_eq!(paths.proposal()[i].tag(), BufferTag::Second);
        }

        paths.swap_all();

        for i in 0..3 {
            assert_eq!(paths.current()[i].tag(), BufferTag::Second);
            assert_eq!(paths.proposal()[i].tag(), BufferTag::First);
        }
    }

    #[test]
    // Purpose
    // -------
    // Block swaps touch only the block and make accepted proposals current.
    //
    // Given
    // -----
    // - A 4-segment pair; the proposal endpoint of segment 2 is set to 9.
    //
    // Expect
    // ------
    // - After `swap_block(1..3)` segments 1 and 2 carry `Second` and
    //   segment 2's endpoint reads 9 through `PathBuffer`.
    // - Segments 0 and 3 are untouched.
    fn swap_block_promotes_proposal() {
        let mut paths = pair(4);
        paths.proposal_mut(2).unwrap().yy_mut()[[2, 0]] = 9.0;

        paths.swap_block(1..3).unwrap();

        let tags: Vec<BufferTag> = paths.current().iter().map(SegmentPath::tag).collect();
        assert_eq!(tags, vec![
            BufferTag::First,
            BufferTag::Second,
            BufferTag::Second,
            BufferTag::First
        ]);
        assert_eq!(paths.endpoint(2).unwrap()[0], 9.0);
        assert_eq!(paths.n_segments(), 4);
    }

    #[test]
    // Purpose
    // -------
    // Out-of-range swaps fail without swapping anything.
    fn swap_out_of_range_is_rejected() {
        let mut paths = pair(2);
        let before = paths.clone();

        assert_eq!(paths.swap_block(1..3), Err(BridgeError::IndexOutOfRange { index: 2, len: 2 }));
        assert_eq!(paths.swap(5), Err(BridgeError::IndexOutOfRange { index: 5, len: 2 }));
        assert_eq!(paths, before);
    }

    #[test]
    // Purpose
    // -------
    // Segment construction checks row counts; endpoints are last rows.
    fn segment_path_validates_and_reports_endpoint() {
        let err =
            SegmentPath::new(3, BufferTag::First, array![0.0, 1.0], array![[1.0]]).unwrap_err();
        assert_eq!(err, BridgeError::InvalidSegmentPath { segment: 3, times: 2, values: 1 });

        let paths = vec![segment(0, 2.0)];
        assert_eq!(paths.endpoint(0).unwrap(), array![2.0, -2.0].view());
        assert!(paths.endpoint(1).is_none());
        assert!(PathPair::new(Vec::new()).is_err());
    }
}
