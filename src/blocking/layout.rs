//! Chequered layout — two interlaced block covers carved out by knots.
//!
//! Purpose
//! -------
//! Turn a user-chosen list of knots into two alternating knot subsets and the
//! contiguous segment blocks each subset induces. Alternating between the two
//! covers lets every knot of one cover sit strictly inside a block of the
//! other, so the whole path mixes even though each proposal is local.
//!
//! Key behaviors
//! -------------
//! - Validate the knot list: strictly increasing and below the number of
//!   segments `m`.
//! - Split knots by input position: positions `0, 2, 4, …` form cover A,
//!   positions `1, 3, …` form cover B.
//! - Drop a knot equal to `m − 1` with a warning: the right endpoint of the
//!   last segment is the end of the path, which already closes every cover's
//!   final block.
//! - Carve each cover into `|knots| + 1` half-open blocks of segments.
//!
//! Invariants & assumptions
//! ------------------------
//! - Each cover's blocks are non-empty, contiguous, pairwise disjoint and
//!   cover `0..m`.
//! - The knots of a cover are exactly the last segments of its blocks, the
//!   final block excepted.
//! - The two knot subsets are disjoint.
//!
//! Conventions
//! -----------
//! - A knot `k` means "the right endpoint of segment `k` closes a block".
//! - Blocks are `Range<usize>` over 0-based segment indices.
use crate::bridge::errors::{BridgeError, BridgeResult};
use log::warn;
use std::{fmt, ops::Range};

/// One of the two alternating block covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cover {
    A,
    B,
}

impl Cover {
    /// The other cover.
    pub fn other(self) -> Cover {
        match self {
            Cover::A => Cover::B,
            Cover::B => Cover::A,
        }
    }

    /// Storage slot of this cover in `[_; 2]` arrays.
    pub fn index(self) -> usize {
        match self {
            Cover::A => 0,
            Cover::B => 1,
        }
    }
}

impl fmt::Display for Cover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cover::A => write!(f, "A"),
            Cover::B => write!(f, "B"),
        }
    }
}

/// ChequeredLayout — knots and blocks of both covers.
///
/// Purpose
/// -------
/// Immutable description of how the `m` segments of a path are grouped into
/// blocks in each cover. It carries no statistics and no counters; those
/// live in [`crate::blocking::ChequeredBlocking`].
///
/// Fields
/// ------
/// - `n_segments`: number of segments `m ≥ 1`.
/// - `knots`: per cover, strictly increasing knots, all `< m − 1`.
/// - `blocks`: per cover, `knots.len() + 1` half-open segment ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChequeredLayout {
    n_segments: usize,
    knots: [Vec<usize>; 2],
    blocks: [Vec<Range<usize>>; 2],
}

impl ChequeredLayout {
    /// Validate `knots` and build both covers over `n_segments` segments.
    ///
    /// Parameters
    /// ----------
    /// - `knots`: `&[usize]`
    ///   Strictly increasing segment indices whose right endpoints close a
    ///   block.
    /// - `n_segments`: `usize`
    ///   Number of segments `m` of the path.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::EmptyPath` if `n_segments == 0`.
    /// - `BridgeError::DuplicateKnot` for a repeated knot.
    /// - `BridgeError::UnsortedKnots` for a decreasing pair.
    /// - `BridgeError::KnotOutOfRange` for a knot `≥ m`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use guided_bridges::blocking::layout::{ChequeredLayout, Cover};
    /// let layout = ChequeredLayout::new(&[0, 1, 2, 3], 4).unwrap();
    /// assert_eq!(layout.knots(Cover::A), &[0, 2]);
    /// assert_eq!(layout.knots(Cover::B), &[1]);
    /// assert_eq!(layout.blocks(Cover::A), &[0..1, 1..3, 3..4]);
    /// assert_eq!(layout.blocks(Cover::B), &[0..2, 2..4]);
    /// ```
    pub fn new(knots: &[usize], n_segments: usize) -> BridgeResult<Self> {
        if n_segments == 0 {
            return Err(BridgeError::EmptyPath);
        }
        validate_knots(knots, n_segments)?;

        let mut split: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
        for (position, &knot) in knots.iter().enumerate() {
            if knot + 1 == n_segments {
                warn!(
                    "knot {knot} at position {position} is the final observation and already \
                     closes every block; ignoring it"
                );
                continue;
            }
            split[position % 2].push(knot);
        }
        let blocks = [carve_blocks(&split[0], n_segments), carve_blocks(&split[1], n_segments)];
        Ok(ChequeredLayout { n_segments, knots: split, blocks })
    }

    pub fn n_segments(&self) -> usize {
        self.n_segments
    }

    pub fn knots(&self, cover: Cover) -> &[usize] {
        &self.knots[cover.index()]
    }

    pub fn blocks(&self, cover: Cover) -> &[Range<usize>] {
        &self.blocks[cover.index()]
    }

    /// Number of segments in each block of `cover`.
    pub fn block_sizes(&self, cover: Cover) -> Vec<usize> {
        self.blocks(cover).iter().map(|b| b.len()).collect()
    }

    /// Whether the right endpoint of `segment` is a knot of `cover`.
    pub fn is_knot(&self, cover: Cover, segment: usize) -> bool {
        self.knots(cover).binary_search(&segment).is_ok()
    }

    /// Index of the block of `cover` containing `segment`.
    pub fn block_of(&self, cover: Cover, segment: usize) -> Option<usize> {
        self.blocks(cover).iter().position(|b| b.contains(&segment))
    }
}

// ---- Helper Methods ----

fn validate_knots(knots: &[usize], n_segments: usize) -> BridgeResult<()> {
    for (position, &knot) in knots.iter().enumerate() {
        if knot >= n_segments {
            return Err(BridgeError::KnotOutOfRange { knot, n_segments });
        }
        if position == 0 {
            continue;
        }
        let previous = knots[position - 1];
        if knot == previous {
            return Err(BridgeError::DuplicateKnot { position, value: knot });
        }
        if knot < previous {
            return Err(BridgeError::UnsortedKnots { position, previous, value: knot });
        }
    }
    Ok(())
}

/// `0..k₀+1, k₀+1..k₁+1, …, k_last+1..m`.
fn carve_blocks(knots: &[usize], n_segments: usize) -> Vec<Range<usize>> {
    let mut blocks = Vec::with_capacity(knots.len() + 1);
    let mut start = 0;
    for &knot in knots {
        blocks.push(start..knot + 1);
        start = knot + 1;
    }
    blocks.push(start..n_segments);
    blocks
}
