//! Change-point policy — where a segment switches backward solver family.
//!
//! Purpose
//! -------
//! Describe, per segment, which part of the fine time grid is integrated by
//! the stable transition family and which part by the Riccati family. Exact
//! pins (artificial noise `ε·I`) make `H` of order `1/ε` near the right
//! boundary, where explicit Riccati steps blow up; the stable family handles
//! that stretch and hands over to the Riccati family further back.
//!
//! Invariants & assumptions
//! ------------------------
//! - The policy never changes the quantity being computed, only the solver.
//! - `ChangePoint` is a plain `Copy` value; segments store it by value, so no
//!   two segments ever share mutable solver state.
//!
//! Conventions
//! -----------
//! - Grids have `n` points indexed `0..n`, the right boundary is `n - 1`.
//! - `Simple { buffer }` covers the last `buffer` grid intervals; a buffer
//!   longer than the grid covers the whole segment.

/// ChangePoint — solver-switch policy for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangePoint {
    /// Riccati family on the whole segment.
    #[default]
    None,
    /// Stable family on the last `buffer` grid intervals.
    Simple { buffer: usize },
}

impl ChangePoint {
    /// Convenience constructor for [`ChangePoint::Simple`].
    pub fn simple(buffer: usize) -> Self {
        ChangePoint::Simple { buffer }
    }

    /// Index of the first grid point solved by the stable family.
    ///
    /// Points `split..n` come from the stable family (the terminal point is
    /// always exact), points `0..split` from the Riccati family.
    ///
    /// Parameters
    /// ----------
    /// - `n_points`: `usize`
    ///   Number of grid points of the segment (at least 1).
    ///
    /// Returns
    /// -------
    /// `usize`
    ///   `n_points - 1` for [`ChangePoint::None`], otherwise
    ///   `(n_points - 1).saturating_sub(buffer)`.
    pub fn split_index(&self, n_points: usize) -> usize {
        let last = n_points.saturating_sub(1);
        match self {
            ChangePoint::None => last,
            ChangePoint::Simple { buffer } => last.saturating_sub(*buffer),
        }
    }

    /// True when some part of the segment uses the stable family.
    pub fn uses_stable_family(&self, n_points: usize) -> bool {
        self.split_index(n_points) < n_points.saturating_sub(1)
    }
}

impl std::fmt::Display for ChangePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangePoint::None => write!(f, "no change point"),
            ChangePoint::Simple { buffer } => write!(f, "simple change point ({buffer})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Verify where each policy splits an 11-point grid.
    //
    // Given
    // -----
    // - `n_points = 11` (right boundary at index 10).
    //
    // Expect
    // ------
    // - `None` splits at the terminal point.
    // - `Simple { buffer: 3 }` splits at index 7.
    // - A buffer larger than the grid splits at index 0.
    fn split_index_follows_buffer() {
        // Arrange
        let n = 11;

        // Act / Assert
        assert_eq!(ChangePoint::None.split_index(n), 10);
        assert_eq!(ChangePoint::simple(3).split_index(n), 7);
        assert_eq!(ChangePoint::simple(50).split_index(n), 0);
        assert!(!ChangePoint::None.uses_stable_family(n));
        assert!(ChangePoint::simple(1).uses_stable_family(n));
        assert!(!ChangePoint::simple(0).uses_stable_family(n));
    }

    #[test]
    // Purpose
    // -------
    // Policies are value objects: copies compare equal and are independent.
    fn copies_compare_by_value() {
        let template = ChangePoint::simple(100);
        let mut copy = template;
        assert_eq!(copy, template);

        copy = ChangePoint::simple(5);
        assert_ne!(copy, template);
        assert_eq!(template, ChangePoint::Simple { buffer: 100 });
    }
}
