//! Fine time grids for segment bridges.
//!
//! Guided statistics are stiff close to the right boundary of a segment, so
//! the usual grid is a uniform grid pushed through the time change
//! `τ(s) = t0 + (s − t0)(2 − (s − t0)/(t1 − t0))`, which keeps both endpoints
//! fixed and shrinks the steps towards `t1`.
use crate::bridge::errors::{BridgeError, BridgeResult};
use ndarray::Array1;

/// Uniform grid `t0, t0 + dt, …` with `t1` always included as the last point.
///
/// A final step shorter than `dt` is kept as is rather than merged; points
/// closer to `t1` than `1e-6 · dt` are dropped so the time change below stays
/// strictly increasing.
///
/// Errors
/// ------
/// - `BridgeError::InvalidStep` when `t0`, `t1` or `dt` is non-finite,
///   `dt <= 0`, or `t0 >= t1`.
pub fn uniform_grid(t0: f64, t1: f64, dt: f64) -> BridgeResult<Array1<f64>> {
    if !t0.is_finite() || !t1.is_finite() || !dt.is_finite() || dt <= 0.0 || t0 >= t1 {
        return Err(BridgeError::InvalidStep { t0, t1, dt });
    }
    let n_steps = ((t1 - t0) / dt).ceil() as usize;
    let mut grid: Vec<f64> =
        (0..n_steps).map(|k| t0 + k as f64 * dt).take_while(|&t| t1 - t > 1e-6 * dt).collect();
    grid.push(t1);
    Ok(Array1::from(grid))
}

/// Uniform grid mapped through the boundary-concentrating time change.
///
/// Examples
/// --------
/// ```rust
/// # use guided_bridges::bridge::core::grid::time_changed_grid;
/// let grid = time_changed_grid(0.0, 1.0, 0.25).unwrap();
/// assert_eq!(grid.len(), 5);
/// assert_eq!(grid[0], 0.0);
/// assert_eq!(grid[4], 1.0);
/// // steps shrink towards the right boundary
/// assert!(grid[4] - grid[3] < grid[1] - grid[0]);
/// ```
pub fn time_changed_grid(t0: f64, t1: f64, dt: f64) -> BridgeResult<Array1<f64>> {
    let span = t1 - t0;
    Ok(uniform_grid(t0, t1, dt)?.mapv(|s| {
        let u = s - t0;
        t0 + u * (2.0 - u / span)
    }))
}

/// Check that `grid` can carry a backward recursion for `segment`.
///
/// Errors
/// ------
/// - `BridgeError::InvalidGrid` for fewer than two points, non-finite
///   entries, or a step that is not strictly positive.
pub fn validate_grid(segment: usize, grid: &Array1<f64>) -> BridgeResult<()> {
    if grid.len() < 2 {
        return Err(BridgeError::InvalidGrid {
            segment,
            reason: "a grid needs at least two points.",
        });
    }
    if grid.iter().any(|t| !t.is_finite()) {
        return Err(BridgeError::InvalidGrid { segment, reason: "grid points must be finite." });
    }
    if grid.iter().zip(grid.iter().skip(1)).any(|(left, right)| right <= left) {
        return Err(BridgeError::InvalidGrid {
            segment,
            reason: "grid points must be strictly increasing.",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    // Purpose
    // -------
    // The uniform grid hits both endpoints even when `dt` does not divide
    // the interval.
    //
    // Given
    // -----
    // - `[0, 1]` with `dt = 0.3`.
    //
    // Expect
    // ------
    // - Points `0, 0.3, 0.6, 0.9, 1.0`.
    fn uniform_grid_includes_right_endpoint() {
        let grid = uniform_grid(0.0, 1.0, 0.3).unwrap();

        assert_eq!(grid.len(), 5);
        assert_abs_diff_eq!(grid[3], 0.9, epsilon = 1e-12);
        assert_eq!(grid[4], 1.0);
    }

    #[test]
    // Purpose
    // -------
    // The time change keeps endpoints, stays increasing and concentrates
    // points near `t1`.
    fn time_change_concentrates_near_right_boundary() {
        let grid = time_changed_grid(2.0, 4.0, 0.1).unwrap();

        assert_eq!(grid[0], 2.0);
        assert_abs_diff_eq!(grid[grid.len() - 1], 4.0, epsilon = 1e-12);
        assert!(validate_grid(0, &grid).is_ok());
        let first = grid[1] - grid[0];
        let last = grid[grid.len() - 1] - grid[grid.len() - 2];
        assert!(last < first);
    }

    #[test]
    // Purpose
    // -------
    // Degenerate inputs are configuration errors, not panics.
    fn invalid_inputs_are_rejected() {
        assert!(matches!(uniform_grid(1.0, 1.0, 0.1), Err(BridgeError::InvalidStep { .. })));
        assert!(matches!(uniform_grid(0.0, 1.0, 0.0), Err(BridgeError::InvalidStep { .. })));
        assert!(matches!(uniform_grid(0.0, f64::NAN, 0.1), Err(BridgeError::InvalidStep { .. })));

        let short = Array1::from(vec![0.0]);
        assert!(matches!(
            validate_grid(2, &short),
            Err(BridgeError::InvalidGrid { segment: 2, .. })
        ));
        let unordered = Array1::from(vec![0.0, 0.5, 0.5]);
        assert!(validate_grid(0, &unordered).is_err());
    }
}
