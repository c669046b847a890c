//! Conversion helpers shared by the Python bindings.
//!
//! Block ranges are handed to Python as `(start, stop)` pairs so they can be
//! fed straight into `range(start, stop)` or slice syntax.
use std::ops::Range;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use numpy::PyReadonlyArray1;

/// Half-open ranges as `(start, stop)` pairs.
pub fn ranges_to_pairs(blocks: &[Range<usize>]) -> Vec<(usize, usize)> {
    blocks.iter().map(|b| (b.start, b.end)).collect()
}

/// Knot list from a 1-D integer `numpy.ndarray` or a sequence of ints.
///
/// Errors
/// ------
/// - `TypeError` if `raw_knots` is neither, or holds negative entries.
#[cfg(feature = "python-bindings")]
pub fn extract_knots<'py>(raw_knots: &Bound<'py, PyAny>) -> PyResult<Vec<usize>> {
    if let Ok(arr) = raw_knots.extract::<PyReadonlyArray1<i64>>() {
        return arr
            .as_array()
            .iter()
            .map(|&k| {
                usize::try_from(k)
                    .map_err(|_| PyTypeError::new_err("knots must be non-negative integers"))
            })
            .collect();
    }
    raw_knots.extract::<Vec<usize>>().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray or sequence of non-negative ints")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Ranges map to their bounds in order.
    fn ranges_become_pairs() {
        assert_eq!(ranges_to_pairs(&[0..1, 1..3, 3..4]), vec![(0, 1), (1, 3), (3, 4)]);
        assert!(ranges_to_pairs(&[]).is_empty());
    }
}
