//! guided_bridges — chequered block updating for guided diffusion bridges.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge for the
//! `_guided_bridges` extension module. The crate implements the
//! block-updating scheduler of an MCMC sampler for partially observed
//! diffusions: it partitions a multi-segment path into two interlaced block
//! covers, alternates between them, and keeps each segment's guided-proposal
//! statistic `(H, Hν, c)` consistent with the current path and parameters.
//!
//! Key behaviors
//! -------------
//! - [`bridge`] holds the per-segment guided statistics: diffusion-law
//!   traits, observations, backward ODE solvers, change points, path buffers
//!   and the crate error type.
//! - [`blocking`] holds the schedules ([`blocking::ChequeredBlocking`],
//!   [`blocking::NoBlocking`]) behind the [`blocking::BlockingScheme`]
//!   contract.
//! - With the `python-bindings` feature, exposes the block layout and grid
//!   helpers to Python.
//!
//! Invariants & assumptions
//! ------------------------
//! - Backward statistics are always recomputed from the last segment to the
//!   first; schedules are immutable values replaced on every sweep.
//! - Everything runs on the caller's thread; each chain owns its schedule
//!   and path buffers.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based for segments, blocks, knots and grid points.
//! - Errors are [`bridge::BridgeError`] values classified by
//!   [`bridge::ErrorClass`]; they convert to Python `ValueError` at the FFI
//!   boundary.
//! - The library logs through the `log` facade and never installs a logger.
//!
//! Downstream usage
//! ----------------
//! - Build reference statistics with [`bridge::build_bridges`], wrap them in
//!   a schedule, then per sweep call `advance`, propose on `blocks()`,
//!   `register_outcome` and swap accepted buffers in a
//!   [`bridge::PathPair`].
//!
//! Testing notes
//! -------------
//! - Unit tests live next to the code; `tests/integration_blocking_pipeline.rs`
//!   runs full sweeps through the public API.

pub mod blocking;
pub mod bridge;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    blocking::layout::{ChequeredLayout, Cover},
    bridge::core::grid,
    utils::{extract_knots, ranges_to_pairs},
};

/// BlockingLayout — Python view of a chequered knot layout.
///
/// Purpose
/// -------
/// Let Python callers inspect how a knot list splits into two covers and
/// which blocks each cover proposes on, without building any statistics.
///
/// Parameters
/// ----------
/// Constructed from Python via `BlockingLayout(knots, n_segments)`:
/// - `knots`: 1-D integer array or sequence, strictly increasing.
/// - `n_segments`: number of path segments `m ≥ 1`.
///
/// Fields
/// ------
/// - `inner`: [`ChequeredLayout`]
///
/// Notes
/// -----
/// - Blocks are returned as `(start, stop)` pairs of 0-based segment indices.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "guided_bridges.blocking")]
pub struct BlockingLayout {
    inner: ChequeredLayout,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl BlockingLayout {
    #[new]
    #[pyo3(text_signature = "(knots, n_segments, /)")]
    pub fn new<'py>(knots: &Bound<'py, PyAny>, n_segments: usize) -> PyResult<Self> {
        let knots = extract_knots(knots)?;
        let inner = ChequeredLayout::new(&knots, n_segments)?;
        Ok(BlockingLayout { inner })
    }

    #[getter]
    pub fn n_segments(&self) -> usize {
        self.inner.n_segments()
    }

    #[getter]
    pub fn knots_a(&self) -> Vec<usize> {
        self.inner.knots(Cover::A).to_vec()
    }

    #[getter]
    pub fn knots_b(&self) -> Vec<usize> {
        self.inner.knots(Cover::B).to_vec()
    }

    #[getter]
    pub fn blocks_a(&self) -> Vec<(usize, usize)> {
        ranges_to_pairs(self.inner.blocks(Cover::A))
    }

    #[getter]
    pub fn blocks_b(&self) -> Vec<(usize, usize)> {
        ranges_to_pairs(self.inner.blocks(Cover::B))
    }

    pub fn __repr__(&self) -> String {
        format!(
            "BlockingLayout(n_segments={}, knots_a={:?}, knots_b={:?}, block_sizes_a={:?}, \
             block_sizes_b={:?})",
            self.inner.n_segments(),
            self.inner.knots(Cover::A),
            self.inner.knots(Cover::B),
            self.inner.block_sizes(Cover::A),
            self.inner.block_sizes(Cover::B)
        )
    }
}

/// Uniform grid on `[t0, t1]` with step `dt`, as a NumPy array.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(t0, t1, dt, /)")]
pub fn uniform_grid<'py>(
    py: Python<'py>, t0: f64, t1: f64, dt: f64,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    Ok(grid::uniform_grid(t0, t1, dt)?.into_pyarray(py))
}

/// Time-changed grid on `[t0, t1]`, denser towards `t1`, as a NumPy array.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(t0, t1, dt, /)")]
pub fn time_changed_grid<'py>(
    py: Python<'py>, t0: f64, t1: f64, dt: f64,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    Ok(grid::time_changed_grid(t0, t1, dt)?.into_pyarray(py))
}

/// _guided_bridges — PyO3 module initializer for the Python extension.
///
/// Creates the `blocking` and `grids` submodules, attaches them to the
/// parent module and registers them in `sys.modules` so dotted imports work.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _guided_bridges<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let blocking_mod = PyModule::new(_py, "blocking")?;
    let grids_mod = PyModule::new(_py, "grids")?;
    blocking(_py, m, &blocking_mod)?;
    grids(_py, m, &grids_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("guided_bridges.blocking", blocking_mod)?;
    _py.import("sys")?.getattr("modules")?.set_item("guided_bridges.grids", grids_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn blocking<'py>(
    _py: Python, guided_bridges: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<BlockingLayout>()?;
    guided_bridges.add_submodule(m)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn grids<'py>(
    _py: Python, guided_bridges: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(uniform_grid, m)?)?;
    m.add_function(wrap_pyfunction!(time_changed_grid, m)?)?;
    guided_bridges.add_submodule(m)?;
    Ok(())
}
