//! Segment bridge statistics — guided proposals on one inter-observation
//! segment and the backward fold that chains them.
//!
//! Purpose
//! -------
//! Hold everything a guided proposal needs on segment `i` (time grid, target
//! and auxiliary laws, observation `(L, Σ, v)`, change-point policy, solver
//! tableau) together with the dense backward record of `(H, Hν, c)` over the
//! grid, and provide the strictly backward fold that seeds segment `i` with
//! the left-boundary triple of segment `i + 1`.
//!
//! Key behaviors
//! -------------
//! - Form the terminal condition `H_T = LᵀΣ⁻¹L + H_{i+1}`,
//!   `Hν_T = LᵀΣ⁻¹v + Hν_{i+1}`, `c_T = ½ vᵀΣ⁻¹v + ½ log|2πΣ| + c_{i+1}`.
//! - Solve the stable transition family on the change-point buffer next to
//!   the right boundary, then the Riccati family back to the left boundary.
//! - Validate the record (finite everywhere, left `H` positive
//!   semi-definite); failures are integration errors.
//! - Rebuild a bridge with new parameters θ for both laws, a new observation
//!   and a new policy, leaving the original untouched.
//!
//! Invariants & assumptions
//! ------------------------
//! - `record.len() == grid.len()` and `record[k]` belongs to `grid[k]`.
//! - Target law, auxiliary law and observation share the state dimension.
//! - Statistics of a path are produced by [`backward_fold`] in strictly
//!   decreasing segment order; nothing else builds seeded bridges.
//!
//! Conventions
//! -----------
//! - Segments are 0-based; segment `m − 1` is the last and has no seed.
//! - `log ρ̃(t_k, x) = −c_k − ½ xᵀH_k x + xᵀHν_k`.
use crate::bridge::{
    core::{
        change_point::ChangePoint,
        grid::validate_grid,
        law::{AuxiliaryLaw, DiffusionLaw, TargetLaw},
        observation::Observation,
        ode::{
            OdeScheme, condition_through, gaussian_log_normaliser, solve_riccati, solve_transition,
        },
        validation::{validate_psd, validate_record_finite},
    },
    errors::{BridgeError, BridgeResult},
};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView1};

/// BackwardTriple — `(H, Hν, c)` at one grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct BackwardTriple {
    pub h: DMatrix<f64>,
    pub hnu: DVector<f64>,
    pub c: f64,
}

impl BackwardTriple {
    /// Guiding term `log ρ̃(x) = −c − ½ xᵀHx + xᵀHν`.
    pub fn log_rho(&self, x: &DVector<f64>) -> f64 {
        -self.c - 0.5 * x.dot(&(&self.h * x)) + x.dot(&self.hnu)
    }

    /// Guiding score `r̃(x) = Hν − Hx`.
    pub fn r_tilde(&self, x: &DVector<f64>) -> DVector<f64> {
        &self.hnu - &self.h * x
    }
}

/// GuidedBridge — guided proposal statistic of one segment.
///
/// Purpose
/// -------
/// Represent the guided proposal on a single segment: which law is targeted,
/// which linear law guides it, what it is conditioned on at the right
/// endpoint, and the resulting backward record.
///
/// Fields
/// ------
/// - `grid`: fine time grid from the left to the right observation time.
/// - `target`, `aux`: target and auxiliary laws (both carry θ).
/// - `obs`: observation `(L, Σ, v)` at the right endpoint.
/// - `change_pt`: where the stable solver family takes over.
/// - `scheme`: Runge–Kutta tableau of both families.
/// - `record`: `(H, Hν, c)` per grid point.
///
/// Invariants
/// ----------
/// - Constructed only through [`GuidedBridge::new`] / [`GuidedBridge::recompute`],
///   so the record always matches the other fields.
#[derive(Debug, Clone, PartialEq)]
pub struct GuidedBridge<T, A> {
    grid: Array1<f64>,
    target: T,
    aux: A,
    obs: Observation,
    change_pt: ChangePoint,
    scheme: OdeScheme,
    record: Vec<BackwardTriple>,
}

impl<T: TargetLaw, A: AuxiliaryLaw> GuidedBridge<T, A> {
    /// Build and solve the guided statistic of `segment`.
    ///
    /// Parameters
    /// ----------
    /// - `segment`: `usize`
    ///   Segment index, used only for error context.
    /// - `grid`: `Array1<f64>`
    ///   Strictly increasing time grid with at least two points.
    /// - `target`, `aux`: laws of dimension `d`.
    /// - `obs`: [`Observation`] acting on dimension `d`.
    /// - `change_pt`: [`ChangePoint`] policy of this segment.
    /// - `scheme`: [`OdeScheme`] used by both solver families.
    /// - `seed`: `Option<&BackwardTriple>`
    ///   Left-boundary triple of segment `segment + 1`; `None` for the last
    ///   segment.
    ///
    /// Errors
    /// ------
    /// - Configuration: `InvalidGrid`, `StateDimensionMismatch`,
    ///   `NoiseNotPositiveDefinite`.
    /// - Integration: `NonFiniteStatistic`, `NotPositiveSemiDefinite`,
    ///   `SingularSystem`.
    pub fn new(
        segment: usize, grid: Array1<f64>, target: T, aux: A, obs: Observation,
        change_pt: ChangePoint, scheme: OdeScheme, seed: Option<&BackwardTriple>,
    ) -> BridgeResult<Self> {
        validate_grid(segment, &grid)?;
        let d = target.dim();
        for found in [aux.dim(), obs.state_dim()] {
            if found != d {
                return Err(BridgeError::StateDimensionMismatch { segment, expected: d, found });
            }
        }
        if let Some(seed) = seed {
            if seed.h.nrows() != d || seed.hnu.len() != d {
                return Err(BridgeError::StateDimensionMismatch {
                    segment,
                    expected: d,
                    found: seed.hnu.len(),
                });
            }
        }
        let record = solve_segment(segment, grid.view(), &aux, &obs, change_pt, scheme, seed)?;
        Ok(GuidedBridge { grid, target, aux, obs, change_pt, scheme, record })
    }

    /// Fresh bridge on the same grid with new conditioning and parameters.
    ///
    /// When `theta` is given it replaces the parameters of both the target
    /// and the auxiliary law before solving. `self` is never modified.
    pub fn recompute(
        &self, segment: usize, obs: Observation, change_pt: ChangePoint,
        theta: Option<ArrayView1<'_, f64>>, seed: Option<&BackwardTriple>,
    ) -> BridgeResult<Self> {
        let mut target = self.target.clone();
        let mut aux = self.aux.clone();
        if let Some(theta) = theta {
            target.set_params(theta)?;
            aux.set_params(theta)?;
        }
        let grid = self.grid.clone();
        GuidedBridge::new(segment, grid, target, aux, obs, change_pt, self.scheme, seed)
    }

    /// Guiding score `r̃(t_k, x) = Hν_k − H_k x`.
    pub fn r_tilde(&self, k: usize, x: &DVector<f64>) -> BridgeResult<DVector<f64>> {
        Ok(self.triple(k)?.r_tilde(x))
    }

    /// Guided drift `b(t_k, x) + a(t_k, x) r̃(t_k, x)` at grid point `k`.
    pub fn guided_drift(&self, k: usize, x: &DVector<f64>) -> BridgeResult<DVector<f64>> {
        let r = self.r_tilde(k, x)?;
        let t = self.grid[k];
        Ok(self.target.drift(t, x) + self.target.diffusion(t, x) * r)
    }

    /// Guiding term `log ρ̃(t_k, x)`.
    pub fn log_rho(&self, k: usize, x: &DVector<f64>) -> BridgeResult<f64> {
        Ok(self.triple(k)?.log_rho(x))
    }

    /// Triple at grid point `k`.
    pub fn triple(&self, k: usize) -> BridgeResult<&BackwardTriple> {
        self.record.get(k).ok_or(BridgeError::IndexOutOfRange { index: k, len: self.record.len() })
    }
}

impl<T, A> GuidedBridge<T, A> {
    /// Left-boundary triple, the seed of the previous segment.
    pub fn seed(&self) -> &BackwardTriple {
        &self.record[0]
    }

    pub fn record(&self) -> &[BackwardTriple] {
        &self.record
    }

    pub fn grid(&self) -> &Array1<f64> {
        &self.grid
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn aux(&self) -> &A {
        &self.aux
    }

    pub fn observation(&self) -> &Observation {
        &self.obs
    }

    pub fn change_pt(&self) -> ChangePoint {
        self.change_pt
    }

    pub fn scheme(&self) -> OdeScheme {
        self.scheme
    }

    /// State dimension `d`.
    pub fn dim(&self) -> usize {
        self.obs.state_dim()
    }
}

/// Fold over segments `m − 1, …, 0`, threading left-boundary seeds.
///
/// `build(i, seed)` must produce the bridge of segment `i` given the seed of
/// segment `i + 1` (`None` for `i = m − 1`). The first error stops the fold.
///
/// Returns
/// -------
/// `BridgeResult<Vec<GuidedBridge<T, A>>>`
///   Bridges in segment order `0..m`.
pub fn backward_fold<T, A, F>(m: usize, mut build: F) -> BridgeResult<Vec<GuidedBridge<T, A>>>
where
    F: FnMut(usize, Option<&BackwardTriple>) -> BridgeResult<GuidedBridge<T, A>>,
{
    let mut bridges: Vec<GuidedBridge<T, A>> = Vec::with_capacity(m);
    for i in (0..m).rev() {
        let bridge = build(i, bridges.last().map(GuidedBridge::seed))?;
        bridges.push(bridge);
    }
    bridges.reverse();
    Ok(bridges)
}

/// Reference statistics for a whole path.
///
/// Segment `i` uses `grids[i]`, `auxes[i]`, `observations[i]`,
/// `change_pts[i]` and a clone of `target`; all slices must have the same
/// length `m ≥ 1`.
///
/// Errors
/// ------
/// - `BridgeError::EmptyPath` for `m = 0`.
/// - `BridgeError::PathLengthMismatch` when the slices disagree in length.
/// - Any error of [`GuidedBridge::new`].
pub fn build_bridges<T: TargetLaw, A: AuxiliaryLaw>(
    grids: &[Array1<f64>], target: &T, auxes: &[A], observations: &[Observation],
    change_pts: &[ChangePoint], scheme: OdeScheme,
) -> BridgeResult<Vec<GuidedBridge<T, A>>> {
    let m = grids.len();
    if m == 0 {
        return Err(BridgeError::EmptyPath);
    }
    for found in [auxes.len(), observations.len(), change_pts.len()] {
        if found != m {
            return Err(BridgeError::PathLengthMismatch { expected: m, found });
        }
    }
    backward_fold(m, |i, seed| {
        GuidedBridge::new(
            i,
            grids[i].clone(),
            target.clone(),
            auxes[i].clone(),
            observations[i].clone(),
            change_pts[i],
            scheme,
            seed,
        )
    })
}

// ---- Helper Methods ----

/// Terminal triple at the right boundary of `segment`.
fn terminal_condition(
    segment: usize, obs: &Observation, seed: Option<&BackwardTriple>,
) -> BridgeResult<BackwardTriple> {
    let chol = obs
        .sigma()
        .clone()
        .cholesky()
        .ok_or(BridgeError::NoiseNotPositiveDefinite { segment })?;
    let sinv_l = chol.solve(obs.l());
    let sinv_v = chol.solve(obs.v());
    let lt = obs.l().transpose();
    let mut h = &lt * sinv_l;
    let mut hnu = &lt * &sinv_v;
    let mut c = 0.5 * obs.v().dot(&sinv_v) + gaussian_log_normaliser(&chol.l().diagonal());
    if let Some(seed) = seed {
        h += &seed.h;
        hnu += &seed.hnu;
        c += seed.c;
    }
    Ok(BackwardTriple { h, hnu, c })
}

/// Solve both families over the grid and validate the record.
fn solve_segment<A: AuxiliaryLaw>(
    segment: usize, grid: ArrayView1<'_, f64>, aux: &A, obs: &Observation,
    change_pt: ChangePoint, scheme: OdeScheme, seed: Option<&BackwardTriple>,
) -> BridgeResult<Vec<BackwardTriple>> {
    let n = grid.len();
    let last = n - 1;
    let split = change_pt.split_index(n);
    let terminal = terminal_condition(segment, obs, seed)?;

    // built from the right boundary backward, reversed at the end
    let mut reversed: Vec<BackwardTriple> = Vec::with_capacity(n);
    let transitions = solve_transition(scheme, grid, aux, split, last);
    for (offset, transition) in transitions.iter().enumerate() {
        let grid_index = last - 1 - offset;
        let triple = condition_through(&terminal, transition)
            .ok_or(BridgeError::SingularSystem { segment, grid_index })?;
        reversed.push(triple);
    }
    let handover = reversed.last().unwrap_or(&terminal).clone();
    let head = solve_riccati(scheme, grid, aux, &handover, 0, split);

    let mut record: Vec<BackwardTriple> = Vec::with_capacity(n);
    record.extend(head.into_iter().rev());
    record.push(handover);
    record.extend(reversed.into_iter().rev().skip(1));
    if split < last {
        record.push(terminal);
    }
    validate_record_finite(segment, &record)?;
    validate_psd(segment, &record[0].h)?;
    Ok(record)
}
