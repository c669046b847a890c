//! Backward ODE solvers for guided-proposal statistics.
//!
//! Purpose
//! -------
//! Integrate, backward in time over a segment grid, the two solver families
//! that produce the guiding triple `(H, Hν, c)`:
//!
//! - the Riccati family, solving directly
//!   `dH/dt  = −BᵀH − HB + H ã H`,
//!   `dHν/dt = −BᵀHν + H ã Hν + Hβ`,
//!   `dc/dt  = βᵀHν + ½ Hνᵀ ã Hν − ½ tr(H ã)`;
//! - the stable transition family, solving the linear system
//!   `dΦ/dt = −ΦB`, `dμ/dt = −Φβ`, `dQ/dt = −Φ ã Φᵀ` from `(I, 0, 0)` at the
//!   right boundary and pushing the terminal triple through the Gaussian
//!   transition `X_T | X_t ~ N(Φ X_t + μ, Q)`.
//!
//! Conventions
//! -----------
//! - `log ρ̃(t, x) = −c − ½ xᵀHx + xᵀHν`, so `c` is the negative log
//!   normalising constant of the guiding term.
//! - Steps run from grid point `k + 1` to `k` with a negative step size.
//! - Both families use the explicit Runge–Kutta tableau of [`OdeScheme`].
//!
//! Invariants & assumptions
//! ------------------------
//! - The transition family never inverts `H_T`; it only solves with
//!   `I + H_T Q`, which stays well-posed when `H_T ≈ I/ε` at exact pins.
//! - Symmetry of `H` is restored after every step.
use crate::bridge::core::{law::AuxiliaryLaw, statistic::BackwardTriple};
use nalgebra::{DMatrix, DVector};
use ndarray::ArrayView1;
use std::f64::consts::PI;

/// Explicit Runge–Kutta tableau used by the backward solvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OdeScheme {
    /// Third-order Ralston method (three stages).
    #[default]
    Ralston3,
    /// Classical fourth-order Runge–Kutta (four stages).
    Rk4,
}

static RALSTON3_C: [f64; 3] = [0.0, 0.5, 0.75];
static RALSTON3_A: [&[f64]; 3] = [&[], &[0.5], &[0.0, 0.75]];
static RALSTON3_B: [f64; 3] = [2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0];

static RK4_C: [f64; 4] = [0.0, 0.5, 0.5, 1.0];
static RK4_A: [&[f64]; 4] = [&[], &[0.5], &[0.0, 0.5], &[0.0, 0.0, 1.0]];
static RK4_B: [f64; 4] = [1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0];

impl OdeScheme {
    fn tableau(&self) -> (&'static [f64], &'static [&'static [f64]], &'static [f64]) {
        match self {
            OdeScheme::Ralston3 => (&RALSTON3_C[..], &RALSTON3_A[..], &RALSTON3_B[..]),
            OdeScheme::Rk4 => (&RK4_C[..], &RK4_A[..], &RK4_B[..]),
        }
    }

    /// One explicit step `y(t) → y(t + h)` of `dy/dt = rhs(t, y)`.
    pub(crate) fn step<S, F>(&self, t: f64, y: &S, h: f64, rhs: F) -> S
    where
        S: OdeState,
        F: Fn(f64, &S) -> S,
    {
        let (c, a, b) = self.tableau();
        let mut stages: Vec<S> = Vec::with_capacity(b.len());
        for (ci, ai) in c.iter().zip(a.iter()) {
            let yi = ai.iter().zip(stages.iter()).fold(y.clone(), |acc, (aij, kj)| {
                if *aij == 0.0 { acc } else { acc.add_scaled(h * aij, kj) }
            });
            stages.push(rhs(t + ci * h, &yi));
        }
        b.iter().zip(stages.iter()).fold(y.clone(), |acc, (bi, ki)| acc.add_scaled(h * bi, ki))
    }
}

/// State of an ODE system that an explicit Runge–Kutta step can combine.
pub(crate) trait OdeState: Clone {
    /// `self + scale · other`.
    fn add_scaled(&self, scale: f64, other: &Self) -> Self;
}

impl OdeState for BackwardTriple {
    fn add_scaled(&self, scale: f64, other: &Self) -> Self {
        BackwardTriple {
            h: &self.h + &other.h * scale,
            hnu: &self.hnu + &other.hnu * scale,
            c: self.c + scale * other.c,
        }
    }
}

/// Linear transition `X_T | X_t ~ N(Φ X_t + μ, Q)` of the auxiliary law.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub phi: DMatrix<f64>,
    pub mu: DVector<f64>,
    pub q: DMatrix<f64>,
}

impl Transition {
    /// Transition over an empty interval: `(I, 0, 0)`.
    pub fn identity(dim: usize) -> Self {
        Transition {
            phi: DMatrix::identity(dim, dim),
            mu: DVector::zeros(dim),
            q: DMatrix::zeros(dim, dim),
        }
    }
}

impl OdeState for Transition {
    fn add_scaled(&self, scale: f64, other: &Self) -> Self {
        Transition {
            phi: &self.phi + &other.phi * scale,
            mu: &self.mu + &other.mu * scale,
            q: &self.q + &other.q * scale,
        }
    }
}

/// Right-hand side of the Riccati system at time `t`.
pub(crate) fn riccati_rhs<A: AuxiliaryLaw>(aux: &A, t: f64, y: &BackwardTriple) -> BackwardTriple {
    let b = aux.b(t);
    let beta = aux.beta(t);
    let a = aux.a(t);
    let bt = b.transpose();
    let ha = &y.h * &a;
    let dh = -(&bt * &y.h) - &y.h * &b + &ha * &y.h;
    let dhnu = -(&bt * &y.hnu) + &ha * &y.hnu + &y.h * &beta;
    let dc = beta.dot(&y.hnu) + 0.5 * y.hnu.dot(&(&a * &y.hnu)) - 0.5 * ha.trace();
    BackwardTriple { h: dh, hnu: dhnu, c: dc }
}

/// Right-hand side of the transition system at time `t`.
pub(crate) fn transition_rhs<A: AuxiliaryLaw>(aux: &A, t: f64, y: &Transition) -> Transition {
    let b = aux.b(t);
    let beta = aux.beta(t);
    let a = aux.a(t);
    Transition {
        phi: -(&y.phi * &b),
        mu: -(&y.phi * &beta),
        q: -(&y.phi * &a * y.phi.transpose()),
    }
}

/// Integrate the Riccati family backward from `grid[hi]` to `grid[lo]`.
///
/// Returns the triples at grid points `lo..hi` ordered from `hi − 1` down to
/// `lo` (the seed at `hi` is not repeated).
pub(crate) fn solve_riccati<A: AuxiliaryLaw>(
    scheme: OdeScheme, grid: ArrayView1<'_, f64>, aux: &A, seed: &BackwardTriple, lo: usize,
    hi: usize,
) -> Vec<BackwardTriple> {
    let mut out: Vec<BackwardTriple> = Vec::with_capacity(hi.saturating_sub(lo));
    for k in (lo..hi).rev() {
        let prev = out.last().unwrap_or(seed);
        let h = grid[k] - grid[k + 1];
        let mut next = scheme.step(grid[k + 1], prev, h, |t, y| riccati_rhs(aux, t, y));
        symmetrize(&mut next.h);
        out.push(next);
    }
    out
}

/// Integrate the transition family backward from `grid[hi]` to `grid[lo]`.
///
/// Returns the transitions from grid points `lo..hi` to `grid[hi]`, ordered
/// from `hi − 1` down to `lo`.
pub(crate) fn solve_transition<A: AuxiliaryLaw>(
    scheme: OdeScheme, grid: ArrayView1<'_, f64>, aux: &A, lo: usize, hi: usize,
) -> Vec<Transition> {
    let start = Transition::identity(aux.dim());
    let mut out: Vec<Transition> = Vec::with_capacity(hi.saturating_sub(lo));
    for k in (lo..hi).rev() {
        let prev = out.last().unwrap_or(&start);
        let h = grid[k] - grid[k + 1];
        let mut next = scheme.step(grid[k + 1], prev, h, |t, y| transition_rhs(aux, t, y));
        symmetrize(&mut next.q);
        out.push(next);
    }
    out
}

/// Push a terminal triple through a linear Gaussian transition.
///
/// With `K = (I + H_T Q)⁻¹` and `g = Hν_T − H_T μ`:
/// `H = Φᵀ K H_T Φ`, `Hν = Φᵀ K g`,
/// `c = c_T + ½ log det(I + H_T Q) + ½ μᵀ H_T μ − μᵀ Hν_T − ½ (Q g)ᵀ K g`.
///
/// Returns `None` when `I + H_T Q` is singular.
pub(crate) fn condition_through(
    terminal: &BackwardTriple, transition: &Transition,
) -> Option<BackwardTriple> {
    let dim = terminal.h.nrows();
    let system = DMatrix::identity(dim, dim) + &terminal.h * &transition.q;
    let lu = system.lu();
    let kh = lu.solve(&terminal.h)?;
    let g = &terminal.hnu - &terminal.h * &transition.mu;
    let kg = lu.solve(&g)?;
    let log_det = lu.u().diagonal().iter().map(|u| u.abs().ln()).sum::<f64>();

    let phi_t = transition.phi.transpose();
    let mut h = &phi_t * kh * &transition.phi;
    symmetrize(&mut h);
    let hnu = &phi_t * &kg;
    let c = terminal.c + 0.5 * log_det + 0.5 * transition.mu.dot(&(&terminal.h * &transition.mu))
        - transition.mu.dot(&terminal.hnu)
        - 0.5 * (&transition.q * &g).dot(&kg);
    Some(BackwardTriple { h, hnu, c })
}

/// `½ (m log 2π + log|Σ|)` given the Cholesky factor diagonal of `Σ`.
pub(crate) fn gaussian_log_normaliser(chol_diagonal: &DVector<f64>) -> f64 {
    let m = chol_diagonal.len() as f64;
    let log_det = 2.0 * chol_diagonal.iter().map(|x| x.ln()).sum::<f64>();
    0.5 * (m * (2.0 * PI).ln() + log_det)
}

fn symmetrize(m: &mut DMatrix<f64>) {
    let sym = (&*m + m.transpose()) * 0.5;
    *m = sym;
}
