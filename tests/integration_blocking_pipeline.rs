//! Integration tests for block-updating schedules.
//!
//! Purpose
//! -------
//! - Drive complete path-update sweeps through the public API: reference
//!   statistics → schedule → advance → propose/accept per block → register
//!   outcome → swap accepted buffers, the way an outer MCMC loop would.
//! - Check that the chequered and unblocked schemes are interchangeable
//!   behind `Blocking`.
//!
//! Coverage
//! --------
//! - `bridge::core`: `build_bridges`, `uniform_grid`, `PathPair`,
//!   `SegmentPath`.
//! - `blocking`: `ChequeredBlocking`, `NoBlocking`, `Blocking`,
//!   `BlockingScheme`, `BlockingOptions`.
//!
//! Exclusions
//! ----------
//! - Forward simulation of guided proposals and acceptance probabilities;
//!   proposals here are synthetic endpoint moves.
//! - Python bindings.
use guided_bridges::{
    blocking::{
        Blocking, BlockingOptions, BlockingScheme, ChequeredBlocking, Cover, EndpointTarget,
        NoBlocking,
    },
    bridge::{
        BridgeError, ChangePoint, DiffusionLaw, GuidedBridge, Observation, OdeScheme,
        OrnsteinUhlenbeck, PathBuffer, PathPair, SegmentPath, build_bridges,
        core::{grid::uniform_grid, path::BufferTag},
        errors::ErrorClass,
    },
};
use nalgebra::{dmatrix, dvector};
use ndarray::{Array1, Array2, array};

const M: usize = 6;

fn law() -> OrnsteinUhlenbeck {
    OrnsteinUhlenbeck::new(2, array![0.6, 0.1, 0.8].view()).unwrap()
}

/// Reference statistics: six unit segments of a 2-d OU path, first
/// coordinate observed with `Σ = 1e-4`.
fn reference() -> Vec<GuidedBridge<OrnsteinUhlenbeck, OrnsteinUhlenbeck>> {
    let grids: Vec<Array1<f64>> =
        (0..M).map(|i| uniform_grid(i as f64, i as f64 + 1.0, 0.05).unwrap()).collect();
    let observations: Vec<Observation> = (0..M)
        .map(|i| {
            Observation::new(dmatrix![1.0, 0.0], dmatrix![1e-4], dvector![(i as f64).sin()])
                .unwrap()
        })
        .collect();
    build_bridges(
        &grids,
        &law(),
        &vec![law(); M],
        &observations,
        &vec![ChangePoint::simple(10); M],
        OdeScheme::Ralston3,
    )
    .unwrap()
}

/// Initial path: per segment, a straight line from `(sin i, 0)` to
/// `(sin(i + 1), 0)` on a 5-point grid.
fn initial_paths() -> PathPair {
    let segments = (0..M)
        .map(|i| {
            let tt = Array1::linspace(i as f64, i as f64 + 1.0, 5);
            let (a, b) = ((i as f64).sin(), (i as f64 + 1.0).sin());
            let yy = Array2::from_shape_fn((5, 2), |(k, j)| {
                if j == 0 { a + (b - a) * k as f64 / 4.0 } else { 0.0 }
            });
            SegmentPath::new(i, BufferTag::First, tt, yy).unwrap()
        })
        .collect();
    PathPair::new(segments).unwrap()
}

/// Synthetic proposal: move the endpoint of every segment in `block`.
fn propose(paths: &mut PathPair, block: std::ops::Range<usize>, shift: f64) {
    for i in block {
        let yy = paths.proposal_mut(i).unwrap().yy_mut();
        let last = yy.nrows() - 1;
        yy[[last, 1]] += shift;
    }
}

/// Run `sweeps` sweeps, accepting even-numbered blocks.
fn run_sweeps(
    mut schedule: Blocking<OrnsteinUhlenbeck, OrnsteinUhlenbeck>, paths: &mut PathPair,
    sweeps: usize,
) -> Blocking<OrnsteinUhlenbeck, OrnsteinUhlenbeck> {
    let theta = array![0.6, 0.1, 0.8];
    for sweep in 0..sweeps {
        schedule = schedule.advance(&*paths, theta.view()).unwrap();
        let blocks = schedule.blocks().to_vec();
        for (k, block) in blocks.into_iter().enumerate() {
            propose(paths, block.clone(), 0.1 * (sweep + 1) as f64);
            let accepted = k % 2 == 0;
            if accepted {
                paths.swap_block(block).unwrap();
            }
            schedule.register_outcome(k, accepted).unwrap();
        }
    }
    schedule
}

#[test]
// Purpose
// -------
// Four chequered sweeps alternate covers, count outcomes per cover and pin
// knots to the accepted path.
//
// Given
// -----
// - Knots `[1, 2, 3]` over six segments: A = `[1, 3]`, B = `[2]`.
// - Blocks with even index accepted, odd index rejected.
//
// Expect
// ------
// - After four sweeps the next cover is A again and each cover was swept
//   twice: A proposed `[2, 2, 2]`, accepted `[2, 0, 2]`; B proposed `[2, 2]`,
//   accepted `[2, 0]`.
// - The following sweep's pinned targets equal the current endpoints.
fn chequered_sweeps_alternate_and_pin_to_accepted_path() {
    let opts = BlockingOptions::new(1e-7, ChangePoint::simple(10)).unwrap();
    let schedule =
        Blocking::Chequered(ChequeredBlocking::new(&[1, 2, 3], &opts, reference()).unwrap());
    let mut paths = initial_paths();

    let schedule = run_sweeps(schedule, &mut paths, 4);

    let Blocking::Chequered(chequered) = &schedule else {
        panic!("expected a chequered schedule");
    };
    assert_eq!(chequered.next_cover(), Cover::A);
    assert_eq!(chequered.counters_of(Cover::A).proposed(), &[2, 2, 2]);
    assert_eq!(chequered.counters_of(Cover::A).accepted(), &[2, 0, 2]);
    assert_eq!(chequered.counters_of(Cover::B).proposed(), &[2, 2]);
    assert_eq!(chequered.counters_of(Cover::B).accepted(), &[2, 0]);

    let targets = schedule.endpoint_targets(&paths).unwrap();
    for (i, target) in targets.iter().enumerate() {
        match target {
            EndpointTarget::Pinned(v) => {
                assert!([1, 3].contains(&i));
                let end = paths.endpoint(i).unwrap();
                assert_eq!(v.as_slice(), end.as_slice().unwrap());
            }
            EndpointTarget::Observed(v) => assert_eq!(v, &dvector![(i as f64).sin()]),
        }
    }
}

#[test]
// Purpose
// -------
// After an advance, every segment carries θ and statistics whose left
// boundary `H` is finite; the unblocked scheme runs the same loop.
//
// Given
// -----
// - The same reference statistics wrapped in `NoBlocking` and in a
//   chequered schedule.
//
// Expect
// ------
// - NoBlocking: one block `0..6`, proposed three times, statistics
//   unchanged.
// - Chequered: all laws carry θ after an advance with a new θ.
fn schemes_are_interchangeable() {
    let mut paths = initial_paths();
    let unblocked = Blocking::from(NoBlocking::new(reference()).unwrap());

    let after = run_sweeps(unblocked.clone(), &mut paths, 3);

    assert_eq!(after.blocks(), &[0..M]);
    assert_eq!(after.counters().proposed(), &[3]);
    assert_eq!(after.bridges(), unblocked.bridges());

    let theta = array![1.1, -0.3, 0.5];
    let chequered = Blocking::Chequered(
        ChequeredBlocking::new(&[0, 2, 4], &BlockingOptions::default(), reference()).unwrap(),
    );
    let advanced = chequered.advance(&initial_paths(), theta.view()).unwrap();
    for bridge in advanced.bridges() {
        assert_eq!(bridge.target().params(), theta.view());
        assert_eq!(bridge.aux().params(), theta.view());
        assert!(bridge.seed().h.iter().all(|x| x.is_finite()));
    }
    assert_eq!(advanced.n_segments(), M);
}

#[test]
// Purpose
// -------
// Errors surface with their class and leave the previous schedule usable.
//
// Given
// -----
// - An invalid θ (negative volatility), a path with a missing segment and
//   an out-of-range block index.
//
// Expect
// ------
// - Configuration, state-consistency and state-consistency classes
//   respectively; the schedule still advances afterwards.
fn errors_keep_previous_schedule() {
    let schedule = Blocking::Chequered(
        ChequeredBlocking::new(&[1, 2, 3], &BlockingOptions::default(), reference()).unwrap(),
    );
    let paths = initial_paths();

    let err = schedule.advance(&paths, array![0.6, 0.1, -0.8].view()).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Configuration);

    let short = &paths.current()[..M - 1];
    let err = schedule.advance(short, array![0.6, 0.1, 0.8].view()).unwrap_err();
    assert_eq!(err, BridgeError::PathLengthMismatch { expected: M, found: M - 1 });
    assert_eq!(err.class(), ErrorClass::StateConsistency);

    let mut advanced = schedule.advance(&paths, array![0.6, 0.1, 0.8].view()).unwrap();
    let err = advanced.register_outcome(7, true).unwrap_err();
    assert_eq!(err.class(), ErrorClass::StateConsistency);
    assert!(!err.is_recoverable());
}
