//! NoBlocking — the whole path as a single block.
//!
//! The degenerate schedule: no knots, one block `0..m`, and an `advance` that
//! returns an identical copy. Outcomes are still counted on that single block
//! so diagnostics look the same as for chequered schedules.
use crate::{
    blocking::{BlockingScheme, EndpointTarget, counters::AcceptanceCounters},
    bridge::{
        core::{
            law::{AuxiliaryLaw, TargetLaw},
            path::PathBuffer,
            statistic::GuidedBridge,
            validation::validate_state_dims,
        },
        errors::{BridgeError, BridgeResult},
    },
};
use ndarray::ArrayView1;
use std::{fmt, ops::Range};

#[derive(Debug, Clone, PartialEq)]
pub struct NoBlocking<T, A> {
    blocks: [Range<usize>; 1],
    counters: AcceptanceCounters,
    bridges: Vec<GuidedBridge<T, A>>,
}

impl<T: TargetLaw, A: AuxiliaryLaw> NoBlocking<T, A> {
    /// Wrap reference statistics as a one-block schedule.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::EmptyPath` for an empty reference.
    /// - `BridgeError::StateDimensionMismatch` if segments disagree on `d`.
    pub fn new(reference: Vec<GuidedBridge<T, A>>) -> BridgeResult<Self> {
        validate_state_dims(reference.iter().map(GuidedBridge::dim))?;
        Ok(NoBlocking {
            blocks: [0..reference.len()],
            counters: AcceptanceCounters::new(1),
            bridges: reference,
        })
    }
}

impl<T: TargetLaw, A: AuxiliaryLaw> BlockingScheme for NoBlocking<T, A> {
    type Target = T;
    type Aux = A;

    fn n_segments(&self) -> usize {
        self.bridges.len()
    }

    /// Identity: the statistics never change.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::PathLengthMismatch` if the path has a different number
    ///   of segments.
    fn advance<P: PathBuffer + ?Sized>(
        &self, path: &P, _theta: ArrayView1<'_, f64>,
    ) -> BridgeResult<Self> {
        check_path_len(self.n_segments(), path)?;
        Ok(self.clone())
    }

    fn blocks(&self) -> &[Range<usize>] {
        &self.blocks
    }

    fn register_outcome(&mut self, block: usize, accepted: bool) -> BridgeResult<()> {
        self.counters.register(block, accepted)
    }

    /// Real observations for every segment; nothing is pinned.
    fn endpoint_targets<P: PathBuffer + ?Sized>(
        &self, path: &P,
    ) -> BridgeResult<Vec<EndpointTarget>> {
        check_path_len(self.n_segments(), path)?;
        Ok(self
            .bridges
            .iter()
            .map(|b| EndpointTarget::Observed(b.observation().v().clone()))
            .collect())
    }

    fn bridges(&self) -> &[GuidedBridge<T, A>] {
        &self.bridges
    }

    fn counters(&self) -> &AcceptanceCounters {
        &self.counters
    }
}

impl<T, A> fmt::Display for NoBlocking<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "NoBlocking: {} segments, accepted/proposed {}",
            self.bridges.len(),
            self.counters
        )
    }
}

fn check_path_len<P: PathBuffer + ?Sized>(expected: usize, path: &P) -> BridgeResult<()> {
    if path.n_segments() != expected {
        return Err(BridgeError::PathLengthMismatch { expected, found: path.n_segments() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{
        core::{
            change_point::ChangePoint,
            grid::uniform_grid,
            observation::Observation,
            ode::OdeScheme,
            path::{BufferTag, SegmentPath},
            statistic::build_bridges,
        },
        models::ornstein_uhlenbeck::OrnsteinUhlenbeck,
    };
    use nalgebra::{dmatrix, dvector};
    use ndarray::{Array1, array};

    fn unblocked(m: usize) -> NoBlocking<OrnsteinUhlenbeck, OrnsteinUhlenbeck> {
        let law = OrnsteinUhlenbeck::new(1, array![1.0, 0.0, 0.5].view()).unwrap();
        let grids: Vec<Array1<f64>> =
            (0..m).map(|i| uniform_grid(i as f64, i as f64 + 1.0, 0.05).unwrap()).collect();
        let obs: Vec<Observation> = (0..m)
            .map(|i| Observation::new(dmatrix![1.0], dmatrix![0.1], dvector![i as f64]).unwrap())
            .collect();
        let bridges = build_bridges(
            &grids,
            &law,
            &vec![law.clone(); m],
            &obs,
            &vec![ChangePoint::None; m],
            OdeScheme::Ralston3,
        )
        .unwrap();
        NoBlocking::new(bridges).unwrap()
    }

    fn path(m: usize) -> Vec<SegmentPath> {
        (0..m)
            .map(|i| {
                SegmentPath::new(i, BufferTag::First, array![0.0, 1.0], array![[0.0], [9.0]])
                    .unwrap()
            })
            .collect()
    }

    #[test]
    // Purpose
    // -------
    // `advance` is the identity and the single block spans the path.
    //
    // Given
    // -----
    // - Three segments, any θ.
    //
    // Expect
    // ------
    // - The advanced schedule equals the original; blocks are `[0..3]`.
    fn advance_is_identity() {
        let sched = unblocked(3);

        let next = sched.advance(&path(3), array![5.0, 5.0, 5.0].view()).unwrap();

        assert_eq!(next, sched);
        assert_eq!(next.blocks(), &[0..3]);
        assert!(matches!(
            sched.advance(&path(2), array![1.0, 0.0, 0.5].view()),
            Err(BridgeError::PathLengthMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Targets are the real observations and outcomes hit the single block.
    fn targets_observed_and_outcomes_counted() {
        let mut sched = unblocked(2);

        let targets = sched.endpoint_targets(&path(2)).unwrap();
        sched.register_outcome(0, true).unwrap();
        sched.register_outcome(0, false).unwrap();

        assert_eq!(targets, vec![
            EndpointTarget::Observed(dvector![0.0]),
            EndpointTarget::Observed(dvector![1.0])
        ]);
        assert_eq!(sched.counters().proposed(), &[2]);
        assert_eq!(sched.counters().accepted(), &[1]);
        assert!(sched.register_outcome(1, true).is_err());
        assert!(sched.to_string().contains("1/2 (50.0%)"));
    }
}
