//! Per-block acceptance counters.
//!
//! Counters are diagnostics only: they are written after the outer sampler
//! has decided on a proposal and are never read back into that decision.
use crate::bridge::errors::{BridgeError, BridgeResult};
use std::fmt;

/// Accepted and proposed counts for each block of one cover.
///
/// Both counts are monotonically non-decreasing and `accepted ≤ proposed`
/// holds per block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptanceCounters {
    accepted: Vec<u64>,
    proposed: Vec<u64>,
}

impl AcceptanceCounters {
    /// Zeroed counters for `n_blocks` blocks.
    pub fn new(n_blocks: usize) -> Self {
        AcceptanceCounters { accepted: vec![0; n_blocks], proposed: vec![0; n_blocks] }
    }

    /// Record one proposal on `block`.
    ///
    /// Errors
    /// ------
    /// - `BridgeError::BlockIndexOutOfRange` if `block ≥ n_blocks`; counters
    ///   are left untouched.
    pub fn register(&mut self, block: usize, accepted: bool) -> BridgeResult<()> {
        let n_blocks = self.proposed.len();
        if block >= n_blocks {
            return Err(BridgeError::BlockIndexOutOfRange { block, n_blocks });
        }
        self.proposed[block] += 1;
        if accepted {
            self.accepted[block] += 1;
        }
        Ok(())
    }

    pub fn n_blocks(&self) -> usize {
        self.proposed.len()
    }

    pub fn accepted(&self) -> &[u64] {
        &self.accepted
    }

    pub fn proposed(&self) -> &[u64] {
        &self.proposed
    }

    /// Acceptance rate per block; `None` for blocks never proposed on.
    pub fn rates(&self) -> Vec<Option<f64>> {
        self.accepted
            .iter()
            .zip(&self.proposed)
            .map(|(&a, &p)| if p == 0 { None } else { Some(a as f64 / p as f64) })
            .collect()
    }
}

impl fmt::Display for AcceptanceCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (block, rate) in self.rates().iter().enumerate() {
            if block > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}/{}", self.accepted[block], self.proposed[block])?;
            match rate {
                Some(r) => write!(f, " ({:.1}%)", 100.0 * r)?,
                None => write!(f, " (-)")?,
            }
        }
        Ok(())
    }
}
