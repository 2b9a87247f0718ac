//! Random-walk proposal for reward-space MCMC.
use crate::BirlError;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// PolicyWalk MCMC proposal.
///
/// A proposal perturbs exactly one coordinate of the reward vector by a
/// signed step of magnitude `delta`. When bounded, a move is only valid if
/// the perturbed coordinate stays in `[-bound, bound]`; invalid moves are
/// redrawn up to `max_retries` times before giving up with
/// [`BirlError::NoValidMove`], which guards against configurations where no
/// valid move exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyWalkProposal {
    /// Dimension of the reward vector.
    pub dim: usize,

    /// Step magnitude.
    pub delta: f64,

    /// Whether moves must stay within `[-bound, bound]`.
    pub bounded: bool,

    /// Half-width of the support when bounded.
    pub bound: f64,

    /// Retry budget for bounded moves.
    pub max_retries: usize,
}

impl PolicyWalkProposal {
    /// Creates a bounded proposal on `[-1, 1]`.
    pub fn new(dim: usize, delta: f64) -> Self {
        Self {
            dim,
            delta,
            bounded: true,
            bound: 1.0,
            max_retries: 100,
        }
    }

    /// Creates an unbounded proposal.
    pub fn unbounded(dim: usize, delta: f64) -> Self {
        Self {
            dim,
            delta,
            bounded: false,
            bound: 1.0,
            max_retries: 100,
        }
    }

    /// Proposes a new reward vector from the current one.
    pub fn propose(&self, rng: &mut StdRng, loc: &[f64]) -> Result<Vec<f64>> {
        let mut new_loc = loc.to_vec();
        for _ in 0..self.max_retries {
            let d = if rng.gen::<bool>() { self.delta } else { -self.delta };
            let i = rng.gen_range(0..self.dim);
            if !self.bounded || (-self.bound..=self.bound).contains(&(new_loc[i] + d)) {
                new_loc[i] += d;
                return Ok(new_loc);
            }
        }
        Err(BirlError::NoValidMove(self.max_retries).into())
    }
}
