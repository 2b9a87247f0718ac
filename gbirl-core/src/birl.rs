//! Bayesian inverse reinforcement learning over a state graph.
//!
//! The solvers in this module seek a reward function underlying a set of
//! expert demonstrations. Each iteration maps the current reward candidate
//! onto the graph's edge rewards, solves the induced MDP, rolls out the
//! resulting policy and compares the quality of the generated trajectories
//! with the demonstrations to drive the next reward candidate.
mod config;
mod likelihood;
mod policy_walk;
use crate::mdp::{Representation, Trajectory};
use crate::policy::SolveStatus;
use anyhow::Result;
pub use config::BirlConfig;
pub use likelihood::{LikelihoodGradientBirl, LikelihoodGradientConfig};
use log::info;
pub use policy_walk::{PolicyWalkBirl, PolicyWalkConfig};
use rand::rngs::StdRng;

/// Result of a reward search.
#[derive(Debug, Clone, PartialEq)]
pub struct BirlOutcome {
    /// The final reward vector.
    pub reward: Vec<f64>,

    /// Status of the last policy solve.
    pub policy_status: SolveStatus,

    /// Number of reward-search iterations run.
    pub iterations: usize,
}

/// A solver of the iterative reward search.
///
/// Implementors supply reward initialization and the per-iteration reward
/// update; the search loop itself is shared. The loop runs for a fixed number
/// of iterations, there is no convergence criterion beyond the cap.
pub trait BirlSolver<R: Representation> {
    /// The shared configuration.
    fn config(&self) -> &BirlConfig;

    /// Draws the initial reward vector.
    fn initialize_reward(&self, rng: &mut StdRng, rep: &R) -> Vec<f64>;

    /// Computes the next reward candidate from the demonstrations and the
    /// generated-trajectory history.
    fn find_next_reward(
        &self,
        rng: &mut StdRng,
        rep: &R,
        demos: &[Trajectory],
        g_trajs: &[Vec<Trajectory>],
        reward: &[f64],
    ) -> Result<Vec<f64>>;

    /// Solves the induced MDP under the given reward.
    fn compute_policy(&self, rep: &mut R, reward: &[f64]) -> Result<SolveStatus>;

    /// Runs the reward search.
    ///
    /// Every iteration mutates the representation's graph: edge rewards are
    /// overwritten from the candidate reward and the policy solver rewrites
    /// all node values and policies.
    fn solve(&self, rng: &mut StdRng, rep: &mut R, demos: &[Trajectory]) -> Result<BirlOutcome> {
        self.config().validate()?;

        let mut reward = self.initialize_reward(rng, rep);
        let mut status = self.compute_policy(rep, &reward)?;
        let mut g_trajs = vec![demos.to_vec()];

        for iteration in 0..self.config().max_iter {
            reward = self.find_next_reward(rng, rep, demos, &g_trajs, &reward)?;

            status = self.compute_policy(rep, &reward)?;
            let trajs = rep.find_best_policies()?;
            g_trajs.push(trajs);

            info!("Iteration: {}", iteration);
        }

        Ok(BirlOutcome {
            reward,
            policy_status: status,
            iterations: self.config().max_iter,
        })
    }
}
