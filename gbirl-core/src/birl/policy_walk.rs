//! PolicyWalk-MCMC reward search.
use super::{BirlConfig, BirlSolver};
use crate::mdp::{Representation, Trajectory};
use crate::policy::{PolicyIteration, PolicyIterationConfig, SolveStatus};
use crate::prior::RewardPrior;
use crate::proposal::PolicyWalkProposal;
use crate::quality::{expert_quality, generated_quality};
use crate::util::mean;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Configuration of [`PolicyWalkBirl`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyWalkConfig {
    /// Shared BIRL configuration.
    pub birl: BirlConfig,

    /// Policy solver configuration.
    pub policy: PolicyIterationConfig,

    /// Prior over reward vectors.
    pub prior: RewardPrior,

    /// MCMC step size.
    pub delta: f64,

    /// Half-width of the reward support.
    pub reward_max: f64,

    /// Number of MCMC steps per reward-search iteration.
    pub mcmc_iter: usize,
}

impl Default for PolicyWalkConfig {
    fn default() -> Self {
        Self {
            birl: BirlConfig::default(),
            policy: PolicyIterationConfig::default(),
            prior: RewardPrior::Uniform,
            delta: 0.2,
            reward_max: 1.0,
            mcmc_iter: 50,
        }
    }
}

impl PolicyWalkConfig {
    /// Sets the shared BIRL configuration.
    pub fn birl(mut self, v: BirlConfig) -> Self {
        self.birl = v;
        self
    }

    /// Sets the prior.
    pub fn prior(mut self, v: RewardPrior) -> Self {
        self.prior = v;
        self
    }

    /// Sets the MCMC step size.
    pub fn delta(mut self, v: f64) -> Self {
        self.delta = v;
        self
    }

    /// Sets the number of MCMC steps per iteration.
    pub fn mcmc_iter(mut self, v: usize) -> Self {
        self.mcmc_iter = v;
        self
    }

    /// Constructs [`PolicyWalkConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let c = serde_yaml::from_reader(rdr)?;
        Ok(c)
    }

    /// Saves [`PolicyWalkConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Reward search with a PolicyWalk Metropolis chain.
///
/// Each reward-search iteration runs a short MCMC chain over the bounded
/// reward space. A proposal perturbs one coordinate by the step size; the
/// acceptance ratio compares posteriors whose likelihood term is the
/// beta-scaled margin between mean expert quality and mean generated-batch
/// quality.
pub struct PolicyWalkBirl {
    config: PolicyWalkConfig,
    proposal: PolicyWalkProposal,
    solver: PolicyIteration,
}

impl PolicyWalkBirl {
    /// Creates a solver for a reward space of the given dimension.
    pub fn new(config: PolicyWalkConfig, reward_dim: usize) -> Result<Self> {
        config.birl.validate()?;
        let mut proposal = PolicyWalkProposal::new(reward_dim, config.delta);
        proposal.bound = config.reward_max;
        let solver = PolicyIteration::new(config.policy.clone());
        Ok(Self {
            config,
            proposal,
            solver,
        })
    }

    /// Log posterior of a reward candidate given the trajectory history.
    fn log_posterior<R: Representation>(
        &self,
        rep: &R,
        demos: &[Trajectory],
        g_trajs: &[Vec<Trajectory>],
        reward: &[f64],
    ) -> Result<f64> {
        let qe = expert_quality(rep, reward, demos)?;
        let qg = generated_quality(rep, reward, g_trajs)?;
        let batch_means: Vec<f64> = qg.iter().map(|batch| mean(batch)).collect();
        let log_like = self.config.birl.beta * (mean(&qe) - mean(&batch_means));
        let log_prior: f64 = self.config.prior.log_density(reward).iter().sum();
        Ok(log_like + log_prior)
    }
}

impl<R: Representation> BirlSolver<R> for PolicyWalkBirl {
    fn config(&self) -> &BirlConfig {
        &self.config.birl
    }

    /// Draws each coordinate from the grid `{-r_max, -r_max + delta, ...,
    /// r_max}`.
    fn initialize_reward(&self, rng: &mut StdRng, rep: &R) -> Vec<f64> {
        let r_max = self.config.reward_max;
        let delta = self.config.delta;
        let n = (2.0 * r_max / delta).round() as usize;
        let grid: Vec<f64> = (0..=n).map(|i| -r_max + i as f64 * delta).collect();
        (0..rep.mdp().reward_dim())
            .map(|_| grid[rng.gen_range(0..grid.len())])
            .collect()
    }

    fn find_next_reward(
        &self,
        rng: &mut StdRng,
        rep: &R,
        demos: &[Trajectory],
        g_trajs: &[Vec<Trajectory>],
        reward: &[f64],
    ) -> Result<Vec<f64>> {
        let mut current = reward.to_vec();
        let mut log_p = self.log_posterior(rep, demos, g_trajs, &current)?;

        for _ in 0..self.config.mcmc_iter {
            let candidate = self.proposal.propose(rng, &current)?;
            let log_p_new = self.log_posterior(rep, demos, g_trajs, &candidate)?;
            let ratio = (log_p_new - log_p).exp().min(1.0);
            if rng.gen::<f64>() < ratio {
                current = candidate;
                log_p = log_p_new;
            }
        }
        Ok(current)
    }

    fn compute_policy(&self, rep: &mut R, reward: &[f64]) -> Result<SolveStatus> {
        rep.update_rewards(reward)?;
        self.solver.solve(rep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::{GraphRepresentation, Mdp};
    use crate::state_graph::{EdgeAttrs, NodeAttrs, NodeType, StateGraph};
    use rand::SeedableRng;

    fn rep() -> GraphRepresentation {
        let mut g = StateGraph::new(2).unwrap();
        g.add_node(0, NodeAttrs::new(vec![0.0, 0.0], NodeType::Start)).unwrap();
        g.add_node(1, NodeAttrs::new(vec![1.0, 0.0], NodeType::Simple)).unwrap();
        g.add_node(2, NodeAttrs::new(vec![2.0, 0.0], NodeType::Goal)).unwrap();
        g.add_edge(0, 1, EdgeAttrs::new(1.0, vec![1.0, 0.0], vec![])).unwrap();
        g.add_edge(1, 2, EdgeAttrs::new(1.0, vec![0.0, 1.0], vec![])).unwrap();
        GraphRepresentation::new(g, Mdp::new(0.9, 100.0, 2).unwrap())
    }

    #[test]
    fn test_initial_reward_on_grid() {
        let solver = PolicyWalkBirl::new(PolicyWalkConfig::default(), 2).unwrap();
        let rep = rep();
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..20 {
            let r = BirlSolver::<GraphRepresentation>::initialize_reward(&solver, &mut rng, &rep);
            assert_eq!(r.len(), 2);
            for x in r {
                assert!((-1.0..=1.0).contains(&x));
                let steps = (x + 1.0) / 0.2;
                assert!((steps - steps.round()).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_next_reward_stays_bounded() {
        let solver = PolicyWalkBirl::new(PolicyWalkConfig::default(), 2).unwrap();
        let mut rep = rep();
        let mut rng = StdRng::seed_from_u64(17);
        let demos = vec![vec![0, 1, 2]];

        solver.compute_policy(&mut rep, &[1.0, 0.0]).unwrap();
        let r = solver
            .find_next_reward(&mut rng, &rep, &demos, &[demos.clone()], &[0.0, 0.0])
            .unwrap();
        assert!(r.iter().all(|&x| (-1.0..=1.0).contains(&x)));
    }

    #[test]
    fn test_solve_runs_all_iterations() {
        let config = PolicyWalkConfig::default()
            .birl(BirlConfig::default().max_iter(3))
            .mcmc_iter(5);
        let solver = PolicyWalkBirl::new(config, 2).unwrap();
        let mut rep = rep();
        let mut rng = StdRng::seed_from_u64(23);
        let demos = vec![vec![0, 1, 2]];

        let outcome = solver.solve(&mut rng, &mut rep, &demos).unwrap();
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.reward.len(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PolicyWalkConfig::default().birl(BirlConfig::default().beta(2.0));
        assert!(PolicyWalkBirl::new(config, 2).is_err());
    }
}
