//! Policy iteration over a state graph.
use crate::mdp::Representation;
use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Configuration of [`PolicyIteration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyIterationConfig {
    /// Convergence tolerance on the largest value change of a sweep.
    pub tolerance: f64,

    /// The maximal number of sweeps over the graph.
    pub max_sweeps: usize,
}

impl Default for PolicyIterationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            max_sweeps: 200,
        }
    }
}

impl PolicyIterationConfig {
    /// Sets the convergence tolerance.
    pub fn tolerance(mut self, v: f64) -> Self {
        self.tolerance = v;
        self
    }

    /// Sets the maximal number of sweeps.
    pub fn max_sweeps(mut self, v: usize) -> Self {
        self.max_sweeps = v;
        self
    }

    /// Constructs [`PolicyIterationConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let c = serde_yaml::from_reader(rdr)?;
        Ok(c)
    }

    /// Saves [`PolicyIterationConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Result of a policy solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The largest value change fell below the tolerance, with the number of
    /// sweeps taken.
    Converged(usize),

    /// The sweep cap was reached first. The last computed policy is in the
    /// graph and is used as is.
    SweepLimit,
}

/// Solves for the optimal policy of the MDP induced by the current edge
/// rewards.
///
/// Each sweep computes, for every node with outgoing edges,
/// `Q(n, a) = reward(n, a) + gamma^duration(n, a) * V(target(n, a))`, then
/// sets `V(n) = max_a Q(n, a)` and `pi(n) = argmax_a Q(n, a)` in place. Ties
/// go to the lowest action index. Terminal nodes keep the MDP's terminal
/// value.
pub struct PolicyIteration {
    config: PolicyIterationConfig,
}

impl PolicyIteration {
    /// Creates a solver.
    pub fn new(config: PolicyIterationConfig) -> Self {
        Self { config }
    }

    /// Runs value/policy sweeps until convergence or the sweep cap.
    pub fn solve<R: Representation>(&self, rep: &mut R) -> Result<SolveStatus> {
        let gamma = rep.mdp().gamma();
        let terminal_value = rep.mdp().terminal_value();
        let nodes: Vec<usize> = rep.graph().nodes().collect();

        for &n in nodes.iter() {
            if rep.graph().out_edges(n)?.is_empty() {
                let attrs = rep.graph_mut().node_attrs_mut(n)?;
                attrs.v = terminal_value;
                attrs.q = Vec::new();
                attrs.pi = 0;
            }
        }

        for sweep in 1..=self.config.max_sweeps {
            let mut delta: f64 = 0.0;
            for &n in nodes.iter() {
                let actions = rep.graph().out_edges(n)?;
                if actions.is_empty() {
                    continue;
                }
                let mut q = Vec::with_capacity(actions.len());
                for &(s, t) in actions.iter() {
                    let e = rep.graph().edge_attrs(s, t)?;
                    let discount = gamma.powf(e.duration);
                    q.push(e.reward + discount * rep.graph().node_attrs(t)?.v);
                }
                let (pi, v) = argmax(&q);
                let attrs = rep.graph_mut().node_attrs_mut(n)?;
                delta = delta.max((v - attrs.v).abs());
                attrs.q = q;
                attrs.v = v;
                attrs.pi = pi;
            }
            if delta < self.config.tolerance {
                return Ok(SolveStatus::Converged(sweep));
            }
        }

        warn!(
            "Policy iteration did not converge within {} sweeps",
            self.config.max_sweeps
        );
        Ok(SolveStatus::SweepLimit)
    }
}

/// Index and value of the largest element, first index on ties.
fn argmax(q: &[f64]) -> (usize, f64) {
    let mut best = 0;
    for i in 1..q.len() {
        if q[i] > q[best] {
            best = i;
        }
    }
    (best, q[best])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::{GraphRepresentation, Mdp, Representation};
    use crate::state_graph::{EdgeAttrs, NodeAttrs, NodeType, StateGraph};

    fn edge(duration: f64, reward: f64) -> EdgeAttrs {
        let mut e = EdgeAttrs::new(duration, vec![1.0, 0.0], vec![]);
        e.reward = reward;
        e
    }

    fn chain(rewards: &[f64]) -> GraphRepresentation {
        let mut g = StateGraph::new(2).unwrap();
        for i in 0..=rewards.len() {
            let ntype = if i == 0 {
                NodeType::Start
            } else if i == rewards.len() {
                NodeType::Goal
            } else {
                NodeType::Simple
            };
            g.add_node(i, NodeAttrs::new(vec![i as f64, 0.0], ntype)).unwrap();
        }
        for (i, &r) in rewards.iter().enumerate() {
            g.add_edge(i, i + 1, edge(1.0, r)).unwrap();
        }
        GraphRepresentation::new(g, Mdp::new(0.9, 100.0, 2).unwrap())
    }

    #[test]
    fn test_terminal_value_fixed() {
        let mut rep = chain(&[0.5, 0.7]);
        let status = PolicyIteration::new(PolicyIterationConfig::default())
            .solve(&mut rep)
            .unwrap();
        assert!(matches!(status, SolveStatus::Converged(_)));
        assert_eq!(rep.graph().node_attrs(2).unwrap().v, 100.0);
    }

    #[test]
    fn test_values_increase_toward_terminal() {
        // On a chain with non-negative rewards, values grow with proximity
        // to the terminal node.
        let mut rep = chain(&[0.5, 0.7, 0.2]);
        PolicyIteration::new(PolicyIterationConfig::default())
            .solve(&mut rep)
            .unwrap();
        let vs: Vec<f64> = (0..4).map(|n| rep.graph().node_attrs(n).unwrap().v).collect();
        assert!(vs[0] < vs[1] && vs[1] < vs[2] && vs[2] < vs[3]);
    }

    #[test]
    fn test_argmax_tie_breaks_low() {
        assert_eq!(argmax(&[1.0, 1.0, 0.5]), (0, 1.0));
        assert_eq!(argmax(&[0.0, 2.0, 2.0]), (1, 2.0));
    }

    #[test]
    fn test_policy_picks_better_branch() {
        let mut g = StateGraph::new(2).unwrap();
        g.add_node(0, NodeAttrs::new(vec![0.0, 0.0], NodeType::Start)).unwrap();
        g.add_node(1, NodeAttrs::new(vec![1.0, 0.0], NodeType::Simple)).unwrap();
        g.add_node(2, NodeAttrs::new(vec![2.0, 0.0], NodeType::Goal)).unwrap();
        // Two routes to the goal, the direct one pays less on the way.
        g.add_edge(0, 1, edge(1.0, 5.0)).unwrap();
        g.add_edge(0, 2, edge(1.0, 0.1)).unwrap();
        g.add_edge(1, 2, edge(1.0, 5.0)).unwrap();
        let mut rep = GraphRepresentation::new(g, Mdp::new(0.9, 0.0, 2).unwrap());

        PolicyIteration::new(PolicyIterationConfig::default())
            .solve(&mut rep)
            .unwrap();
        // 5 + 0.9 * 5 = 9.5 beats 0.1.
        assert_eq!(rep.graph().node_attrs(0).unwrap().pi, 0);
        assert!((rep.graph().node_attrs(0).unwrap().v - 9.5).abs() < 1e-9);
    }

    #[test]
    fn test_sweep_limit_reported() {
        let mut g = StateGraph::new(2).unwrap();
        g.add_node(0, NodeAttrs::new(vec![0.0, 0.0], NodeType::Start)).unwrap();
        g.add_node(1, NodeAttrs::new(vec![1.0, 0.0], NodeType::Simple)).unwrap();
        // A positive-reward cycle never converges with gamma = 1.
        g.add_edge(0, 1, edge(0.0, 1.0)).unwrap();
        g.add_edge(1, 0, edge(0.0, 1.0)).unwrap();
        let mut rep = GraphRepresentation::new(g, Mdp::new(1.0, 0.0, 2).unwrap());

        let status = PolicyIteration::new(PolicyIterationConfig::default().max_sweeps(10))
            .solve(&mut rep)
            .unwrap();
        assert_eq!(status, SolveStatus::SweepLimit);
    }
}
