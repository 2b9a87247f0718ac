//! MDP descriptor and the representation seam used by the solvers.
use crate::state_graph::{NodeType, StateGraph};
use crate::util::dot;
use crate::BirlError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A trajectory, an ordered sequence of node ids through a [`StateGraph`].
pub type Trajectory = Vec<usize>;

/// Scalar parameters of the MDP induced over a state graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mdp {
    gamma: f64,
    terminal_value: f64,
    reward_dim: usize,
}

impl Mdp {
    /// Creates an MDP descriptor.
    ///
    /// `gamma` must lie in `(0, 1]` and `reward_dim` must be positive.
    pub fn new(gamma: f64, terminal_value: f64, reward_dim: usize) -> Result<Self> {
        if !(gamma > 0.0 && gamma <= 1.0) {
            return Err(
                BirlError::InvalidConfig(format!("gamma must be in (0, 1], got {}", gamma)).into(),
            );
        }
        if reward_dim == 0 {
            return Err(BirlError::InvalidConfig("reward_dim must be > 0".into()).into());
        }
        Ok(Self {
            gamma,
            terminal_value,
            reward_dim,
        })
    }

    /// Discount factor.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Fixed value attributed to reaching a node with no outgoing edges.
    pub fn terminal_value(&self) -> f64 {
        self.terminal_value
    }

    /// Dimension of reward and feature vectors.
    pub fn reward_dim(&self) -> usize {
        self.reward_dim
    }
}

/// The representation of an MDP driven by a BIRL solver.
///
/// A solver only needs two operations beyond graph access: refreshing edge
/// rewards from a candidate reward vector, and rolling out the current policy
/// into trajectories.
pub trait Representation {
    /// The underlying state graph.
    fn graph(&self) -> &StateGraph;

    /// The underlying state graph, mutable.
    fn graph_mut(&mut self) -> &mut StateGraph;

    /// The MDP parameters.
    fn mdp(&self) -> &Mdp;

    /// Writes `reward · phi` onto every edge's reward attribute.
    fn update_rewards(&mut self, reward: &[f64]) -> Result<()>;

    /// Rolls out the current policy from every start node.
    fn find_best_policies(&self) -> Result<Vec<Trajectory>>;
}

/// A representation owning a [`StateGraph`] and its MDP parameters.
pub struct GraphRepresentation {
    graph: StateGraph,
    mdp: Mdp,
}

impl GraphRepresentation {
    /// Creates a representation over a graph.
    pub fn new(graph: StateGraph, mdp: Mdp) -> Self {
        Self { graph, mdp }
    }

    fn rollout(&self, start: usize) -> Result<Trajectory> {
        let mut traj = vec![start];
        let mut n = start;
        // Rollouts are capped at the node count, the policy may have cycles
        // before the solver converges.
        for _ in 0..self.graph.num_nodes() {
            let actions = self.graph.out_edges(n)?;
            if actions.is_empty() {
                break;
            }
            let pi = self.graph.node_attrs(n)?.pi;
            let &(_, target) = actions.get(pi).ok_or(BirlError::InvalidPolicy {
                node: n,
                action: pi,
                n_actions: actions.len(),
            })?;
            traj.push(target);
            n = target;
        }
        Ok(traj)
    }
}

impl Representation for GraphRepresentation {
    fn graph(&self) -> &StateGraph {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut StateGraph {
        &mut self.graph
    }

    fn mdp(&self) -> &Mdp {
        &self.mdp
    }

    fn update_rewards(&mut self, reward: &[f64]) -> Result<()> {
        if reward.len() != self.mdp.reward_dim() {
            return Err(BirlError::DimensionMismatch {
                expected: self.mdp.reward_dim(),
                got: reward.len(),
            }
            .into());
        }
        let nodes: Vec<usize> = self.graph.nodes().collect();
        let mut edges = Vec::new();
        for n in nodes {
            edges.extend(self.graph.out_edges(n)?);
        }
        for (s, t) in edges {
            let attrs = self.graph.edge_attrs_mut(s, t)?;
            if attrs.phi.len() != reward.len() {
                return Err(BirlError::DimensionMismatch {
                    expected: reward.len(),
                    got: attrs.phi.len(),
                }
                .into());
            }
            attrs.reward = dot(&attrs.phi, reward);
        }
        Ok(())
    }

    fn find_best_policies(&self) -> Result<Vec<Trajectory>> {
        self.graph
            .filter_nodes_by_type(NodeType::Start)
            .into_iter()
            .map(|n| self.rollout(n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_graph::{EdgeAttrs, NodeAttrs};

    fn chain() -> GraphRepresentation {
        let mut g = StateGraph::new(2).unwrap();
        g.add_node(0, NodeAttrs::new(vec![0.0, 0.0], NodeType::Start)).unwrap();
        g.add_node(1, NodeAttrs::new(vec![1.0, 0.0], NodeType::Simple)).unwrap();
        g.add_node(2, NodeAttrs::new(vec![2.0, 0.0], NodeType::Goal)).unwrap();
        g.add_edge(0, 1, EdgeAttrs::new(1.0, vec![1.0, 0.0], vec![])).unwrap();
        g.add_edge(1, 2, EdgeAttrs::new(1.0, vec![0.0, 1.0], vec![])).unwrap();
        let mdp = Mdp::new(0.9, 100.0, 2).unwrap();
        GraphRepresentation::new(g, mdp)
    }

    #[test]
    fn test_mdp_validation() {
        assert!(Mdp::new(0.0, 100.0, 2).is_err());
        assert!(Mdp::new(1.1, 100.0, 2).is_err());
        assert!(Mdp::new(0.9, 100.0, 0).is_err());
        assert!(Mdp::new(1.0, 100.0, 2).is_ok());
    }

    #[test]
    fn test_update_rewards() {
        let mut rep = chain();
        rep.update_rewards(&[1.0, 0.5]).unwrap();
        assert_eq!(rep.graph().edge_attrs(0, 1).unwrap().reward, 1.0);
        assert_eq!(rep.graph().edge_attrs(1, 2).unwrap().reward, 0.5);
        assert!(rep.update_rewards(&[1.0]).is_err());
    }

    #[test]
    fn test_rollout_follows_policy() {
        let rep = chain();
        let trajs = rep.find_best_policies().unwrap();
        assert_eq!(trajs, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_rollout_capped_on_cycle() {
        let mut rep = chain();
        rep.graph_mut()
            .add_edge(2, 0, EdgeAttrs::new(1.0, vec![0.0, 0.0], vec![]))
            .unwrap();
        let trajs = rep.find_best_policies().unwrap();
        assert_eq!(trajs[0].len(), rep.graph().num_nodes() + 1);
    }
}
