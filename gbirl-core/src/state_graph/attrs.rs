//! Typed node and edge attributes of the state graph.
use serde::{Deserialize, Serialize};

/// Category of a node in the state graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// A node where rollouts start.
    Start,

    /// A goal node.
    Goal,

    /// An ordinary intermediate node.
    Simple,

    /// A node on a highlighted path.
    Path,
}

/// Attributes attached to every node.
///
/// Besides the state vector `data`, a node carries the dynamic-programming
/// state written by the policy solver: action values `q`, state value `v` and
/// the selected action `pi` (an index into the node's outgoing edges in
/// insertion order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAttrs {
    /// State vector, of the graph's state dimension.
    pub data: Vec<f64>,

    /// Cost of reaching this node.
    pub cost: f64,

    /// Priority used for ordering during graph construction.
    pub priority: f64,

    /// Action values, one per outgoing edge.
    pub q: Vec<f64>,

    /// State value.
    pub v: f64,

    /// Selected action, as an outgoing-edge index.
    pub pi: usize,

    /// Node category.
    pub ntype: NodeType,
}

impl NodeAttrs {
    /// Creates node attributes with zeroed dynamic-programming state.
    pub fn new(data: Vec<f64>, ntype: NodeType) -> Self {
        Self {
            data,
            cost: 0.0,
            priority: 0.0,
            q: Vec::new(),
            v: 0.0,
            pi: 0,
            ntype,
        }
    }
}

/// Attributes attached to every edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeAttrs {
    /// Time taken to traverse the edge, non-negative.
    pub duration: f64,

    /// Edge reward, derived as the dot product of a reward vector and `phi`.
    pub reward: f64,

    /// Feature vector of the action represented by the edge.
    pub phi: Vec<f64>,

    /// Representative trajectory segment, an ordered sequence of state vectors.
    pub traj: Vec<Vec<f64>>,
}

impl EdgeAttrs {
    /// Creates edge attributes with zero reward.
    pub fn new(duration: f64, phi: Vec<f64>, traj: Vec<Vec<f64>>) -> Self {
        Self {
            duration,
            reward: 0.0,
            phi,
            traj,
        }
    }
}

/// Selector of a per-node signal for bulk extraction.
///
/// Replaces a string-keyed attribute lookup with an enumerated set, so that
/// an unknown signal is unrepresentable instead of a runtime assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeSignal {
    /// Node cost.
    Cost,

    /// Selected action per node.
    Policy,

    /// Node priority.
    Priority,

    /// State value per node.
    V,

    /// Action values per node, variable length.
    Q,
}

/// A signal extracted from all nodes, in node insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// One scalar per node (cost, policy, priority and V).
    Scalars(Vec<f64>),

    /// One vector per node, of varying lengths (Q values).
    PerAction(Vec<Vec<f64>>),
}
