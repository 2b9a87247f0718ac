//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum BirlError {
    /// A vector has a different length than the graph expects.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// The node is not in the graph.
    #[error("Node ({0}) not in the graph")]
    MissingNode(usize),

    /// The edge is not in the graph.
    #[error("Edge ({0}--{1}) not in the graph")]
    MissingEdge(usize, usize),

    /// An edge attribute is out of its legal range.
    #[error("Invalid edge attribute: {0}")]
    InvalidEdgeAttr(String),

    /// A configuration value is out of its legal range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The bounded proposal could not find a valid move within its retry budget.
    #[error("No valid move found within {0} retries")]
    NoValidMove(usize),

    /// No path between the given nodes.
    #[error("No path from node ({0}) to node ({1})")]
    PathNotFound(usize, usize),

    /// A node's selected action does not match its outgoing edges.
    #[error("Policy of node ({node}) selects action {action}, but the node has {n_actions} actions")]
    InvalidPolicy {
        /// Node identifier.
        node: usize,
        /// Selected action index.
        action: usize,
        /// Number of outgoing edges of the node.
        n_actions: usize,
    },
}
