//! State graph representation of an MDP.
//!
//! The state graph is a flexible representation for an MDP which affords
//! task-specific constraints as well as temporally extended actions. Nodes
//! carry the dynamic-programming state of the policy solver, edges carry
//! action attributes (duration, reward, features and a representative
//! trajectory segment).
mod attrs;
mod search;
use crate::BirlError;
use anyhow::Result;
pub use attrs::{EdgeAttrs, NodeAttrs, NodeSignal, NodeType, Signal};
use log::warn;
use ndarray::Array2;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A directed graph over MDP states.
///
/// Nodes are identified by caller-chosen `usize` ids. At most one edge exists
/// per ordered node pair and self-loops are rejected. Node iteration order is
/// insertion order throughout.
pub struct StateGraph {
    graph: StableDiGraph<NodeAttrs, EdgeAttrs>,
    index: HashMap<usize, NodeIndex>,
    order: Vec<usize>,
    state_dim: usize,
}

/// Serialized form of the graph for [`StateGraph::save`]/[`StateGraph::load`].
#[derive(Serialize, Deserialize)]
struct GraphBlob {
    state_dim: usize,
    nodes: Vec<(usize, NodeAttrs)>,
    edges: Vec<(usize, usize, EdgeAttrs)>,
}

impl StateGraph {
    /// Creates an empty graph of the given state dimension.
    pub fn new(state_dim: usize) -> Result<Self> {
        if state_dim == 0 {
            return Err(
                BirlError::InvalidConfig("state_dim must be greater than 0".into()).into(),
            );
        }
        Ok(Self {
            graph: StableDiGraph::new(),
            index: HashMap::new(),
            order: Vec::new(),
            state_dim,
        })
    }

    /// Dimension of node state vectors.
    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    /// Removes all nodes and edges.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.index.clear();
        self.order.clear();
    }

    /// Adds a new node to the graph.
    ///
    /// Adding an id that is already present is a warning and a no-op. A state
    /// vector of the wrong dimension is an error.
    pub fn add_node(&mut self, id: usize, attrs: NodeAttrs) -> Result<()> {
        if attrs.data.len() != self.state_dim {
            return Err(BirlError::DimensionMismatch {
                expected: self.state_dim,
                got: attrs.data.len(),
            }
            .into());
        }
        if self.index.contains_key(&id) {
            warn!("Node ({}) already exists in the graph, not added", id);
            return Ok(());
        }
        let ix = self.graph.add_node(attrs);
        self.index.insert(id, ix);
        self.order.push(id);
        Ok(())
    }

    /// Adds a new edge to the graph.
    ///
    /// A self-loop or an already existing edge is a warning and a no-op.
    /// A negative duration or a trajectory row of the wrong dimension is an
    /// error, as is a missing endpoint.
    pub fn add_edge(&mut self, source: usize, target: usize, attrs: EdgeAttrs) -> Result<()> {
        if attrs.duration < 0.0 {
            return Err(BirlError::InvalidEdgeAttr(format!(
                "duration must be non-negative, got {}",
                attrs.duration
            ))
            .into());
        }
        if let Some(row) = attrs.traj.iter().find(|r| r.len() != self.state_dim) {
            return Err(BirlError::DimensionMismatch {
                expected: self.state_dim,
                got: row.len(),
            }
            .into());
        }
        if source == target {
            warn!("source: {} and target: {} nodes are the same", source, target);
            return Ok(());
        }
        let s = self.node_index(source)?;
        let t = self.node_index(target)?;
        if self.graph.find_edge(s, t).is_some() {
            warn!("Edge ({}--{}) already exists in the graph", source, target);
            return Ok(());
        }
        self.graph.add_edge(s, t, attrs);
        Ok(())
    }

    /// Removes a node and all its edges.
    pub fn remove_node(&mut self, id: usize) -> Result<()> {
        let ix = self.node_index(id)?;
        let _ = self.graph.remove_node(ix);
        self.index.remove(&id);
        self.order.retain(|&n| n != id);
        Ok(())
    }

    /// Removes an edge. A self-loop is a warning and a no-op.
    pub fn remove_edge(&mut self, source: usize, target: usize) -> Result<()> {
        if source == target {
            warn!("source: {} and target: {} nodes are the same", source, target);
            return Ok(());
        }
        let s = self.node_index(source)?;
        let t = self.node_index(target)?;
        let e = self
            .graph
            .find_edge(s, t)
            .ok_or(BirlError::MissingEdge(source, target))?;
        let _ = self.graph.remove_edge(e);
        Ok(())
    }

    /// Checks if an edge exists in the graph.
    pub fn edge_exists(&self, source: usize, target: usize) -> bool {
        match (self.index.get(&source), self.index.get(&target)) {
            (Some(&s), Some(&t)) => self.graph.find_edge(s, t).is_some(),
            _ => false,
        }
    }

    /// Attributes of a node.
    pub fn node_attrs(&self, id: usize) -> Result<&NodeAttrs> {
        let ix = self.node_index(id)?;
        Ok(&self.graph[ix])
    }

    /// Mutable attributes of a node.
    pub fn node_attrs_mut(&mut self, id: usize) -> Result<&mut NodeAttrs> {
        let ix = self.node_index(id)?;
        Ok(&mut self.graph[ix])
    }

    /// Attributes of an edge.
    pub fn edge_attrs(&self, source: usize, target: usize) -> Result<&EdgeAttrs> {
        let e = self.edge_index(source, target)?;
        Ok(&self.graph[e])
    }

    /// Mutable attributes of an edge.
    pub fn edge_attrs_mut(&mut self, source: usize, target: usize) -> Result<&mut EdgeAttrs> {
        let e = self.edge_index(source, target)?;
        Ok(&mut self.graph[e])
    }

    /// Node ids in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied()
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Outgoing edges of a node as `(source, target)` pairs, in edge
    /// insertion order.
    pub fn out_edges(&self, id: usize) -> Result<Vec<(usize, usize)>> {
        let ix = self.node_index(id)?;
        // petgraph iterates outgoing edges most-recent first.
        let mut edges: Vec<_> = self
            .graph
            .edges(ix)
            .map(|e| (id, self.node_id(e.target())))
            .collect();
        edges.reverse();
        Ok(edges)
    }

    /// Targets of the outgoing edges of a node, in edge insertion order.
    pub fn neighbors(&self, id: usize) -> Result<Vec<usize>> {
        Ok(self.out_edges(id)?.into_iter().map(|(_, t)| t).collect())
    }

    /// All nodes within `radius` of a position, by Euclidean distance over
    /// state vectors.
    pub fn find_neighbors_from_pose(&self, pose: &[f64], radius: f64) -> Vec<usize> {
        self.order
            .iter()
            .copied()
            .filter(|&n| {
                let ix = self.index[&n];
                eud(&self.graph[ix].data, pose) <= radius
            })
            .collect()
    }

    /// All nodes within `radius` of a node, by Euclidean distance over state
    /// vectors. The query node itself is included, as its distance is zero.
    pub fn find_neighbors_range(&self, id: usize, radius: f64) -> Result<Vec<usize>> {
        let center = self.node_attrs(id)?.data.clone();
        Ok(self.find_neighbors_from_pose(&center, radius))
    }

    /// The `k` nearest nodes to a node, by Euclidean distance over state
    /// vectors, ascending. Ties are broken by insertion order. The query node
    /// itself is excluded.
    pub fn find_neighbors_k(&self, id: usize, k: usize) -> Result<Vec<usize>> {
        let center = self.node_attrs(id)?.data.clone();
        let mut others: Vec<usize> = self.order.iter().copied().filter(|&n| n != id).collect();
        others.sort_by(|&a, &b| {
            let da = eud(&self.graph[self.index[&a]].data, &center);
            let db = eud(&self.graph[self.index[&b]].data, &center);
            da.partial_cmp(&db).expect("distances are finite")
        });
        others.truncate(k);
        Ok(others)
    }

    /// Ids of all nodes of the given type, in insertion order.
    pub fn filter_nodes_by_type(&self, ntype: NodeType) -> Vec<usize> {
        self.order
            .iter()
            .copied()
            .filter(|&n| self.graph[self.index[&n]].ntype == ntype)
            .collect()
    }

    /// Searches for a path from `source` to `target`, see [`search`].
    pub fn search_path(&self, source: usize, target: usize) -> Result<Vec<usize>> {
        search::search_path(self, source, target)
    }

    /// Dense adjacency matrix in node insertion order, 1.0 where an edge
    /// exists.
    pub fn transition_matrix(&self) -> Array2<f64> {
        let n = self.order.len();
        let mut m = Array2::zeros((n, n));
        for (i, &a) in self.order.iter().enumerate() {
            for (j, &b) in self.order.iter().enumerate() {
                if self.edge_exists(a, b) {
                    m[(i, j)] = 1.0;
                }
            }
        }
        m
    }

    /// Retrieves a graph signal from the nodes, in node insertion order.
    ///
    /// Scalar signals come back as one value per node; the Q signal is a list
    /// of lists of varying lengths, since the number of edges varies per node.
    pub fn signal(&self, name: NodeSignal) -> Signal {
        match name {
            NodeSignal::Cost => Signal::Scalars(self.scalar_signal(|a| a.cost)),
            NodeSignal::Policy => Signal::Scalars(self.scalar_signal(|a| a.pi as f64)),
            NodeSignal::Priority => Signal::Scalars(self.scalar_signal(|a| a.priority)),
            NodeSignal::V => Signal::Scalars(self.scalar_signal(|a| a.v)),
            NodeSignal::Q => Signal::PerAction(
                self.order
                    .iter()
                    .map(|&n| self.graph[self.index[&n]].q.clone())
                    .collect(),
            ),
        }
    }

    /// Saves the graph to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), &self.to_blob())?;
        Ok(())
    }

    /// Loads a graph from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let blob: GraphBlob = bincode::deserialize_from(BufReader::new(file))?;
        Self::from_blob(blob)
    }

    fn to_blob(&self) -> GraphBlob {
        let nodes = self
            .order
            .iter()
            .map(|&n| (n, self.graph[self.index[&n]].clone()))
            .collect();
        let mut edges = Vec::new();
        for &n in self.order.iter() {
            for e in self.out_edges(n).expect("node is in the graph") {
                let attrs = self.edge_attrs(e.0, e.1).expect("edge is in the graph");
                edges.push((e.0, e.1, attrs.clone()));
            }
        }
        GraphBlob {
            state_dim: self.state_dim,
            nodes,
            edges,
        }
    }

    fn from_blob(blob: GraphBlob) -> Result<Self> {
        let mut g = Self::new(blob.state_dim)?;
        for (id, attrs) in blob.nodes {
            g.add_node(id, attrs)?;
        }
        for (s, t, attrs) in blob.edges {
            g.add_edge(s, t, attrs)?;
        }
        Ok(g)
    }

    fn scalar_signal(&self, f: impl Fn(&NodeAttrs) -> f64) -> Vec<f64> {
        self.order.iter().map(|&n| f(&self.graph[self.index[&n]])).collect()
    }

    fn node_index(&self, id: usize) -> Result<NodeIndex> {
        self.index
            .get(&id)
            .copied()
            .ok_or_else(|| BirlError::MissingNode(id).into())
    }

    fn edge_index(&self, source: usize, target: usize) -> Result<petgraph::stable_graph::EdgeIndex> {
        let s = self.node_index(source)?;
        let t = self.node_index(target)?;
        self.graph
            .find_edge(s, t)
            .ok_or_else(|| BirlError::MissingEdge(source, target).into())
    }

    fn node_id(&self, ix: NodeIndex) -> usize {
        *self
            .index
            .iter()
            .find(|(_, &v)| v == ix)
            .expect("index map is consistent")
            .0
    }
}

/// Euclidean distance between two state vectors.
fn eud(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
