#![warn(missing_docs)]
//! A library for Bayesian inverse reinforcement learning on state graphs.
//!
//! The reward underlying a set of expert demonstrations is treated as a
//! latent variable. A [`BirlSolver`] searches reward space by alternating
//! between solving the MDP induced by a candidate reward ([`PolicyIteration`]
//! over a [`StateGraph`]) and scoring how well the induced behavior matches
//! the demonstrations, using the score to drive the next candidate.
pub mod error;
pub mod quality;
pub mod util;

mod state_graph;
pub use state_graph::{EdgeAttrs, NodeAttrs, NodeSignal, NodeType, Signal, StateGraph};

mod mdp;
pub use mdp::{GraphRepresentation, Mdp, Representation, Trajectory};

mod policy;
pub use policy::{PolicyIteration, PolicyIterationConfig, SolveStatus};

mod prior;
pub use prior::RewardPrior;

mod proposal;
pub use proposal::PolicyWalkProposal;

mod birl;
pub use birl::{
    BirlConfig, BirlOutcome, BirlSolver, LikelihoodGradientBirl, LikelihoodGradientConfig,
    PolicyWalkBirl, PolicyWalkConfig,
};

pub use error::BirlError;
