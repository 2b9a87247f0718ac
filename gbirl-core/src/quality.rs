//! Discounted quality of trajectories under the current policy.
use crate::mdp::{Representation, Trajectory};
use crate::util::dot;
use crate::BirlError;
use anyhow::Result;

/// Discounted cumulative reward of a trajectory.
///
/// Walks the node sequence; at each node with outgoing edges the edge
/// selected by the node's policy is followed, accumulating
/// `gamma^time * (reward · phi)` and advancing time by the edge duration.
/// A terminal node contributes `gamma^time * terminal_value` and ends the
/// walk.
pub fn trajectory_quality<R: Representation>(
    rep: &R,
    reward: &[f64],
    traj: &Trajectory,
) -> Result<f64> {
    let g = rep.graph();
    let gamma = rep.mdp().gamma();
    let mut time = 0.0;
    let mut quality = 0.0;
    for &n in traj.iter() {
        let actions = g.out_edges(n)?;
        if actions.is_empty() {
            quality += gamma.powf(time) * rep.mdp().terminal_value();
            break;
        }
        let pi = g.node_attrs(n)?.pi;
        let &(s, t) = actions.get(pi).ok_or(BirlError::InvalidPolicy {
            node: n,
            action: pi,
            n_actions: actions.len(),
        })?;
        let e = g.edge_attrs(s, t)?;
        quality += gamma.powf(time) * dot(reward, &e.phi);
        time += e.duration;
    }
    Ok(quality)
}

/// Quality of each expert demonstration.
pub fn expert_quality<R: Representation>(
    rep: &R,
    reward: &[f64],
    demos: &[Trajectory],
) -> Result<Vec<f64>> {
    demos
        .iter()
        .map(|traj| trajectory_quality(rep, reward, traj))
        .collect()
}

/// Quality of each generated trajectory, per iteration batch.
pub fn generated_quality<R: Representation>(
    rep: &R,
    reward: &[f64],
    g_trajs: &[Vec<Trajectory>],
) -> Result<Vec<Vec<f64>>> {
    g_trajs
        .iter()
        .map(|batch| expert_quality(rep, reward, batch))
        .collect()
}
