//! A*-style path search over the state graph.
use super::StateGraph;
use crate::BirlError;
use anyhow::Result;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Cost charged for a missing edge by the search metric.
const MISSING_EDGE_PENALTY: f64 = 1000.0;

/// Cap on node expansions of a single search.
const MAX_EXPANSIONS: usize = 100_000;

/// Searches for a path from `source` to `target`.
///
/// The metric of the search is the negated edge reward, turning reward
/// maximization into cost minimization. The heuristic is intentionally kept
/// as in the original design: it closes over the `(source, target)` pair of
/// the call and is therefore constant throughout one search, which reduces
/// the search to a uniform-cost expansion. Search stops with
/// [`BirlError::PathNotFound`] when the frontier empties or the expansion
/// cap is hit.
pub(super) fn search_path(g: &StateGraph, source: usize, target: usize) -> Result<Vec<usize>> {
    g.node_attrs(source)?;
    g.node_attrs(target)?;

    // Constant per search, see above.
    let heuristic = if g.edge_exists(source, target) {
        -g.edge_attrs(source, target)?.reward
    } else {
        MISSING_EDGE_PENALTY
    };

    let mut dist: HashMap<usize, f64> = HashMap::new();
    let mut came_from: HashMap<usize, usize> = HashMap::new();
    let mut frontier = BinaryHeap::new();

    dist.insert(source, 0.0);
    frontier.push(Reverse((OrderedFloat(heuristic), source)));

    let mut expansions = 0;
    while let Some(Reverse((_, n))) = frontier.pop() {
        if n == target {
            return Ok(reconstruct(&came_from, source, target));
        }
        expansions += 1;
        if expansions > MAX_EXPANSIONS {
            break;
        }

        let d_n = dist[&n];
        for (s, t) in g.out_edges(n)? {
            let cost = -g.edge_attrs(s, t)?.reward;
            let d_t = d_n + cost;
            if dist.get(&t).map_or(true, |&d| d_t < d) {
                dist.insert(t, d_t);
                came_from.insert(t, n);
                frontier.push(Reverse((OrderedFloat(d_t + heuristic), t)));
            }
        }
    }

    Err(BirlError::PathNotFound(source, target).into())
}

fn reconstruct(came_from: &HashMap<usize, usize>, source: usize, target: usize) -> Vec<usize> {
    let mut path = vec![target];
    let mut n = target;
    while n != source {
        n = came_from[&n];
        path.push(n);
    }
    path.reverse();
    path
}
