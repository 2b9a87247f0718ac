//! Priors over reward vectors.
use serde::{Deserialize, Serialize};

/// A prior density over the components of a reward vector.
///
/// The variants form a closed set selected by configuration. Densities are
/// normalized over the supplied batch, so the returned values sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RewardPrior {
    /// Flat prior.
    Uniform,

    /// Gaussian prior of the given scale.
    Gaussian {
        /// Scale of the density.
        sigma: f64,
    },

    /// Laplacian prior of the given scale.
    Laplacian {
        /// Scale of the density.
        sigma: f64,
    },
}

impl RewardPrior {
    /// Density of each component, normalized to sum to one over the batch.
    pub fn density(&self, r: &[f64]) -> Vec<f64> {
        let raw: Vec<f64> = match self {
            RewardPrior::Uniform => vec![1.0; r.len()],
            RewardPrior::Gaussian { sigma } => r
                .iter()
                .map(|&x| {
                    (-x * x / (2.0 * sigma * sigma)).exp() / (2.0 * std::f64::consts::PI).sqrt()
                        * sigma
                })
                .collect(),
            RewardPrior::Laplacian { sigma } => r
                .iter()
                .map(|&x| (-x.abs() / (2.0 * sigma)).exp() / (2.0 * sigma))
                .collect(),
        };
        let total: f64 = raw.iter().sum();
        raw.into_iter().map(|p| p / total).collect()
    }

    /// Natural log of [`RewardPrior::density`].
    pub fn log_density(&self, r: &[f64]) -> Vec<f64> {
        self.density(r).into_iter().map(|p| p.ln()).collect()
    }
}
