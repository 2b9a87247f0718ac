//! Configuration shared by the BIRL solver family.
use crate::BirlError;
use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Configuration shared by the BIRL solvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirlConfig {
    /// Expert optimality parameter of the likelihood term, in `(0, 1]`.
    pub beta: f64,

    /// Number of reward-search iterations.
    pub max_iter: usize,
}

impl Default for BirlConfig {
    fn default() -> Self {
        Self {
            beta: 0.7,
            max_iter: 10,
        }
    }
}

impl BirlConfig {
    /// Sets the expert optimality parameter.
    pub fn beta(mut self, v: f64) -> Self {
        self.beta = v;
        self
    }

    /// Sets the number of reward-search iterations.
    pub fn max_iter(mut self, v: usize) -> Self {
        self.max_iter = v;
        self
    }

    /// Checks the configuration, warning on implausible values.
    pub fn validate(&self) -> Result<()> {
        if !(self.beta > 0.0 && self.beta <= 1.0) {
            return Err(BirlError::InvalidConfig(format!(
                "beta must be in (0, 1], got {}",
                self.beta
            ))
            .into());
        }
        if self.max_iter == 0 {
            return Err(BirlError::InvalidConfig("max_iter must be > 0".into()).into());
        }
        if self.max_iter > 1000 {
            warn!("max_iter set to high value: {}", self.max_iter);
        }
        Ok(())
    }

    /// Constructs [`BirlConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let c = serde_yaml::from_reader(rdr)?;
        Ok(c)
    }

    /// Saves [`BirlConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
