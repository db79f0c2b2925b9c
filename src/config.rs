//! Engine options and their file-based loading.

use crate::backend::IsolationLevel;
use crate::error::{CourierError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_max_parallelism() -> usize {
    4
}

/// Tunable engine behavior, loadable from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Upper bound on concurrently executing items in parallel mode.
    #[serde(default = "default_max_parallelism")]
    pub max_parallelism: usize,

    /// Isolation level for transactional envelopes.
    #[serde(default)]
    pub isolation: IsolationLevel,

    /// Reject envelopes that combine parallel fan-out with a transaction
    /// instead of merely logging a warning.
    #[serde(default)]
    pub forbid_parallel_transactions: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_parallelism: default_max_parallelism(),
            isolation: IsolationLevel::default(),
            forbid_parallel_transactions: false,
        }
    }
}

impl EngineOptions {
    /// Loads options from a TOML file.
    ///
    /// A missing file yields the defaults; a present but malformed file is a
    /// configuration error.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            CourierError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            CourierError::config(format!("failed to parse {}: {}", path.display(), e))
        })
    }
}
