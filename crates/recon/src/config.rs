use serde::{Deserialize, Serialize};

use crate::blocking::DEFAULT_MIN_CANDIDATES;
use crate::cache::DEFAULT_SOURCE;
use crate::error::ReconError;
use crate::model::{DEFAULT_LIMIT, MAX_LIMIT};

/// Tunables for the matching pipeline. Scoring constants are not configurable.
///
/// Deserializes from a `[matching]` table; `source` is never read from it and is
/// set by whoever owns the registry location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    /// Registry source key queries are matched against.
    #[serde(skip)]
    pub source: String,
    /// Limit applied when a query omits one.
    pub default_limit: usize,
    /// Below this many blocked candidates, blocking widens.
    pub min_candidates: usize,
    /// Fan batch members out across the rayon pool.
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.into(),
            default_limit: DEFAULT_LIMIT,
            min_candidates: DEFAULT_MIN_CANDIDATES,
            parallel: true,
        }
    }
}

impl MatchConfig {
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.source.trim().is_empty() {
            return Err(ReconError::Config("source must not be empty".into()));
        }

        if !(1..=MAX_LIMIT).contains(&self.default_limit) {
            return Err(ReconError::Config(format!(
                "default_limit must be between 1 and {MAX_LIMIT}, got {}",
                self.default_limit
            )));
        }

        if self.min_candidates == 0 {
            return Err(ReconError::Config("min_candidates must be at least 1".into()));
        }

        Ok(())
    }
}
