//! FILENAME: core/rule-engine/src/config.rs
//! PURPOSE: Tunables for the rule engine.
//! CONTEXT: Deserializable from the same camelCase JSON the front-end uses,
//! with every field optional so a partial document keeps the defaults.

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Wall-clock budget for one rule execution.
    pub timeout_ms: u64,
    /// Complexity scores above this produce a warning.
    pub complexity_threshold: u32,
    /// Rules longer than this (in characters) produce a warning.
    pub max_rule_length: usize,
    /// Number of most recent executions used for performance statistics.
    pub stats_window: usize,
    /// Maximum retained history entries. None keeps everything.
    pub history_capacity: Option<usize>,
    /// Master switch for the result cache.
    pub cache_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            timeout_ms: 1000,
            complexity_threshold: 10,
            max_rule_length: 1000,
            stats_window: 100,
            history_capacity: None,
            cache_enabled: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
