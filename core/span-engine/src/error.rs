//! FILENAME: core/span-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpanError {
    /// The merge configuration failed validation; carries every problem found.
    #[error("Invalid merge configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
