//! FILENAME: core/span-engine/src/lib.rs
//! PURPOSE: Main library entry point for the cell span engine.
//! CONTEXT: Decides which cells of a table render as merged blocks. Equality
//! between cells is delegated to the rule engine so a custom rule can
//! replace plain equality.

pub mod config;
pub mod dataset;
pub mod error;
pub mod preview;
pub mod spans;

pub use config::{validate_merge_config, ConfigValidation, MergeConfiguration, MergeType};
pub use dataset::{Record, Scalar, TableDataset};
pub use error::SpanError;
pub use preview::{merge_preview, suggest_config, PreviewRow};
pub use spans::{compute_spans, span_for, SpanMatrix, SpanResult};

// The engine is part of every signature here.
pub use rule_engine::{Equivalence, RuleEngine};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_computes_spans_end_to_end() {
        let dataset = TableDataset::new(["dept"]).with_row(["Eng"]).with_row(["Eng"]);
        let config = MergeConfiguration::new(MergeType::Row, ["dept"]);
        let mut engine = RuleEngine::new();

        let matrix = compute_spans(&dataset, &config, &mut engine).unwrap();
        assert_eq!(matrix.get(0, "dept"), Some(SpanResult::new(2, 1)));
        assert_eq!(matrix.get(1, "dept"), Some(SpanResult::HIDDEN));
    }
}
