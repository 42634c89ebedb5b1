//! FILENAME: core/span-engine/src/config.rs
//! PURPOSE: Merge configuration and its up-front validation.
//! CONTEXT: An invalid configuration is the only hard failure of span
//! computation, so every problem is collected and reported at once.

use crate::dataset::TableDataset;
use crate::error::SpanError;
use rule_engine::{Equivalence, RuleEngine};
use serde::{Deserialize, Serialize};

/// Merge topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeType {
    /// Equal values stacked in one column merge vertically.
    #[default]
    Row,
    /// Equal values side by side in one row merge horizontally.
    Column,
    /// Vertical runs first, then horizontal growth over whole blocks.
    Mixed,
}

/// What to merge and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConfiguration {
    pub merge_type: MergeType,
    /// Columns taking part in merging. Column merge follows this order.
    pub merge_columns: Vec<String>,
    #[serde(default)]
    pub equivalence: Equivalence,
    /// First row of the merge window.
    #[serde(default)]
    pub start_row: usize,
    /// Last row of the merge window (inclusive). None means the last row.
    #[serde(default)]
    pub end_row: Option<usize>,
}

impl MergeConfiguration {
    pub fn new<I, S>(merge_type: MergeType, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MergeConfiguration {
            merge_type,
            merge_columns: columns.into_iter().map(Into::into).collect(),
            equivalence: Equivalence::Exact,
            start_row: 0,
            end_row: None,
        }
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.equivalence = Equivalence::Custom(rule.into());
        self
    }

    pub fn with_range(mut self, start_row: usize, end_row: Option<usize>) -> Self {
        self.start_row = start_row;
        self.end_row = end_row;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, SpanError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Merge columns in configured order, first occurrence wins.
    pub fn ordered_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::with_capacity(self.merge_columns.len());
        for column in &self.merge_columns {
            if !columns.contains(&column.as_str()) {
                columns.push(column);
            }
        }
        columns
    }

    /// The inclusive row window clamped to a dataset of `len` rows, or None
    /// when no row falls inside it.
    pub fn window(&self, len: usize) -> Option<(usize, usize)> {
        if len == 0 {
            return None;
        }
        let end = self.end_row.unwrap_or(len - 1).min(len - 1);
        if self.start_row > end {
            None
        } else {
            Some((self.start_row, end))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ConfigValidation {
    pub fn into_result(self) -> Result<(), SpanError> {
        if self.valid {
            Ok(())
        } else {
            Err(SpanError::InvalidConfig(self.errors))
        }
    }
}

/// Checks a configuration against a dataset before any span is computed.
pub fn validate_merge_config(
    dataset: &TableDataset,
    config: &MergeConfiguration,
    engine: &mut RuleEngine,
) -> ConfigValidation {
    let mut errors = Vec::new();

    if config.merge_columns.is_empty() {
        errors.push("Select at least one column to merge".to_string());
    }

    if !dataset.fields.is_empty() {
        let unknown: Vec<&str> = config
            .ordered_columns()
            .into_iter()
            .filter(|column| !dataset.has_field(column))
            .collect();
        if !unknown.is_empty() {
            errors.push(format!("Unknown merge columns: {}", unknown.join(", ")));
        }
    }

    if let Some(end_row) = config.end_row {
        if config.start_row > end_row {
            errors.push(format!(
                "startRow ({}) must not be greater than endRow ({})",
                config.start_row, end_row
            ));
        }
    }

    if let Equivalence::Custom(rule) = &config.equivalence {
        if rule.trim().is_empty() {
            errors.push("A custom merge rule is required".to_string());
        } else {
            let validation = engine.validate(rule);
            errors.extend(
                validation
                    .errors
                    .into_iter()
                    .map(|e| format!("Custom rule: {}", e)),
            );
        }
    }

    ConfigValidation {
        valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> TableDataset {
        TableDataset::new(["dept", "name"]).with_row(["Eng", "A"])
    }

    #[test]
    fn test_valid_config() {
        let config = MergeConfiguration::new(MergeType::Row, ["dept"]);
        let validation = validate_merge_config(&dataset(), &config, &mut RuleEngine::new());
        assert!(validation.valid);
        assert!(validation.into_result().is_ok());
    }

    #[test]
    fn test_collects_every_problem() {
        let config = MergeConfiguration::new(MergeType::Row, ["dept", "salary", "bonus"])
            .with_range(5, Some(2))
            .with_rule("window.alert(value1)");
        let validation = validate_merge_config(&dataset(), &config, &mut RuleEngine::new());

        assert!(!validation.valid);
        assert_eq!(validation.errors[0], "Unknown merge columns: salary, bonus");
        assert_eq!(validation.errors[1], "startRow (5) must not be greater than endRow (2)");
        assert!(validation.errors[2].starts_with("Custom rule: "));
    }

    #[test]
    fn test_empty_columns_and_empty_rule() {
        let config = MergeConfiguration::new(MergeType::Mixed, Vec::<String>::new()).with_rule("  ");
        let validation = validate_merge_config(&dataset(), &config, &mut RuleEngine::new());
        assert_eq!(
            validation.errors,
            vec![
                "Select at least one column to merge".to_string(),
                "A custom merge rule is required".to_string(),
            ]
        );
    }

    #[test]
    fn test_columns_unchecked_without_fields() {
        let config = MergeConfiguration::new(MergeType::Row, ["anything"]);
        let validation = validate_merge_config(&TableDataset::default(), &config, &mut RuleEngine::new());
        assert!(validation.valid);
    }

    #[test]
    fn test_window_clamping() {
        let config = MergeConfiguration::new(MergeType::Row, ["a"]);
        assert_eq!(config.window(0), None);
        assert_eq!(config.window(5), Some((0, 4)));
        assert_eq!(config.clone().with_range(2, Some(10)).window(5), Some((2, 4)));
        assert_eq!(config.with_range(7, None).window(5), None);
    }

    #[test]
    fn test_ordered_columns_dedup() {
        let config = MergeConfiguration::new(MergeType::Column, ["b", "a", "b"]);
        assert_eq!(config.ordered_columns(), vec!["b", "a"]);
    }

    #[test]
    fn test_json_wire_format() {
        let config = MergeConfiguration::from_json(
            r#"{
                "mergeType": "mixed",
                "mergeColumns": ["region", "product"],
                "equivalence": {"condition": "custom", "rule": "value1.trim() === value2.trim()"},
                "startRow": 1,
                "endRow": 9
            }"#,
        )
        .unwrap();
        assert_eq!(config.merge_type, MergeType::Mixed);
        assert_eq!(config.start_row, 1);
        assert_eq!(config.end_row, Some(9));
        assert!(matches!(config.equivalence, Equivalence::Custom(_)));

        let minimal =
            MergeConfiguration::from_json(r#"{"mergeType": "row", "mergeColumns": ["dept"]}"#).unwrap();
        assert_eq!(minimal.equivalence, Equivalence::Exact);
        assert_eq!(minimal.end_row, None);
    }
}
