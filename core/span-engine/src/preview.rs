//! FILENAME: core/span-engine/src/preview.rs
//! PURPOSE: Helpers for configuration front-ends: a row-by-row merge
//! preview and a starting configuration guessed from the data.

use crate::config::{MergeConfiguration, MergeType};
use crate::dataset::{Record, TableDataset};
use crate::error::SpanError;
use crate::spans::{compute_spans, SpanResult};
use rule_engine::RuleEngine;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Columns whose distinct values stay below this share of the row count
/// are suggested for merging.
pub const SUGGEST_DISTINCT_RATIO: f64 = 0.8;

/// A record paired with the span of each of its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRow {
    pub index: usize,
    pub record: Record,
    pub merge_info: BTreeMap<String, SpanResult>,
}

pub fn merge_preview(
    dataset: &TableDataset,
    config: &MergeConfiguration,
    engine: &mut RuleEngine,
) -> Result<Vec<PreviewRow>, SpanError> {
    let matrix = compute_spans(dataset, config, engine)?;

    let preview = dataset
        .records
        .iter()
        .zip(&matrix.rows)
        .enumerate()
        .map(|(index, (record, spans))| PreviewRow {
            index,
            record: record.clone(),
            merge_info: matrix.fields.iter().cloned().zip(spans.iter().copied()).collect(),
        })
        .collect();

    Ok(preview)
}

/// Row merge with exact equality over every field that repeats enough to
/// be worth merging.
pub fn suggest_config(dataset: &TableDataset) -> MergeConfiguration {
    let rows = dataset.len();
    let columns: Vec<&String> = if rows == 0 {
        Vec::new()
    } else {
        dataset
            .fields
            .iter()
            .filter(|field| {
                let distinct: FxHashSet<Option<String>> = (0..rows)
                    .map(|row| dataset.text(row, field).map(|text| text.into_owned()))
                    .collect();
                (distinct.len() as f64) < rows as f64 * SUGGEST_DISTINCT_RATIO
            })
            .collect()
    };

    log::debug!(target: "spans", "Suggested merge columns: {:?}", columns);
    MergeConfiguration::new(MergeType::Row, columns.into_iter().cloned())
}
