//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for span engine integration tests.

#![allow(dead_code)]

use span_engine::{
    compute_spans, span_for, MergeConfiguration, RuleEngine, SpanMatrix, SpanResult, TableDataset,
};

/// Owns a dataset and an engine so tests read as (config, expectations).
pub struct SpanHarness {
    pub dataset: TableDataset,
    pub engine: RuleEngine,
}

impl SpanHarness {
    /// Builds a dataset from rows of text, one column per field.
    pub fn new(fields: &[&str], rows: &[&[&str]]) -> Self {
        let mut dataset = TableDataset::new(fields.iter().copied());
        for row in rows {
            dataset.push_row(row.iter().copied());
        }
        SpanHarness {
            dataset,
            engine: RuleEngine::new(),
        }
    }

    pub fn compute(&mut self, config: &MergeConfiguration) -> SpanMatrix {
        compute_spans(&self.dataset, config, &mut self.engine).unwrap()
    }

    pub fn span(&mut self, config: &MergeConfiguration, row: usize, field: &str) -> SpanResult {
        span_for(&self.dataset, config, &mut self.engine, row, field).unwrap()
    }
}

/// Spans of one field down the whole matrix, as (rowSpan, colSpan) pairs.
pub fn column_spans(matrix: &SpanMatrix, field: &str) -> Vec<(u32, u32)> {
    (0..matrix.row_count())
        .map(|row| {
            let span = matrix.get(row, field).unwrap();
            (span.row_span, span.col_span)
        })
        .collect()
}

/// Asserts that every hidden cell lies inside exactly one anchor's block and
/// that anchor blocks never overlap.
pub fn assert_blocks_consistent(matrix: &SpanMatrix) {
    let width = matrix.fields.len();
    let mut owners = vec![vec![0usize; width]; matrix.row_count()];

    for (row, cells) in matrix.rows.iter().enumerate() {
        for (col, span) in cells.iter().enumerate() {
            if span.is_hidden() {
                continue;
            }
            for r in row..row + span.row_span as usize {
                for c in col..col + span.col_span as usize {
                    assert!(r < matrix.row_count() && c < width, "block at ({}, {}) overflows", row, col);
                    owners[r][c] += 1;
                }
            }
        }
    }

    for (row, cells) in owners.iter().enumerate() {
        for (col, &count) in cells.iter().enumerate() {
            assert_eq!(count, 1, "cell ({}, {}) is covered {} times", row, col, count);
        }
    }
}
