//! FILENAME: core/span-engine/src/spans.rs
//! PURPOSE: Turns a dataset plus a merge configuration into per-cell spans.
//! CONTEXT: Every cell is decided on its own. A forward scan from the cell
//! measures its run, and a backward check against the immediately preceding
//! row (or merge column) decides whether it is hidden. Only that one
//! predecessor is consulted, so runs are always contiguous.

use crate::config::{validate_merge_config, MergeConfiguration, MergeType};
use crate::dataset::TableDataset;
use crate::error::SpanError;
use rule_engine::{Equivalence, RuleEngine};
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "spans";

// ========================================
// RESULT TYPES
// ========================================

/// Span of a single cell. (1,1) is an ordinary cell, (0,0) is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanResult {
    pub row_span: u32,
    pub col_span: u32,
}

impl SpanResult {
    pub const PLAIN: SpanResult = SpanResult { row_span: 1, col_span: 1 };
    pub const HIDDEN: SpanResult = SpanResult { row_span: 0, col_span: 0 };

    pub fn new(row_span: u32, col_span: u32) -> Self {
        SpanResult { row_span, col_span }
    }

    pub fn is_hidden(&self) -> bool {
        self.row_span == 0 && self.col_span == 0
    }

    /// True when the cell covers more than itself.
    pub fn is_anchor(&self) -> bool {
        !self.is_hidden() && (self.row_span > 1 || self.col_span > 1)
    }
}

impl Default for SpanResult {
    fn default() -> Self {
        SpanResult::PLAIN
    }
}

/// Spans for every (row, field) pair of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanMatrix {
    pub fields: Vec<String>,
    /// One entry per dataset row, aligned with `fields`.
    pub rows: Vec<Vec<SpanResult>>,
    /// Distinct degradations hit while comparing, such as a custom rule
    /// falling back to exact equality.
    pub warnings: Vec<String>,
}

impl SpanMatrix {
    pub fn get(&self, row: usize, field: &str) -> Option<SpanResult> {
        let column = self.fields.iter().position(|f| f == field)?;
        self.rows.get(row).and_then(|cells| cells.get(column)).copied()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of anchors, i.e. merged blocks rendered.
    pub fn merged_block_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|span| span.is_anchor())
            .count()
    }

    pub fn hidden_cell_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|span| span.is_hidden())
            .count()
    }
}

// ========================================
// PUBLIC OPERATIONS
// ========================================

/// Computes spans for the whole dataset.
///
/// An invalid configuration is the only error. Comparison problems degrade
/// to exact equality and are reported in `SpanMatrix::warnings`.
pub fn compute_spans(
    dataset: &TableDataset,
    config: &MergeConfiguration,
    engine: &mut RuleEngine,
) -> Result<SpanMatrix, SpanError> {
    validate_merge_config(dataset, config, engine).into_result()?;

    let columns = config.ordered_columns();
    let fields = matrix_fields(dataset, &columns);
    let mut rows = vec![vec![SpanResult::PLAIN; fields.len()]; dataset.len()];

    let Some(window) = config.window(dataset.len()) else {
        log::debug!(target: LOG_TARGET, "No rows inside the merge window, all cells plain");
        return Ok(SpanMatrix {
            fields,
            rows,
            warnings: Vec::new(),
        });
    };

    log::debug!(
        target: LOG_TARGET,
        "Computing {:?} spans over rows {}..={} for {} columns",
        config.merge_type,
        window.0,
        window.1,
        columns.len()
    );

    let grid = CellGrid::build(dataset, &columns, window);
    let mut comparer = Comparer::new(engine, &config.equivalence);

    let positions: Vec<usize> = columns
        .iter()
        .filter_map(|column| fields.iter().position(|f| f == column))
        .collect();
    for row in window.0..=window.1 {
        for (k, &position) in positions.iter().enumerate() {
            rows[row][position] = grid.span(config.merge_type, row, k, &mut comparer);
        }
    }

    Ok(SpanMatrix {
        fields,
        rows,
        warnings: comparer.into_warnings(),
    })
}

/// Span of one cell. Gives the same answer as the matching `compute_spans`
/// entry.
pub fn span_for(
    dataset: &TableDataset,
    config: &MergeConfiguration,
    engine: &mut RuleEngine,
    row: usize,
    field: &str,
) -> Result<SpanResult, SpanError> {
    validate_merge_config(dataset, config, engine).into_result()?;

    let columns = config.ordered_columns();
    let Some(k) = columns.iter().position(|c| *c == field) else {
        return Ok(SpanResult::PLAIN);
    };
    let Some((start, end)) = config.window(dataset.len()) else {
        return Ok(SpanResult::PLAIN);
    };
    if row < start || row > end {
        return Ok(SpanResult::PLAIN);
    }

    let grid = CellGrid::build(dataset, &columns, (start, end));
    let mut comparer = Comparer::new(engine, &config.equivalence);
    Ok(grid.span(config.merge_type, row, k, &mut comparer))
}

/// Dataset fields followed by any merge column the field list lacks.
fn matrix_fields(dataset: &TableDataset, columns: &[&str]) -> Vec<String> {
    let mut fields = dataset.fields.clone();
    for column in columns {
        if !dataset.has_field(column) {
            fields.push(column.to_string());
        }
    }
    fields
}

// ========================================
// COMPARISON
// ========================================

/// Wraps the rule engine so a failing custom rule is reported once.
struct Comparer<'a> {
    engine: &'a mut RuleEngine,
    equivalence: &'a Equivalence,
    warnings: Vec<String>,
}

impl<'a> Comparer<'a> {
    fn new(engine: &'a mut RuleEngine, equivalence: &'a Equivalence) -> Self {
        Comparer {
            engine,
            equivalence,
            warnings: Vec::new(),
        }
    }

    /// A missing cell never matches anything.
    fn equivalent(&mut self, value1: Option<&str>, value2: Option<&str>) -> bool {
        let (Some(value1), Some(value2)) = (value1, value2) else {
            return false;
        };

        let comparison = self.engine.compare(value1, value2, self.equivalence);
        if let Some(message) = comparison.fallback {
            if !self.warnings.contains(&message) {
                log::warn!(target: LOG_TARGET, "{}", message);
                self.warnings.push(message);
            }
        }
        comparison.matched
    }

    fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}

// ========================================
// SCANS
// ========================================

/// Normalized merge-column values for the rows inside the window.
struct CellGrid {
    start: usize,
    end: usize,
    /// cells[row - start][k], None when the record lacks the field.
    cells: Vec<Vec<Option<String>>>,
    width: usize,
}

impl CellGrid {
    fn build(dataset: &TableDataset, columns: &[&str], (start, end): (usize, usize)) -> Self {
        let cells = (start..=end)
            .map(|row| {
                columns
                    .iter()
                    .map(|column| dataset.text(row, column).map(|text| text.into_owned()))
                    .collect()
            })
            .collect();
        CellGrid {
            start,
            end,
            cells,
            width: columns.len(),
        }
    }

    fn cell(&self, row: usize, k: usize) -> Option<&str> {
        self.cells
            .get(row - self.start)
            .and_then(|cells| cells.get(k))
            .and_then(|cell| cell.as_deref())
    }

    /// Span of the cell at `row` in merge column `k`. The row must lie inside
    /// the window.
    fn span(&self, merge_type: MergeType, row: usize, k: usize, comparer: &mut Comparer<'_>) -> SpanResult {
        match merge_type {
            MergeType::Row => {
                if self.follows_row_above(row, k, comparer) {
                    return SpanResult::HIDDEN;
                }
                SpanResult::new(self.row_run(row, k, comparer), 1)
            }
            MergeType::Column => {
                if self.follows_column_before(row, k, comparer) {
                    return SpanResult::HIDDEN;
                }
                SpanResult::new(1, self.column_run(row, k, comparer))
            }
            MergeType::Mixed => {
                // The column check only runs when the row check kept the cell.
                if self.follows_row_above(row, k, comparer)
                    || self.follows_column_before(row, k, comparer)
                {
                    return SpanResult::HIDDEN;
                }
                let row_span = self.row_run(row, k, comparer);
                SpanResult::new(row_span, self.block_width(row, k, row_span, comparer))
            }
        }
    }

    /// Backward check: the row directly above, if inside the window, matches.
    fn follows_row_above(&self, row: usize, k: usize, comparer: &mut Comparer<'_>) -> bool {
        row > self.start && comparer.equivalent(self.cell(row - 1, k), self.cell(row, k))
    }

    /// Backward check: the preceding merge column in this row matches.
    fn follows_column_before(&self, row: usize, k: usize, comparer: &mut Comparer<'_>) -> bool {
        k > 0 && comparer.equivalent(self.cell(row, k - 1), self.cell(row, k))
    }

    /// 1 plus the rows below whose value matches this cell, stopping at the
    /// first mismatch or the window end.
    fn row_run(&self, row: usize, k: usize, comparer: &mut Comparer<'_>) -> u32 {
        let anchor = self.cell(row, k);
        let mut span = 1;
        for i in row + 1..=self.end {
            if !comparer.equivalent(self.cell(i, k), anchor) {
                break;
            }
            span += 1;
        }
        span
    }

    /// 1 plus the following merge columns whose value in this row matches.
    fn column_run(&self, row: usize, k: usize, comparer: &mut Comparer<'_>) -> u32 {
        let anchor = self.cell(row, k);
        let mut span = 1;
        for j in k + 1..self.width {
            if !comparer.equivalent(self.cell(row, j), anchor) {
                break;
            }
            span += 1;
        }
        span
    }

    /// Grows a block of `row_span` rows one merge column at a time. A column
    /// is taken only when every row of the block matches the anchor value
    /// there; the first rejected column ends the growth.
    fn block_width(&self, row: usize, k: usize, row_span: u32, comparer: &mut Comparer<'_>) -> u32 {
        let anchor = self.cell(row, k);
        let block = row..row + row_span as usize;
        let mut span = 1;
        for j in k + 1..self.width {
            let uniform = block
                .clone()
                .all(|i| comparer.equivalent(self.cell(i, j), anchor));
            if !uniform {
                break;
            }
            span += 1;
        }
        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RuleEngine {
        RuleEngine::new()
    }

    fn column(matrix: &SpanMatrix, field: &str) -> Vec<(u32, u32)> {
        (0..matrix.row_count())
            .map(|row| {
                let span = matrix.get(row, field).unwrap();
                (span.row_span, span.col_span)
            })
            .collect()
    }

    #[test]
    fn test_row_merge_scenario() {
        let dataset = TableDataset::new(["dept", "name"])
            .with_row(["Eng", "A"])
            .with_row(["Eng", "B"])
            .with_row(["Sales", "C"]);
        let config = MergeConfiguration::new(MergeType::Row, ["dept"]);

        let matrix = compute_spans(&dataset, &config, &mut engine()).unwrap();
        assert_eq!(column(&matrix, "dept"), vec![(2, 1), (0, 0), (1, 1)]);
        assert_eq!(column(&matrix, "name"), vec![(1, 1); 3]);
        assert!(matrix.warnings.is_empty());
    }

    #[test]
    fn test_runs_are_contiguous() {
        let dataset = TableDataset::new(["v"])
            .with_row(["a"])
            .with_row(["a"])
            .with_row(["b"])
            .with_row(["a"])
            .with_row(["a"])
            .with_row(["a"]);
        let config = MergeConfiguration::new(MergeType::Row, ["v"]);

        let matrix = compute_spans(&dataset, &config, &mut engine()).unwrap();
        assert_eq!(
            column(&matrix, "v"),
            vec![(2, 1), (0, 0), (1, 1), (3, 1), (0, 0), (0, 0)]
        );
    }

    #[test]
    fn test_window_limits_merging() {
        let dataset = TableDataset::new(["v"])
            .with_row(["x"])
            .with_row(["x"])
            .with_row(["x"])
            .with_row(["x"])
            .with_row(["x"])
            .with_row(["x"]);
        let config = MergeConfiguration::new(MergeType::Row, ["v"]).with_range(2, Some(4));

        let matrix = compute_spans(&dataset, &config, &mut engine()).unwrap();
        assert_eq!(
            column(&matrix, "v"),
            vec![(1, 1), (1, 1), (3, 1), (0, 0), (0, 0), (1, 1)]
        );
    }

    #[test]
    fn test_column_merge_follows_configured_order() {
        let dataset = TableDataset::new(["a", "b", "c"]).with_row(["1", "2", "1"]);
        let config = MergeConfiguration::new(MergeType::Column, ["a", "c", "b"]);

        let matrix = compute_spans(&dataset, &config, &mut engine()).unwrap();
        assert_eq!(matrix.get(0, "a"), Some(SpanResult::new(1, 2)));
        assert_eq!(matrix.get(0, "c"), Some(SpanResult::HIDDEN));
        assert_eq!(matrix.get(0, "b"), Some(SpanResult::PLAIN));
    }

    #[test]
    fn test_mixed_block_requires_whole_block() {
        let same = TableDataset::new(["A", "B"])
            .with_row(["x", "x"])
            .with_row(["x", "x"])
            .with_row(["x", "y"]);
        let config = MergeConfiguration::new(MergeType::Mixed, ["A", "B"]).with_range(0, Some(1));

        let matrix = compute_spans(&same, &config, &mut engine()).unwrap();
        assert_eq!(matrix.get(0, "A"), Some(SpanResult::new(2, 2)));
        assert_eq!(matrix.get(0, "B"), Some(SpanResult::HIDDEN));
        assert_eq!(matrix.get(1, "A"), Some(SpanResult::HIDDEN));
        assert_eq!(matrix.get(1, "B"), Some(SpanResult::HIDDEN));
        assert_eq!(matrix.get(2, "A"), Some(SpanResult::PLAIN));

        let broken = TableDataset::new(["A", "B"])
            .with_row(["x", "x"])
            .with_row(["x", "2"]);
        let matrix = compute_spans(&broken, &config, &mut engine()).unwrap();
        assert_eq!(matrix.get(0, "A"), Some(SpanResult::new(2, 1)));
        // Hidden by the column check: A0 and B0 hold the same value.
        assert_eq!(matrix.get(0, "B"), Some(SpanResult::HIDDEN));
        assert_eq!(matrix.get(1, "A"), Some(SpanResult::HIDDEN));
        assert_eq!(matrix.get(1, "B"), Some(SpanResult::PLAIN));
    }

    #[test]
    fn test_mixed_grows_over_uniform_column() {
        let dataset = TableDataset::new(["A", "B"])
            .with_row(["p", "q"])
            .with_row(["q", "q"])
            .with_row(["q", "q"]);
        let config = MergeConfiguration::new(MergeType::Mixed, ["A", "B"]);

        let matrix = compute_spans(&dataset, &config, &mut engine()).unwrap();
        assert_eq!(matrix.get(0, "A"), Some(SpanResult::PLAIN));
        assert_eq!(matrix.get(0, "B"), Some(SpanResult::new(3, 1)));
        assert_eq!(matrix.get(1, "A"), Some(SpanResult::new(2, 2)));
        assert_eq!(matrix.get(1, "B"), Some(SpanResult::HIDDEN));
        assert_eq!(matrix.get(2, "A"), Some(SpanResult::HIDDEN));
        assert_eq!(matrix.get(2, "B"), Some(SpanResult::HIDDEN));
    }

    #[test]
    fn test_only_the_predecessor_decides_visibility() {
        // "Within 5" is not transitive: 8 is too far from 0 to join its run,
        // but close enough to 4 to be hidden behind it.
        let dataset = TableDataset::new(["v"])
            .with_row(["0"])
            .with_row(["4"])
            .with_row(["8"]);
        let config = MergeConfiguration::new(MergeType::Row, ["v"])
            .with_rule("Math.abs(Number(value1) - Number(value2)) <= 5");

        let matrix = compute_spans(&dataset, &config, &mut engine()).unwrap();
        assert_eq!(matrix.get(0, "v"), Some(SpanResult::new(2, 1)));
        assert_eq!(matrix.get(1, "v"), Some(SpanResult::HIDDEN));
        assert_eq!(matrix.get(2, "v"), Some(SpanResult::HIDDEN));
    }

    #[test]
    fn test_missing_field_never_merges() {
        let mut dataset = TableDataset::new(["dept"]).with_row(["Eng"]);
        dataset.records.push(Default::default());
        dataset.push_row(["Eng"]);
        let config = MergeConfiguration::new(MergeType::Row, ["dept"]);

        let matrix = compute_spans(&dataset, &config, &mut engine()).unwrap();
        assert_eq!(column(&matrix, "dept"), vec![(1, 1); 3]);
    }

    #[test]
    fn test_failing_rule_falls_back_with_one_warning() {
        let dataset = TableDataset::new(["v"])
            .with_row(["a"])
            .with_row(["a"])
            .with_row(["b"])
            .with_row(["b"]);
        let config = MergeConfiguration::new(MergeType::Row, ["v"]).with_rule("matches(value1, '(')");

        let mut engine = engine();
        let matrix = compute_spans(&dataset, &config, &mut engine).unwrap();
        assert_eq!(column(&matrix, "v"), vec![(2, 1), (0, 0), (2, 1), (0, 0)]);
        assert_eq!(matrix.warnings.len(), 1);
        assert!(matrix.warnings[0].contains("exact equality"));
    }

    #[test]
    fn test_custom_rule_merges() {
        let dataset = TableDataset::new(["v"])
            .with_row(["Apple"])
            .with_row(["apple "])
            .with_row(["pear"]);
        let config = MergeConfiguration::new(MergeType::Row, ["v"])
            .with_rule("value1.trim().toLowerCase() === value2.trim().toLowerCase()");

        let matrix = compute_spans(&dataset, &config, &mut engine()).unwrap();
        assert_eq!(column(&matrix, "v"), vec![(2, 1), (0, 0), (1, 1)]);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dataset = TableDataset::new(["v"]).with_row(["a"]);
        let config = MergeConfiguration::new(MergeType::Row, ["missing"]);
        let err = compute_spans(&dataset, &config, &mut engine()).unwrap_err();
        assert!(matches!(err, SpanError::InvalidConfig(_)));
        assert!(span_for(&dataset, &config, &mut engine(), 0, "v").is_err());
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = TableDataset::new(["v"]);
        let config = MergeConfiguration::new(MergeType::Mixed, ["v"]);
        let matrix = compute_spans(&dataset, &config, &mut engine()).unwrap();
        assert_eq!(matrix.row_count(), 0);
        assert_eq!(
            span_for(&dataset, &config, &mut engine(), 0, "v").unwrap(),
            SpanResult::PLAIN
        );
    }

    #[test]
    fn test_span_for_agrees_with_matrix() {
        let dataset = TableDataset::new(["A", "B", "C"])
            .with_row(["1", "1", "2"])
            .with_row(["1", "1", "2"])
            .with_row(["3", "3", "3"])
            .with_row(["3", "4", "3"]);

        for merge_type in [MergeType::Row, MergeType::Column, MergeType::Mixed] {
            let config = MergeConfiguration::new(merge_type, ["A", "B", "C"]);
            let matrix = compute_spans(&dataset, &config, &mut engine()).unwrap();
            for row in 0..dataset.len() {
                for field in ["A", "B", "C"] {
                    assert_eq!(
                        span_for(&dataset, &config, &mut engine(), row, field).unwrap(),
                        matrix.get(row, field).unwrap(),
                        "{:?} at ({}, {})",
                        merge_type,
                        row,
                        field
                    );
                }
            }
        }
    }

    #[test]
    fn test_span_result_flags() {
        assert!(SpanResult::HIDDEN.is_hidden());
        assert!(!SpanResult::PLAIN.is_anchor());
        assert!(SpanResult::new(1, 3).is_anchor());
        assert_eq!(
            serde_json::to_string(&SpanResult::new(2, 1)).unwrap(),
            r#"{"rowSpan":2,"colSpan":1}"#
        );
    }
}
