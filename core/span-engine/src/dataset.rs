//! FILENAME: core/span-engine/src/dataset.rs
//! PURPOSE: The in-memory table that spans are computed over.
//! CONTEXT: An ingestion layer (CSV, spreadsheet, JSON) produces this; the
//! span engine only reads it. Scalars keep their source type for display
//! but are compared as normalized text.

use crate::error::SpanError;
use rule_engine::value::format_number;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// The text used for every comparison. Null normalizes to empty text.
    pub fn normalized(&self) -> Cow<'_, str> {
        match self {
            Scalar::Null => Cow::Borrowed(""),
            Scalar::Boolean(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Scalar::Number(n) => Cow::Owned(format_number(*n)),
            Scalar::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

/// One row, keyed by field name.
pub type Record = FxHashMap<String, Scalar>;

/// An ordered, fully materialized table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDataset {
    /// Field names in display order.
    pub fields: Vec<String>,
    pub records: Vec<Record>,
}

impl TableDataset {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TableDataset {
            fields: fields.into_iter().map(Into::into).collect(),
            records: Vec::new(),
        }
    }

    pub fn from_records(fields: Vec<String>, records: Vec<Record>) -> Self {
        TableDataset { fields, records }
    }

    /// Parses `{"fields": [...], "records": [{...}, ...]}`.
    pub fn from_json(json: &str) -> Result<Self, SpanError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Appends a row whose values line up with `fields`. Extra values are
    /// ignored; missing trailing values leave the field absent.
    pub fn push_row<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        let record: Record = self
            .fields
            .iter()
            .cloned()
            .zip(values.into_iter().map(Into::into))
            .collect();
        self.records.push(record);
    }

    pub fn with_row<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        self.push_row(values);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn value(&self, row: usize, field: &str) -> Option<&Scalar> {
        self.records.get(row).and_then(|record| record.get(field))
    }

    /// Normalized text of a cell, or None when the row lacks the field.
    pub fn text(&self, row: usize, field: &str) -> Option<Cow<'_, str>> {
        self.value(row, field).map(Scalar::normalized)
    }
}
