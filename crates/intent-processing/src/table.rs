//! Feature tables with a named column schema, and column projection

use crate::features::{feature_columns, FeatureVector};
use intent_core::{config_error, IntentError, IntentResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Input columns of the deployed classifier, in the order it expects them
pub const DEPLOYED_COLUMNS: [&str; 33] = [
    "FFT_101",
    "Spectral Spread",
    "Kurtosis",
    "FFT_98",
    "FFT_26",
    "Max",
    "Spectral Skewness",
    "FFT_24",
    "FFT_4",
    "Beta Power",
    "Abs Diff Signal",
    "FFT_70",
    "FFT_1",
    "FFT_2",
    "FFT_5",
    "FFT_103",
    "Start Timestamp",
    "FFT_121",
    "FFT_100",
    "FFT_25",
    "FFT_120",
    "Entropy",
    "FFT_22",
    "FFT_55",
    "RMS",
    "FFT_123",
    "FFT_27",
    "Standard Deviation",
    "End Timestamp",
    "Zero Crossing Rate",
    "Skewness",
    "Peak-to-Peak",
    "Delta Power",
];

/// Ordered subset of feature columns a classifier consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSelection {
    columns: Vec<String>,
}

impl ColumnSelection {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Keep every column of a schema, in schema order
    pub fn all(schema: &[String]) -> Self {
        Self::new(schema.iter().cloned())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Selected columns that `schema` does not provide, in selection order
    pub fn missing_from(&self, schema: &[String]) -> Vec<String> {
        let available: HashSet<&str> = schema.iter().map(String::as_str).collect();
        self.columns
            .iter()
            .filter(|column| !available.contains(column.as_str()))
            .cloned()
            .collect()
    }

    /// Check the selection is non-empty, free of duplicates and fully
    /// provided by `schema`
    pub fn validate_against(&self, schema: &[String]) -> IntentResult<()> {
        if self.columns.is_empty() {
            return Err(config_error!("column selection is empty"));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.as_str()) {
                return Err(config_error!("column '{}' selected more than once", column));
            }
        }

        let missing = self.missing_from(schema);
        if !missing.is_empty() {
            return Err(IntentError::SchemaMismatch { missing });
        }
        Ok(())
    }
}

impl Default for ColumnSelection {
    fn default() -> Self {
        Self::new(DEPLOYED_COLUMNS)
    }
}

/// Rows of feature values sharing one ordered column schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Empty table with the given schema
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row; its length must match the schema width
    pub fn push_row(&mut self, row: Vec<f64>) -> IntentResult<()> {
        if row.len() != self.columns.len() {
            // Name the schema columns the row has no value for
            let missing = if row.len() < self.columns.len() {
                self.columns[row.len()..].to_vec()
            } else {
                Vec::new()
            };
            return Err(IntentError::SchemaMismatch { missing });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Values of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Table holding only the latest `n` rows
    pub fn tail(&self, n: usize) -> FeatureTable {
        let start = self.rows.len().saturating_sub(n);
        FeatureTable {
            columns: self.columns.clone(),
            rows: self.rows[start..].to_vec(),
        }
    }

    /// Select and reorder columns
    pub fn project(&self, selection: &ColumnSelection) -> IntentResult<FeatureTable> {
        let lookup: HashMap<&str, usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| (column.as_str(), i))
            .collect();

        let mut indices = Vec::with_capacity(selection.len());
        let mut missing = Vec::new();
        for column in selection.columns() {
            match lookup.get(column.as_str()) {
                Some(&index) => indices.push(index),
                None => missing.push(column.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(IntentError::SchemaMismatch { missing });
        }

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i]).collect())
            .collect();

        Ok(FeatureTable {
            columns: selection.columns().to_vec(),
            rows,
        })
    }

    /// Render as CSV with a header line
    pub fn to_csv(&self) -> String {
        let mut out = self.columns.join(",");
        out.push('\n');
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }
}

/// Collects per-window feature vectors into a full-schema table
#[derive(Debug, Clone)]
pub struct FeatureTableBuilder {
    table: FeatureTable,
}

impl FeatureTableBuilder {
    /// Builder for windows of `window_size` samples
    pub fn new(window_size: usize) -> Self {
        Self {
            table: FeatureTable::new(feature_columns(window_size)),
        }
    }

    pub fn push(&mut self, features: &FeatureVector) -> IntentResult<()> {
        self.table.push_row(features.to_row())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn finish(self) -> FeatureTable {
        self.table
    }
}
