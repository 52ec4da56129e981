//! In-memory trip tables and delimited-file I/O.
//!
//! Two table types flow through the pipeline:
//!
//! - [`TripTable`] is the immutable input: a header plus raw string rows,
//!   read once from a CSV file (or built in memory). Upstream-derived
//!   columns are never interpreted here beyond the ones the configuration
//!   names; they pass through to the output untouched.
//! - [`AggregatedTable`] is the output: every surviving input row with its
//!   original cells plus the derived feature values. Missing statistics are
//!   `NaN` in memory and empty cells on disk.
//!
//! Required-column checks happen against the header before any group
//! processing starts, so a misconfigured run fails fast with the offending
//! column named instead of producing all-missing feature columns.

use crate::error::{FeatureError, Result};
use crate::schema::FeatureSchema;
use std::io::{Read, Write};
use std::path::Path;

/// Immutable input table: header plus raw rows.
#[derive(Debug, Clone)]
pub struct TripTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TripTable {
    /// Build a table from a header and rows, checking row widths.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let width = headers.len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(FeatureError::config(format!(
                    "row {i} has {} cells, header has {width}",
                    row.len()
                )));
            }
        }
        Ok(Self { headers, rows })
    }

    /// Read a table from a CSV file.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Read a table from any CSV byte stream.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Column headers in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Raw rows in file order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of a column, or a fail-fast error naming the missing column.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| FeatureError::MissingColumn(name.to_string()))
    }
}

/// One output row: the original cells plus derived feature values.
#[derive(Debug, Clone)]
pub struct AggregatedRow {
    /// Original cells, unchanged from the input row.
    pub cells: Vec<String>,
    /// Parsed entry timestamp (sort key within the group).
    pub in_time: i64,
    /// Parsed date, consumed by the first-period filter.
    pub date: i64,
    /// Derived feature values in schema order; NaN marks missing.
    pub features: Vec<f64>,
}

/// Output table: concatenated per-group results.
///
/// Row order within a group follows the group's timestamp order; group-to-
/// group order in the concatenation is unspecified. Consumers that need a
/// deterministic total order must sort explicitly (e.g. by group key and
/// timestamp).
#[derive(Debug, Clone)]
pub struct AggregatedTable {
    headers: Vec<String>,
    base_width: usize,
    rows: Vec<AggregatedRow>,
}

impl AggregatedTable {
    /// Create an empty output table for the given input header and schema.
    pub fn new(base_headers: &[String], schema: &FeatureSchema) -> Self {
        let base_width = base_headers.len();
        let mut headers = base_headers.to_vec();
        headers.extend(schema.column_names());
        Self {
            headers,
            base_width,
            rows: Vec::new(),
        }
    }

    /// Append one row.
    pub fn push(&mut self, row: AggregatedRow) {
        debug_assert_eq!(row.cells.len(), self.base_width);
        debug_assert_eq!(row.features.len(), self.headers.len() - self.base_width);
        self.rows.push(row);
    }

    /// Append many rows.
    pub fn extend(&mut self, rows: impl IntoIterator<Item = AggregatedRow>) {
        for row in rows {
            self.push(row);
        }
    }

    /// Column headers: original columns followed by derived columns.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of original (non-derived) columns.
    pub fn base_width(&self) -> usize {
        self.base_width
    }

    /// All rows.
    pub fn rows(&self) -> &[AggregatedRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column (original or derived) by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Derived feature value for a row, looked up by column name.
    pub fn feature(&self, row_index: usize, column: &str) -> Option<f64> {
        let column_index = self.column_index(column)?;
        let feature_index = column_index.checked_sub(self.base_width)?;
        Some(self.rows.get(row_index)?.features[feature_index])
    }

    /// Write the table to a CSV file.
    pub fn to_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }

    /// Write the table to any CSV byte sink. NaN features become empty
    /// cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;

        let mut record = Vec::with_capacity(self.headers.len());
        for row in &self.rows {
            record.clear();
            record.extend(row.cells.iter().cloned());
            for &value in &row.features {
                record.push(format_feature(value));
            }
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

fn format_feature(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value}")
    }
}
