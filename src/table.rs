use std::collections::HashSet;

use camino::Utf8Path;
use tracing::debug;

use crate::error::EnaError;
use crate::fs_util;

/// Row-oriented metadata table with declared column order preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, EnaError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(EnaError::MalformedTable(format!(
                    "duplicate column name: {column}"
                )));
            }
        }
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(EnaError::Parse(format!(
                    "row {} has {} fields, expected {}",
                    index + 1,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Load a tab-delimited table with a header row.
    pub fn load(path: &Utf8Path) -> Result<Self, EnaError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_path(path.as_std_path())
            .map_err(|err| EnaError::Parse(format!("{path}: {err}")))?;

        let columns = reader
            .headers()
            .map_err(|err| EnaError::Parse(format!("{path}: {err}")))?
            .iter()
            .map(|name| name.trim().to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| EnaError::Parse(format!("{path}: {err}")))?;
            rows.push(record.iter().map(|field| field.to_string()).collect());
        }

        let table = Self::new(columns, rows)?;
        debug!(
            path = %path,
            rows = table.len(),
            columns = table.columns().len(),
            "loaded table"
        );
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// Cell value by row index and column name; `None` when the column does
    /// not exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|fields| fields[index].as_str())
    }

    /// Cell value that must be present and non-empty.
    pub fn required_value(&self, row: usize, column: &str) -> Result<&str, EnaError> {
        let value = self.value(row, column).ok_or_else(|| {
            EnaError::MalformedTable(format!("missing required column: {column}"))
        })?;
        if value.trim().is_empty() {
            return Err(EnaError::MalformedTable(format!(
                "row {}: empty value in required column {column}",
                row + 1
            )));
        }
        Ok(value)
    }

    /// Check that every named column exists; the error lists all that do not.
    pub fn require_columns(&self, required: &[&str]) -> Result<(), EnaError> {
        let missing = required
            .iter()
            .filter(|column| self.column_index(column).is_none())
            .map(|column| column.to_string())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(EnaError::MalformedTable(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    /// Check that all values in `column` are distinct.
    pub fn require_unique(&self, column: &str) -> Result<(), EnaError> {
        let index = self.column_index(column).ok_or_else(|| {
            EnaError::MalformedTable(format!("missing required column: {column}"))
        })?;
        let mut seen = HashSet::new();
        for row in &self.rows {
            let value = row[index].as_str();
            if !seen.insert(value) {
                return Err(EnaError::MalformedTable(format!(
                    "duplicate {column}: {value}"
                )));
            }
        }
        Ok(())
    }

    /// Pure projection: every row restricted to the named columns, in the
    /// given order.
    pub fn select(&self, columns: &[String]) -> Result<Self, EnaError> {
        let indices = columns
            .iter()
            .map(|column| {
                self.column_index(column).ok_or_else(|| {
                    EnaError::MalformedTable(format!("cannot select unknown column: {column}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Self::new(columns.to_vec(), rows)
    }

    /// Reorder columns; `columns` must be a permutation of the current ones.
    pub fn reorder(&self, columns: &[String]) -> Result<Self, EnaError> {
        if columns.len() != self.columns.len() {
            return Err(EnaError::MalformedTable(format!(
                "reorder names {} columns, table has {}",
                columns.len(),
                self.columns.len()
            )));
        }
        self.select(columns)
    }

    /// Positional rename of every column.
    pub fn rename(&self, names: &[String]) -> Result<Self, EnaError> {
        if names.len() != self.columns.len() {
            return Err(EnaError::MalformedTable(format!(
                "rename gives {} names, table has {} columns",
                names.len(),
                self.columns.len()
            )));
        }
        Self::new(names.to_vec(), self.rows.clone())
    }

    /// Serialize back to TSV with a header row.
    pub fn write(&self, path: &Utf8Path) -> Result<(), EnaError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(Vec::new());
        writer
            .write_record(&self.columns)
            .map_err(|err| EnaError::Serialization(err.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|err| EnaError::Serialization(err.to_string()))?;
        }
        let content = writer
            .into_inner()
            .map_err(|err| EnaError::Serialization(err.to_string()))?;
        fs_util::write_bytes_atomic(path, &content)
    }
}
