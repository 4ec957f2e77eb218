// ============================================================
// Layer 4 — In-Memory CSV Table
// ============================================================
// Every file this pipeline touches is a small CSV that is read
// completely, reshaped, and written back once. `Table` keeps
// the cells as strings so columns we never touch are written
// out byte-for-byte as they came in; numbers are parsed only
// when a stage actually needs them.
//
// Reading and writing go through the `csv` crate:
//   - quoted fields and embedded commas are handled for us
//   - ragged rows are rejected at load time
//
// Reference: csv crate documentation
//            Rust Book §8 (Vectors), §9 (Error Handling)

use anyhow::{bail, Context, Result};
use std::{fs, path::Path};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows:    Vec<Vec<String>>,
}

impl Table {
    /// An empty table with the given header.
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows:    Vec::new(),
        }
    }

    /// Build a table from literal rows, checking every row's width.
    #[cfg(test)]
    pub fn from_rows<S: Into<String>>(
        headers: impl IntoIterator<Item = S>,
        rows:    Vec<Vec<String>>,
    ) -> Result<Self> {
        let mut table = Self::new(headers);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Load a whole CSV file (first line = header).
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .with_context(|| format!("Cannot open CSV '{}'", path.display()))?;

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Cannot read header of '{}'", path.display()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record
                .with_context(|| format!("Malformed row {} in '{}'", i + 1, path.display()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        tracing::debug!("Read {} rows from '{}'", rows.len(), path.display());
        Ok(Self { headers, rows })
    }

    /// Write the table to `path`, creating parent directories as needed.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
        }

        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Necessary)
            .from_path(path)
            .with_context(|| format!("Cannot create CSV '{}'", path.display()))?;

        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        tracing::debug!("Wrote {} rows to '{}'", self.rows.len(), path.display());
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("Column '{name}' not found (have: {})", self.headers.join(", ")))
    }

    /// Borrow every cell of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Parse one column as `f64`, failing on the first bad cell.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let cell = row[idx].trim();
                cell.parse::<f64>().with_context(|| {
                    format!("Row {}: column '{name}' is not numeric ('{cell}')", i + 1)
                })
            })
            .collect()
    }

    /// Append one row; its width must match the header.
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.headers.len() {
            bail!(
                "Row has {} cells but the table has {} columns",
                row.len(),
                self.headers.len()
            );
        }
        self.rows.push(row);
        Ok(())
    }

    /// Overwrite a column in place, or append it if it doesn't exist yet.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            bail!(
                "Column '{name}' has {} values but the table has {} rows",
                values.len(),
                self.rows.len()
            );
        }

        match self.headers.iter().position(|h| h == name) {
            Some(idx) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
        Ok(())
    }
}
