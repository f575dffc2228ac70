use std::fmt;
use std::fmt::Formatter;
use csv::{ReaderBuilder, Writer};
use crate::errors::TableError;

/// Storage type of a column as inferred from its cell values
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::Real    => write!(f, "REAL"),
            ColumnType::Text    => write!(f, "TEXT"),
        }
    }
}

/// A delimited text table with a header row. Empty cells are held as None.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Reads a CSV file with a header row
    ///
    /// # Arguments
    ///
    /// * 'file_path' - the file to read
    pub fn read_csv(file_path: &str) -> Result<Table, TableError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(file_path)
            .map_err(|e| TableError(format!("can't open {}: {}", file_path, e)))?;

        let headers = reader.headers()?
            .iter()
            .map(String::from)
            .collect::<Vec<String>>();

        let mut rows: Vec<Vec<Option<String>>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record
                .iter()
                .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
                .collect());
        }

        Ok(Table { headers, rows })
    }

    /// Writes the table as CSV, replacing any existing file
    ///
    /// # Arguments
    ///
    /// * 'file_path' - the file to write
    pub fn write_csv(&self, file_path: &str) -> Result<(), TableError> {
        let mut writer = Writer::from_path(file_path)?;

        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;

        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Returns the cells of a column
    ///
    /// # Arguments
    ///
    /// * 'idx' - column index
    pub fn column(&self, idx: usize) -> impl Iterator<Item = Option<&str>> {
        self.rows.iter().map(move |r| r.get(idx).and_then(|c| c.as_deref()))
    }

    /// Infers the storage type of a column.
    ///
    /// Integer requires every cell to be present and integral, a column of numbers with
    /// gaps is Real, and so is a column of empty cells. Columns of a table without rows
    /// are Text.
    ///
    /// # Arguments
    ///
    /// * 'idx' - column index
    pub fn column_type(&self, idx: usize) -> ColumnType {
        if self.rows.is_empty() {
            return ColumnType::Text;
        }

        let mut has_gaps = false;
        let mut all_int = true;

        for cell in self.column(idx) {
            match cell {
                None => has_gaps = true,
                Some(c) if c.parse::<i64>().is_ok() => (),
                Some(c) if c.parse::<f64>().is_ok() => all_int = false,
                Some(_) => return ColumnType::Text,
            }
        }

        if all_int && !has_gaps {
            ColumnType::Integer
        } else {
            ColumnType::Real
        }
    }

    /// Returns the values of a numeric column, or None if the column holds text
    ///
    /// # Arguments
    ///
    /// * 'idx' - column index
    pub fn numeric_column(&self, idx: usize) -> Option<Vec<Option<f64>>> {
        if self.column_type(idx) == ColumnType::Text {
            return None;
        }

        Some(self.column(idx).map(|c| c.and_then(|v| v.parse::<f64>().ok())).collect())
    }
}

/// Formats a number for a table cell, integral values are written without decimals
///
/// # Arguments
///
/// * 'value' - the value to format
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}
