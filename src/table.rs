//! Typed, header-addressed view over a CSV file.
//!
//! Columns are typed as a whole: a column whose non-empty cells all parse as
//! `f64` holds numbers, any other column holds text. Empty cells are absent.

use csv::{ReaderBuilder, Trim};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: missing field '{field}'")]
    MissingField { row: usize, field: String },

    #[error("row {row}: field '{field}' is not {expected}")]
    FieldType {
        row: usize,
        field: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    columns: HashMap<String, usize>,
    rows: Vec<Vec<Option<Cell>>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        // A repeated header name resolves to its first column.
        let mut columns = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            columns.entry(h.clone()).or_insert(i);
        }
        Self {
            headers,
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row. Short rows are padded with empty cells.
    pub fn push_row(&mut self, mut cells: Vec<Option<Cell>>) {
        cells.resize(self.headers.len(), None);
        self.rows.push(cells);
    }

    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let file = File::open(path).map_err(csv::Error::from)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut raw: Vec<Vec<String>> = Vec::new();
        for result in rdr.records() {
            let record = result?;
            raw.push(record.iter().map(str::to_string).collect());
        }

        let numeric: Vec<bool> = (0..headers.len())
            .map(|col| {
                raw.iter()
                    .filter_map(|row| row.get(col))
                    .filter(|v| !v.is_empty())
                    .all(|v| v.parse::<f64>().is_ok())
            })
            .collect();

        let mut table = Self::new(headers);
        for row in raw {
            let cells = row
                .into_iter()
                .enumerate()
                .map(|(col, value)| {
                    if value.is_empty() {
                        return None;
                    }
                    match value.parse::<f64>() {
                        Ok(n) if numeric[col] => Some(Cell::Number(n)),
                        _ => Some(Cell::Text(value)),
                    }
                })
                .collect();
            table.push_row(cells);
        }
        Ok(table)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().enumerate().map(move |(index, cells)| Row {
            columns: &self.columns,
            index,
            cells,
        })
    }
}

/// One table row; fields are looked up by column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    index: usize,
    cells: &'a [Option<Cell>],
}

impl<'a> Row<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, field: &str) -> Option<&'a Cell> {
        let col = *self.columns.get(field)?;
        self.cells.get(col)?.as_ref()
    }

    fn require(&self, field: &str) -> Result<&'a Cell, TableError> {
        self.get(field).ok_or_else(|| TableError::MissingField {
            row: self.index,
            field: field.to_string(),
        })
    }

    pub fn text(&self, field: &str) -> Result<&'a str, TableError> {
        match self.require(field)? {
            Cell::Text(s) => Ok(s),
            Cell::Number(_) => Err(self.type_error(field, "text")),
        }
    }

    pub fn number(&self, field: &str) -> Result<f64, TableError> {
        match self.require(field)? {
            Cell::Number(n) => Ok(*n),
            Cell::Text(_) => Err(self.type_error(field, "a number")),
        }
    }

    fn type_error(&self, field: &str, expected: &'static str) -> TableError {
        TableError::FieldType {
            row: self.index,
            field: field.to_string(),
            expected,
        }
    }
}
