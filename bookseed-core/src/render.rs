//! Rendering of query results
//!
//! A [`Frame`] is a rows-by-named-columns snapshot of one table. The text
//! form is a dataframe-style layout: a zero-based row index followed by
//! right-aligned columns, `None` standing in for SQL NULL.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// Gap between rendered columns
const COLUMN_GAP: &str = "  ";

/// One decoded value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Int(i64),
    Text(String),
    Decimal(Decimal),
    Date(NaiveDate),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("None"),
            Cell::Int(v) => write!(f, "{}", v),
            Cell::Text(v) => f.write_str(v),
            Cell::Decimal(v) => write!(f, "{}", v),
            Cell::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
        }
    }
}

/// Output format for a rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Rows x named columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub columns: Vec<String>,
    #[serde(rename = "data")]
    pub rows: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a frame from fetched rows. Column names come from the first
    /// row, or from `fallback_columns` when the result is empty.
    pub fn from_rows(rows: &[MySqlRow], fallback_columns: &[&str]) -> Result<Self, sqlx::Error> {
        let columns = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => fallback_columns.iter().map(|c| c.to_string()).collect(),
        };

        let mut frame = Self::new(columns);
        for row in rows {
            let cells = (0..row.len())
                .map(|idx| decode_cell(row, idx))
                .collect::<Result<Vec<_>, _>>()?;
            frame.rows.push(cells);
        }
        Ok(frame)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at `row` in the named column.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Render in the requested format.
    pub fn render(&self, format: OutputFormat) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Table => Ok(self.to_string()),
            OutputFormat::Json => serde_json::to_string_pretty(self),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return write!(
                f,
                "Empty table\nColumns: [{}]\nIndex: []",
                self.columns.join(", ")
            );
        }

        let text: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect();

        let index_width = (self.rows.len() - 1).to_string().len();
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &text {
            for (i, value) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(value.chars().count());
                }
            }
        }

        write!(f, "{:index_width$}", "")?;
        for (name, width) in self.columns.iter().zip(&widths) {
            write!(f, "{}{:>width$}", COLUMN_GAP, name, width = *width)?;
        }

        for (idx, row) in text.iter().enumerate() {
            write!(f, "\n{:<index_width$}", idx)?;
            for (value, width) in row.iter().zip(&widths) {
                write!(f, "{}{:>width$}", COLUMN_GAP, value, width = *width)?;
            }
        }
        Ok(())
    }
}

/// Decode a column by its MySQL type name.
fn decode_cell(row: &MySqlRow, idx: usize) -> Result<Cell, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(Cell::Null);
    }

    let type_name = row.column(idx).type_info().name().to_ascii_uppercase();
    let cell = match type_name.as_str() {
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            Cell::Int(row.try_get::<i64, _>(idx).or_else(|_| {
                row.try_get::<i32, _>(idx).map(i64::from)
            })?)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED" => {
            Cell::Int(row.try_get::<u32, _>(idx).map(i64::from)?)
        }
        "DECIMAL" => Cell::Decimal(row.try_get::<Decimal, _>(idx)?),
        "DATE" => Cell::Date(row.try_get::<NaiveDate, _>(idx)?),
        _ => Cell::Text(row.try_get::<String, _>(idx)?),
    };
    Ok(cell)
}
