//! Workbook-backed sheets (xlsx, xls, xlsb, ods) read through calamine.

use super::{Sheet, TabularSource};
use crate::error::{AnalyticsError, Result};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::{NaiveDateTime, Timelike};
use polars::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Sheets<BufReader<File>>> {
        if !self.path.exists() {
            return Err(AnalyticsError::DataUnavailable(format!(
                "Dataset not found: {}",
                self.path.display()
            )));
        }

        open_workbook_auto(&self.path).map_err(|e| {
            AnalyticsError::DataUnavailable(format!(
                "Failed to open workbook {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn read_sheet(
        &self,
        workbook: &mut Sheets<BufReader<File>>,
        sheet_name: &str,
    ) -> Result<Sheet> {
        let range = workbook.worksheet_range(sheet_name).map_err(|e| {
            AnalyticsError::DataUnavailable(format!(
                "Failed to read sheet '{}' from {}: {}",
                sheet_name,
                self.path.display(),
                e
            ))
        })?;

        let frame = range_to_frame(&range).map_err(|e| {
            AnalyticsError::DataUnavailable(format!("Malformed sheet '{}': {}", sheet_name, e))
        })?;

        info!(
            "📂 Loaded sheet '{}': {} rows, {} columns",
            sheet_name,
            frame.height(),
            frame.width()
        );
        Ok(Sheet::new(sheet_name, frame))
    }
}

impl TabularSource for WorkbookSource {
    fn sheet_names(&self) -> Result<Vec<String>> {
        Ok(self.open()?.sheet_names())
    }

    fn load(&self, sheet_name: &str) -> Result<Sheet> {
        let mut workbook = self.open()?;
        if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
            return Err(AnalyticsError::DataUnavailable(format!(
                "Sheet '{}' not found in {}",
                sheet_name,
                self.path.display()
            )));
        }
        self.read_sheet(&mut workbook, sheet_name)
    }

    fn load_all(&self) -> Result<Vec<Sheet>> {
        let mut workbook = self.open()?;
        let names = workbook.sheet_names();
        names
            .iter()
            .map(|name| self.read_sheet(&mut workbook, name))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Empty,
    Int,
    Float,
    Bool,
    Text,
}

/// First row is the header; every following row is data.
fn range_to_frame(range: &Range<Data>) -> PolarsResult<DataFrame> {
    let mut rows = range.rows();
    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(DataFrame::empty()),
    };
    let body: Vec<&[Data]> = rows.collect();
    let empty = Data::Empty;

    let columns = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let name = header_name(cell, idx);
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&empty))
                .collect();
            column_series(&name, &cells)
        })
        .collect::<Vec<Series>>();

    DataFrame::new(columns)
}

fn header_name(cell: &Data, idx: usize) -> String {
    match cell_text(cell) {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => format!("column_{}", idx + 1),
    }
}

fn infer_kind(cells: &[&Data]) -> ColumnKind {
    let mut kind = ColumnKind::Empty;
    for cell in cells {
        let cell_kind = match cell {
            Data::Empty => continue,
            Data::Int(_) => ColumnKind::Int,
            Data::Float(_) => ColumnKind::Float,
            Data::Bool(_) => ColumnKind::Bool,
            _ => ColumnKind::Text,
        };
        kind = match (kind, cell_kind) {
            (ColumnKind::Empty, k) => k,
            (a, b) if a == b => a,
            (ColumnKind::Int, ColumnKind::Float) | (ColumnKind::Float, ColumnKind::Int) => {
                ColumnKind::Float
            }
            _ => return ColumnKind::Text,
        };
    }
    kind
}

fn column_series(name: &str, cells: &[&Data]) -> Series {
    match infer_kind(cells) {
        ColumnKind::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        ColumnKind::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Float(v) => Some(*v),
                    Data::Int(v) => Some(*v as f64),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        ColumnKind::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Bool(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        ColumnKind::Text | ColumnKind::Empty => {
            let values: Vec<Option<String>> = cells.iter().map(|cell| cell_text(cell)).collect();
            Series::new(name, values)
        }
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(n) => Some(n.to_string()),
        Data::Float(n) => {
            // integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Some(format!("{}", *n as i64))
            } else {
                Some(n.to_string())
            }
        }
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => Some(
            dt.as_datetime()
                .map(format_datetime)
                .unwrap_or_else(|| dt.as_f64().to_string()),
        ),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        other => Some(format!("{:?}", other)),
    }
}

fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
