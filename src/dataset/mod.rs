//! Tabular Data Source
//!
//! Read-only access to the named sheets of the RCM dataset. Every call
//! re-reads the backing store; nothing is cached between requests.

pub mod csv_dir;
pub mod memory;
pub mod schema;
pub mod workbook;

use crate::error::{AnalyticsError, Result};
use polars::prelude::*;
use std::path::{Path, PathBuf};

pub use csv_dir::CsvDirectorySource;
pub use memory::MemorySource;
pub use workbook::WorkbookSource;

/// A named table loaded from the dataset.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    frame: DataFrame,
}

impl Sheet {
    pub fn new(name: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            name: name.into(),
            frame,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    /// Fails with `DataUnavailable` when any of `columns` is absent.
    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        let present = self.frame.get_column_names();
        let missing: Vec<&str> = columns
            .iter()
            .copied()
            .filter(|c| !present.contains(c))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalyticsError::DataUnavailable(format!(
                "Sheet '{}' is missing required columns {:?}. Available columns: {:?}",
                self.name, missing, present
            )))
        }
    }

    /// Fails with `DataUnavailable` when a non-null value in any of
    /// `columns` does not read as a number. Nulls are allowed.
    pub fn require_numeric(&self, columns: &[&str]) -> Result<()> {
        self.require_columns(columns)?;
        for column in columns {
            self.frame
                .column(column)?
                .strict_cast(&DataType::Float64)
                .map_err(|e| {
                    AnalyticsError::DataUnavailable(format!(
                        "Sheet '{}' column '{}' has non-numeric values: {}",
                        self.name, column, e
                    ))
                })?;
        }
        Ok(())
    }
}

/// Source of named sheets.
pub trait TabularSource: Send + Sync {
    /// Sheet names in dataset order.
    fn sheet_names(&self) -> Result<Vec<String>>;

    fn load(&self, sheet_name: &str) -> Result<Sheet>;

    fn load_all(&self) -> Result<Vec<Sheet>> {
        self.sheet_names()?
            .iter()
            .map(|name| self.load(name))
            .collect()
    }
}

/// Dataset located on disk: a workbook file, or a directory of CSV sheets.
pub enum DatasetSource {
    Workbook(WorkbookSource),
    CsvDirectory(CsvDirectorySource),
}

impl DatasetSource {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            DatasetSource::CsvDirectory(CsvDirectorySource::new(path))
        } else {
            DatasetSource::Workbook(WorkbookSource::new(path))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            DatasetSource::Workbook(source) => source.path(),
            DatasetSource::CsvDirectory(source) => source.dir(),
        }
    }
}

impl TabularSource for DatasetSource {
    fn sheet_names(&self) -> Result<Vec<String>> {
        match self {
            DatasetSource::Workbook(source) => source.sheet_names(),
            DatasetSource::CsvDirectory(source) => source.sheet_names(),
        }
    }

    fn load(&self, sheet_name: &str) -> Result<Sheet> {
        match self {
            DatasetSource::Workbook(source) => source.load(sheet_name),
            DatasetSource::CsvDirectory(source) => source.load(sheet_name),
        }
    }

    fn load_all(&self) -> Result<Vec<Sheet>> {
        match self {
            DatasetSource::Workbook(source) => source.load_all(),
            DatasetSource::CsvDirectory(source) => source.load_all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_columns_reports_missing() {
        let frame = df![
            "denial_id" => ["D1"],
            "claim_id" => ["C1"]
        ]
        .unwrap();
        let sheet = Sheet::new("fact_denials", frame);

        assert!(sheet.require_columns(&["denial_id", "claim_id"]).is_ok());

        match sheet.require_columns(&["denial_id", "denial_date"]) {
            Err(AnalyticsError::DataUnavailable(msg)) => {
                assert!(msg.contains("denial_date"));
                assert!(msg.contains("fact_denials"));
            }
            other => panic!("expected DataUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_open_picks_source_by_path_kind() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DatasetSource::open(dir.path()),
            DatasetSource::CsvDirectory(_)
        ));
        assert!(matches!(
            DatasetSource::open(dir.path().join("data.xlsx")),
            DatasetSource::Workbook(_)
        ));
    }
}
