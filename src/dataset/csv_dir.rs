//! Directory of CSV files, one file per sheet (`<sheet>.csv`).

use super::{Sheet, TabularSource};
use crate::error::{AnalyticsError, Result};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TabularSource for CsvDirectorySource {
    fn sheet_names(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            AnalyticsError::DataUnavailable(format!(
                "Failed to read dataset directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn load(&self, sheet_name: &str) -> Result<Sheet> {
        let path = self.dir.join(format!("{}.csv", sheet_name));
        if !path.exists() {
            return Err(AnalyticsError::DataUnavailable(format!(
                "Sheet '{}' not found: {}",
                sheet_name,
                path.display()
            )));
        }

        info!("📂 Loading CSV: {}", path.display());
        let frame = LazyCsvReader::new(&path)
            .with_has_header(true)
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|e| {
                AnalyticsError::DataUnavailable(format!(
                    "Failed to load CSV {}: {}",
                    path.display(),
                    e
                ))
            })?;

        info!("✅ Loaded {} rows, {} columns", frame.height(), frame.width());
        Ok(Sheet::new(sheet_name, frame))
    }
}
