use super::{Sheet, TabularSource};
use crate::error::{AnalyticsError, Result};

/// Fixed set of in-memory sheets.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: Vec<Sheet>,
}

impl MemorySource {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }
}

impl TabularSource for MemorySource {
    fn sheet_names(&self) -> Result<Vec<String>> {
        Ok(self.sheets.iter().map(|s| s.name().to_string()).collect())
    }

    fn load(&self, sheet_name: &str) -> Result<Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name() == sheet_name)
            .cloned()
            .ok_or_else(|| {
                AnalyticsError::DataUnavailable(format!("Sheet '{}' not found", sheet_name))
            })
    }

    fn load_all(&self) -> Result<Vec<Sheet>> {
        Ok(self.sheets.clone())
    }
}
