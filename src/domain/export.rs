//! Export formats and the files they produce.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::entity::EntityKind;
use super::error::AptdeskError;

/// Spreadsheet format requested from the export endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Excel,
    Csv,
}

impl ExportFormat {
    /// Value sent as `format=` to the API.
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Excel => "excel",
            Self::Csv => "csv",
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Excel => "xlsx",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for ExportFormat {
    type Err = AptdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "excel" | "xlsx" => Ok(Self::Excel),
            "csv" => Ok(Self::Csv),
            other => Err(AptdeskError::Validation(format!("unknown export format: {other}"))),
        }
    }
}

/// Downloaded export body plus the client-generated filename.
#[derive(Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ExportFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportFile")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ExportFile {
    /// Filename for an export of selected records, e.g.
    /// `selected_households_2024-03-01.xlsx`.
    #[must_use]
    pub fn selected_name(kind: EntityKind, format: ExportFormat, day: NaiveDate) -> String {
        format!(
            "selected_{}_{}.{}",
            kind.resource(),
            day.format("%Y-%m-%d"),
            format.extension()
        )
    }

    /// Filename for an export of the whole collection, e.g. `households_2024-03-01.csv`.
    #[must_use]
    pub fn collection_name(kind: EntityKind, format: ExportFormat, day: NaiveDate) -> String {
        format!(
            "{}_{}.{}",
            kind.resource(),
            day.format("%Y-%m-%d"),
            format.extension()
        )
    }
}
