use rust_decimal::Decimal;
use thiserror::Error;

use crate::catalog::sources::SourceId;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Entry name is empty after normalization: {0:?}")]
    EmptyName(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Invalid bibcode: {0:?}")]
    InvalidBibcode(String),

    #[error("Record added to {0} carries no source")]
    MissingSource(String),

    #[error("Unknown source id {id} for entry {entry}")]
    UnknownSource { entry: String, id: SourceId },

    #[error("Photometry record has neither a magnitude nor counts")]
    MissingBrightness,

    #[error("Counts must be positive to derive a magnitude, got {0}")]
    NonPositiveCounts(Decimal),

    #[error("Unable to parse numeric literal: {0:?}")]
    DecimalParse(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Dataset {dataset}, row {row}: {reason}")]
    Structure {
        dataset: String,
        row: usize,
        reason: String,
    },

    #[error("Invalid ingestion parameter: {0}")]
    InvalidIngestParameter(String),

    #[error("UTF-8 Path error: {0}")]
    Utf8PathError(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV reader error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CatalogError {
    /// Build a [`CatalogError::Structure`] for a row that violates its dataset layout.
    pub fn structure(dataset: &str, row: usize, reason: impl Into<String>) -> Self {
        CatalogError::Structure {
            dataset: dataset.to_string(),
            row,
            reason: reason.into(),
        }
    }
}

impl PartialEq for CatalogError {
    fn eq(&self, other: &Self) -> bool {
        use CatalogError::*;
        match (self, other) {
            (EmptyName(a), EmptyName(b)) => a == b,
            (EntryNotFound(a), EntryNotFound(b)) => a == b,
            (InvalidBibcode(a), InvalidBibcode(b)) => a == b,
            (MissingSource(a), MissingSource(b)) => a == b,
            (
                UnknownSource { entry: e1, id: i1 },
                UnknownSource { entry: e2, id: i2 },
            ) => e1 == e2 && i1 == i2,
            (NonPositiveCounts(a), NonPositiveCounts(b)) => a == b,
            (DecimalParse(a), DecimalParse(b)) => a == b,
            (InvalidDate(a), InvalidDate(b)) => a == b,
            (
                Structure {
                    dataset: d1,
                    row: r1,
                    reason: s1,
                },
                Structure {
                    dataset: d2,
                    row: r2,
                    reason: s2,
                },
            ) => d1 == d2 && r1 == r2 && s1 == s2,
            (InvalidIngestParameter(a), InvalidIngestParameter(b)) => a == b,
            (Utf8PathError(a), Utf8PathError(b)) => a == b,

            // not comparable, same variant is enough
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (JsonError(_), JsonError(_)) => true,

            (MissingBrightness, MissingBrightness) => true,

            _ => false,
        }
    }
}
