// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

/// Failures inside the store. Public operations log these and degrade to
/// `false` / `None` / empty; they only surface through the `try_*` helpers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse ledger JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column: {0}")]
    MissingColumn(&'static str),

    #[error("Table has no header row: {}", .0.display())]
    EmptyTable(PathBuf),

    #[error("Path exists but is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

pub type Result<T> = std::result::Result<T, StoreError>;
