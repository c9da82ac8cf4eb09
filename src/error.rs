//! # Error Types
//!
//! This module defines error types used throughout the sheetsync library.

use thiserror::Error;

/// Main error type for sheetsync operations
#[derive(Debug, Error)]
pub enum SheetSyncError {
    /// Batch precondition failures (no template, no attachable parent, zero rows)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Image byte retrieval failures (network, timeout, undecodable bytes)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Scene-graph mutation rejected by the document model
    #[error("Scene error: {0}")]
    Scene(String),

    /// Spreadsheet ingestion errors (workbook parsing, Sheets API)
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Authentication context errors (missing or expired token)
    #[error("Auth error: {0}")]
    Auth(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
