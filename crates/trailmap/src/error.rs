//! Error types for Trailmap operations.
//!
//! Computing a layout never fails. [`TrailmapError`] covers the fallible edges
//! around it: reading event documents, validating configuration and exporting
//! results.

use std::io;

use thiserror::Error;

/// The main error type for Trailmap operations.
#[derive(Debug, Error)]
pub enum TrailmapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Event parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error + Send + Sync>),
}

impl From<crate::export::Error> for TrailmapError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl From<serde_json::Error> for TrailmapError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}
