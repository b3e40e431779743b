//! Error adapter for converting TrailmapError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use trailmap::TrailmapError;

/// Adapter for a [`TrailmapError`].
///
/// Attaches a stable error code and, where one helps, a hint for fixing the
/// input.
pub struct ErrorAdapter<'a>(pub &'a TrailmapError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            TrailmapError::Io(_) => "trailmap::io",
            TrailmapError::Parse(_) => "trailmap::parse",
            TrailmapError::Config(_) => "trailmap::config",
            TrailmapError::Export(_) => "trailmap::export",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            TrailmapError::Parse(_) => {
                "expected a JSON array of events, or an incident object with an `events` array"
            }
            TrailmapError::Config(_) => {
                "check the [layout] and [style] tables of the configuration file"
            }
            TrailmapError::Io(_) | TrailmapError::Export(_) => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Convert a [`TrailmapError`] into a list of reportable errors.
///
/// Every variant currently maps to a single report.
pub fn to_reportables(err: &TrailmapError) -> Vec<ErrorAdapter<'_>> {
    vec![ErrorAdapter(err)]
}
