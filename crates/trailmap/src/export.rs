//! Export backends for computed layouts.
//!
//! This module provides the [`Exporter`] trait, the last stage of the
//! Trailmap pipeline.
//!
//! # Pipeline Position
//!
//! ```text
//! Event JSON
//!     ↓ parse
//! Vec<Event>
//!     ↓ layout
//! Layout { nodes, edges }
//!     ↓ export (this module)
//! JSON / SVG output
//! ```
//!
//! # Available Backends
//!
//! - [`json::Json`] - The layout itself as pretty-printed JSON
//! - [`svg::Svg`] - A static SVG preview of the timeline
//!
//! # Error Handling
//!
//! Export operations return [`Error`], covering rendering failures and I/O
//! errors. [`Error`] converts into [`TrailmapError::Export`] at the crate
//! boundary.
//!
//! [`TrailmapError::Export`]: crate::TrailmapError::Export

pub mod json;
pub mod svg;

use std::io::Write;

use trailmap_core::event::Event;

use crate::layout::Layout;

/// Abstraction for layout export backends.
pub trait Exporter {
    /// Writes `layout` to `writer` in the backend's format.
    ///
    /// `events` are the events the layout was computed from. Backends that
    /// only need geometry may ignore them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the layout cannot be converted to the
    /// target format, or [`Error::Io`] if writing the output fails.
    fn export_layout(
        &self,
        layout: &Layout,
        events: &[Event],
        writer: &mut dyn Write,
    ) -> Result<(), Error>;
}

/// Errors that can occur during export.
///
/// This type is converted into [`TrailmapError::Export`] at the crate
/// boundary via the [`From`] implementation in [`crate::error`].
///
/// [`TrailmapError::Export`]: crate::TrailmapError::Export
#[derive(Debug)]
pub enum Error {
    /// A rendering or conversion failure described by `message`.
    Render(String),
    /// An I/O error encountered while writing output.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}
