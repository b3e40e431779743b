//! Trailmap - lineage-aware layout for incident response timelines.
//!
//! An incident timeline is a forest of events linked by `parent_id`, plus
//! lateral-movement links that jump between otherwise unrelated branches.
//! Trailmap assigns every event a level and a position, keeps subtrees grouped,
//! resolves collisions deterministically and colors edges so lineages stay
//! distinguishable.
//!
//! The layout step never fails: dangling references are dropped, parent cycles
//! are cut and the palette is reused once exhausted.

pub mod config;
pub mod export;
pub mod structure;

mod error;
mod layout;

pub use trailmap_core::{color, event, geometry};

pub use error::TrailmapError;
pub use layout::{EdgeKind, Layout, LayoutEdge, LayoutNode, NodeStyle};

use std::io::Write;

use log::{debug, info, warn};

use config::{AppConfig, ColorScheme, LayoutConfig};
use event::{Event, EventDocument};
use export::Exporter;

/// Builder for parsing, laying out and exporting incident timelines.
///
/// # Examples
///
/// ```
/// use trailmap::{LayoutBuilder, config::AppConfig};
///
/// let source = r#"[
///     {"id": "1", "timestamp": "2024-12-03T11:55:51", "title": "Phishing email opened"},
///     {"id": "2", "timestamp": "2024-12-03T11:58:10", "parentId": "1"}
/// ]"#;
///
/// let builder = LayoutBuilder::new(AppConfig::default());
/// let events = builder.parse_events(source).expect("valid events");
/// let layout = builder.layout(&events);
///
/// assert_eq!(layout.nodes().len(), 2);
/// assert_eq!(layout.edges()[0].id(), "1-2");
///
/// let svg = builder.render_svg(&layout, &events).expect("renders");
/// assert!(svg.contains("Phishing email opened"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct LayoutBuilder {
    config: AppConfig,
}

impl LayoutBuilder {
    /// Creates a builder with the given configuration.
    ///
    /// The configuration is not checked here; [`LayoutBuilder::layout`] falls
    /// back to defaults for any invalid part. Use [`LayoutBuilder::try_new`]
    /// to reject bad configuration up front.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Creates a builder after validating sizes, spacings and colors.
    ///
    /// # Errors
    ///
    /// Returns [`TrailmapError::Config`] describing the first invalid setting.
    pub fn try_new(config: AppConfig) -> Result<Self, TrailmapError> {
        config.layout().validate()?;
        config.style().color_scheme()?;
        config.style().background_color()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parses an event document.
    ///
    /// Accepts either a bare JSON array of events or an incident object with
    /// an `events` array.
    ///
    /// # Errors
    ///
    /// Returns [`TrailmapError::Parse`] if `source` is not a valid document.
    pub fn parse_events(&self, source: &str) -> Result<Vec<Event>, TrailmapError> {
        info!(source_len = source.len(); "Parsing events");

        let document: EventDocument = serde_json::from_str(source)?;
        let events = document.into_events();

        debug!(events_count = events.len(); "Events parsed");
        Ok(events)
    }

    /// Computes the layout of `events`.
    ///
    /// Produces one node per distinct event id, in input order.
    pub fn layout(&self, events: &[Event]) -> Layout {
        let layout_config = match self.config.layout().validate() {
            Ok(()) => *self.config.layout(),
            Err(err) => {
                warn!(err:err; "Invalid layout configuration, using defaults");
                LayoutConfig::default()
            }
        };
        let scheme = match self.config.style().color_scheme() {
            Ok(scheme) => scheme,
            Err(err) => {
                warn!(err:err; "Invalid style configuration, using default colors");
                ColorScheme::default()
            }
        };

        layout::compute(events, &layout_config, &scheme)
    }

    /// Writes `layout` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TrailmapError::Export`] if writing fails.
    pub fn write_json(&self, layout: &Layout, writer: &mut dyn Write) -> Result<(), TrailmapError> {
        export::json::Json.export_layout(layout, &[], writer)?;
        Ok(())
    }

    /// Writes an SVG preview of `layout`.
    ///
    /// `events` supply card text; events missing from it are labelled by id.
    ///
    /// # Errors
    ///
    /// Returns [`TrailmapError::Config`] for an invalid background color, or
    /// [`TrailmapError::Export`] if writing fails.
    pub fn write_svg(
        &self,
        layout: &Layout,
        events: &[Event],
        writer: &mut dyn Write,
    ) -> Result<(), TrailmapError> {
        let background = self.config.style().background_color()?;
        export::svg::Svg::default()
            .with_background_color(background)
            .export_layout(layout, events, writer)?;
        Ok(())
    }

    /// Renders an SVG preview of `layout` to a string.
    ///
    /// # Errors
    ///
    /// See [`LayoutBuilder::write_svg`].
    pub fn render_svg(&self, layout: &Layout, events: &[Event]) -> Result<String, TrailmapError> {
        let mut buffer = Vec::new();
        self.write_svg(layout, events, &mut buffer)?;
        let svg = String::from_utf8(buffer).map_err(|err| TrailmapError::Export(Box::new(err)))?;

        info!(svg_len = svg.len(); "SVG rendered successfully");
        Ok(svg)
    }
}

/// Computes the layout of `events` with the default configuration.
///
/// # Examples
///
/// ```
/// use trailmap::{compute_layout, event::Event};
///
/// let events = vec![
///     Event::new("R", "2024-01-01T00:00:00"),
///     Event::new("C1", "2024-01-01T00:01:00").with_parent("R"),
///     Event::new("C2", "2024-01-01T00:02:00").with_parent("R"),
/// ];
/// let layout = compute_layout(&events);
///
/// let x = |id| layout.node(id).unwrap().position().x();
/// assert!(x("C1") < x("R") && x("R") < x("C2"));
/// ```
pub fn compute_layout(events: &[Event]) -> Layout {
    LayoutBuilder::default().layout(events)
}
