//! Configuration types for Trailmap layouts.
//!
//! This module provides configuration structures that control how timelines
//! are laid out and styled. All types implement [`serde::Deserialize`] for
//! flexible loading from external sources such as TOML files.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and style settings.
//! - [`LayoutConfig`] - Spacing and node box dimensions used by the layout stages.
//! - [`StyleConfig`] - Lineage palette, highlight and background colors.
//!
//! # Example
//!
//! ```
//! # use trailmap::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.layout().validate().is_ok());
//! assert_eq!(config.style().color_scheme().unwrap().palette().len(), 5);
//! ```

use serde::Deserialize;

use trailmap_core::{color::Color, geometry::Size};

use crate::error::TrailmapError;

/// Lineage colors assigned to roots and sibling groups, in assignment order.
pub const DEFAULT_PALETTE: [&str; 5] = [
    "rgb(59, 130, 246)",
    "rgb(16, 185, 129)",
    "rgb(217, 70, 239)",
    "rgb(245, 158, 11)",
    "rgb(148, 163, 184)",
];

/// Reserved color for lateral-movement edges.
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#ef4444";

/// Color used for lineage edges whose child has no assigned color.
pub const DEFAULT_FALLBACK_COLOR: &str = "rgb(148, 163, 184)";

/// Top-level application configuration combining layout and style settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified layout and style configurations.
    pub fn new(layout: LayoutConfig, style: StyleConfig) -> Self {
        Self { layout, style }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }
}

/// Spacing and sizing used by the positioning and overlap stages.
///
/// Every field has a default, so a TOML `[layout]` table only needs the
/// values it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal distance between roots, and between a relocated
    /// lateral-movement branch and everything placed before it.
    base_spacing: f32,

    /// Extra horizontal space between siblings, on top of the node width.
    sibling_gap: f32,

    /// Minimum horizontal distance between neighbouring sibling groups.
    group_spacing: f32,

    /// Vertical distance between levels.
    vertical_spacing: f32,

    /// Y offset of level 0.
    top_margin: f32,

    /// Extra Y offset for lateral-movement destinations.
    jump_offset: f32,

    /// Node box width used for spacing and overlap checks.
    node_width: f32,

    /// Node box height used for overlap checks.
    node_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_spacing: 350.0,
            sibling_gap: 100.0,
            group_spacing: 400.0,
            vertical_spacing: 160.0,
            top_margin: 30.0,
            jump_offset: 120.0,
            node_width: 300.0,
            node_height: 100.0,
        }
    }
}

impl LayoutConfig {
    pub fn with_base_spacing(mut self, spacing: f32) -> Self {
        self.base_spacing = spacing;
        self
    }

    pub fn with_vertical_spacing(mut self, spacing: f32) -> Self {
        self.vertical_spacing = spacing;
        self
    }

    pub fn with_node_size(mut self, size: Size) -> Self {
        self.node_width = size.width();
        self.node_height = size.height();
        self
    }

    pub fn base_spacing(&self) -> f32 {
        self.base_spacing
    }

    /// Distance between the left edges of adjacent siblings.
    pub fn sibling_spacing(&self) -> f32 {
        self.node_width + self.sibling_gap
    }

    pub fn group_spacing(&self) -> f32 {
        self.group_spacing
    }

    pub fn vertical_spacing(&self) -> f32 {
        self.vertical_spacing
    }

    pub fn top_margin(&self) -> f32 {
        self.top_margin
    }

    pub fn jump_offset(&self) -> f32 {
        self.jump_offset
    }

    /// Returns the fixed node box size.
    pub fn node_size(&self) -> Size {
        Size::new(self.node_width, self.node_height)
    }

    /// Checks that sizes are positive and spacings are non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`TrailmapError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), TrailmapError> {
        let positive = [
            ("node_width", self.node_width),
            ("node_height", self.node_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TrailmapError::Config(format!(
                    "`{name}` must be a positive number, got {value}"
                )));
            }
        }

        let non_negative = [
            ("base_spacing", self.base_spacing),
            ("sibling_gap", self.sibling_gap),
            ("group_spacing", self.group_spacing),
            ("vertical_spacing", self.vertical_spacing),
            ("top_margin", self.top_margin),
            ("jump_offset", self.jump_offset),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(TrailmapError::Config(format!(
                    "`{name}` must be a non-negative number, got {value}"
                )));
            }
        }

        Ok(())
    }
}

/// Visual styling configuration.
///
/// Colors are kept as strings until [`StyleConfig::color_scheme`] resolves
/// them, so a bad color surfaces as a configuration error rather than a
/// deserialization failure.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleConfig {
    /// Lineage palette, as CSS color strings.
    #[serde(default)]
    palette: Option<Vec<String>>,

    /// Lateral-movement edge color.
    #[serde(default)]
    highlight_color: Option<String>,

    /// Lineage edge color when a child has no assigned color.
    #[serde(default)]
    fallback_color: Option<String>,

    /// Canvas background for SVG export.
    #[serde(default)]
    background_color: Option<String>,
}

impl StyleConfig {
    /// Replaces the lineage palette.
    pub fn with_palette<I, S>(mut self, palette: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.palette = Some(palette.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    /// Resolves the configured colors.
    ///
    /// # Errors
    ///
    /// Returns [`TrailmapError::Config`] if any color string cannot be parsed
    /// or if the palette is empty.
    pub fn color_scheme(&self) -> Result<ColorScheme, TrailmapError> {
        let palette = match &self.palette {
            Some(colors) => colors
                .iter()
                .map(|color| parse_color("palette", color))
                .collect::<Result<Vec<_>, _>>()?,
            None => ColorScheme::default().palette,
        };
        if palette.is_empty() {
            return Err(TrailmapError::Config(
                "`palette` must contain at least one color".to_string(),
            ));
        }

        let highlight = parse_color(
            "highlight_color",
            self.highlight_color
                .as_deref()
                .unwrap_or(DEFAULT_HIGHLIGHT_COLOR),
        )?;
        let fallback = parse_color(
            "fallback_color",
            self.fallback_color
                .as_deref()
                .unwrap_or(DEFAULT_FALLBACK_COLOR),
        )?;

        Ok(ColorScheme {
            palette,
            highlight,
            fallback,
        })
    }

    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns [`TrailmapError::Config`] if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, TrailmapError> {
        self.background_color
            .as_deref()
            .map(|color| parse_color("background_color", color))
            .transpose()
    }
}

fn parse_color(field: &str, value: &str) -> Result<Color, TrailmapError> {
    Color::new(value).map_err(|err| TrailmapError::Config(format!("invalid `{field}`: {err}")))
}

/// Resolved colors consumed by the edge and color stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScheme {
    palette: Vec<Color>,
    highlight: Color,
    fallback: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE
                .iter()
                .map(|color| Color::new(color).expect("default palette colors are valid"))
                .collect(),
            highlight: Color::new(DEFAULT_HIGHLIGHT_COLOR)
                .expect("default highlight color is valid"),
            fallback: Color::new(DEFAULT_FALLBACK_COLOR).expect("default fallback color is valid"),
        }
    }
}

impl ColorScheme {
    /// Lineage palette; never empty.
    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    pub fn highlight(&self) -> Color {
        self.highlight
    }

    pub fn fallback(&self) -> Color {
        self.fallback
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_layout_defaults() {
        let layout = LayoutConfig::default();
        assert_approx_eq!(f32, layout.base_spacing(), 350.0);
        assert_approx_eq!(f32, layout.sibling_spacing(), 400.0);
        assert_approx_eq!(f32, layout.node_size().width(), 300.0);
        assert_approx_eq!(f32, layout.node_size().height(), 100.0);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_layout_validate_rejects_bad_sizes() {
        let layout = LayoutConfig::default().with_node_size(Size::new(0.0, 100.0));
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("node_width"));

        let layout = LayoutConfig::default().with_vertical_spacing(-1.0);
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("vertical_spacing"));

        let layout = LayoutConfig::default().with_base_spacing(f32::NAN);
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_default_color_scheme() {
        let scheme = StyleConfig::default().color_scheme().unwrap();
        assert_eq!(scheme, ColorScheme::default());
        assert_eq!(scheme.palette().len(), DEFAULT_PALETTE.len());
        assert_ne!(scheme.highlight(), scheme.palette()[0]);
    }

    #[test]
    fn test_custom_palette() {
        let style = StyleConfig::default().with_palette(["red", "green"]);
        let scheme = style.color_scheme().unwrap();
        assert_eq!(scheme.palette().len(), 2);
        assert_eq!(scheme.palette()[0], Color::new("red").unwrap());
    }

    #[test]
    fn test_empty_palette_rejected() {
        let style = StyleConfig::default().with_palette(Vec::<String>::new());
        assert!(matches!(
            style.color_scheme(),
            Err(TrailmapError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_color_rejected() {
        let style = StyleConfig::default().with_palette(["red", "not-a-color"]);
        let err = style.color_scheme().unwrap_err();
        assert!(err.to_string().contains("palette"));

        let style = StyleConfig::default().with_background_color("nope");
        assert!(style.background_color().is_err());
    }

    #[test]
    fn test_background_color_optional() {
        assert!(StyleConfig::default().background_color().unwrap().is_none());
        let style = StyleConfig::default().with_background_color("#030711");
        assert!(style.background_color().unwrap().is_some());
    }
}
