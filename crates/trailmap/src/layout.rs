//! Layout pipeline and its result types.
//!
//! [`compute`] runs the stages in a fixed order:
//!
//! ```text
//! events ─► Lineage ─► levels ─► x ─► overlap (x, y) ─► colors + edges ─► Layout
//! ```
//!
//! Every stage reads the dense indices handed out by [`Lineage`] and writes a
//! per-index vector. Nothing is mutated after the [`Layout`] is returned.

mod edges;
mod levels;
mod overlap;
mod position;

use log::{debug, info};
use serde::Serialize;

use trailmap_core::{
    color::Color,
    event::Event,
    geometry::{Bounds, Point, Size},
};

use crate::{
    config::{ColorScheme, LayoutConfig},
    error::TrailmapError,
    structure::Lineage,
};

/// Relationship an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Drawn from a `parent_id` link.
    ParentChild,
    /// Drawn from a lateral-movement event to the Initial Access event on its
    /// destination host.
    LateralMovement,
}

/// Style metadata attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    width: f32,
    border_color: Color,
}

impl NodeStyle {
    pub fn width(&self) -> f32 {
        self.width
    }

    /// The lineage color of the node.
    pub fn border_color(&self) -> Color {
        self.border_color
    }
}

/// A positioned event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    id: String,
    level: u32,
    position: Point,
    style: NodeStyle,
}

impl LayoutNode {
    /// The event id the node was built from.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Depth of the node in the lineage forest after lateral-movement boosts.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Top-left corner of the node box.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn style(&self) -> &NodeStyle {
        &self.style
    }
}

/// A styled connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEdge {
    id: String,
    source: String,
    target: String,
    kind: EdgeKind,
    color: Color,
    dashed: bool,
    stroke_width: f32,
}

impl LayoutEdge {
    /// Stable edge id, `"{parent}-{child}"` or `"lateral-{source}-{target}"`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_dashed(&self) -> bool {
        self.dashed
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }
}

/// The computed layout of an event list.
///
/// Nodes are in input order, one per distinct event id. Parent-child edges
/// come first (in child input order), followed by lateral-movement edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    nodes: Vec<LayoutNode>,
    edges: Vec<LayoutEdge>,
    #[serde(skip)]
    node_size: Size,
}

impl Layout {
    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[LayoutEdge] {
        &self.edges
    }

    /// Finds the node for an event id.
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Box size shared by every node.
    pub fn node_size(&self) -> Size {
        self.node_size
    }

    /// Returns the bounds of the node box placed at `node`.
    pub fn node_bounds(&self, node: &LayoutNode) -> Bounds {
        node.position.to_bounds(self.node_size)
    }

    /// Union of all node boxes, or `None` for an empty layout.
    pub fn bounds(&self) -> Option<Bounds> {
        self.nodes
            .iter()
            .map(|node| self.node_bounds(node))
            .reduce(|acc, bounds| acc.merge(&bounds))
    }

    /// Serializes the layout as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TrailmapError::Export`] if serialization fails.
    pub fn to_json(&self) -> Result<String, TrailmapError> {
        serde_json::to_string_pretty(self).map_err(|err| TrailmapError::Export(Box::new(err)))
    }
}

/// Runs the full layout pipeline over `events`.
///
/// `config` must be valid (see [`LayoutConfig::validate`]).
pub(crate) fn compute(events: &[Event], config: &LayoutConfig, scheme: &ColorScheme) -> Layout {
    info!(events_count = events.len(); "Computing layout");

    let lineage = Lineage::new(events);

    let levels = levels::assign_levels(&lineage);
    debug!(
        max_level = levels.iter().copied().max().unwrap_or(0);
        "Levels assigned"
    );

    let xs = position::assign_x(&lineage, &levels, config);
    let positions = overlap::resolve_overlaps(&lineage, &levels, &xs, config);

    let colors = edges::assign_colors(&lineage, scheme.palette());
    let edges = edges::build_edges(&lineage, &colors, scheme);

    let node_size = config.node_size();
    let nodes: Vec<LayoutNode> = (0..lineage.len())
        .map(|idx| LayoutNode {
            id: lineage.event(idx).id.clone(),
            level: levels[idx],
            position: positions[idx],
            style: NodeStyle {
                width: node_size.width(),
                border_color: colors[idx].unwrap_or_else(|| scheme.fallback()),
            },
        })
        .collect();

    info!(
        nodes_count = nodes.len(),
        edges_count = edges.len();
        "Layout computed"
    );

    Layout {
        nodes,
        edges,
        node_size,
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn run(events: &[Event]) -> Layout {
        compute(events, &LayoutConfig::default(), &ColorScheme::default())
    }

    #[test]
    fn test_empty_layout() {
        let layout = run(&[]);
        assert!(layout.is_empty());
        assert!(layout.edges().is_empty());
        assert!(layout.bounds().is_none());
    }

    #[test]
    fn test_single_event() {
        let layout = run(&[Event::new("only", "2024-01-01T00:00:00")]);
        let node = layout.node("only").unwrap();
        assert_eq!(node.level(), 0);
        assert_approx_eq!(f32, node.position().x(), 0.0);
        assert_approx_eq!(f32, node.position().y(), 30.0);
        assert_approx_eq!(f32, node.style().width(), 300.0);
        assert_eq!(node.style().border_color(), ColorScheme::default().palette()[0]);
    }

    #[test]
    fn test_bounds_cover_all_nodes() {
        let events = vec![
            Event::new("a", "2024-01-01T00:00:00"),
            Event::new("b", "2024-01-01T00:01:00").with_parent("a"),
        ];
        let layout = run(&events);
        let bounds = layout.bounds().unwrap();
        for node in layout.nodes() {
            let node_bounds = layout.node_bounds(node);
            assert!(bounds.min_x() <= node_bounds.min_x());
            assert!(bounds.max_y() >= node_bounds.max_y());
        }
    }

    #[test]
    fn test_layout_outlives_events() {
        let layout = {
            let events = vec![
                Event::new("root".to_string(), "2024-01-01T00:00:00"),
                Event::new("child".to_string(), "2024-01-01T00:01:00").with_parent("root"),
            ];
            run(&events)
        };

        let ids: Vec<&str> = layout.nodes().iter().map(|node| node.id()).collect();
        assert_eq!(ids, ["root", "child"]);
        let edge = &layout.edges()[0];
        assert_eq!((edge.source(), edge.target()), ("root", "child"));
    }

    #[test]
    fn test_to_json_shape() {
        let events = vec![
            Event::new("a", "2024-01-01T00:00:00"),
            Event::new("b", "2024-01-01T00:01:00").with_parent("a"),
        ];
        let json = run(&events).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["nodes"][1]["id"], "b");
        assert_eq!(value["nodes"][1]["level"], 1);
        assert!(value["nodes"][0]["position"]["x"].is_number());
        assert!(value["nodes"][0]["style"]["borderColor"].is_string());
        assert_eq!(value["edges"][0]["id"], "a-b");
        assert_eq!(value["edges"][0]["kind"], "parent-child");
        assert_eq!(value["edges"][0]["strokeWidth"], 2.0);
        assert!(value.get("nodeSize").is_none());
    }
}
