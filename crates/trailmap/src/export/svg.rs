//! SVG export backend.
//!
//! Renders a static preview of a [`Layout`]: one rounded card per event,
//! straight lineage edges underneath and dashed lateral-movement edges on top.

use std::{collections::HashMap, io::Write};

use log::{debug, info};
use svg::{
    Document,
    node::{Text as SvgText, element as svg_element},
};

use trailmap_core::{
    color::Color,
    event::Event,
    geometry::{Bounds, Insets, Point},
};

use crate::{
    export::{self, Exporter},
    layout::{EdgeKind, Layout, LayoutEdge, LayoutNode},
};

const MARGIN: f32 = 50.0;
const CORNER_RADIUS: f32 = 8.0;
const TEXT_INSET: f32 = 12.0;
const FILL_ALPHA: f32 = 0.12;
const FONT_FAMILY: &str = "Inter, Helvetica, Arial, sans-serif";
const INITIAL_ACCESS_MARKER: &str = "♦ ";

/// SVG exporter.
///
/// # Examples
///
/// ```
/// use trailmap::{LayoutBuilder, export::{Exporter, svg::Svg}};
/// use trailmap_core::event::Event;
///
/// let events = vec![Event::new("a", "2024-01-01T00:00:00").with_title("Phish opened")];
/// let layout = LayoutBuilder::default().layout(&events);
///
/// let mut out = Vec::new();
/// Svg::default().export_layout(&layout, &events, &mut out).unwrap();
/// assert!(String::from_utf8(out).unwrap().contains("Phish opened"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct Svg {
    background_color: Option<Color>,
}

impl Svg {
    /// Fills the canvas with `color` before drawing.
    pub fn with_background_color(mut self, color: Option<Color>) -> Self {
        self.background_color = color;
        self
    }

    /// Renders the layout into an SVG document.
    pub fn render(&self, layout: &Layout, events: &[Event]) -> Document {
        let view = layout
            .bounds()
            .unwrap_or_default()
            .add_padding(Insets::uniform(MARGIN));
        debug!(width = view.width(), height = view.height(); "SVG view box computed");

        let mut doc = Document::new()
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    view.min_x(),
                    view.min_y(),
                    view.width(),
                    view.height()
                ),
            )
            .set("width", view.width())
            .set("height", view.height());

        if let Some(color) = self.background_color {
            doc = doc.add(background(view, color));
        }

        let nodes: HashMap<&str, &LayoutNode> =
            layout.nodes().iter().map(|node| (node.id(), node)).collect();

        let mut lineage_edges = svg_element::Group::new().set("class", "lineage-edges");
        let mut lateral_edges = svg_element::Group::new().set("class", "lateral-edges");
        for edge in layout.edges() {
            let (Some(source), Some(target)) =
                (nodes.get(edge.source()), nodes.get(edge.target()))
            else {
                continue;
            };
            let line = edge_line(layout, edge, source, target);
            match edge.kind() {
                EdgeKind::ParentChild => lineage_edges = lineage_edges.add(line),
                EdgeKind::LateralMovement => lateral_edges = lateral_edges.add(line),
            }
        }
        doc = doc.add(lineage_edges);

        let mut by_id: HashMap<&str, &Event> = HashMap::with_capacity(events.len());
        for event in events {
            by_id.entry(event.id.as_str()).or_insert(event);
        }

        let mut cards = svg_element::Group::new().set("class", "events");
        for node in layout.nodes() {
            cards = cards.add(card(layout, node, by_id.get(node.id()).copied()));
        }

        doc.add(cards).add(lateral_edges)
    }
}

impl Exporter for Svg {
    fn export_layout(
        &self,
        layout: &Layout,
        events: &[Event],
        writer: &mut dyn Write,
    ) -> Result<(), export::Error> {
        info!(nodes_count = layout.nodes().len(); "Rendering SVG");
        let doc = self.render(layout, events);
        debug!("SVG document rendered");

        write!(writer, "{doc}").map_err(export::Error::Io)
    }
}

fn background(view: Bounds, color: Color) -> svg_element::Rectangle {
    svg_element::Rectangle::new()
        .set("x", view.min_x())
        .set("y", view.min_y())
        .set("width", view.width())
        .set("height", view.height())
        .set("fill", color.to_string())
        .set("fill-opacity", color.alpha())
}

/// Connects the bottom center of `source` to the top center of `target`.
fn edge_line(
    layout: &Layout,
    edge: &LayoutEdge,
    source: &LayoutNode,
    target: &LayoutNode,
) -> svg_element::Line {
    let from = layout.node_bounds(source);
    let to = layout.node_bounds(target);
    let start = Point::new(from.center().x(), from.max_y());
    let end = Point::new(to.center().x(), to.min_y());

    let mut line = svg_element::Line::new()
        .set("id", edge.id())
        .set("x1", start.x())
        .set("y1", start.y())
        .set("x2", end.x())
        .set("y2", end.y())
        .set("stroke", edge.color().to_string())
        .set("stroke-opacity", edge.color().alpha())
        .set("stroke-width", edge.stroke_width());
    if edge.is_dashed() {
        line = line.set("stroke-dasharray", "8 4");
    }
    line
}

/// Card title: the event title, else its tactic, else its id.
fn card_title(node: &LayoutNode, event: Option<&Event>) -> String {
    let Some(event) = event else {
        return node.id().to_string();
    };
    let title = if !event.title.is_empty() {
        event.title.as_str()
    } else {
        event.tactic.as_deref().unwrap_or(event.id.as_str())
    };
    if event.is_initial_access() {
        format!("{INITIAL_ACCESS_MARKER}{title}")
    } else {
        title.to_string()
    }
}

fn card(layout: &Layout, node: &LayoutNode, event: Option<&Event>) -> svg_element::Group {
    let bounds = layout.node_bounds(node);
    let border = node.style().border_color();
    let fill = border.with_alpha(FILL_ALPHA);

    let rect = svg_element::Rectangle::new()
        .set("x", bounds.min_x())
        .set("y", bounds.min_y())
        .set("width", bounds.width())
        .set("height", bounds.height())
        .set("rx", CORNER_RADIUS)
        .set("fill", fill.to_string())
        .set("fill-opacity", fill.alpha())
        .set("stroke", border.to_string())
        .set("stroke-width", 2);

    let mut lines = vec![(card_title(node, event), 14, "bold")];
    if let Some(event) = event {
        lines.push((event.timestamp.clone(), 12, "normal"));
        if let Some(technique) = &event.technique {
            lines.push((technique.clone(), 12, "normal"));
        }
    }

    let mut group = svg_element::Group::new()
        .set("data-event-id", node.id())
        .add(rect);
    for (i, (content, size, weight)) in lines.into_iter().enumerate() {
        let text = svg_element::Text::new("")
            .set("x", bounds.min_x() + TEXT_INSET)
            .set("y", bounds.min_y() + 28.0 + i as f32 * 22.0)
            .set("font-family", FONT_FAMILY)
            .set("font-size", size)
            .set("font-weight", weight)
            .add(SvgText::new(content));
        group = group.add(text);
    }
    group
}
