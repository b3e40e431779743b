//! Integration tests for the LayoutBuilder API
//!
//! These tests drive the public API with small incident timelines and check
//! the geometry and styling hosts rely on.

use float_cmp::assert_approx_eq;

use trailmap::{
    EdgeKind, LayoutBuilder, compute_layout,
    config::{AppConfig, LayoutConfig, StyleConfig},
    event::{Artifact, ArtifactKind, Event, INITIAL_ACCESS, LATERAL_MOVEMENT},
    structure::Lineage,
};

fn event(id: &str, minute: u32) -> Event {
    Event::new(id, format!("2024-12-03T12:{minute:02}:00"))
}

fn pivot_to(host: &str) -> Artifact {
    Artifact::new(ArtifactKind::Hostname, "Destination Host", host)
}

#[test]
fn test_builder_api_exists() {
    let _builder = LayoutBuilder::default();
    let _builder = LayoutBuilder::new(AppConfig::default());
}

#[test]
fn test_empty_input() {
    let layout = compute_layout(&[]);
    assert!(layout.is_empty());
    assert!(layout.edges().is_empty());
}

#[test]
fn test_root_with_two_children() {
    let events = vec![
        event("R", 0),
        event("C1", 1).with_parent("R"),
        event("C2", 2).with_parent("R"),
    ];
    let layout = compute_layout(&events);

    let r = layout.node("R").unwrap();
    let c1 = layout.node("C1").unwrap();
    let c2 = layout.node("C2").unwrap();

    assert!(c1.position().x() < r.position().x());
    assert!(r.position().x() < c2.position().x());
    assert_approx_eq!(f32, c1.position().y(), c2.position().y());
    assert!(c1.position().y() > r.position().y());

    assert_eq!(c1.style().border_color(), c2.style().border_color());
    assert_ne!(c1.style().border_color(), r.style().border_color());

    let edge_ids: Vec<&str> = layout.edges().iter().map(|edge| edge.id()).collect();
    assert_eq!(edge_ids, ["R-C1", "R-C2"]);
}

#[test]
fn test_lateral_movement_jump() {
    let events = vec![
        event("R", 0).with_host("WS-01"),
        event("L", 5)
            .with_parent("R")
            .with_tactic(LATERAL_MOVEMENT)
            .with_artifact(pivot_to("SRV-02")),
        event("I", 6).with_tactic(INITIAL_ACCESS).with_host("SRV-02"),
        event("I1", 7).with_parent("I"),
    ];
    let layout = compute_layout(&events);

    let lateral: Vec<_> = layout
        .edges()
        .iter()
        .filter(|edge| edge.kind() == EdgeKind::LateralMovement)
        .collect();
    assert_eq!(lateral.len(), 1);
    assert_eq!(lateral[0].id(), "lateral-L-I");
    assert_eq!(lateral[0].source(), "L");
    assert_eq!(lateral[0].target(), "I");
    assert!(lateral[0].is_dashed());

    let l = layout.node("L").unwrap();
    let i = layout.node("I").unwrap();
    assert_eq!(i.level(), l.level() + 1);
    assert_eq!(layout.node("I1").unwrap().level(), i.level() + 1);

    // The destination branch is moved right of the source branch.
    assert!(i.position().x() > l.position().x());
}

#[test]
fn test_host_jump_overrides_parent_level() {
    let events = vec![
        event("R", 0),
        event("A", 1).with_parent("R"),
        event("B", 2).with_parent("A"),
        event("L", 3)
            .with_parent("B")
            .with_tactic(LATERAL_MOVEMENT)
            .with_artifact(pivot_to("SRV")),
        event("P", 4),
        event("I", 5)
            .with_parent("P")
            .with_tactic(INITIAL_ACCESS)
            .with_host("SRV"),
    ];
    let layout = compute_layout(&events);

    assert_eq!(layout.node("L").unwrap().level(), 3);
    assert_eq!(layout.node("I").unwrap().level(), 4);
    // The parent link is still drawn.
    assert!(layout.edges().iter().any(|edge| edge.id() == "P-I"));
}

#[test]
fn test_parent_cycle() {
    let events = vec![event("A", 0).with_parent("B"), event("B", 1).with_parent("A")];
    let layout = compute_layout(&events);

    assert_eq!(layout.nodes().len(), 2);
    let parent_child = layout
        .edges()
        .iter()
        .filter(|edge| edge.kind() == EdgeKind::ParentChild)
        .count();
    assert_eq!(parent_child, 2);

    let lineage = Lineage::new(&events);
    assert_eq!(lineage.ancestors("A").len(), 1);
    assert!(lineage.is_descendant("A", "B"));
    assert!(lineage.is_descendant("B", "A"));
}

#[test]
fn test_dangling_references() {
    let events = vec![
        event("A", 0).with_parent("ghost"),
        event("B", 1)
            .with_parent("A")
            .with_tactic(LATERAL_MOVEMENT)
            .with_lateral_movement_target("nowhere"),
    ];
    let layout = compute_layout(&events);

    assert_eq!(layout.node("A").unwrap().level(), 0);
    assert_eq!(layout.node("B").unwrap().level(), 1);
    assert_eq!(layout.edges().len(), 1);
    assert_eq!(layout.edges()[0].id(), "A-B");
}

#[test]
fn test_layout_is_idempotent() {
    let events = vec![
        event("R", 0),
        event("C1", 1).with_parent("R"),
        event("C2", 1).with_parent("R"),
        event("L", 2)
            .with_parent("C1")
            .with_tactic(LATERAL_MOVEMENT)
            .with_artifact(pivot_to("SRV")),
        event("I", 3).with_tactic(INITIAL_ACCESS).with_host("SRV"),
    ];
    let builder = LayoutBuilder::default();
    assert_eq!(builder.layout(&events), builder.layout(&events));
    assert_eq!(
        builder.layout(&events).to_json().unwrap(),
        builder.layout(&events).to_json().unwrap()
    );
}

#[test]
fn test_no_overlapping_nodes() {
    // Several small trees whose groups collide before the push-down.
    let mut events = Vec::new();
    for root in 0..4 {
        let root_id = format!("r{root}");
        events.push(event(&root_id, root));
        for child in 0..3 {
            events.push(event(&format!("r{root}-c{child}"), 10 + child).with_parent(&root_id));
        }
    }
    let layout = compute_layout(&events);

    for (i, a) in layout.nodes().iter().enumerate() {
        for b in &layout.nodes()[i + 1..] {
            assert!(
                !layout.node_bounds(a).overlaps(&layout.node_bounds(b)),
                "{} overlaps {}",
                a.id(),
                b.id()
            );
        }
    }
}

#[test]
fn test_parse_incident_envelope() {
    let source = r#"{
        "name": "Ransomware precursor",
        "events": [
            {"id": "1", "timestamp": "2024-12-03T11:55:51", "title": "Phishing email opened"},
            {"id": "2", "timestamp": "2024-12-03T12:10:00", "parentId": "1",
             "tactic": "Lateral Movement",
             "artifacts": [{"type": "hostname", "name": "Destination Host", "value": "SRV-02"}]},
            {"id": "3", "timestamp": "2024-12-03T12:11:00", "tactic": "Initial Access",
             "host": "SRV-02"}
        ]
    }"#;

    let builder = LayoutBuilder::default();
    let events = builder.parse_events(source).expect("Failed to parse events");
    let layout = builder.layout(&events);

    assert_eq!(layout.nodes().len(), 3);
    assert!(layout.edges().iter().any(|edge| edge.id() == "lateral-2-3"));
}

#[test]
fn test_custom_spacing() {
    let events = vec![event("a", 0), event("b", 1)];
    let layout_config = LayoutConfig::default().with_base_spacing(500.0);
    let builder = LayoutBuilder::try_new(AppConfig::new(layout_config, StyleConfig::default()))
        .expect("valid config");
    let layout = builder.layout(&events);

    assert_approx_eq!(f32, layout.node("a").unwrap().position().x(), -250.0);
    assert_approx_eq!(f32, layout.node("b").unwrap().position().x(), 250.0);
}

#[test]
fn test_custom_palette_colors_roots() {
    let events = vec![event("a", 0), event("b", 1)];
    let style = StyleConfig::default().with_palette(["#111111", "#222222"]);
    let builder = LayoutBuilder::new(AppConfig::new(LayoutConfig::default(), style));
    let layout = builder.layout(&events);

    assert_eq!(
        layout.node("a").unwrap().style().border_color().to_string(),
        trailmap::color::Color::new("#111111").unwrap().to_string()
    );
}

#[test]
fn test_render_svg() {
    let events = vec![
        event("R", 0).with_title("Phishing email opened"),
        event("C", 1).with_parent("R").with_technique("T1059.001"),
    ];
    let builder = LayoutBuilder::default();
    let layout = builder.layout(&events);
    let svg = builder
        .render_svg(&layout, &events)
        .expect("Failed to render layout");

    assert!(svg.contains("<svg"), "Output should contain SVG tag");
    assert!(svg.contains("</svg>"), "Output should be complete SVG");
    assert!(svg.contains("T1059.001"));
}

#[test]
fn test_write_json() {
    let events = vec![event("R", 0), event("C", 1).with_parent("R")];
    let builder = LayoutBuilder::default();
    let layout = builder.layout(&events);

    let mut buffer = Vec::new();
    builder.write_json(&layout, &mut buffer).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
    assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(value["edges"][0]["kind"], "parent-child");
}
