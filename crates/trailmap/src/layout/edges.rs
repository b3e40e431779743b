//! Lineage coloring and edge construction.

use std::collections::HashSet;

use log::trace;

use trailmap_core::color::Color;

use super::{EdgeKind, LayoutEdge};
use crate::{config::ColorScheme, structure::Lineage};

const LINEAGE_STROKE_WIDTH: f32 = 2.0;
const LATERAL_STROKE_WIDTH: f32 = 3.0;

/// Assigns a lineage color to every node reachable from a root.
///
/// Roots cycle through the palette in input order. Walking each tree depth
/// first, every node claims one color for its children: the first palette
/// entry that differs from the node's own color and no other node has claimed
/// yet. Once every entry is claimed, nodes reuse the first entry that still
/// differs from their own. Leaves claim a color too, even though no child
/// receives it.
pub(super) fn assign_colors(lineage: &Lineage<'_>, palette: &[Color]) -> Vec<Option<Color>> {
    let mut colors: Vec<Option<Color>> = vec![None; lineage.len()];
    let Some(&first) = palette.first() else {
        return colors;
    };

    for (i, &root) in lineage.root_indices().iter().enumerate() {
        colors[root] = Some(palette[i % palette.len()]);
    }

    let mut taken: HashSet<Color> = HashSet::new();
    let mut processed = vec![false; lineage.len()];
    for &root in lineage.root_indices() {
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            if std::mem::replace(&mut processed[idx], true) {
                continue;
            }

            let own = colors[idx];
            let color = palette
                .iter()
                .copied()
                .find(|&color| Some(color) != own && !taken.contains(&color))
                .or_else(|| {
                    trace!(
                        event_id = lineage.event(idx).id.as_str();
                        "Palette exhausted, reusing a lineage color"
                    );
                    palette.iter().copied().find(|&color| Some(color) != own)
                })
                .unwrap_or(first);
            taken.insert(color);

            let children = lineage.child_indices(idx);
            for &child in children {
                colors[child] = Some(color);
            }
            stack.extend(children.iter().rev());
        }
    }

    colors
}

/// Builds parent-child edges for every raw parent link, then one
/// lateral-movement edge per host link.
///
/// A parent link cut to break a cycle joins two nodes of the same tree, so it
/// is drawn in the fallback color instead of the child's lineage color.
pub(super) fn build_edges(
    lineage: &Lineage<'_>,
    colors: &[Option<Color>],
    scheme: &ColorScheme,
) -> Vec<LayoutEdge> {
    let mut edges = Vec::with_capacity(lineage.len() + lineage.host_links().len());

    for child in 0..lineage.len() {
        let Some(parent) = lineage.raw_parent_index(child) else {
            continue;
        };
        let parent_id = &lineage.event(parent).id;
        let child_id = &lineage.event(child).id;
        let color = if lineage.parent_index(child) == Some(parent) {
            colors[child].unwrap_or_else(|| scheme.fallback())
        } else {
            scheme.fallback()
        };
        edges.push(LayoutEdge {
            id: format!("{parent_id}-{child_id}"),
            source: parent_id.clone(),
            target: child_id.clone(),
            kind: EdgeKind::ParentChild,
            color,
            dashed: false,
            stroke_width: LINEAGE_STROKE_WIDTH,
        });
    }

    for link in lineage.host_links() {
        let source_id = &lineage.event(link.source()).id;
        let destination_id = &lineage.event(link.destination()).id;
        edges.push(LayoutEdge {
            id: format!("lateral-{source_id}-{destination_id}"),
            source: source_id.clone(),
            target: destination_id.clone(),
            kind: EdgeKind::LateralMovement,
            color: scheme.highlight(),
            dashed: true,
            stroke_width: LATERAL_STROKE_WIDTH,
        });
    }

    edges
}
