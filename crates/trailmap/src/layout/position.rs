//! Horizontal placement.
//!
//! Siblings are laid out as evenly spaced groups centered under their parent.
//! Groups on the same level are swept left to right and pushed apart so that
//! neighbouring groups keep a minimum gap. Jump destinations are then moved
//! with their subtrees to the right of everything else.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::{config::LayoutConfig, structure::Lineage};

/// Computes the x coordinate of every node.
pub(super) fn assign_x(lineage: &Lineage<'_>, levels: &[u32], config: &LayoutConfig) -> Vec<f32> {
    let mut xs: Vec<Option<f32>> = vec![None; lineage.len()];
    let base = config.base_spacing();

    let roots: Vec<usize> = lineage
        .root_indices()
        .iter()
        .copied()
        .filter(|&root| !lineage.is_destination(root))
        .collect();
    let start = -(roots.len().saturating_sub(1) as f32) * base / 2.0;
    for (i, &root) in roots.iter().enumerate() {
        xs[root] = Some(start + i as f32 * base);
    }

    let max_level = levels.iter().copied().max().unwrap_or(0);
    for level in 1..=max_level {
        let members: Vec<usize> = (0..lineage.len())
            .filter(|&idx| levels[idx] == level && lineage.parent_index(idx).is_some())
            .collect();
        if !members.is_empty() {
            layout_level(lineage, &members, &mut xs, config);
        }
    }

    for &destination in lineage.destinations() {
        relocate_branch(lineage, destination, levels, &mut xs, config);
    }

    for idx in lineage.tree_order() {
        if xs[idx].is_none() {
            let inherited = lineage.parent_index(idx).and_then(|parent| xs[parent]);
            debug!(
                event_id = lineage.event(idx).id.as_str();
                "Node left unplaced, inheriting parent x"
            );
            xs[idx] = Some(inherited.unwrap_or(0.0));
        }
    }

    xs.into_iter().map(|x| x.unwrap_or(0.0)).collect()
}

/// Moves a jump destination right of every node outside its subtree and
/// lays the subtree out again beneath it.
fn relocate_branch(
    lineage: &Lineage<'_>,
    destination: usize,
    levels: &[u32],
    xs: &mut [Option<f32>],
    config: &LayoutConfig,
) {
    let subtree = lineage.subtree_with_depth(destination);

    let mut inside = vec![false; lineage.len()];
    inside[destination] = true;
    for &(idx, _) in &subtree {
        inside[idx] = true;
    }

    let rightmost = xs
        .iter()
        .zip(&inside)
        .filter(|&(_, &inside)| !inside)
        .filter_map(|(x, _)| *x)
        .max_by(f32::total_cmp)
        .unwrap_or(0.0);
    let x = rightmost + config.base_spacing();
    xs[destination] = Some(x);
    trace!(
        event_id = lineage.event(destination).id.as_str(),
        x = x;
        "Jump destination relocated"
    );

    let mut by_level: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (idx, _) in subtree {
        by_level.entry(levels[idx]).or_default().push(idx);
    }
    for members in by_level.values_mut() {
        members.sort_unstable();
        layout_level(lineage, members, xs, config);
    }
}

/// Places `members`, all on one level, grouped by effective parent.
///
/// Groups are ordered by their parent's x, ties keeping first-seen order. A
/// parent without an x yet is treated as sitting at 0.
fn layout_level(
    lineage: &Lineage<'_>,
    members: &[usize],
    xs: &mut [Option<f32>],
    config: &LayoutConfig,
) {
    let mut groups: IndexMap<usize, Vec<usize>> = IndexMap::new();
    for &idx in members {
        if let Some(parent) = lineage.parent_index(idx) {
            groups.entry(parent).or_default().push(idx);
        }
    }

    let mut groups: Vec<(f32, Vec<usize>)> = groups
        .into_iter()
        .map(|(parent, children)| (xs[parent].unwrap_or(0.0), children))
        .collect();
    groups.sort_by(|(a, _), (b, _)| a.total_cmp(b));

    let spacing = config.sibling_spacing();
    let mut previous_end: Option<f32> = None;
    for (parent_x, children) in groups {
        let width = (children.len() - 1) as f32 * spacing;
        let mut start = parent_x - width / 2.0;
        if let Some(end) = previous_end {
            start = start.max(end + config.group_spacing());
        }
        for (i, &child) in children.iter().enumerate() {
            xs[child] = Some(start + i as f32 * spacing);
        }
        previous_end = Some(start + width);
    }
}
