//! Depth assignment.

use log::trace;

use crate::structure::Lineage;

/// Assigns an integer level to every event.
///
/// Roots sit at level 0 and children one level below their parent. A child of
/// an Initial Access event that some lateral movement targets sits two levels
/// below it instead, leaving room for the incoming jump edge; the extra level
/// applies to that step only.
///
/// Host jumps then pull each destination one level below its source and move
/// the destination's subtree along with it. Jumps are applied in source order,
/// so when jumps chain the later one wins.
pub(super) fn assign_levels(lineage: &Lineage<'_>) -> Vec<u32> {
    let mut levels: Vec<Option<u32>> = vec![None; lineage.len()];

    for &root in lineage.root_indices() {
        levels[root] = Some(0);
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let level = levels[idx].unwrap_or(0);
            // Only the targeted event's own children drop two levels; the
            // grandchildren below them step by one again rather than
            // inheriting the extra level.
            let step = if lineage.event(idx).is_initial_access() && lineage.is_jump_target(idx) {
                2
            } else {
                1
            };
            for &child in lineage.child_indices(idx).iter().rev() {
                if levels[child].is_none() {
                    levels[child] = Some(level + step);
                    stack.push(child);
                }
            }
        }
    }

    for jump in lineage.host_jumps() {
        let destination_level = levels[jump.source()].unwrap_or(0) + 1;
        levels[jump.destination()] = Some(destination_level);
        for (idx, depth) in lineage.subtree_with_depth(jump.destination()) {
            levels[idx] = Some(destination_level + depth);
        }
        trace!(
            source = lineage.event(jump.source()).id.as_str(),
            destination = lineage.event(jump.destination()).id.as_str(),
            level = destination_level;
            "Jump destination leveled"
        );
    }

    levels.into_iter().map(|level| level.unwrap_or(0)).collect()
}

#[cfg(test)]
mod tests {
    use trailmap_core::event::{Artifact, ArtifactKind, Event, INITIAL_ACCESS, LATERAL_MOVEMENT};

    use super::*;

    fn event(id: &str) -> Event {
        Event::new(id, "2024-01-01T00:00:00")
    }

    fn pivot_to(host: &str) -> Artifact {
        Artifact::new(ArtifactKind::Hostname, "Destination Host", host)
    }

    #[test]
    fn test_forest_levels() {
        let events = vec![
            event("r1"),
            event("c").with_parent("r1"),
            event("g").with_parent("c"),
            event("r2"),
            event("orphan").with_parent("ghost"),
        ];
        let lineage = Lineage::new(&events);
        assert_eq!(assign_levels(&lineage), vec![0, 1, 2, 0, 0]);
    }

    #[test]
    fn test_cycle_members_get_levels() {
        let events = vec![event("a").with_parent("b"), event("b").with_parent("a")];
        let lineage = Lineage::new(&events);
        assert_eq!(assign_levels(&lineage), vec![0, 1]);
    }

    #[test]
    fn test_host_jump_overrides_forest_level() {
        let events = vec![
            event("r"),
            event("m").with_parent("r"),
            event("l")
                .with_parent("m")
                .with_tactic(LATERAL_MOVEMENT)
                .with_artifact(pivot_to("SRV")),
            event("i").with_tactic(INITIAL_ACCESS).with_host("SRV"),
            event("i-child").with_parent("i"),
            event("i-grandchild").with_parent("i-child"),
        ];
        let lineage = Lineage::new(&events);
        let levels = assign_levels(&lineage);

        assert_eq!(levels[2], 2);
        assert_eq!(levels[3], 3);
        assert_eq!(levels[4], 4);
        assert_eq!(levels[5], 5);
    }

    #[test]
    fn test_targeted_initial_access_pushes_children_two_levels() {
        let events = vec![
            event("r"),
            event("l").with_parent("r").with_lateral_movement_target("i"),
            event("i").with_tactic(INITIAL_ACCESS),
            event("c").with_parent("i"),
            event("g").with_parent("c"),
        ];
        let lineage = Lineage::new(&events);
        let levels = assign_levels(&lineage);

        // No host match, so "i" keeps its forest level.
        assert_eq!(levels[2], 0);
        assert_eq!(levels[3], 2);
        assert_eq!(levels[4], 3);
    }

    #[test]
    fn test_untargeted_initial_access_uses_single_step() {
        let events = vec![
            event("i").with_tactic(INITIAL_ACCESS),
            event("c").with_parent("i"),
        ];
        let lineage = Lineage::new(&events);
        assert_eq!(assign_levels(&lineage), vec![0, 1]);
    }
}
