//! Vertical placement and collision removal.

use log::trace;

use trailmap_core::geometry::{Bounds, Point};

use crate::{config::LayoutConfig, structure::Lineage};

/// Turns `(level, x)` into a top-left position and pushes colliding boxes down.
///
/// Nodes are visited in chronological order (unparseable timestamps last,
/// ties by input order). Each node moves down by half a node height until its
/// box clears every box placed before it, so earlier events keep their
/// nominal row. Every shift rechecks all previously placed boxes.
pub(super) fn resolve_overlaps(
    lineage: &Lineage<'_>,
    levels: &[u32],
    xs: &[f32],
    config: &LayoutConfig,
) -> Vec<Point> {
    let mut order: Vec<_> = (0..lineage.len())
        .map(|idx| (lineage.event(idx).parsed_timestamp(), idx))
        .collect();
    order.sort_by_key(|&(timestamp, idx)| (timestamp.is_none(), timestamp, idx));

    let size = config.node_size();
    let step = size.height() / 2.0;

    let mut positions = vec![Point::default(); lineage.len()];
    let mut placed: Vec<Bounds> = Vec::with_capacity(lineage.len());
    for (_, idx) in order {
        let mut y = levels[idx] as f32 * config.vertical_spacing() + config.top_margin();
        if lineage.is_destination(idx) {
            y += config.jump_offset();
        }

        let mut position = Point::new(xs[idx], y);
        let mut shifts = 0u32;
        while placed
            .iter()
            .any(|other| other.overlaps(&position.to_bounds(size)))
        {
            position = position.with_y(position.y() + step);
            shifts += 1;
        }
        if shifts > 0 {
            trace!(
                event_id = lineage.event(idx).id.as_str(),
                shifts = shifts;
                "Node pushed down to clear overlap"
            );
        }

        placed.push(position.to_bounds(size));
        positions[idx] = position;
    }

    positions
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use trailmap_core::event::Event;

    use super::*;

    fn resolve(events: &[Event], levels: &[u32], xs: &[f32]) -> Vec<Point> {
        let lineage = Lineage::new(events);
        resolve_overlaps(&lineage, levels, xs, &LayoutConfig::default())
    }

    #[test]
    fn test_nominal_rows() {
        let events = vec![
            Event::new("a", "2024-01-01T00:00:00"),
            Event::new("b", "2024-01-01T00:01:00").with_parent("a"),
        ];
        let positions = resolve(&events, &[0, 1], &[0.0, 0.0]);
        assert_approx_eq!(f32, positions[0].y(), 30.0);
        assert_approx_eq!(f32, positions[1].y(), 190.0);
    }

    #[test]
    fn test_later_event_pushed_down() {
        // Same spot, "late" comes first in input but second in time.
        let events = vec![
            Event::new("late", "2024-01-01T10:00:00"),
            Event::new("early", "2024-01-01T09:00:00"),
        ];
        let positions = resolve(&events, &[0, 0], &[0.0, 100.0]);
        assert_approx_eq!(f32, positions[1].y(), 30.0);
        assert_approx_eq!(f32, positions[0].y(), 130.0);
        assert_approx_eq!(f32, positions[0].x(), 0.0);
    }

    #[test]
    fn test_unparseable_timestamps_placed_last() {
        let events = vec![
            Event::new("unknown", "not a time"),
            Event::new("known", "2024-01-01T10:00:00"),
        ];
        let positions = resolve(&events, &[0, 0], &[0.0, 0.0]);
        assert_approx_eq!(f32, positions[1].y(), 30.0);
        assert_approx_eq!(f32, positions[0].y(), 130.0);
    }

    #[test]
    fn test_ties_resolved_by_input_order() {
        let events = vec![
            Event::new("first", "2024-01-01T10:00:00"),
            Event::new("second", "2024-01-01T10:00:00"),
            Event::new("third", "2024-01-01T10:00:00"),
        ];
        let positions = resolve(&events, &[0, 0, 0], &[0.0, 0.0, 0.0]);
        assert_approx_eq!(f32, positions[0].y(), 30.0);
        assert_approx_eq!(f32, positions[1].y(), 130.0);
        assert_approx_eq!(f32, positions[2].y(), 230.0);
    }

    #[test]
    fn test_touching_boxes_not_moved() {
        let events = vec![
            Event::new("a", "2024-01-01T10:00:00"),
            Event::new("b", "2024-01-01T10:00:00"),
        ];
        let positions = resolve(&events, &[0, 0], &[0.0, 300.0]);
        assert_approx_eq!(f32, positions[1].y(), 30.0);
    }
}
