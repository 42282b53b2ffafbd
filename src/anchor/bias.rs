//! Bias calculation and the final fallback stage

use tracing::debug;

use crate::snapshot::Axis;

use super::engine::ContainerPass;
use super::tolerance::round_to;
use super::types::*;

/// Fraction of free space before a box, given the space on either side
///
/// `0` when nothing precedes the box, `1` when nothing follows it.
pub fn bias(start: f64, end: f64, accuracy: u32) -> f64 {
    if start == 0.0 {
        return 0.0;
    }
    if end == 0.0 {
        return 1.0;
    }
    let total = start + end;
    if total <= 0.0 {
        return 0.0;
    }
    round_to(start / total, accuracy).clamp(0.0, 1.0)
}

impl ContainerPass<'_> {
    pub(super) fn apply_bias(&mut self) {
        for i in 0..self.children.len() {
            let node = &self.nodes[i];
            let untouched = Axis::BOTH
                .iter()
                .all(|&axis| !node.state.get(axis).is_resolved() && !node.has_axis_anchor(axis));
            if untouched && self.anchorable(i) {
                self.pin_with_bias(i);
            }

            for axis in Axis::BOTH {
                let node = &self.nodes[i];
                if !node.state.get(axis).is_resolved() && !node.has_axis_anchor(axis) {
                    debug!(node = %node.id, ?axis, "no anchor found, spanning container");
                    self.full_bleed(i, axis);
                    self.nodes[i].advance(axis, AxisState::BiasResolved);
                }
            }
        }
    }

    /// Pin both edges of an axis to the container
    pub(super) fn full_bleed(&mut self, i: usize, axis: Axis) {
        self.place(i, AnchorAttribute::align(axis, Edge::Near), Target::Parent, false, true);
        self.place(i, AnchorAttribute::align(axis, Edge::Far), Target::Parent, false, true);
    }

    /// Anchor a free-floating box to all four container edges
    ///
    /// A box sitting in the middle of the container keeps no bias at all.
    fn pin_with_bias(&mut self, i: usize) {
        let content = self.frame.content;
        let accuracy = self.config.accuracy;

        let mut biases = AxisPair::<Option<f64>>::default();
        for axis in Axis::BOTH {
            if content.extent(axis) <= 0.0 {
                continue;
            }
            let start = (self.edge_coord(i, axis, Edge::Near) - content.near(axis)).max(0.0);
            let end = (content.far(axis) - self.edge_coord(i, axis, Edge::Far)).max(0.0);
            *biases.get_mut(axis) = Some(bias(start, end, accuracy));
        }

        let centered = Axis::BOTH.iter().all(|&axis| {
            biases
                .get(axis)
                .map_or(true, |b| (b - 0.5).abs() <= self.config.center_tolerance)
        });

        for axis in Axis::BOTH {
            self.full_bleed(i, axis);
            self.nodes[i].advance(axis, AxisState::BiasResolved);
        }
        if !centered {
            self.nodes[i].bias = biases;
        }
        debug!(
            node = %self.nodes[i].id,
            centered,
            horizontal = ?biases.horizontal,
            vertical = ?biases.vertical,
            "pinned to container"
        );
    }
}
