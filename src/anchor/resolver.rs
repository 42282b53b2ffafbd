//! Pairwise anchor resolution
//!
//! Compares every anchorable child against the container edges and against
//! each sibling. Per axis and per node the candidates are tried in a fixed
//! order:
//!
//! 1. container edges (`left`/`right` to `parent`)
//! 2. edge adjacency (`leftRight`/`rightLeft`), requiring cross-axis overlap
//! 3. text baselines and image bottoms (vertical axis only)
//! 4. shared-edge alignment (`left`/`right` to a sibling)
//!
//! Baseline and shared-edge anchors only point at earlier siblings. Sibling
//! anchors that would close a dependency loop on the axis are refused.

use std::collections::HashSet;

use crate::snapshot::{Axis, VerticalAlign};

use super::engine::ContainerPass;
use super::tolerance::touches;
use super::types::*;

impl ContainerPass<'_> {
    pub(super) fn resolve_anchors(&mut self) {
        for i in 0..self.children.len() {
            if !self.anchorable(i) {
                continue;
            }
            for axis in Axis::BOTH {
                self.resolve_container_edges(i, axis);
                self.resolve_adjacency(i, axis);
                if axis == Axis::Vertical {
                    self.resolve_text_alignment(i);
                }
                self.resolve_shared_edges(i, axis);
            }
        }
    }

    fn tolerance(&self) -> f64 {
        self.config.edge_tolerance
    }

    /// Pin edges lying on the container's own edges
    ///
    /// When both edges lie on the container the axis stays unresolved; the
    /// guideline stage decides between match-parent and a fixed size.
    fn resolve_container_edges(&mut self, i: usize, axis: Axis) {
        let content = self.frame.content;
        let tolerance = self.tolerance();
        let near = touches(self.edge_coord(i, axis, Edge::Near), content.near(axis), tolerance);
        let far = touches(self.edge_coord(i, axis, Edge::Far), content.far(axis), tolerance);

        if near {
            self.place(i, AnchorAttribute::align(axis, Edge::Near), Target::Parent, true, false);
        }
        if far {
            self.place(i, AnchorAttribute::align(axis, Edge::Far), Target::Parent, true, false);
        }
        if near != far {
            self.nodes[i].advance(axis, AxisState::SiblingAnchored);
        }
    }

    /// Pin an edge to the touching opposite edge of a sibling
    fn resolve_adjacency(&mut self, i: usize, axis: Axis) {
        let primary = if self.prefers_far_edge(i, axis) { Edge::Far } else { Edge::Near };

        for edge in [primary, primary.flip()] {
            if edge != primary && self.nodes[i].has_edge_anchor(axis, primary) {
                break;
            }
            if self.nodes[i].has_edge_anchor(axis, edge) {
                continue;
            }
            let coord = self.edge_coord(i, axis, edge);
            let found = (0..self.children.len()).find(|&j| {
                j != i
                    && self.anchorable(j)
                    && touches(coord, self.edge_coord(j, axis, edge.flip()), self.tolerance())
                    && self.children[i]
                        .linear()
                        .overlaps_on(&self.children[j].linear(), axis.cross())
                    && !self.would_cycle(i, j, axis)
            });
            if let Some(j) = found {
                let target = Target::Node(self.children[j].id.clone());
                if self.place(i, AnchorAttribute::adjacent(axis, edge), target, true, false) {
                    self.nodes[i].advance(axis, AxisState::SiblingAnchored);
                }
            }
        }
    }

    /// Baseline alignment between text runs, bottom alignment to images
    fn resolve_text_alignment(&mut self, i: usize) {
        let axis = Axis::Vertical;
        let child = &self.children[i];
        if !child.is_text || self.nodes[i].has_axis_anchor(axis) {
            return;
        }

        let mut chosen = None;
        for (j, other) in self.children.iter().enumerate() {
            if j == i || !self.anchorable(j) {
                continue;
            }
            // same line band
            if !child.bounds.overlaps_on(&other.bounds, axis) {
                continue;
            }
            if other.is_image {
                if touches(child.bounds.bottom, other.bounds.bottom, self.tolerance())
                    && !self.would_cycle(i, j, axis)
                {
                    chosen = Some((j, AnchorAttribute::Bottom));
                    break;
                }
            } else if j < i
                && other.is_text
                && child.vertical_align == VerticalAlign::Baseline
                && other.vertical_align == VerticalAlign::Baseline
                && child.text_baseline.is_some()
                && other.text_baseline.is_some()
                && touches(child.baseline_y(), other.baseline_y(), self.tolerance())
                && !self.would_cycle(i, j, axis)
            {
                chosen = Some((j, AnchorAttribute::Baseline));
                break;
            }
        }

        if let Some((j, attribute)) = chosen {
            let target = Target::Node(self.children[j].id.clone());
            if self.place(i, attribute, target, true, false) {
                self.nodes[i].advance(axis, AxisState::SiblingAnchored);
            }
        }
    }

    /// Align a still unanchored node with a sibling sharing an edge
    fn resolve_shared_edges(&mut self, i: usize, axis: Axis) {
        if self.nodes[i].has_axis_anchor(axis) {
            return;
        }
        let near = self.children[i].bounds.near(axis);
        let far = self.children[i].bounds.far(axis);

        let mut chosen = None;
        for j in 0..i {
            if !self.anchorable(j) || self.nodes[j].has_parent_edge(axis, Edge::Near) {
                continue;
            }
            let other = &self.children[j].bounds;
            let edge = if touches(near, other.near(axis), self.tolerance()) {
                Edge::Near
            } else if touches(far, other.far(axis), self.tolerance()) {
                Edge::Far
            } else {
                continue;
            };
            if !self.would_cycle(i, j, axis) {
                chosen = Some((j, edge));
                break;
            }
        }

        if let Some((j, edge)) = chosen {
            let target = Target::Node(self.children[j].id.clone());
            if self.place(i, AnchorAttribute::align(axis, edge), target, true, false) {
                self.nodes[i].advance(axis, AxisState::SiblingAnchored);
            }
        }
    }

    /// Whether anchoring `source` to `target` on `axis` closes a loop
    pub(super) fn would_cycle(&self, source: usize, target: usize, axis: Axis) -> bool {
        let mut seen = HashSet::new();
        let mut worklist = vec![target];
        while let Some(current) = worklist.pop() {
            if current == source {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            for anchor in self.nodes[current].on_axis(axis) {
                if let Some(&next) = anchor.target.node_id().and_then(|id| self.index.get(id)) {
                    worklist.push(next);
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::config::AnchorConfig;
    use crate::snapshot::{BoxNode, Flow, Rect};

    use super::super::engine::ContainerPass;
    use super::*;

    fn resolve(container: &BoxNode, config: &AnchorConfig) -> Vec<NodeAnchors> {
        let mut pass = ContainerPass::new(container, config).unwrap_or_else(|e| panic!("{e}"));
        pass.resolve_anchors();
        pass.nodes
    }

    fn container(children: Vec<BoxNode>) -> BoxNode {
        BoxNode::new("root", Rect::new(0.0, 0.0, 300.0, 100.0)).with_children(children)
    }

    fn target(node: &NodeAnchors, attribute: AnchorAttribute) -> Option<String> {
        node.target(attribute).map(|t| t.to_string())
    }

    #[test]
    fn test_touching_row_anchors_leftward() {
        let root = container(vec![
            BoxNode::new("a", Rect::new(0.0, 0.0, 100.0, 50.0)),
            BoxNode::new("b", Rect::new(100.0, 0.0, 200.0, 50.0)),
        ]);
        let nodes = resolve(&root, &AnchorConfig::default());

        assert_eq!(target(&nodes[0], AnchorAttribute::Left).as_deref(), Some("parent"));
        assert_eq!(target(&nodes[0], AnchorAttribute::RightLeft), None);
        assert_eq!(target(&nodes[1], AnchorAttribute::LeftRight).as_deref(), Some("a"));
        assert_eq!(nodes[1].state.horizontal, AxisState::SiblingAnchored);
    }

    #[test]
    fn test_both_container_edges_defer_axis() {
        let root = container(vec![BoxNode::new("wide", Rect::new(0.0, 10.0, 300.0, 40.0))]);
        let nodes = resolve(&root, &AnchorConfig::default());

        assert!(nodes[0].has_parent_edge(Axis::Horizontal, Edge::Near));
        assert!(nodes[0].has_parent_edge(Axis::Horizontal, Edge::Far));
        assert_eq!(nodes[0].state.horizontal, AxisState::Unresolved);
    }

    #[test]
    fn test_adjacency_needs_cross_overlap() {
        let root = container(vec![
            BoxNode::new("a", Rect::new(10.0, 0.0, 100.0, 40.0)),
            BoxNode::new("b", Rect::new(100.0, 60.0, 200.0, 90.0)),
        ]);
        let nodes = resolve(&root, &AnchorConfig::default());
        assert_eq!(target(&nodes[1], AnchorAttribute::LeftRight), None);
    }

    #[test]
    fn test_float_right_prefers_far_edge() {
        let root = container(vec![
            BoxNode::new("a", Rect::new(150.0, 0.0, 200.0, 50.0)).with_flow(Flow::FloatRight),
            BoxNode::new("b", Rect::new(200.0, 0.0, 300.0, 50.0)).with_flow(Flow::FloatRight),
        ]);
        let nodes = resolve(&root, &AnchorConfig::default());

        assert_eq!(target(&nodes[0], AnchorAttribute::RightLeft).as_deref(), Some("b"));
        assert_eq!(target(&nodes[1], AnchorAttribute::Right).as_deref(), Some("parent"));
        // b may not point back at a
        assert_eq!(target(&nodes[1], AnchorAttribute::LeftRight), None);
    }

    #[test]
    fn test_shared_left_edge_alignment() {
        let root = container(vec![
            BoxNode::new("a", Rect::new(40.0, 0.0, 100.0, 20.0)),
            BoxNode::new("b", Rect::new(40.0, 50.0, 140.0, 70.0)),
        ]);
        let nodes = resolve(&root, &AnchorConfig::default());

        assert_eq!(target(&nodes[1], AnchorAttribute::Left).as_deref(), Some("a"));
        assert_eq!(target(&nodes[0], AnchorAttribute::Left), None);
    }

    #[test]
    fn test_text_runs_share_baseline() {
        let root = container(vec![
            BoxNode::new("big", Rect::new(0.0, 20.0, 100.0, 60.0)).with_text(30.0),
            BoxNode::new("small", Rect::new(120.0, 34.0, 180.0, 56.0)).with_text(16.0),
        ]);
        let nodes = resolve(&root, &AnchorConfig::default());

        assert_eq!(target(&nodes[1], AnchorAttribute::Baseline).as_deref(), Some("big"));
        assert_eq!(target(&nodes[1], AnchorAttribute::Top), None);
    }

    #[test]
    fn test_images_never_receive_baseline() {
        let root = container(vec![
            BoxNode::new("icon", Rect::new(0.0, 20.0, 40.0, 60.0)).with_image(),
            BoxNode::new("label", Rect::new(50.0, 40.0, 150.0, 60.0)).with_text(15.0),
        ]);
        let nodes = resolve(&root, &AnchorConfig::default());

        assert_eq!(target(&nodes[1], AnchorAttribute::Bottom).as_deref(), Some("icon"));
        assert_eq!(target(&nodes[1], AnchorAttribute::Baseline), None);
    }

    #[test]
    fn test_cycle_refused() {
        let config = AnchorConfig::default();
        let root = container(vec![
            BoxNode::new("a", Rect::new(40.0, 10.0, 100.0, 20.0)),
            BoxNode::new("b", Rect::new(40.0, 30.0, 100.0, 40.0)),
        ]);
        let mut pass = ContainerPass::new(&root, &config).unwrap_or_else(|e| panic!("{e}"));
        pass.resolve_anchors();
        // b.left -> a exists, so a -> b would loop
        assert!(pass.would_cycle(0, 1, Axis::Horizontal));
        assert!(!pass.would_cycle(1, 0, Axis::Horizontal));
    }
}
