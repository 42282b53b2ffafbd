//! Guideline synthesis
//!
//! Axes the resolver and chain stages left open are pinned to synthetic
//! guides. Guides are measured from the near container edge, or from the far
//! edge for `opposite` boxes (right floats, right-aligned text, boxes pinned
//! to the far edge). Equal guides in a container are shared.

use tracing::debug;

use crate::snapshot::Axis;

use super::engine::{ContainerPass, Frame, IdSequence};
use super::tolerance::{round_to, same_at, within_fraction};
use super::types::*;

impl Guideline {
    /// Coordinate of the line inside `frame`
    ///
    /// Percent guides span the content box, absolute guides count pixels
    /// from the outer edge.
    pub fn position(&self, frame: &Frame) -> f64 {
        let axis = self.orientation.axis();
        let content = frame.content;
        match (self.mode, self.opposite) {
            (GuideMode::Percent, false) => content.near(axis) + self.value * content.extent(axis),
            (GuideMode::Percent, true) => content.far(axis) - self.value * content.extent(axis),
            (GuideMode::Absolute, false) => frame.outer.near(axis) + self.value,
            (GuideMode::Absolute, true) => frame.outer.far(axis) - self.value,
        }
    }

    fn matches(&self, other: &Guideline, accuracy: u32) -> bool {
        self.orientation == other.orientation
            && self.mode == other.mode
            && self.opposite == other.opposite
            && match self.mode {
                GuideMode::Percent => same_at(self.value, other.value, accuracy),
                GuideMode::Absolute => within_fraction(self.value, other.value),
            }
    }
}

impl ContainerPass<'_> {
    pub(super) fn synthesize_guidelines(&mut self, ids: &mut IdSequence) {
        for i in 0..self.children.len() {
            let absolute = !self.anchorable(i);
            let node = &self.nodes[i];
            if !absolute && Axis::BOTH.iter().all(|&axis| !node.has_axis_anchor(axis)) {
                continue;
            }

            for axis in Axis::BOTH {
                let node = &self.nodes[i];
                let state = *node.state.get(axis);
                if state.is_settled() {
                    continue;
                }
                if state == AxisState::Unresolved
                    && node.has_parent_edge(axis, Edge::Near)
                    && node.has_parent_edge(axis, Edge::Far)
                {
                    self.decide_match_parent(i, axis);
                } else if state == AxisState::Unresolved && !node.has_axis_anchor(axis) {
                    let edge = if self.is_opposite(i, axis) { Edge::Far } else { Edge::Near };
                    self.anchor_to_guide(i, axis, edge, ids);
                } else if state == AxisState::SiblingAnchored
                    && self.is_flexible_opposite(i, axis)
                {
                    self.anchor_to_guide(i, axis, Edge::Near, ids);
                }
            }
        }
    }

    /// Keep both container anchors; stretch unless a size was given
    fn decide_match_parent(&mut self, i: usize, axis: Axis) {
        let stretch = !self.children[i].has_dimension(axis);
        *self.nodes[i].match_parent.get_mut(axis) = stretch;
        self.nodes[i].advance(axis, AxisState::GuidelineResolved);
    }

    /// An opposite box hanging off the far edge whose near edge may float
    fn is_flexible_opposite(&self, i: usize, axis: Axis) -> bool {
        let node = &self.nodes[i];
        self.is_opposite(i, axis)
            && !self.children[i].has_dimension(axis)
            && !node.has_edge_anchor(axis, Edge::Near)
            && node.has_edge_anchor(axis, Edge::Far)
            && self.edge_coord(i, axis, Edge::Near) - self.frame.content.near(axis) > 0.0
    }

    /// Pin `edge` to a guide, or to the container when the guide would sit on
    /// the container edge it is measured from
    fn anchor_to_guide(&mut self, i: usize, axis: Axis, edge: Edge, ids: &mut IdSequence) {
        let content = self.frame.content;
        let extent = content.extent(axis);
        if extent <= 0.0 {
            debug!(node = %self.children[i].id, ?axis, "empty content box, spanning container");
            self.full_bleed(i, axis);
            self.nodes[i].advance(axis, AxisState::GuidelineResolved);
            return;
        }

        let child = &self.children[i];
        let opposite = self.is_opposite(i, axis);
        let percent = (opposite && !child.force_absolute) || child.percent_hint;
        let accuracy = self.config.accuracy;
        let coord = self.edge_coord(i, axis, edge);

        let (mode, value) = if percent {
            let position = (coord - content.near(axis)) / extent;
            let reference = if opposite { 1.0 } else { 0.0 };
            (GuideMode::Percent, round_to((position - reference).abs(), accuracy))
        } else {
            let outer = self.frame.outer;
            let (distance, inset) = if opposite {
                (outer.far(axis) - coord, self.frame.insets.far(axis))
            } else {
                (coord - outer.near(axis), self.frame.insets.near(axis))
            };
            let value = if distance <= inset { 0.0 } else { round_to(distance, accuracy) };
            (GuideMode::Absolute, value)
        };

        let reference_edge = if opposite { Edge::Far } else { Edge::Near };
        let target = if value == 0.0 && edge == reference_edge {
            Target::Parent
        } else {
            Target::Guideline(self.guide_id(
                Guideline {
                    id: String::new(),
                    orientation: Orientation::for_axis(axis),
                    mode,
                    value,
                    opposite,
                },
                ids,
            ))
        };

        self.place(i, AnchorAttribute::align(axis, edge), target, false, true);
        self.nodes[i].remove(AnchorAttribute::adjacent(axis, edge));
        self.nodes[i].advance(axis, AxisState::GuidelineResolved);
    }

    /// Id of an equal existing guide, or of `candidate` after registering it
    fn guide_id(&mut self, mut candidate: Guideline, ids: &mut IdSequence) -> String {
        let accuracy = self.config.accuracy;
        if let Some(existing) = self.guidelines.iter().find(|g| g.matches(&candidate, accuracy)) {
            return existing.id.clone();
        }
        candidate.id = ids.next_id();
        debug!(
            id = %candidate.id,
            orientation = ?candidate.orientation,
            mode = ?candidate.mode,
            value = candidate.value,
            opposite = candidate.opposite,
            "guideline created"
        );
        let id = candidate.id.clone();
        self.guidelines.push(candidate);
        id
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::config::AnchorConfig;
    use crate::snapshot::{BoxNode, Flow, Insets, Rect};

    use super::*;

    fn guided(container: &BoxNode) -> (Vec<NodeAnchors>, Vec<Guideline>) {
        let config = AnchorConfig::default();
        let mut ids = IdSequence::new("g");
        let mut pass = ContainerPass::new(container, &config).unwrap_or_else(|e| panic!("{e}"));
        pass.resolve_anchors();
        pass.partition_chains();
        pass.synthesize_guidelines(&mut ids);
        (pass.nodes, pass.guidelines)
    }

    fn padded(children: Vec<BoxNode>) -> BoxNode {
        BoxNode::new("box", Rect::new(0.0, 0.0, 200.0, 100.0))
            .with_padding(Insets::uniform(10.0))
            .with_children(children)
    }

    fn guide(mode: GuideMode, value: f64, opposite: bool) -> Guideline {
        Guideline {
            id: "g".into(),
            orientation: Orientation::Vertical,
            mode,
            value,
            opposite,
        }
    }

    #[test]
    fn test_guide_positions() {
        let frame = Frame::of(&padded(vec![]));
        assert_eq!(guide(GuideMode::Percent, 0.25, false).position(&frame), 55.0);
        assert_eq!(guide(GuideMode::Percent, 0.25, true).position(&frame), 145.0);
        assert_eq!(guide(GuideMode::Absolute, 60.0, false).position(&frame), 60.0);
        assert_eq!(guide(GuideMode::Absolute, 60.0, true).position(&frame), 140.0);
    }

    #[test]
    fn test_float_right_gets_opposite_percent_guide() {
        let root = BoxNode::new("box", Rect::new(0.0, 0.0, 400.0, 100.0)).with_children(vec![
            BoxNode::new("side", Rect::new(40.0, 0.0, 400.0, 100.0)).with_flow(Flow::FloatRight),
        ]);
        let (nodes, guides) = guided(&root);

        assert_eq!(
            guides,
            vec![Guideline {
                id: "g1".into(),
                orientation: Orientation::Vertical,
                mode: GuideMode::Percent,
                value: 0.9,
                opposite: true,
            }]
        );
        assert_eq!(nodes[0].target(AnchorAttribute::Left), Some(&Target::Guideline("g1".into())));
        assert_eq!(nodes[0].get(AnchorAttribute::Left).map(|a| a.offset), Some(0.0));
        assert_eq!(nodes[0].target(AnchorAttribute::Right), Some(&Target::Parent));
        // full height without an explicit height stretches
        assert!(nodes[0].match_parent.vertical);
    }

    #[test]
    fn test_absolute_box_gets_absolute_guides() {
        let (nodes, guides) = guided(&padded(vec![
            BoxNode::new("abs", Rect::new(60.0, 40.0, 100.0, 60.0)).with_flow(Flow::Absolute)
        ]));

        assert_eq!(guides.len(), 2);
        assert_eq!(guides[0].orientation, Orientation::Vertical);
        assert_eq!(guides[0].value, 60.0);
        assert_eq!(guides[1].orientation, Orientation::Horizontal);
        assert_eq!(guides[1].value, 40.0);
        assert_eq!(nodes[0].target(AnchorAttribute::Top), Some(&Target::Guideline("g2".into())));
        assert_eq!(nodes[0].state.horizontal, AxisState::GuidelineResolved);
    }

    #[test]
    fn test_guide_inside_padding_clamps_to_parent() {
        let (nodes, guides) = guided(&padded(vec![
            BoxNode::new("abs", Rect::new(5.0, 10.0, 50.0, 30.0)).with_flow(Flow::Absolute)
        ]));

        assert!(guides.is_empty());
        assert_eq!(nodes[0].target(AnchorAttribute::Left), Some(&Target::Parent));
        assert_eq!(nodes[0].get(AnchorAttribute::Left).map(|a| a.offset), Some(-5.0));
        assert_eq!(nodes[0].get(AnchorAttribute::Top).map(|a| a.offset), Some(0.0));
    }

    #[test]
    fn test_equal_guides_are_shared() {
        let (nodes, guides) = guided(&padded(vec![
            BoxNode::new("a", Rect::new(60.0, 20.0, 100.0, 30.0)).with_flow(Flow::Absolute),
            BoxNode::new("b", Rect::new(60.4, 50.0, 90.0, 70.0)).with_flow(Flow::Absolute),
        ]));

        let ids: Vec<_> = guides.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2", "g3"]);
        assert_eq!(nodes[0].target(AnchorAttribute::Left), nodes[1].target(AnchorAttribute::Left));
    }

    #[test]
    fn test_explicit_size_keeps_measured_width() {
        let root = BoxNode::new("box", Rect::new(0.0, 0.0, 300.0, 100.0)).with_children(vec![
            BoxNode::new("banner", Rect::new(0.0, 0.0, 300.0, 40.0)).with_size_set(true, false),
        ]);
        let (nodes, guides) = guided(&root);

        assert!(guides.is_empty());
        assert!(!nodes[0].match_parent.horizontal);
        assert_eq!(nodes[0].state.horizontal, AxisState::GuidelineResolved);
        assert_eq!(nodes[0].target(AnchorAttribute::Right), Some(&Target::Parent));
    }

    #[test]
    fn test_empty_content_falls_back_to_parent() {
        let mut root = BoxNode::new("box", Rect::new(0.0, 0.0, 20.0, 100.0)).with_children(vec![
            BoxNode::new("abs", Rect::new(10.0, 40.0, 10.0, 60.0)).with_flow(Flow::Absolute),
        ]);
        root.padding = Insets {
            left: 10.0,
            top: 0.0,
            right: 10.0,
            bottom: 0.0,
        };
        let (nodes, guides) = guided(&root);

        assert_eq!(nodes[0].target(AnchorAttribute::Left), Some(&Target::Parent));
        assert_eq!(nodes[0].target(AnchorAttribute::Right), Some(&Target::Parent));
        assert_eq!(guides.len(), 1);
        assert_eq!(guides[0].orientation, Orientation::Horizontal);
    }
}
