//! Conflict cleanup
//!
//! Two siblings pinning the same edge to the same sibling leave one of them
//! redundant. The anchor is dropped from a node that still has another
//! alignment anchor on the axis; when neither does, the pair is reported.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::engine::ContainerPass;
use super::types::*;

impl ContainerPass<'_> {
    pub(super) fn resolve_conflicts(&mut self) {
        let mut groups: BTreeMap<(AnchorAttribute, String), Vec<usize>> = BTreeMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            for anchor in node.anchors.values() {
                if !anchor.attribute.is_adjacency()
                    || *node.state.get(anchor.axis) == AxisState::ChainResolved
                {
                    continue;
                }
                if let Some(target) = anchor.target.node_id() {
                    groups
                        .entry((anchor.attribute, target.to_string()))
                        .or_default()
                        .push(i);
                }
            }
        }

        for ((attribute, target), members) in groups {
            let shared = Target::Node(target.clone());
            for a in 0..members.len() {
                for b in a + 1..members.len() {
                    let (x, y) = (members[a], members[b]);
                    if self.nodes[x].target(attribute) != Some(&shared)
                        || self.nodes[y].target(attribute) != Some(&shared)
                    {
                        continue;
                    }
                    if self.has_alternative(x, attribute, &target) {
                        self.drop_redundant(x, attribute);
                    } else if self.has_alternative(y, attribute, &target) {
                        self.drop_redundant(y, attribute);
                    } else {
                        let conflict = AnchorConflict {
                            container: self.container.id.clone(),
                            attribute,
                            target: target.clone(),
                            nodes: (self.nodes[x].id.clone(), self.nodes[y].id.clone()),
                        };
                        warn!(%conflict, "unresolved anchor conflict");
                        self.conflicts.push(conflict);
                    }
                }
            }
        }
    }

    /// Another alignment anchor on the same axis, not pointing at `shared`
    fn has_alternative(&self, i: usize, attribute: AnchorAttribute, shared: &str) -> bool {
        self.nodes[i].on_axis(attribute.axis()).any(|a| {
            a.attribute != attribute
                && a.attribute.is_alignment()
                && a.target.node_id() != Some(shared)
        })
    }

    fn drop_redundant(&mut self, i: usize, attribute: AnchorAttribute) {
        if let Some(anchor) = self.nodes[i].remove(attribute) {
            debug!(
                node = %anchor.source,
                %attribute,
                target = %anchor.target,
                "dropped redundant anchor"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::config::AnchorConfig;
    use crate::snapshot::{BoxNode, Rect};

    use super::*;

    fn cleaned(container: &BoxNode) -> (Vec<NodeAnchors>, Vec<AnchorConflict>) {
        let config = AnchorConfig::default();
        let mut pass = ContainerPass::new(container, &config).unwrap_or_else(|e| panic!("{e}"));
        pass.resolve_anchors();
        pass.partition_chains();
        pass.resolve_conflicts();
        (pass.nodes, pass.conflicts)
    }

    fn beside_sidebar(width: f64, lower_right: f64) -> BoxNode {
        BoxNode::new("row", Rect::new(0.0, 0.0, width, 100.0)).with_children(vec![
            BoxNode::new("t", Rect::new(0.0, 0.0, 100.0, 100.0)),
            BoxNode::new("x", Rect::new(100.0, 0.0, 200.0, 50.0)),
            BoxNode::new("y", Rect::new(100.0, 50.0, lower_right, 100.0)),
        ])
    }

    #[test]
    fn test_anchor_dropped_from_node_with_alternative() {
        let (nodes, conflicts) = cleaned(&beside_sidebar(250.0, 250.0));

        assert!(conflicts.is_empty());
        assert_eq!(nodes[1].target(AnchorAttribute::LeftRight), Some(&Target::Node("t".into())));
        assert_eq!(nodes[2].target(AnchorAttribute::LeftRight), None);
        assert_eq!(nodes[2].target(AnchorAttribute::Right), Some(&Target::Parent));
    }

    #[test]
    fn test_conflict_without_alternative_is_reported() {
        let (nodes, conflicts) = cleaned(&beside_sidebar(300.0, 200.0));

        assert_eq!(
            conflicts,
            vec![AnchorConflict {
                container: "row".into(),
                attribute: AnchorAttribute::LeftRight,
                target: "t".into(),
                nodes: ("x".into(), "y".into()),
            }]
        );
        // both anchors stay in place
        assert!(nodes[1].target(AnchorAttribute::LeftRight).is_some());
        assert!(nodes[2].target(AnchorAttribute::LeftRight).is_some());
    }

    #[test]
    fn test_shared_alignment_is_not_a_conflict() {
        let root = BoxNode::new("col", Rect::new(0.0, 0.0, 300.0, 300.0)).with_children(vec![
            BoxNode::new("a", Rect::new(40.0, 10.0, 100.0, 20.0)),
            BoxNode::new("b", Rect::new(40.0, 30.0, 120.0, 40.0)),
            BoxNode::new("c", Rect::new(40.0, 50.0, 140.0, 60.0)),
        ]);
        let (nodes, conflicts) = cleaned(&root);

        assert!(conflicts.is_empty());
        assert_eq!(nodes[1].target(AnchorAttribute::Left), Some(&Target::Node("a".into())));
        assert_eq!(nodes[2].target(AnchorAttribute::Left), Some(&Target::Node("a".into())));
    }
}
