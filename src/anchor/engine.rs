//! Container pass orchestration
//!
//! Every container with children gets one pass. Within a pass the stages run
//! in a fixed order, each reading the anchors and axis states left by the
//! previous one:
//!
//! 1. **Resolver**: pairwise edge matching against siblings and the container
//! 2. **Chains**: collinear siblings regrouped into distributed chains
//! 3. **Guidelines**: synthetic reference lines for axes still unresolved
//! 4. **Conflicts**: redundant anchors sharing a target are dropped
//! 5. **Bias**: fully unanchored nodes pinned to the container with a bias
//!
//! Containers never share state except the id sequence, so a failed container
//! does not affect any other.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use serde::Serialize;
use tracing::{debug, debug_span, trace, warn};

use crate::config::AnchorConfig;
use crate::snapshot::{Axis, BoxNode, Flow, Insets, Rect, Snapshot, TextAlign};

use super::error::GeometryError;
use super::tolerance::round_to;
use super::types::*;

/// Allocates ids for synthesized nodes across a whole conversion run
#[derive(Debug, Clone)]
pub struct IdSequence {
    prefix: String,
    next: usize,
    taken: HashSet<String>,
}

impl IdSequence {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
            taken: HashSet::new(),
        }
    }

    /// Never hand out any of `ids`, typically the snapshot's box ids
    pub fn with_taken(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.taken.extend(ids);
        self
    }

    pub fn next_id(&mut self) -> String {
        loop {
            self.next += 1;
            let id = format!("{}{}", self.prefix, self.next);
            if !self.taken.contains(&id) {
                return id;
            }
        }
    }
}

/// Reference rectangles a container offers its children
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Container bounds
    pub outer: Rect,
    /// Bounds minus padding and border
    pub content: Rect,
    /// Padding plus border
    pub insets: Insets,
}

impl Frame {
    pub fn of(container: &BoxNode) -> Self {
        Self {
            outer: container.bounds,
            content: container.content_box(),
            insets: container.padding.plus(&container.border),
        }
    }

    /// Describe why children cannot be measured against this frame
    ///
    /// A content box narrower than its insets is fine and handled later as
    /// full bleed; only values that cannot be represented are rejected.
    pub fn defect(&self) -> Option<String> {
        if let Some(reason) = self.insets.defect() {
            return Some(format!("combined insets: {reason}"));
        }
        let content = self.content;
        let values = [
            content.left,
            content.top,
            content.right,
            content.bottom,
            content.width(),
            content.height(),
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Some("content box overflows".to_string());
        }
        None
    }
}

/// Anchors produced for one container
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerResult {
    pub container_id: String,
    /// Children in snapshot order
    pub nodes: Vec<NodeAnchors>,
    pub guidelines: Vec<Guideline>,
    pub chains: Vec<Chain>,
    pub conflicts: Vec<AnchorConflict>,
}

impl ContainerResult {
    pub fn node(&self, id: &str) -> Option<&NodeAnchors> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn guideline(&self, id: &str) -> Option<&Guideline> {
        self.guidelines.iter().find(|g| g.id == id)
    }
}

/// The complete result of a conversion run
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConversionResult {
    /// Converted containers in tree pre-order
    pub containers: Vec<ContainerResult>,
    /// Containers left without anchors
    pub skipped: Vec<GeometryError>,
}

impl ConversionResult {
    pub fn container(&self, id: &str) -> Option<&ContainerResult> {
        self.containers.iter().find(|c| c.container_id == id)
    }

    /// Look up a node in whichever container owns it
    pub fn node(&self, id: &str) -> Option<&NodeAnchors> {
        self.containers.iter().find_map(|c| c.node(id))
    }

    /// Unresolved conflicts across all containers
    pub fn conflicts(&self) -> impl Iterator<Item = &AnchorConflict> {
        self.containers.iter().flat_map(|c| c.conflicts.iter())
    }

    /// Stable text listing of every container's anchors
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for container in &self.containers {
            let _ = writeln!(out, "container {}", container.container_id);
            for guide in &container.guidelines {
                let mode = match guide.mode {
                    GuideMode::Percent => "percent",
                    GuideMode::Absolute => "absolute",
                };
                let _ = writeln!(
                    out,
                    "  guideline {} {:?} {} {}{}",
                    guide.id,
                    guide.orientation,
                    mode,
                    guide.value,
                    if guide.opposite { " opposite" } else { "" }
                );
            }
            for chain in &container.chains {
                let _ = writeln!(
                    out,
                    "  chain {:?} {} [{}]",
                    chain.axis,
                    chain.style,
                    chain.members.join(", ")
                );
            }
            for node in &container.nodes {
                for anchor in node.anchors.values() {
                    let _ = writeln!(
                        out,
                        "  {}.{} -> {} ({})",
                        node.id, anchor.attribute, anchor.target, anchor.offset
                    );
                }
            }
        }
        for skipped in &self.skipped {
            let _ = writeln!(out, "skipped {}", skipped);
        }
        out
    }
}

/// Mutable state of one container while its passes run
pub(crate) struct ContainerPass<'a> {
    pub(super) config: &'a AnchorConfig,
    pub(super) container: &'a BoxNode,
    pub(super) frame: Frame,
    pub(super) children: &'a [BoxNode],
    pub(super) nodes: Vec<NodeAnchors>,
    pub(super) index: HashMap<&'a str, usize>,
    pub(super) guidelines: Vec<Guideline>,
    pub(super) chains: Vec<Chain>,
    pub(super) conflicts: Vec<AnchorConflict>,
}

impl<'a> ContainerPass<'a> {
    /// Prepare a pass, rejecting containers with malformed geometry
    pub(crate) fn new(
        container: &'a BoxNode,
        config: &'a AnchorConfig,
    ) -> Result<Self, GeometryError> {
        let own_defect = container
            .bounds
            .defect()
            .or_else(|| container.padding.defect().map(|r| format!("padding: {r}")))
            .or_else(|| container.border.defect().map(|r| format!("border: {r}")));
        if let Some(reason) = own_defect {
            return Err(GeometryError::invalid(&container.id, &container.id, reason));
        }
        let frame = Frame::of(container);
        if let Some(reason) = frame.defect() {
            return Err(GeometryError::invalid(&container.id, &container.id, reason));
        }
        for child in &container.children {
            let defect = child
                .bounds
                .defect()
                .or_else(|| child.linear.and_then(|l| l.defect()))
                .or_else(|| match child.text_baseline {
                    Some(b) if !b.is_finite() => Some("non-finite baseline".to_string()),
                    _ => None,
                });
            if let Some(reason) = defect {
                return Err(GeometryError::invalid(&container.id, &child.id, reason));
            }
        }

        let children = container.children.as_slice();
        Ok(Self {
            config,
            container,
            frame,
            children,
            nodes: children.iter().map(|c| NodeAnchors::new(&c.id)).collect(),
            index: children
                .iter()
                .enumerate()
                .map(|(i, c)| (c.id.as_str(), i))
                .collect(),
            guidelines: Vec::new(),
            chains: Vec::new(),
            conflicts: Vec::new(),
        })
    }

    /// Run every stage and hand back the container's anchors
    pub(crate) fn run(mut self, ids: &mut IdSequence) -> ContainerResult {
        self.resolve_anchors();
        self.partition_chains();
        self.synthesize_guidelines(ids);
        self.resolve_conflicts();
        self.apply_bias();

        debug!(
            container = %self.container.id,
            children = self.children.len(),
            guidelines = self.guidelines.len(),
            chains = self.chains.len(),
            conflicts = self.conflicts.len(),
            "container resolved"
        );

        ContainerResult {
            container_id: self.container.id.clone(),
            nodes: self.nodes,
            guidelines: self.guidelines,
            chains: self.chains,
            conflicts: self.conflicts,
        }
    }

    /// Whether a child takes part in sibling anchoring at all
    pub(super) fn anchorable(&self, i: usize) -> bool {
        self.children[i].flow != Flow::Absolute
    }

    /// Coordinate of a child's edge on `axis`
    pub(super) fn edge_coord(&self, i: usize, axis: Axis, edge: Edge) -> f64 {
        let child = &self.children[i];
        match edge {
            Edge::Near => child.linear().near(axis),
            Edge::Far => child.linear().far(axis),
            Edge::Baseline => child.baseline_y(),
        }
    }

    /// Coordinate of the referenced edge of an anchor target
    pub(super) fn target_coord(&self, target: &Target, axis: Axis, edge: Edge) -> Option<f64> {
        match target {
            Target::Parent => Some(match edge {
                Edge::Far => self.frame.content.far(axis),
                Edge::Near | Edge::Baseline => self.frame.content.near(axis),
            }),
            Target::Node(id) => self
                .index
                .get(id.as_str())
                .map(|&j| self.edge_coord(j, axis, edge)),
            Target::Guideline(id) => self
                .guidelines
                .iter()
                .find(|g| &g.id == id)
                .map(|g| g.position(&self.frame)),
        }
    }

    /// Record an anchor with its offset; returns whether it was stored
    pub(super) fn place(
        &mut self,
        i: usize,
        attribute: AnchorAttribute,
        target: Target,
        replaceable: bool,
        force: bool,
    ) -> bool {
        let axis = attribute.axis();
        let Some(target_coord) = self.target_coord(&target, axis, attribute.target_edge()) else {
            return false;
        };
        let offset = round_to(
            self.edge_coord(i, axis, attribute.source_edge()) - target_coord,
            self.config.accuracy,
        );
        let anchor = Anchor {
            attribute,
            source: self.children[i].id.clone(),
            target,
            axis,
            offset,
            overwrite: replaceable,
        };
        trace!(
            node = %anchor.source,
            attribute = %anchor.attribute,
            target = %anchor.target,
            offset,
            "placing anchor"
        );
        self.nodes[i].anchor(anchor, force)
    }

    /// Whether the box itself hangs from the far side: right floats,
    /// right-aligned text, or an explicit far offset without a near one
    pub(super) fn prefers_far_edge(&self, i: usize, axis: Axis) -> bool {
        let child = &self.children[i];
        let right_side = axis == Axis::Horizontal
            && (child.flow == Flow::FloatRight
                || (child.is_text && child.text_align == TextAlign::Right));
        let far_offset_only =
            child.offsets.near(axis).is_none() && child.offsets.far(axis).is_some();
        right_side || far_offset_only
    }

    /// Whether positions on `axis` are measured from the container's far edge
    pub(super) fn is_opposite(&self, i: usize, axis: Axis) -> bool {
        let node = &self.nodes[i];
        let pinned_far =
            node.has_parent_edge(axis, Edge::Far) && !node.has_parent_edge(axis, Edge::Near);
        self.prefers_far_edge(i, axis) || pinned_far
    }
}

/// Convert every container of a snapshot, allocating guide ids from `ids`
pub fn convert_tree(
    snapshot: &Snapshot,
    config: &AnchorConfig,
    ids: &mut IdSequence,
) -> ConversionResult {
    let mut result = ConversionResult::default();
    visit(&snapshot.root, config, ids, &mut result);
    result
}

fn visit(
    node: &BoxNode,
    config: &AnchorConfig,
    ids: &mut IdSequence,
    result: &mut ConversionResult,
) {
    if !node.children.is_empty() {
        let _span = debug_span!("container", id = %node.id).entered();
        match ContainerPass::new(node, config) {
            Ok(pass) => result.containers.push(pass.run(ids)),
            Err(e) => {
                warn!(error = %e, "skipping container");
                result.skipped.push(e);
            }
        }
    }
    for child in &node.children {
        visit(child, config, ids, result);
    }
}
