//! Core types for the anchoring engine

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::snapshot::Axis;

/// Which edge of a box an anchor attribute refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Left or top
    Near,
    /// Right or bottom
    Far,
    /// Text baseline
    Baseline,
}

impl Edge {
    pub fn flip(self) -> Edge {
        match self {
            Edge::Near => Edge::Far,
            Edge::Far => Edge::Near,
            Edge::Baseline => Edge::Baseline,
        }
    }
}

/// Directional or baseline anchor kinds
///
/// The two-word variants name the source edge first: `LeftRight` pins the
/// source's left edge to the target's right edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnchorAttribute {
    Left,
    Right,
    Top,
    Bottom,
    LeftRight,
    RightLeft,
    TopBottom,
    BottomTop,
    Baseline,
}

impl AnchorAttribute {
    /// Edge-to-same-edge attribute (`left`, `right`, `top`, `bottom`)
    pub fn align(axis: Axis, edge: Edge) -> AnchorAttribute {
        match (axis, edge) {
            (Axis::Horizontal, Edge::Far) => AnchorAttribute::Right,
            (Axis::Horizontal, _) => AnchorAttribute::Left,
            (Axis::Vertical, Edge::Far) => AnchorAttribute::Bottom,
            (Axis::Vertical, Edge::Baseline) => AnchorAttribute::Baseline,
            (Axis::Vertical, Edge::Near) => AnchorAttribute::Top,
        }
    }

    /// Edge-to-opposite-edge attribute, keyed by the source edge
    pub fn adjacent(axis: Axis, edge: Edge) -> AnchorAttribute {
        match (axis, edge) {
            (Axis::Horizontal, Edge::Far) => AnchorAttribute::RightLeft,
            (Axis::Horizontal, _) => AnchorAttribute::LeftRight,
            (Axis::Vertical, Edge::Far) => AnchorAttribute::BottomTop,
            (Axis::Vertical, _) => AnchorAttribute::TopBottom,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            AnchorAttribute::Left
            | AnchorAttribute::Right
            | AnchorAttribute::LeftRight
            | AnchorAttribute::RightLeft => Axis::Horizontal,
            _ => Axis::Vertical,
        }
    }

    /// Edge of the source box this attribute pins
    pub fn source_edge(self) -> Edge {
        match self {
            AnchorAttribute::Left
            | AnchorAttribute::Top
            | AnchorAttribute::LeftRight
            | AnchorAttribute::TopBottom => Edge::Near,
            AnchorAttribute::Right
            | AnchorAttribute::Bottom
            | AnchorAttribute::RightLeft
            | AnchorAttribute::BottomTop => Edge::Far,
            AnchorAttribute::Baseline => Edge::Baseline,
        }
    }

    /// Edge of the target this attribute refers to
    pub fn target_edge(self) -> Edge {
        if self.is_adjacency() {
            self.source_edge().flip()
        } else {
            self.source_edge()
        }
    }

    pub fn is_adjacency(self) -> bool {
        matches!(
            self,
            AnchorAttribute::LeftRight
                | AnchorAttribute::RightLeft
                | AnchorAttribute::TopBottom
                | AnchorAttribute::BottomTop
        )
    }

    pub fn is_alignment(self) -> bool {
        matches!(
            self,
            AnchorAttribute::Left
                | AnchorAttribute::Right
                | AnchorAttribute::Top
                | AnchorAttribute::Bottom
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            AnchorAttribute::Left => "left",
            AnchorAttribute::Right => "right",
            AnchorAttribute::Top => "top",
            AnchorAttribute::Bottom => "bottom",
            AnchorAttribute::LeftRight => "leftRight",
            AnchorAttribute::RightLeft => "rightLeft",
            AnchorAttribute::TopBottom => "topBottom",
            AnchorAttribute::BottomTop => "bottomTop",
            AnchorAttribute::Baseline => "baseline",
        }
    }
}

impl fmt::Display for AnchorAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an anchor points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    /// The owning container
    Parent,
    /// A sibling box
    Node(String),
    /// A guideline synthesized in the same container
    Guideline(String),
}

impl Target {
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Target::Node(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Parent => f.write_str("parent"),
            Target::Node(id) | Target::Guideline(id) => f.write_str(id),
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A directed edge relation from one box to a target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anchor {
    pub attribute: AnchorAttribute,
    pub source: String,
    pub target: Target,
    pub axis: Axis,
    /// Source edge minus target edge, in pixels
    pub offset: f64,
    /// Whether a later anchor call may replace this one without forcing
    pub overwrite: bool,
}

/// Per-node, per-axis resolution state
///
/// States only move forward through the pass sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisState {
    #[default]
    Unresolved,
    SiblingAnchored,
    ChainResolved,
    GuidelineResolved,
    BiasResolved,
}

impl AxisState {
    pub fn is_resolved(self) -> bool {
        self != AxisState::Unresolved
    }

    /// Resolved by a pass that later passes must not revisit
    pub fn is_settled(self) -> bool {
        self >= AxisState::ChainResolved
    }
}

/// A value per axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AxisPair<T> {
    pub horizontal: T,
    pub vertical: T,
}

impl<T> AxisPair<T> {
    pub fn get(&self, axis: Axis) -> &T {
        match axis {
            Axis::Horizontal => &self.horizontal,
            Axis::Vertical => &self.vertical,
        }
    }

    pub fn get_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::Horizontal => &mut self.horizontal,
            Axis::Vertical => &mut self.vertical,
        }
    }
}

/// Chain distribution style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStyle {
    Spread,
    SpreadInside,
    Packed,
}

impl fmt::Display for ChainStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainStyle::Spread => write!(f, "spread"),
            ChainStyle::SpreadInside => write!(f, "spread_inside"),
            ChainStyle::Packed => write!(f, "packed"),
        }
    }
}

/// Distribution hint carried by a chain's first member
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChainHead {
    pub style: ChainStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bias: Option<f64>,
}

/// Siblings collinear on one axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chain {
    pub axis: Axis,
    /// Sorted by near edge
    pub members: Vec<String>,
    pub style: ChainStyle,
    /// Only set for packed chains
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bias: Option<f64>,
}

impl Chain {
    pub fn head(&self) -> Option<&str> {
        self.members.first().map(String::as_str)
    }
}

/// Orientation of a guideline's line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Orientation of the line that positions boxes along `axis`
    pub fn for_axis(axis: Axis) -> Orientation {
        match axis {
            Axis::Horizontal => Orientation::Vertical,
            Axis::Vertical => Orientation::Horizontal,
        }
    }

    /// Axis along which this line positions boxes
    pub fn axis(self) -> Axis {
        match self {
            Orientation::Vertical => Axis::Horizontal,
            Orientation::Horizontal => Axis::Vertical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuideMode {
    Percent,
    Absolute,
}

/// A synthetic reference line owned by a container
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Guideline {
    pub id: String,
    pub orientation: Orientation,
    pub mode: GuideMode,
    /// Fraction of the content extent, or pixels from the outer edge
    pub value: f64,
    /// Measured from the far edge instead of the near edge
    pub opposite: bool,
}

/// Two nodes pinned to the same reference with no way to drop either
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorConflict {
    pub container: String,
    pub attribute: AnchorAttribute,
    pub target: String,
    pub nodes: (String, String),
}

impl fmt::Display for AnchorConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' and '{}' both anchor {} to '{}' in container '{}'",
            self.nodes.0, self.nodes.1, self.attribute, self.target, self.container
        )
    }
}

/// Resolved anchors and axis state of one node
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NodeAnchors {
    pub id: String,
    pub anchors: BTreeMap<AnchorAttribute, Anchor>,
    pub state: AxisPair<AxisState>,
    /// Position in free space when both edges are pinned to the parent
    pub bias: AxisPair<Option<f64>>,
    /// Span the container instead of keeping the measured size
    pub match_parent: AxisPair<bool>,
    /// Chain style, only on a chain's first member
    pub chain: AxisPair<Option<ChainHead>>,
}

impl NodeAnchors {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, attribute: AnchorAttribute) -> Option<&Anchor> {
        self.anchors.get(&attribute)
    }

    /// Target of an attribute, if anchored
    pub fn target(&self, attribute: AnchorAttribute) -> Option<&Target> {
        self.anchors.get(&attribute).map(|a| &a.target)
    }

    /// Anchors acting on `axis`
    pub fn on_axis(&self, axis: Axis) -> impl Iterator<Item = &Anchor> {
        self.anchors.values().filter(move |a| a.axis == axis)
    }

    pub fn has_axis_anchor(&self, axis: Axis) -> bool {
        self.on_axis(axis).next().is_some()
    }

    /// Whether the given source edge is pinned by any anchor
    pub fn has_edge_anchor(&self, axis: Axis, edge: Edge) -> bool {
        self.on_axis(axis).any(|a| a.attribute.source_edge() == edge)
    }

    /// Whether the given edge is pinned to the matching container edge
    pub fn has_parent_edge(&self, axis: Axis, edge: Edge) -> bool {
        self.target(AnchorAttribute::align(axis, edge)) == Some(&Target::Parent)
    }

    /// Set an anchor, honoring the overwrite rules
    ///
    /// A settled axis is only touched when `force` is set. An occupied
    /// attribute is replaced when `force` is set or the stored anchor is
    /// replaceable. Other attributes are never touched.
    pub fn anchor(&mut self, anchor: Anchor, force: bool) -> bool {
        if self.state.get(anchor.axis).is_settled() && !force {
            return false;
        }
        if let Some(existing) = self.anchors.get(&anchor.attribute) {
            if !force && !existing.overwrite {
                return false;
            }
        }
        self.anchors.insert(anchor.attribute, anchor);
        true
    }

    pub fn remove(&mut self, attribute: AnchorAttribute) -> Option<Anchor> {
        self.anchors.remove(&attribute)
    }

    /// Drop every anchor on an axis
    pub fn clear_axis(&mut self, axis: Axis) {
        self.anchors.retain(|_, a| a.axis != axis);
    }

    /// Move an axis forward to `next`; earlier states are ignored
    pub fn advance(&mut self, axis: Axis, next: AxisState) {
        let state = self.state.get_mut(axis);
        if next > *state {
            *state = next;
        }
    }
}
