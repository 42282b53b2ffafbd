//! Geometry snapshot consumed by the anchoring engine
//!
//! The snapshot is produced by an external layout engine: every box already
//! carries its resolved pixel geometry and flow metadata. Nothing here is
//! computed, only described and validated.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;

/// Id that anchor output uses for the owning container
pub const RESERVED_ID: &str = "parent";

/// Layout axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Both axes, horizontal first
    pub const BOTH: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];

    /// The perpendicular axis
    pub fn cross(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// A four-sided rectangle in snapshot pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Leading edge on the axis (left or top)
    pub fn near(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.left,
            Axis::Vertical => self.top,
        }
    }

    /// Trailing edge on the axis (right or bottom)
    pub fn far(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.right,
            Axis::Vertical => self.bottom,
        }
    }

    /// Size along the axis
    pub fn extent(&self, axis: Axis) -> f64 {
        self.far(axis) - self.near(axis)
    }

    /// Strict overlap of the projections onto `axis`
    pub fn overlaps_on(&self, other: &Rect, axis: Axis) -> bool {
        self.near(axis) < other.far(axis) && other.near(axis) < self.far(axis)
    }

    /// Shrink by the given insets
    pub fn inset(&self, insets: &Insets) -> Rect {
        Rect::new(
            self.left + insets.left,
            self.top + insets.top,
            self.right - insets.right,
            self.bottom - insets.bottom,
        )
    }

    /// Describe why this rectangle cannot be used, if it cannot
    pub fn defect(&self) -> Option<String> {
        let sides = [self.left, self.top, self.right, self.bottom];
        if sides.iter().any(|v| !v.is_finite()) {
            return Some("non-finite coordinate".to_string());
        }
        if self.width() < 0.0 {
            return Some(format!("negative width {}", self.width()));
        }
        if self.height() < 0.0 {
            return Some(format!("negative height {}", self.height()));
        }
        None
    }
}

/// Padding or border widths
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Insets {
    pub fn uniform(value: f64) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }

    pub fn near(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.left,
            Axis::Vertical => self.top,
        }
    }

    pub fn far(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.right,
            Axis::Vertical => self.bottom,
        }
    }

    /// Sum of two inset sets
    pub fn plus(&self, other: &Insets) -> Insets {
        Insets {
            left: self.left + other.left,
            top: self.top + other.top,
            right: self.right + other.right,
            bottom: self.bottom + other.bottom,
        }
    }

    /// Describe why these widths cannot be used, if they cannot
    pub fn defect(&self) -> Option<String> {
        let sides = [self.left, self.top, self.right, self.bottom];
        if sides.iter().any(|v| !v.is_finite()) {
            return Some("non-finite inset".to_string());
        }
        sides
            .iter()
            .find(|v| **v < 0.0)
            .map(|v| format!("negative inset {v}"))
    }
}

/// Explicit positioning offsets, as set upstream
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Offsets {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
}

impl Offsets {
    pub fn near(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Horizontal => self.left,
            Axis::Vertical => self.top,
        }
    }

    pub fn far(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Horizontal => self.right,
            Axis::Vertical => self.bottom,
        }
    }
}

/// Flow classification of a box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    #[default]
    Pageflow,
    FloatLeft,
    FloatRight,
    Absolute,
}


/// How a container distributes its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerLayout {
    #[default]
    Block,
    Flex,
    Columns,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlign {
    #[default]
    Baseline,
    Top,
    Middle,
    Bottom,
}

/// One measured box of the layout tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxNode {
    pub id: String,
    /// Content rectangle
    pub bounds: Rect,
    /// Bounds expanded by margins; defaults to `bounds`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linear: Option<Rect>,
    #[serde(default)]
    pub flow: Flow,
    #[serde(default)]
    pub offsets: Offsets,
    #[serde(default)]
    pub padding: Insets,
    #[serde(default)]
    pub border: Insets,
    #[serde(default)]
    pub has_width: bool,
    #[serde(default)]
    pub has_height: bool,
    #[serde(default)]
    pub layout: ContainerLayout,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub vertical_align: VerticalAlign,
    /// Baseline distance from `bounds.top`
    #[serde(default)]
    pub text_baseline: Option<f64>,
    #[serde(default)]
    pub is_text: bool,
    #[serde(default)]
    pub is_image: bool,
    /// Request percent-based guides for this box
    #[serde(default)]
    pub percent_hint: bool,
    /// Never use percent guides for this box
    #[serde(default)]
    pub force_absolute: bool,
    #[serde(default)]
    pub children: Vec<BoxNode>,
}

impl BoxNode {
    /// A plain pageflow box with the given bounds
    pub fn new(id: impl Into<String>, bounds: Rect) -> Self {
        Self {
            id: id.into(),
            bounds,
            linear: None,
            flow: Flow::Pageflow,
            offsets: Offsets::default(),
            padding: Insets::default(),
            border: Insets::default(),
            has_width: false,
            has_height: false,
            layout: ContainerLayout::Block,
            text_align: TextAlign::Left,
            vertical_align: VerticalAlign::Baseline,
            text_baseline: None,
            is_text: false,
            is_image: false,
            percent_hint: false,
            force_absolute: false,
            children: vec![],
        }
    }

    pub fn with_flow(mut self, flow: Flow) -> Self {
        self.flow = flow;
        self
    }

    pub fn with_children(mut self, children: Vec<BoxNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_size_set(mut self, has_width: bool, has_height: bool) -> Self {
        self.has_width = has_width;
        self.has_height = has_height;
        self
    }

    pub fn with_layout(mut self, layout: ContainerLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }

    /// Mark as a text run with a baseline `baseline` px below the top
    pub fn with_text(mut self, baseline: f64) -> Self {
        self.is_text = true;
        self.text_baseline = Some(baseline);
        self
    }

    pub fn with_image(mut self) -> Self {
        self.is_image = true;
        self
    }

    /// Margin box used for adjacency tests
    pub fn linear(&self) -> Rect {
        self.linear.unwrap_or(self.bounds)
    }

    /// Inner rectangle children are laid out against
    pub fn content_box(&self) -> Rect {
        self.bounds.inset(&self.padding.plus(&self.border))
    }

    /// Absolute baseline y coordinate
    pub fn baseline_y(&self) -> f64 {
        self.bounds.top + self.text_baseline.unwrap_or_else(|| self.bounds.height())
    }

    pub fn has_dimension(&self, axis: Axis) -> bool {
        match axis {
            Axis::Horizontal => self.has_width,
            Axis::Vertical => self.has_height,
        }
    }
}

/// A complete geometry snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub root: BoxNode,
}

impl Snapshot {
    pub fn new(root: BoxNode) -> Self {
        Self { root }
    }

    /// Load a snapshot from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a snapshot from JSON text
    pub fn from_json(content: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(content)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check that box ids are unique across the tree and none is reserved
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut seen = HashSet::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if node.id == RESERVED_ID {
                return Err(SnapshotError::ReservedId(node.id.clone()));
            }
            if !seen.insert(node.id.as_str()) {
                return Err(SnapshotError::DuplicateId(node.id.clone()));
            }
            stack.extend(node.children.iter());
        }
        Ok(())
    }

    /// Every box id in the tree
    pub fn ids(&self) -> HashSet<String> {
        let mut ids = HashSet::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            ids.insert(node.id.clone());
            stack.extend(node.children.iter());
        }
        ids
    }

    /// Find a box anywhere in the tree
    pub fn find(&self, id: &str) -> Option<&BoxNode> {
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(10.0, 20.0, 110.0, 70.0);
        assert_eq!(r.width(), 100.0);
        assert_eq!(r.height(), 50.0);
        assert_eq!(r.near(Axis::Vertical), 20.0);
        assert_eq!(r.far(Axis::Horizontal), 110.0);
        assert_eq!(r.extent(Axis::Vertical), 50.0);
    }

    #[test]
    fn test_overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(100.0, 0.0, 200.0, 100.0);
        assert!(!a.overlaps_on(&b, Axis::Horizontal));
        assert!(a.overlaps_on(&b, Axis::Vertical));
    }

    #[test]
    fn test_rect_defects() {
        assert!(Rect::new(0.0, 0.0, 10.0, 10.0).defect().is_none());
        assert!(Rect::new(10.0, 0.0, 0.0, 10.0).defect().is_some());
        assert!(Rect::new(0.0, f64::NAN, 10.0, 10.0).defect().is_some());
    }

    #[test]
    fn test_inset_defects() {
        assert!(Insets::uniform(4.0).defect().is_none());
        assert!(Insets::default().defect().is_none());
        let nan = Insets {
            left: f64::NAN,
            ..Insets::default()
        };
        assert_eq!(nan.defect().as_deref(), Some("non-finite inset"));
        let negative = Insets {
            bottom: -3.0,
            ..Insets::default()
        };
        assert_eq!(negative.defect().as_deref(), Some("negative inset -3"));
    }

    #[test]
    fn test_reserved_parent_id_rejected() {
        let root = BoxNode::new("root", Rect::new(0.0, 0.0, 10.0, 10.0))
            .with_children(vec![BoxNode::new("parent", Rect::new(0.0, 0.0, 5.0, 5.0))]);
        let err = Snapshot::new(root).validate().unwrap_err();
        assert!(matches!(err, SnapshotError::ReservedId(id) if id == "parent"));
    }

    #[test]
    fn test_ids_in_tree() {
        let root = BoxNode::new("root", Rect::new(0.0, 0.0, 10.0, 10.0))
            .with_children(vec![BoxNode::new("a", Rect::new(0.0, 0.0, 5.0, 5.0))]);
        let ids = Snapshot::new(root).ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("root") && ids.contains("a"));
    }

    #[test]
    fn test_content_box_applies_padding_and_border() {
        let mut node = BoxNode::new("c", Rect::new(0.0, 0.0, 200.0, 100.0))
            .with_padding(Insets::uniform(10.0));
        node.border = Insets::uniform(2.0);
        assert_eq!(node.content_box(), Rect::new(12.0, 12.0, 188.0, 88.0));
    }

    #[test]
    fn test_parse_minimal_json() {
        let snapshot = Snapshot::from_json(
            r#"{"root": {"id": "root", "bounds": {"left": 0, "top": 0, "right": 100, "bottom": 50},
                "children": [{"id": "a", "bounds": {"left": 0, "top": 0, "right": 10, "bottom": 10},
                              "flow": "float_right"}]}}"#,
        )
        .unwrap();
        assert_eq!(snapshot.root.children.len(), 1);
        assert_eq!(snapshot.root.children[0].flow, Flow::FloatRight);
        assert_eq!(snapshot.root.children[0].linear(), snapshot.root.children[0].bounds);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let root = BoxNode::new("root", Rect::new(0.0, 0.0, 10.0, 10.0)).with_children(vec![
            BoxNode::new("a", Rect::new(0.0, 0.0, 5.0, 5.0)),
            BoxNode::new("a", Rect::new(5.0, 0.0, 10.0, 5.0)),
        ]);
        let err = Snapshot::new(root).validate().unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateId(id) if id == "a"));
    }
}
