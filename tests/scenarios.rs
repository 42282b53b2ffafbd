//! End-to-end anchoring of small reference layouts

use anchorage::anchor::{AnchorAttribute, ChainStyle, GuideMode, Guideline, Orientation, Target};
use anchorage::{convert_str, ConversionResult, ConvertConfig};
use pretty_assertions::assert_eq;

fn convert(json: &str) -> ConversionResult {
    convert_str(json, &ConvertConfig::default()).expect("Should convert")
}

fn target(result: &ConversionResult, node: &str, attribute: AnchorAttribute) -> Option<String> {
    result
        .node(node)
        .and_then(|n| n.target(attribute))
        .map(Target::to_string)
}

#[test]
fn test_touching_row_becomes_spread_inside_chain() {
    let result = convert(include_str!("fixtures/scenario_a.json"));
    let row = result.container("row").expect("row container");

    assert_eq!(row.chains.len(), 1);
    assert_eq!(row.chains[0].style, ChainStyle::SpreadInside);
    assert_eq!(row.chains[0].members, vec!["a", "b", "c"]);
    assert!(row.guidelines.is_empty());

    insta::assert_snapshot!(result.dump().trim_end(), @r"
    container row
      chain Horizontal spread_inside [a, b, c]
      a.left -> parent (0)
      a.top -> parent (0)
      a.bottom -> parent (0)
      a.rightLeft -> b (0)
      b.top -> parent (0)
      b.bottom -> parent (0)
      b.leftRight -> a (0)
      b.rightLeft -> c (0)
      c.right -> parent (0)
      c.top -> parent (0)
      c.bottom -> parent (0)
      c.leftRight -> b (0)
    ");
}

#[test]
fn test_full_height_row_members_match_parent() {
    let result = convert(include_str!("fixtures/scenario_a.json"));
    for id in ["a", "b", "c"] {
        let node = result.node(id).expect("row member");
        assert!(node.match_parent.vertical, "{id} should stretch vertically");
        assert!(!node.match_parent.horizontal);
    }
    let head = result.node("a").and_then(|n| n.chain.horizontal);
    assert_eq!(head.map(|h| h.style), Some(ChainStyle::SpreadInside));
}

#[test]
fn test_centered_child_pins_all_edges() {
    let result = convert(include_str!("fixtures/scenario_b.json"));
    let card = result.node("card").expect("card");

    for attribute in [
        AnchorAttribute::Left,
        AnchorAttribute::Right,
        AnchorAttribute::Top,
        AnchorAttribute::Bottom,
    ] {
        assert_eq!(card.target(attribute), Some(&Target::Parent), "{attribute}");
    }
    assert_eq!(card.anchors.len(), 4);
    assert_eq!(card.bias.horizontal, None);
    assert_eq!(card.bias.vertical, None);
}

#[test]
fn test_corner_child_needs_no_guideline() {
    let result = convert(include_str!("fixtures/scenario_c.json"));

    assert_eq!(target(&result, "logo", AnchorAttribute::Left).as_deref(), Some("parent"));
    assert_eq!(target(&result, "logo", AnchorAttribute::Top).as_deref(), Some("parent"));
    assert_eq!(result.node("logo").map(|n| n.anchors.len()), Some(2));
    assert!(result.containers[0].guidelines.is_empty());
}

#[test]
fn test_right_float_gets_percent_guide_on_left() {
    let result = convert(include_str!("fixtures/scenario_d.json"));
    let container = &result.containers[0];

    assert_eq!(
        container.guidelines,
        vec![Guideline {
            id: "guideline_1".into(),
            orientation: Orientation::Vertical,
            mode: GuideMode::Percent,
            value: 0.9,
            opposite: true,
        }]
    );
    assert_eq!(target(&result, "side", AnchorAttribute::Right).as_deref(), Some("parent"));
    assert_eq!(target(&result, "side", AnchorAttribute::Left).as_deref(), Some("guideline_1"));
}

#[test]
fn test_shared_adjacency_kept_on_node_without_alternative() {
    let result = convert(include_str!("fixtures/scenario_e.json"));

    assert_eq!(target(&result, "x", AnchorAttribute::LeftRight).as_deref(), Some("t"));
    assert_eq!(target(&result, "y", AnchorAttribute::LeftRight), None);
    assert_eq!(target(&result, "y", AnchorAttribute::Right).as_deref(), Some("parent"));
    assert_eq!(result.conflicts().count(), 0);

    insta::assert_snapshot!(result.dump().trim_end(), @r"
    container row
      chain Vertical packed [x, y]
      t.left -> parent (0)
      t.top -> parent (0)
      t.bottom -> parent (0)
      x.top -> parent (0)
      x.leftRight -> t (0)
      x.bottomTop -> y (0)
      y.right -> parent (0)
      y.bottom -> parent (0)
      y.topBottom -> x (0)
    ");
}
