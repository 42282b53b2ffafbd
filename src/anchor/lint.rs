//! Structural checks over a finished conversion
//!
//! Runs after all container passes and reports anchors or guides that a
//! downstream layout could not honor: targets outside the container,
//! duplicated guides, nodes in two chains on one axis, out-of-range biases,
//! and axes nothing pins.

use std::collections::HashSet;
use std::fmt;

use crate::snapshot::Axis;

use super::engine::{ContainerResult, ConversionResult};
use super::tolerance::{same_at, within_fraction};
use super::types::*;

/// Digits compared when deduplicating percent guides
const PERCENT_ACCURACY: u32 = 4;

/// A structural problem in a conversion result
#[derive(Debug, Clone, PartialEq)]
pub struct LintWarning {
    pub category: LintCategory,
    pub message: String,
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Category of lint finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintCategory {
    Dangling,
    Guideline,
    Chain,
    Bias,
    Unresolved,
}

impl fmt::Display for LintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintCategory::Dangling => write!(f, "dangling"),
            LintCategory::Guideline => write!(f, "guideline"),
            LintCategory::Chain => write!(f, "chain"),
            LintCategory::Bias => write!(f, "bias"),
            LintCategory::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Run all lint checks on a conversion result
pub fn check(result: &ConversionResult) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    for container in &result.containers {
        check_targets(container, &mut warnings);
        check_guidelines(container, &mut warnings);
        check_chains(container, &mut warnings);
        check_biases(container, &mut warnings);
        check_resolution(container, &mut warnings);
    }
    warnings
}

fn warn(warnings: &mut Vec<LintWarning>, category: LintCategory, message: String) {
    warnings.push(LintWarning { category, message });
}

// ── Targets ───────────────────────────────────────────────────────

fn check_targets(container: &ContainerResult, warnings: &mut Vec<LintWarning>) {
    for node in &container.nodes {
        for (attribute, anchor) in &node.anchors {
            let known = match &anchor.target {
                Target::Parent => true,
                Target::Node(id) => id != &node.id && container.node(id).is_some(),
                Target::Guideline(id) => container.guideline(id).is_some(),
            };
            if !known {
                warn(
                    warnings,
                    LintCategory::Dangling,
                    format!(
                        "\"{}\".{} points at \"{}\", which is not in container \"{}\"",
                        node.id, attribute, anchor.target, container.container_id
                    ),
                );
            }
            // a slot holding another attribute or node means two writers collided
            if *attribute != anchor.attribute || anchor.source != node.id {
                warn(
                    warnings,
                    LintCategory::Dangling,
                    format!(
                        "\"{}\".{} holds {}.{}",
                        node.id, attribute, anchor.source, anchor.attribute
                    ),
                );
            }
        }
    }
}

// ── Guidelines ────────────────────────────────────────────────────

fn check_guidelines(container: &ContainerResult, warnings: &mut Vec<LintWarning>) {
    let guides = &container.guidelines;
    for (i, a) in guides.iter().enumerate() {
        for b in &guides[i + 1..] {
            let same_value = match a.mode {
                GuideMode::Percent => same_at(a.value, b.value, PERCENT_ACCURACY),
                GuideMode::Absolute => within_fraction(a.value, b.value),
            };
            if a.orientation == b.orientation
                && a.mode == b.mode
                && a.opposite == b.opposite
                && same_value
            {
                warn(
                    warnings,
                    LintCategory::Guideline,
                    format!(
                        "guidelines \"{}\" and \"{}\" in \"{}\" describe the same line",
                        a.id, b.id, container.container_id
                    ),
                );
            }
        }
        if a.mode == GuideMode::Percent && !(0.0..=1.0).contains(&a.value) {
            warn(
                warnings,
                LintCategory::Guideline,
                format!("percent guideline \"{}\" has value {} outside 0..1", a.id, a.value),
            );
        }
    }
}

// ── Chains ────────────────────────────────────────────────────────

fn check_chains(container: &ContainerResult, warnings: &mut Vec<LintWarning>) {
    for axis in Axis::BOTH {
        let mut seen = HashSet::new();
        for chain in container.chains.iter().filter(|c| c.axis == axis) {
            for member in &chain.members {
                if !seen.insert(member.as_str()) {
                    warn(
                        warnings,
                        LintCategory::Chain,
                        format!("\"{}\" belongs to more than one {:?} chain", member, axis),
                    );
                }
            }
            if chain.members.len() < 2 {
                warn(
                    warnings,
                    LintCategory::Chain,
                    format!(
                        "{:?} chain in \"{}\" has a single member",
                        axis, container.container_id
                    ),
                );
            }
        }
    }
}

// ── Biases ────────────────────────────────────────────────────────

fn check_biases(container: &ContainerResult, warnings: &mut Vec<LintWarning>) {
    let in_range = |b: &Option<f64>| b.map_or(true, |b| (0.0..=1.0).contains(&b));
    for node in &container.nodes {
        for axis in Axis::BOTH {
            if !in_range(node.bias.get(axis)) {
                warn(
                    warnings,
                    LintCategory::Bias,
                    format!("\"{}\" has {:?} bias {:?}", node.id, axis, node.bias.get(axis)),
                );
            }
        }
    }
    for chain in &container.chains {
        if !in_range(&chain.bias) {
            warn(
                warnings,
                LintCategory::Bias,
                format!("chain headed by {:?} has bias {:?}", chain.head(), chain.bias),
            );
        }
    }
}

// ── Resolution ────────────────────────────────────────────────────

fn check_resolution(container: &ContainerResult, warnings: &mut Vec<LintWarning>) {
    for node in &container.nodes {
        for axis in Axis::BOTH {
            if !node.state.get(axis).is_resolved() || !node.has_axis_anchor(axis) {
                warn(
                    warnings,
                    LintCategory::Unresolved,
                    format!("\"{}\" is not pinned on the {:?} axis", node.id, axis),
                );
            }
        }
    }
}
