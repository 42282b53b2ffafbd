//! Replay verification
//!
//! Rebuilds every converted container as a Cassowary system and checks that
//! the anchors reproduce the measured geometry. Each child contributes one
//! variable per axis for its near edge; extents stay fixed, the container and
//! its guides are constants, and every anchor becomes a strong equality.

use std::collections::HashMap;

use kasuari::{Expression, Solver, Strength, Variable, WeightedRelation::*};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::snapshot::{Axis, BoxNode, Snapshot};

use super::engine::{ContainerResult, ConversionResult, Frame};
use super::types::*;

/// Errors from rebuilding a container in the constraint solver
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Unsatisfiable anchor in container '{container}': {anchor}")]
    Unsatisfiable { container: String, anchor: String },

    #[error("Container '{0}' is not part of the snapshot")]
    UnknownContainer(String),

    #[error("Internal solver error: {0}")]
    Internal(String),
}

/// A child whose replayed position differs from the snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deviation {
    pub container: String,
    pub node: String,
    pub axis: Axis,
    pub expected: f64,
    pub actual: f64,
}

impl std::fmt::Display for Deviation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' in '{}' lands at {} instead of {} on the {:?} axis",
            self.node, self.container, self.actual, self.expected, self.axis
        )
    }
}

/// Replay every converted container, collecting positions off by more than `tolerance`
pub fn verify(
    snapshot: &Snapshot,
    result: &ConversionResult,
    tolerance: f64,
) -> Result<Vec<Deviation>, SolverError> {
    let mut deviations = Vec::new();
    for container in &result.containers {
        let node = snapshot
            .find(&container.container_id)
            .ok_or_else(|| SolverError::UnknownContainer(container.container_id.clone()))?;
        deviations.extend(Replay::new(node, container).run(tolerance)?);
    }
    Ok(deviations)
}

/// Where an anchor's target edge sits
enum Reference {
    Fixed(f64),
    Edge(Expression),
}

struct Replay<'a> {
    container: &'a BoxNode,
    result: &'a ContainerResult,
    frame: Frame,
    solver: Solver,
    /// Near-edge variables per child, horizontal then vertical
    variables: Vec<AxisPair<Variable>>,
    index: HashMap<&'a str, usize>,
}

impl<'a> Replay<'a> {
    fn new(container: &'a BoxNode, result: &'a ContainerResult) -> Self {
        Self {
            container,
            result,
            frame: Frame::of(container),
            solver: Solver::new(),
            variables: container
                .children
                .iter()
                .map(|_| AxisPair {
                    horizontal: Variable::new(),
                    vertical: Variable::new(),
                })
                .collect(),
            index: container
                .children
                .iter()
                .enumerate()
                .map(|(i, c)| (c.id.as_str(), i))
                .collect(),
        }
    }

    /// Expression for a child's edge in terms of its near-edge variable
    fn edge(&self, i: usize, axis: Axis, edge: Edge) -> Expression {
        let child = &self.container.children[i];
        let linear = child.linear();
        let shift = match edge {
            Edge::Near => 0.0,
            Edge::Far => linear.extent(axis),
            Edge::Baseline => child.baseline_y() - linear.near(axis),
        };
        *self.variables[i].get(axis) + shift
    }

    fn reference(&self, target: &Target, axis: Axis, edge: Edge) -> Option<Reference> {
        match target {
            Target::Parent => Some(Reference::Fixed(match edge {
                Edge::Far => self.frame.content.far(axis),
                Edge::Near | Edge::Baseline => self.frame.content.near(axis),
            })),
            Target::Node(id) => self
                .index
                .get(id.as_str())
                .map(|&j| Reference::Edge(self.edge(j, axis, edge))),
            Target::Guideline(id) => self
                .result
                .guideline(id)
                .map(|g| Reference::Fixed(g.position(&self.frame))),
        }
    }

    fn add_anchor(&mut self, i: usize, anchor: &Anchor) -> Result<(), SolverError> {
        let attribute = anchor.attribute;
        // dangling targets are reported by lint
        let reference = self.reference(&anchor.target, anchor.axis, attribute.target_edge());
        let Some(reference) = reference else {
            return Ok(());
        };
        let source = self.edge(i, anchor.axis, attribute.source_edge());
        let constraint = match reference {
            Reference::Fixed(value) => source | EQ(Strength::STRONG) | value + anchor.offset,
            Reference::Edge(target) => source | EQ(Strength::STRONG) | target + anchor.offset,
        };
        self.solver.add_constraint(constraint).map_err(|e| match e {
            kasuari::AddConstraintError::UnsatisfiableConstraint => SolverError::Unsatisfiable {
                container: self.container.id.clone(),
                anchor: format!("{}.{} -> {}", anchor.source, attribute, anchor.target),
            },
            kasuari::AddConstraintError::DuplicateConstraint => SolverError::Internal(format!(
                "Duplicate constraint: {}.{}",
                anchor.source, attribute
            )),
            kasuari::AddConstraintError::InternalSolverError(msg) => {
                SolverError::Internal(msg.to_string())
            }
        })
    }

    fn run(mut self, tolerance: f64) -> Result<Vec<Deviation>, SolverError> {
        let result = self.result;
        for node in &result.nodes {
            let Some(&i) = self.index.get(node.id.as_str()) else {
                continue;
            };
            for anchor in node.anchors.values() {
                self.add_anchor(i, anchor)?;
            }
        }

        let values: HashMap<Variable, f64> = self.solver.fetch_changes().iter().copied().collect();
        let mut deviations = Vec::new();
        for (i, child) in self.container.children.iter().enumerate() {
            for axis in Axis::BOTH {
                let expected = child.linear().near(axis);
                let actual = values.get(self.variables[i].get(axis)).copied().unwrap_or(0.0);
                if (actual - expected).abs() > tolerance {
                    deviations.push(Deviation {
                        container: self.container.id.clone(),
                        node: child.id.clone(),
                        axis,
                        expected,
                        actual,
                    });
                }
            }
        }
        debug!(container = %self.container.id, deviations = deviations.len(), "replayed container");
        Ok(deviations)
    }
}

#[cfg(test)]
mod tests {
    use crate::anchor::engine::{convert_tree, IdSequence};
    use crate::config::AnchorConfig;
    use crate::snapshot::Rect;

    use super::*;

    fn converted(root: BoxNode) -> (Snapshot, ConversionResult) {
        let snapshot = Snapshot::new(root);
        let mut ids = IdSequence::new("guideline_");
        let result = convert_tree(&snapshot, &AnchorConfig::default(), &mut ids);
        (snapshot, result)
    }

    #[test]
    fn test_row_replays_exactly() {
        let (snapshot, result) = converted(
            BoxNode::new("row", Rect::new(0.0, 0.0, 300.0, 100.0)).with_children(vec![
                BoxNode::new("a", Rect::new(0.0, 0.0, 100.0, 100.0)),
                BoxNode::new("b", Rect::new(100.0, 0.0, 200.0, 100.0)),
                BoxNode::new("c", Rect::new(200.0, 0.0, 300.0, 100.0)),
            ]),
        );
        let deviations = verify(&snapshot, &result, 0.5).unwrap();
        assert!(deviations.is_empty(), "{deviations:?}");
    }

    #[test]
    fn test_missing_anchor_is_reported() {
        let (snapshot, mut result) = converted(
            BoxNode::new("box", Rect::new(0.0, 0.0, 200.0, 200.0))
                .with_children(vec![BoxNode::new("mid", Rect::new(50.0, 50.0, 150.0, 150.0))]),
        );
        result.containers[0].nodes[0].anchors.clear();

        let deviations = verify(&snapshot, &result, 0.5).unwrap();
        assert_eq!(deviations.len(), 2);
        assert_eq!(deviations[0].node, "mid");
        assert_eq!(deviations[0].expected, 50.0);
        assert_eq!(deviations[0].actual, 0.0);
    }

    #[test]
    fn test_unknown_container_is_an_error() {
        let (_, result) = converted(
            BoxNode::new("box", Rect::new(0.0, 0.0, 10.0, 10.0))
                .with_children(vec![BoxNode::new("leaf", Rect::new(0.0, 0.0, 10.0, 10.0))]),
        );
        let other = Snapshot::new(BoxNode::new("elsewhere", Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(matches!(
            verify(&other, &result, 0.5),
            Err(SolverError::UnknownContainer(id)) if id == "box"
        ));
    }
}
