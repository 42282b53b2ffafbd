//! Constraint anchoring engine
//!
//! This module takes a measured box tree and re-expresses every container's
//! children as relative anchors, guidelines and chains.

pub mod bias;
mod chain;
mod conflict;
pub mod engine;
pub mod error;
mod guideline;
pub mod lint;
mod resolver;
pub mod solver;
pub mod tolerance;
pub mod types;

pub use bias::bias;
pub use engine::{convert_tree, ContainerResult, ConversionResult, Frame, IdSequence};
pub use error::GeometryError;
pub use lint::{LintCategory, LintWarning};
pub use solver::{verify, Deviation, SolverError};
pub use types::*;
