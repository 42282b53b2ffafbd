//! Error types for the anchoring engine

use serde::Serialize;
use thiserror::Error;

/// Errors that stop a single container pass
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryError {
    /// A box in the container has unusable geometry
    #[error("invalid geometry for '{node}' in container '{container}': {reason}")]
    InvalidGeometry {
        container: String,
        node: String,
        reason: String,
    },
}

impl GeometryError {
    /// Create an invalid geometry error
    pub fn invalid(
        container: impl Into<String>,
        node: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidGeometry {
            container: container.into(),
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// The container whose pass was skipped
    pub fn container(&self) -> &str {
        match self {
            Self::InvalidGeometry { container, .. } => container,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_geometry_display() {
        let err = GeometryError::invalid("body", "hero", "negative width -4");
        let message = err.to_string();
        assert!(message.contains("'hero'"));
        assert!(message.contains("'body'"));
        assert!(message.contains("negative width"));
        assert_eq!(err.container(), "body");
    }
}
