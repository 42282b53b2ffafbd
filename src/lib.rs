//! Anchorage - relative constraints from measured layouts
//!
//! This library takes a snapshot of already laid-out boxes and produces the
//! anchors, guidelines and chains a constraint-based layout needs to
//! reproduce the same geometry.
//!
//! # Example
//!
//! ```rust
//! use anchorage::{convert_str, ConvertConfig};
//!
//! let json = r#"{"root": {
//!     "id": "page",
//!     "bounds": {"left": 0, "top": 0, "right": 200, "bottom": 200},
//!     "children": [
//!         {"id": "card", "bounds": {"left": 50, "top": 50, "right": 150, "bottom": 150}}
//!     ]
//! }}"#;
//! let result = convert_str(json, &ConvertConfig::default()).unwrap();
//! assert_eq!(result.node("card").unwrap().anchors.len(), 4);
//! ```

pub mod anchor;
pub mod config;
pub mod error;
pub mod snapshot;

pub use anchor::{ConversionResult, GeometryError, IdSequence};
pub use config::AnchorConfig;
pub use error::{ConfigError, SnapshotError};
pub use snapshot::{BoxNode, Snapshot};

use std::path::Path;

use thiserror::Error;
use tracing::debug;

/// Errors that can occur during the conversion pipeline
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The snapshot could not be loaded
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Configuration for the complete conversion pipeline
#[derive(Debug, Clone, Default)]
pub struct ConvertConfig {
    /// Anchoring options
    pub anchors: AnchorConfig,
    /// Debug mode: log the anchor listing of every container
    pub debug: bool,
}

impl ConvertConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the anchoring configuration
    pub fn with_anchors(mut self, config: AnchorConfig) -> Self {
        self.anchors = config;
        self
    }

    /// Enable or disable debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Convert a snapshot with default configuration
pub fn convert(snapshot: &Snapshot) -> ConversionResult {
    convert_with_config(snapshot, &ConvertConfig::default())
}

/// Convert a snapshot with custom configuration
///
/// Every call gets a fresh guideline id sequence, so independent runs
/// produce identical ids. Guide ids never reuse a box id from the snapshot.
pub fn convert_with_config(snapshot: &Snapshot, config: &ConvertConfig) -> ConversionResult {
    let mut ids =
        IdSequence::new(config.anchors.guideline_prefix.clone()).with_taken(snapshot.ids());
    let result = anchor::convert_tree(snapshot, &config.anchors, &mut ids);

    if config.debug {
        debug!("anchor listing:\n{}", result.dump());
    }
    result
}

/// Parse a JSON snapshot and convert it
pub fn convert_str(json: &str, config: &ConvertConfig) -> Result<ConversionResult, ConvertError> {
    let snapshot = Snapshot::from_json(json)?;
    Ok(convert_with_config(&snapshot, config))
}

/// Load a JSON snapshot file and convert it
pub fn convert_file(path: &Path, config: &ConvertConfig) -> Result<ConversionResult, ConvertError> {
    let snapshot = Snapshot::from_file(path)?;
    Ok(convert_with_config(&snapshot, config))
}
