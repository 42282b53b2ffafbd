//! Configuration for the anchoring engine

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Most decimal digits an f64 coordinate can meaningfully carry
pub const MAX_ACCURACY: u32 = 15;

/// Configuration options for anchor resolution
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Extra pixel slack on top of fractional edge matching
    pub edge_tolerance: f64,

    /// Decimal digits kept for percent guides and biases
    pub accuracy: u32,

    /// Whether block containers may group siblings into chains
    pub chains_enabled: bool,

    /// Largest inter-member gap that still counts as a packed chain
    pub chain_gap_threshold: f64,

    /// Distance from 0.5 at which a bias counts as centered
    pub center_tolerance: f64,

    /// Prefix for synthesized guideline ids
    pub guideline_prefix: String,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            edge_tolerance: 0.0,
            accuracy: 4,
            chains_enabled: true,
            chain_gap_threshold: 1.0,
            center_tolerance: 0.01,
            guideline_prefix: "guideline_".to_string(),
        }
    }
}

impl AnchorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string; missing keys keep defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        if config.accuracy > MAX_ACCURACY {
            return Err(ConfigError::InvalidValue(format!(
                "accuracy {} exceeds {} digits",
                config.accuracy, MAX_ACCURACY
            )));
        }
        Ok(config)
    }

    /// Set the extra pixel slack for edge matching
    pub fn with_edge_tolerance(mut self, tolerance: f64) -> Self {
        self.edge_tolerance = tolerance;
        self
    }

    /// Set the rounding digits, capped at [`MAX_ACCURACY`]
    pub fn with_accuracy(mut self, digits: u32) -> Self {
        self.accuracy = digits.min(MAX_ACCURACY);
        self
    }

    /// Enable or disable chain grouping in block containers
    pub fn with_chains(mut self, enabled: bool) -> Self {
        self.chains_enabled = enabled;
        self
    }

    /// Set the largest gap of a packed chain
    pub fn with_chain_gap_threshold(mut self, threshold: f64) -> Self {
        self.chain_gap_threshold = threshold;
        self
    }

    /// Set the distance from 0.5 that still counts as centered
    pub fn with_center_tolerance(mut self, tolerance: f64) -> Self {
        self.center_tolerance = tolerance;
        self
    }

    /// Set the prefix of synthesized guideline ids
    pub fn with_guideline_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.guideline_prefix = prefix.into();
        self
    }
}
