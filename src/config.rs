//! Retrieval configuration — every tunable the orchestration core consults.
//!
//! Thresholds and ceilings live here as named values so tests can exercise
//! boundary behavior directly instead of fighting magic numbers. A config
//! can be loaded from YAML or built in code; `RetrievalConfig::default()`
//! matches the tuning the system shipped with.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Default number of prior turns kept per conversation.
pub const DEFAULT_CONTEXT_WINDOW: usize = 3;

/// Default result ceilings per tier (quick / standard / deep).
pub const DEFAULT_QUICK_CEILING: usize = 15;
pub const DEFAULT_STANDARD_CEILING: usize = 50;
pub const DEFAULT_DEEP_CEILING: usize = 100;

/// Default minimum top-k mean similarity before a tier is considered confident.
pub const DEFAULT_VECTOR_CONFIDENCE_FLOOR: f32 = 0.45;

/// Default k for the top-k mean confidence signal.
pub const DEFAULT_CONFIDENCE_TOP_K: usize = 10;

/// Default distance at which a vector hit is treated as fully irrelevant.
/// Similarity is normalized as `1 - distance / max_distance`, clamped to [0,1].
pub const DEFAULT_MAX_DISTANCE: f32 = 1.5;

/// Default upper bound on a single adapter call.
pub const DEFAULT_ADAPTER_TIMEOUT_MS: u64 = 10_000;

/// Default cap on items rendered into the generation context block.
pub const DEFAULT_MAX_RENDERED_ITEMS: usize = 20;

/// Per-tier result-count ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TierCeilings {
    pub quick: usize,
    pub standard: usize,
    pub deep: usize,
}

impl Default for TierCeilings {
    fn default() -> Self {
        Self {
            quick: DEFAULT_QUICK_CEILING,
            standard: DEFAULT_STANDARD_CEILING,
            deep: DEFAULT_DEEP_CEILING,
        }
    }
}

/// Configuration for one retrieval orchestration core.
///
/// All fields have serde defaults, so a YAML file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Prior turns retained per conversation (oldest dropped first).
    pub context_window: usize,
    /// Result-count ceilings per tier.
    pub tier_ceilings: TierCeilings,
    /// Minimum top-k mean similarity; below this a tier escalates.
    pub vector_confidence_floor: f32,
    /// How many of the best-scoring vector hits feed the confidence signal.
    pub confidence_top_k: usize,
    /// Distance at which similarity bottoms out at 0.
    pub max_distance: f32,
    /// Upper bound on a single adapter call, in milliseconds.
    pub adapter_timeout_ms: u64,
    /// Cap on items rendered into the generation context block.
    pub max_rendered_items: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            tier_ceilings: TierCeilings::default(),
            vector_confidence_floor: DEFAULT_VECTOR_CONFIDENCE_FLOOR,
            confidence_top_k: DEFAULT_CONFIDENCE_TOP_K,
            max_distance: DEFAULT_MAX_DISTANCE,
            adapter_timeout_ms: DEFAULT_ADAPTER_TIMEOUT_MS,
            max_rendered_items: DEFAULT_MAX_RENDERED_ITEMS,
        }
    }
}

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl RetrievalConfig {
    /// Load from a YAML file and validate.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parse from a YAML string and validate.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency.
    ///
    /// Tier ceilings must be strictly increasing so escalation always
    /// widens the search; the confidence floor must be a valid similarity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.tier_ceilings;
        if !(c.quick < c.standard && c.standard < c.deep) {
            return Err(ConfigError::Invalid(format!(
                "tier ceilings must be strictly increasing, got {}/{}/{}",
                c.quick, c.standard, c.deep
            )));
        }
        if !(0.0..=1.0).contains(&self.vector_confidence_floor) {
            return Err(ConfigError::Invalid(format!(
                "vector_confidence_floor must be in [0,1], got {}",
                self.vector_confidence_floor
            )));
        }
        if self.confidence_top_k == 0 {
            return Err(ConfigError::Invalid("confidence_top_k must be > 0".into()));
        }
        if self.max_distance <= 0.0 {
            return Err(ConfigError::Invalid("max_distance must be > 0".into()));
        }
        if self.context_window == 0 {
            return Err(ConfigError::Invalid("context_window must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RetrievalConfig::default().validate().is_ok());
    }

    #[test]
    fn yaml_overrides_only_named_fields() {
        let config = RetrievalConfig::from_yaml_str(
            "vector_confidence_floor: 0.6\ncontext_window: 5\n",
        )
        .unwrap();
        assert_eq!(config.vector_confidence_floor, 0.6);
        assert_eq!(config.context_window, 5);
        // Unnamed fields keep their defaults
        assert_eq!(config.tier_ceilings.quick, DEFAULT_QUICK_CEILING);
    }

    #[test]
    fn non_increasing_ceilings_rejected() {
        let config = RetrievalConfig::from_yaml_str(
            "tier_ceilings:\n  quick: 50\n  standard: 50\n  deep: 100\n",
        );
        assert!(matches!(config, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn out_of_range_floor_rejected() {
        let config = RetrievalConfig::from_yaml_str("vector_confidence_floor: 1.5\n");
        assert!(matches!(config, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn unknown_fields_rejected() {
        let config = RetrievalConfig::from_yaml_str("no_such_field: 1\n");
        assert!(matches!(config, Err(ConfigError::Parse(_))));
    }
}
