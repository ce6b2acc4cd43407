//! Generator configuration

use crate::error::TranslationError;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Options for one translation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenConfig {
    /// Translate function bodies on the rayon thread pool
    #[serde(default)]
    pub parallel: bool,
    /// Reject explicit local IDs that do not follow the implicit numbering.
    /// When off, numeric local names only identify the local inside the
    /// input and are renumbered on output.
    #[serde(default = "default_true")]
    pub strict_local_ids: bool,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            strict_local_ids: true,
        }
    }
}

impl GenConfig {
    pub fn parallel() -> Self {
        Self {
            parallel: true,
            ..Self::default()
        }
    }

    /// Load a configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, TranslationError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = GenConfig::from_json(r#"{ "parallel": true }"#).unwrap();
        assert!(config.parallel);
        assert!(config.strict_local_ids);
        assert_eq!(GenConfig::from_json("{}").unwrap(), GenConfig::default());
        assert!(GenConfig::from_json("[]").is_err());
    }
}
