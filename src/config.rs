use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine tuning, loadable from TOML.
///
/// ```toml
/// shuffle_attempts = 100
/// auto_shuffle = true
/// seed = 514514
/// score_per_match = 100
/// hint_charges = 3
/// shuffle_charges = 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Permutations tried per shuffle before giving up.
    pub shuffle_attempts: u32,
    /// Shuffle for free when a match leaves no legal move.
    pub auto_shuffle: bool,
    /// RNG seed for shuffles and parity respawns; entropy when absent.
    pub seed: Option<u64>,
    pub score_per_match: u32,
    pub hint_charges: u32,
    pub shuffle_charges: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            shuffle_attempts: 100,
            auto_shuffle: true,
            seed: None,
            score_per_match: 100,
            hint_charges: 3,
            shuffle_charges: 3,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shuffle_attempts == 0 {
            return Err(ConfigError::Validation(
                "shuffle_attempts must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml("seed = 7\nhint_charges = 10\n").unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.hint_charges, 10);
        assert_eq!(config.shuffle_attempts, 100);
        assert!(config.auto_shuffle);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = EngineConfig::from_toml("shuffle_attempts = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = EngineConfig::from_toml("seed = \"abc\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = EngineConfig::load_or_default(Path::new("no/such/engine.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
