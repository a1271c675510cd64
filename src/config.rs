// File: src/config.rs
use crate::core::context::ScoringWeights;
use crate::core::jamo::TYPO_THRESHOLD;
use crate::core::spacing::MAX_WORD_LEN;
use crate::core::types::Formality;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables of a [`crate::Translator`]. Every key is optional in the TOML
/// file; missing ones keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Jamo distance under which two words count as the same word, mistyped.
    pub typo_threshold: f64,
    /// Words on each side of a polysemous word that score as near context.
    pub context_window: usize,
    /// Entities remembered for subject restoration and pronoun resolution.
    pub entity_window: usize,
    /// Longest word, in syllables, tried by spacing recovery.
    pub max_word_len: usize,
    pub default_formality: Formality,
    pub weights: ScoringWeights,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            typo_threshold: TYPO_THRESHOLD,
            context_window: 3,
            entity_window: 5,
            max_word_len: MAX_WORD_LEN,
            default_formality: Formality::Neutral,
            weights: ScoringWeights::default(),
        }
    }
}

impl TranslatorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

pub fn load_config_from_file(path: impl AsRef<Path>) -> Result<TranslatorConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    TranslatorConfig::from_toml_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_keys_keep_defaults() {
        let config = TranslatorConfig::from_toml_str("context_window = 5\n[weights]\ndomain_match = 2.0\n").unwrap();
        assert_eq!(config.context_window, 5);
        assert_eq!(config.typo_threshold, 1.5);
        assert_eq!(config.weights.domain_match, 2.0);
        assert_eq!(config.weights.immediate_after, 4.0);
        assert_eq!(config.default_formality, Formality::Neutral);
    }

    #[test]
    fn reads_formality_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_formality = \"formal\"").unwrap();
        let config = load_config_from_file(file.path()).unwrap();
        assert_eq!(config.default_formality, Formality::Formal);
    }

    #[test]
    fn rejects_bad_toml() {
        assert!(matches!(TranslatorConfig::from_toml_str("context_window = \"x\""), Err(ConfigError::Parse(_))));
    }
}
