// src/error.rs
use thiserror::Error;

/// Failures of the jamo engine. Never escapes the morphological analyzer:
/// a token that fails decomposition is treated as non-Korean and passed through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HangulError {
    #[error("'{0}' is not a precomposed Hangul syllable (U+AC00..U+D7A3)")]
    InvalidSyllable(char),
    #[error("'{0}' is not a jamo valid in this position")]
    InvalidJamo(char),
}

/// Raised while loading or injecting dictionary partitions.
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("dictionary entry has an empty headword")]
    EmptyHeadword,
    #[error("dictionary entry '{headword}' has no senses")]
    NoSenses { headword: String },
    #[error("invalid sense in entry '{headword}': {reason}")]
    InvalidSense { headword: String, reason: String },
    #[error("malformed dictionary partition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("could not read dictionary partition: {0}")]
    Io(#[from] std::io::Error),
}

/// The only error the translation pipeline surfaces to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("input is empty or whitespace only")]
    EmptyInput,
}

/// Failures of the one-time initialization gate.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("the shared translator has already been initialized")]
    AlreadyInitialized,
    #[error("failed to build the dictionary: {0}")]
    Dictionary(#[from] DictionaryError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to encode or decode weights: {0}")]
    Encode(#[from] bincode::Error),
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}
