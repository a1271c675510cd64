// src/lib.rs

pub mod benchmark;
pub mod c_api;
pub mod config;
pub mod core;
pub mod error;
pub mod learning;
pub mod persistence;

pub use crate::config::{load_config_from_file, TranslatorConfig};
pub use crate::core::context::{EntityTracker, ScoringWeights};
pub use crate::core::dictionary::{DictionaryBuilder, DictionaryStore, InjectionReport};
pub use crate::core::engine::{inject_dictionary_data, init_shared, shared, Translator};
pub use crate::core::types::{
    Direction, DictionaryEntry, Formality, Sense, TranslateOptions, TranslationResult, Warning,
};
pub use crate::error::{ConfigError, DictionaryError, InitError, PersistenceError, TranslateError};
