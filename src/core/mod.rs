pub mod context;
pub mod dictionary;
pub mod engine;
pub mod grammar;
pub mod jamo;
pub mod morphology;
pub mod spacing;
pub mod trie;
pub mod types;
