// File: src/persistence.rs
use crate::core::context::ScoringWeights;
use crate::core::dictionary::Partition;
use crate::core::types::DictionaryEntry;
use crate::error::PersistenceError;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Tuned weights as written by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightSnapshot {
    pub weights: ScoringWeights,
    /// WSD score the weights reached when they were saved.
    pub score: f64,
}

/// Writes `snapshot` next to `path` and renames it into place, so a crash
/// never leaves a half-written file behind.
pub fn save_weights(snapshot: &WeightSnapshot, path: &Path) -> Result<(), PersistenceError> {
    let parent_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    let writer = BufWriter::new(&temp_file);
    bincode::serialize_into(writer, snapshot)?;

    temp_file.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), score = snapshot.score, "weights saved");
    Ok(())
}

pub fn load_weights(path: &Path) -> Result<WeightSnapshot, PersistenceError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(bincode::deserialize_from(reader)?)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntryFile {
    Partition(Partition),
    Entries(Vec<DictionaryEntry>),
}

/// Reads host-supplied dictionary entries: either a partition object
/// (`{"partition": .., "entries": [..]}`) or a bare array of entries.
pub fn load_entries(path: &Path) -> Result<Vec<DictionaryEntry>, PersistenceError> {
    let contents = fs::read_to_string(path)?;
    let entries = match serde_json::from_str::<EntryFile>(&contents)? {
        EntryFile::Partition(p) => p.into_entries(),
        EntryFile::Entries(e) => e,
    };
    debug!(path = %path.display(), entries = entries.len(), "entries loaded");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn weights_survive_a_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("weights.bin");
        let snapshot = WeightSnapshot {
            weights: ScoringWeights { domain_match: 2.25, ..ScoringWeights::default() },
            score: 0.875,
        };
        save_weights(&snapshot, &path).unwrap();
        assert_eq!(load_weights(&path).unwrap(), snapshot);
    }

    #[test]
    fn missing_weights_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_weights(&dir.path().join("none.bin")), Err(PersistenceError::Io(_))));
    }

    #[test]
    fn reads_partition_and_bare_entry_files() {
        let mut partition = NamedTempFile::new().unwrap();
        write!(
            partition,
            r#"{{"partition": "host", "domain": "food", "entries": [{{"headword": "김밥", "senses": [{{"gloss": "gimbap", "pos": "noun"}}]}}]}}"#
        )
        .unwrap();
        let entries = load_entries(partition.path()).unwrap();
        assert_eq!(entries[0].headword, "김밥");
        assert!(entries[0].senses[0].has_tag("food"));

        let mut bare = NamedTempFile::new().unwrap();
        write!(bare, r#"[{{"headword": "떡볶이", "senses": [{{"gloss": "tteokbokki", "pos": "noun"}}]}}]"#).unwrap();
        assert_eq!(load_entries(bare.path()).unwrap().len(), 1);
    }
}
