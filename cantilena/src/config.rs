// Pipeline configuration.
//
// All file locations and pipeline constants travel in one explicit struct
// handed to whatever needs them — nothing in the library consults globals
// or hardcoded paths. The defaults describe a self-contained layout under
// the working directory; the binaries override individual fields from
// flags.

use crate::encode::DEFAULT_TIME_STEP;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Training-time sequence length: 64 sixteenth-note steps = 4 bars of 4/4.
pub const DEFAULT_SEQUENCE_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory of raw score JSON files (searched recursively).
    pub dataset_dir: PathBuf,
    /// Directory for per-song encoded token files.
    pub encoded_dir: PathBuf,
    /// The single-file corpus: every song, delimiter-joined.
    pub corpus_path: PathBuf,
    /// Vocabulary mapping JSON.
    pub mapping_path: PathBuf,
    /// Built-in n-gram model JSON.
    pub model_path: PathBuf,
    /// Where `generate` writes its MIDI output.
    pub output_path: PathBuf,
    /// Time steps per training window (and delimiter-run length).
    pub sequence_length: usize,
    /// Quarter-lengths per encoded time step.
    pub time_step: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            dataset_dir: PathBuf::from("dataset"),
            encoded_dir: PathBuf::from("encoded"),
            corpus_path: PathBuf::from("file_dataset.txt"),
            mapping_path: PathBuf::from("mapping.json"),
            model_path: PathBuf::from("model.json"),
            output_path: PathBuf::from("melody.mid"),
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            time_step: DEFAULT_TIME_STEP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_standard_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.sequence_length, 64);
        assert_eq!(config.time_step, 0.25);
        assert_eq!(config.mapping_path, PathBuf::from("mapping.json"));
    }

    #[test]
    fn serde_roundtrip() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
