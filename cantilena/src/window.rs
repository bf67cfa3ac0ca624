// Sliding-window training pairs from the integer corpus.
//
// The corpus is one long ID sequence (songs joined by delimiter runs). A
// window of `sequence_length` IDs slides across it with stride 1; the
// target is always the single ID immediately following the window. One-hot
// expansion over the vocabulary is the model trainer's job, not ours —
// pairs stay as plain IDs.

use crate::vocab::TokenId;
use serde::{Deserialize, Serialize};

/// One training sample: a fixed-length window and the ID that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPair {
    pub window: Vec<TokenId>,
    pub target: TokenId,
}

/// Slide a `sequence_length` window across the corpus with stride 1.
///
/// Produces exactly `corpus.len() - sequence_length` pairs; a corpus no
/// longer than the window (or a zero-length window) produces none.
pub fn training_pairs(corpus: &[TokenId], sequence_length: usize) -> Vec<TrainingPair> {
    if sequence_length == 0 || corpus.len() <= sequence_length {
        return Vec::new();
    }
    (0..corpus.len() - sequence_length)
        .map(|i| TrainingPair {
            window: corpus[i..i + sequence_length].to_vec(),
            target: corpus[i + sequence_length],
        })
        .collect()
}
