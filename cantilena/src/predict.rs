// Next-token prediction: the trait seam and the built-in n-gram model.
//
// The sampler only ever asks for `predict(context) -> probability vector`,
// so a neural sequence model trained elsewhere can sit behind the trait
// without the pipeline knowing. The built-in `NgramPredictor` keeps the
// pipeline self-contained: trained directly from the integer corpus during
// preprocessing, persisted as JSON, and used whenever no external model is
// wired in.
//
// The n-gram model uses Katz-style backoff: try the 3-token context, fall
// back to 2, then 1, then the unigram distribution. Backoff tables are
// "soft" statistics — smoothing beyond the unigram floor is deliberately
// absent, since the temperature rescale in the sampler already controls
// sharpness.

use crate::error::PipelineError;
use crate::vocab::TokenId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Next-token counts observed after one context.
/// Key: next token ID. Value: occurrence count.
type TransitionTable = BTreeMap<TokenId, f64>;

/// A next-token predictor over the vocabulary.
///
/// `predict` returns one probability per vocabulary entry, summing to 1.
/// The context is most-recent-last; implementations may consume any suffix
/// of it.
pub trait Predictor {
    fn vocab_size(&self) -> usize;
    fn predict(&self, context: &[TokenId]) -> Vec<f64>;
}

/// Backoff n-gram model over token IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NgramPredictor {
    vocab_size: usize,
    /// Order-3 transitions: (3-token context) -> next-token counts.
    order3: BTreeMap<String, TransitionTable>,
    /// Order-2 transitions.
    order2: BTreeMap<String, TransitionTable>,
    /// Order-1 transitions.
    order1: BTreeMap<String, TransitionTable>,
    /// Order-0 (unigram): overall token distribution.
    order0: TransitionTable,
}

impl NgramPredictor {
    /// An empty model: predicts uniformly until trained. Stands in when no
    /// model file exists yet, the way an untrained network would.
    pub fn untrained(vocab_size: usize) -> Self {
        NgramPredictor {
            vocab_size,
            order3: BTreeMap::new(),
            order2: BTreeMap::new(),
            order1: BTreeMap::new(),
            order0: TransitionTable::new(),
        }
    }

    /// Count transitions of orders 0 through 3 across the corpus.
    pub fn train(corpus: &[TokenId], vocab_size: usize) -> Self {
        let mut model = Self::untrained(vocab_size);
        for (i, &next) in corpus.iter().enumerate() {
            *model.order0.entry(next).or_insert(0.0) += 1.0;
            if i >= 1 {
                bump(&mut model.order1, &corpus[i - 1..i], next);
            }
            if i >= 2 {
                bump(&mut model.order2, &corpus[i - 2..i], next);
            }
            if i >= 3 {
                bump(&mut model.order3, &corpus[i - 3..i], next);
            }
        }
        model
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Save to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// The highest-order table with data for this context, unigram last.
    fn table_for(&self, context: &[TokenId]) -> &TransitionTable {
        if context.len() >= 3 {
            if let Some(table) = self.order3.get(&context_key(&context[context.len() - 3..])) {
                return table;
            }
        }
        if context.len() >= 2 {
            if let Some(table) = self.order2.get(&context_key(&context[context.len() - 2..])) {
                return table;
            }
        }
        if !context.is_empty() {
            if let Some(table) = self.order1.get(&context_key(&context[context.len() - 1..])) {
                return table;
            }
        }
        &self.order0
    }
}

impl Predictor for NgramPredictor {
    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn predict(&self, context: &[TokenId]) -> Vec<f64> {
        if self.vocab_size == 0 {
            return Vec::new();
        }
        let table = self.table_for(context);
        let total: f64 = table.values().sum();
        if total <= 0.0 {
            // Untrained: uniform over the vocabulary.
            return vec![1.0 / self.vocab_size as f64; self.vocab_size];
        }
        let mut probs = vec![0.0; self.vocab_size];
        for (&id, &count) in table {
            if let Some(slot) = probs.get_mut(id as usize) {
                *slot = count / total;
            }
        }
        probs
    }
}

fn bump(tables: &mut BTreeMap<String, TransitionTable>, context: &[TokenId], next: TokenId) {
    *tables
        .entry(context_key(context))
        .or_default()
        .entry(next)
        .or_insert(0.0) += 1.0;
}

/// Encode a context slice as a string key for BTreeMap lookup.
fn context_key(context: &[TokenId]) -> String {
    context
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sums_to_one(probs: &[f64]) {
        let total: f64 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "probabilities sum to {total}");
    }

    #[test]
    fn untrained_model_is_uniform() {
        let model = NgramPredictor::untrained(4);
        let probs = model.predict(&[0, 1, 2]);
        assert_eq!(probs, [0.25; 4]);
    }

    #[test]
    fn trained_model_follows_observed_transitions() {
        // 0 is always followed by 1 in this corpus.
        let model = NgramPredictor::train(&[0, 1, 0, 1, 0, 1], 2);
        let probs = model.predict(&[1, 0]);
        assert_sums_to_one(&probs);
        assert!(probs[1] > 0.99);
    }

    #[test]
    fn unseen_context_backs_off_to_unigram() {
        let model = NgramPredictor::train(&[0, 0, 0, 1], 3);
        // Context 2 never occurs: falls through to the unigram counts,
        // where 0 dominates 3:1 and 2 was never seen at all.
        let probs = model.predict(&[2]);
        assert_sums_to_one(&probs);
        assert!(probs[0] > probs[1]);
        assert_eq!(probs[2], 0.0);
    }

    #[test]
    fn longer_context_wins_over_shorter() {
        // After [0, 1] the corpus always continues with 2, even though 3
        // is globally more common.
        let corpus = [0, 1, 2, 3, 3, 3, 3, 0, 1, 2];
        let model = NgramPredictor::train(&corpus, 4);
        let probs = model.predict(&[0, 1]);
        assert!(probs[2] > 0.99);
    }

    #[test]
    fn empty_context_uses_unigram() {
        let model = NgramPredictor::train(&[0, 1, 1, 1], 2);
        let probs = model.predict(&[]);
        assert_sums_to_one(&probs);
        assert!(probs[1] > probs[0]);
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let model = NgramPredictor::train(&[0, 1, 2, 0, 1, 2], 3);

        model.save(&path).unwrap();
        let loaded = NgramPredictor::load(&path).unwrap();
        assert_eq!(model, loaded);
    }

    #[test]
    fn zero_vocab_predicts_nothing() {
        let model = NgramPredictor::untrained(0);
        assert!(model.predict(&[]).is_empty());
    }
}
