// Symbol-to-integer vocabulary mapping.
//
// Built once from the full corpus, persisted as a JSON object of
// token -> ID, and loaded read-only for both training and inference.
// Build order is canonical — tokens are sorted lexicographically before
// IDs are assigned — so two builds from the same corpus produce identical
// mappings, and a mapping built today matches one built at training time.
//
// Lookup is dual-indexed: a Vec gives O(1) ID -> token, a HashMap gives
// token -> ID. Asking for a token the build never saw is an
// `UnknownSymbol` error, not a silent drop: it means the caller is mixing
// vocabularies or feeding unvetted input.

use crate::error::PipelineError;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Dense integer ID assigned to a vocabulary token.
pub type TokenId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    /// Token string for each ID (index = ID), lexicographically ordered.
    tokens: Vec<String>,
    /// Reverse index, token -> ID.
    ids: HashMap<String, TokenId>,
}

impl Vocabulary {
    /// Build a vocabulary from a whitespace-joined token corpus.
    pub fn build(corpus: &str) -> Self {
        let mut distinct: Vec<&str> = corpus.split_whitespace().collect();
        distinct.sort_unstable();
        distinct.dedup();
        Self::from_tokens(distinct.into_iter().map(str::to_string).collect())
    }

    fn from_tokens(tokens: Vec<String>) -> Self {
        let ids = tokens
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as TokenId))
            .collect();
        Vocabulary { tokens, ids }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.ids.contains_key(token)
    }

    /// The ID for a token seen at build time.
    pub fn id(&self, token: &str) -> Result<TokenId, PipelineError> {
        self.ids
            .get(token)
            .copied()
            .ok_or_else(|| PipelineError::UnknownSymbol {
                token: token.to_string(),
            })
    }

    /// The token for an ID, `None` when out of range.
    pub fn token(&self, id: TokenId) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    /// Map a whitespace-joined token string to IDs, failing on the first
    /// unknown token.
    pub fn encode_text(&self, text: &str) -> Result<Vec<TokenId>, PipelineError> {
        text.split_whitespace().map(|token| self.id(token)).collect()
    }

    /// Persist as a JSON object of token -> ID.
    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        let map: BTreeMap<&str, TokenId> = self
            .tokens
            .iter()
            .enumerate()
            .map(|(id, token)| (token.as_str(), id as TokenId))
            .collect();
        let json = serde_json::to_string_pretty(&map)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a persisted mapping, validating that the IDs form a dense
    /// 0..n bijection.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let data = std::fs::read_to_string(path)?;
        let map: BTreeMap<String, TokenId> = serde_json::from_str(&data)?;
        Self::from_map(map)
    }

    fn from_map(map: BTreeMap<String, TokenId>) -> Result<Self, PipelineError> {
        let mut slots: Vec<Option<String>> = vec![None; map.len()];
        for (token, id) in map {
            let Some(slot) = slots.get_mut(id as usize) else {
                return Err(PipelineError::VocabCorrupt {
                    reason: format!("id {id} out of range for {} tokens", slots.len()),
                });
            };
            if slot.is_some() {
                return Err(PipelineError::VocabCorrupt {
                    reason: format!("duplicate id {id}"),
                });
            }
            *slot = Some(token);
        }
        let tokens = slots
            .into_iter()
            .enumerate()
            .map(|(id, slot)| {
                slot.ok_or_else(|| PipelineError::VocabCorrupt {
                    reason: format!("missing id {id}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_tokens(tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_is_deterministic() {
        let corpus = "60 _ _ r 62 / 60 r";
        let a = Vocabulary::build(corpus);
        let b = Vocabulary::build(corpus);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn ids_follow_lexicographic_token_order() {
        let vocab = Vocabulary::build("r 62 60 _ /");
        // Sorted: "/", "60", "62", "_", "r"
        assert_eq!(vocab.id("/").unwrap(), 0);
        assert_eq!(vocab.id("60").unwrap(), 1);
        assert_eq!(vocab.id("62").unwrap(), 2);
        assert_eq!(vocab.id("_").unwrap(), 3);
        assert_eq!(vocab.id("r").unwrap(), 4);
    }

    #[test]
    fn reverse_lookup_inverts_forward_lookup() {
        let vocab = Vocabulary::build("60 r _ /");
        for token in ["60", "r", "_", "/"] {
            let id = vocab.id(token).unwrap();
            assert_eq!(vocab.token(id), Some(token));
        }
        assert_eq!(vocab.token(99), None);
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let vocab = Vocabulary::build("60 r _ /");
        let err = vocab.id("61").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnknownSymbol { token } if token == "61"
        ));
        assert!(vocab.encode_text("60 61").is_err());
    }

    #[test]
    fn encode_text_maps_every_token() {
        let vocab = Vocabulary::build("/ 60 r _");
        let ids = vocab.encode_text("60 _ _ r /").unwrap();
        assert_eq!(ids.len(), 5);
        assert_eq!(vocab.token(ids[0]), Some("60"));
        assert_eq!(vocab.token(ids[4]), Some("/"));
    }

    #[test]
    fn save_load_roundtrip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        let vocab = Vocabulary::build("60 62 64 r _ /");

        vocab.save(&path).unwrap();
        let loaded = Vocabulary::load(&path).unwrap();
        assert_eq!(vocab, loaded);
    }

    #[test]
    fn load_rejects_sparse_or_duplicated_ids() {
        let dir = tempfile::tempdir().unwrap();

        let sparse = dir.path().join("sparse.json");
        std::fs::write(&sparse, r#"{ "60": 0, "r": 2 }"#).unwrap();
        assert!(matches!(
            Vocabulary::load(&sparse).unwrap_err(),
            PipelineError::VocabCorrupt { .. }
        ));

        let duplicated = dir.path().join("dup.json");
        std::fs::write(&duplicated, r#"{ "60": 0, "r": 0 }"#).unwrap();
        assert!(matches!(
            Vocabulary::load(&duplicated).unwrap_err(),
            PipelineError::VocabCorrupt { .. }
        ));
    }
}
