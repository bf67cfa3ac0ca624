// Error taxonomy for the pipeline.
//
// Fatal contract violations get typed variants and propagate with `?`.
// Data-quality problems during corpus construction (out-of-range pitches,
// unknown event kinds, too-short or unacceptable durations, unusable key
// signatures) are logged and counted where they occur instead — a single
// malformed score never aborts a batch. Nothing in the core is retried;
// retries belong to the calling layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A note or rest with a non-positive duration. The whole score is
    /// rejected; there is no sensible token count for such an event.
    #[error("invalid duration {duration} (must be > 0)")]
    InvalidDuration { duration: f64 },

    /// A token absent from the vocabulary built at corpus time. Fatal for
    /// the request that supplied it: the caller violated the contract that
    /// every consumed symbol was seen during the vocabulary build.
    #[error("unknown symbol `{token}` (not in vocabulary)")]
    UnknownSymbol { token: String },

    /// Sampling temperature must be finite and greater than zero.
    #[error("invalid temperature {temperature} (must be > 0)")]
    InvalidTemperature { temperature: f64 },

    /// The predictor returned a distribution of the wrong length.
    #[error("predictor returned {got} probabilities, expected {expected}")]
    PredictorShape { expected: usize, got: usize },

    /// A persisted vocabulary that cannot be rebuilt into a dense bijection.
    #[error("vocabulary file is corrupt: {reason}")]
    VocabCorrupt { reason: String },

    /// A melody token that is not part of the symbolic alphabet.
    #[error(transparent)]
    Symbol(#[from] crate::symbol::SymbolParseError),

    /// Malformed score, mapping, or model JSON.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
