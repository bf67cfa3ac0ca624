// The time-quantized token alphabet.
//
// Every melody in the pipeline is a flat sequence of symbols, one per time
// step: MIDI pitch numbers for note onsets, "r" for rest onsets, "_" for
// steps that continue the previous event, and "/" as the boundary between
// songs in the concatenated corpus. The delimiter doubles as sequence-start
// padding for the sampler and as its stop signal.
//
// Text forms are the interchange format: encoded songs, the single-file
// corpus, and generation seeds are all whitespace-joined symbol strings,
// so `Display` and `FromStr` here are the canonical (de)serialization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Text form of the rest symbol.
pub const REST_TOKEN: &str = "r";
/// Text form of the hold (continuation) symbol.
pub const HOLD_TOKEN: &str = "_";
/// Text form of the song delimiter.
pub const DELIMITER_TOKEN: &str = "/";

/// Highest valid MIDI pitch.
pub const MAX_MIDI_PITCH: u8 = 127;

/// One element of the symbolic alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    /// A note onset at the given MIDI pitch (0-127).
    Pitch(u8),
    /// A rest onset.
    Rest,
    /// Continuation of the previous event into this time step.
    Hold,
    /// Boundary between songs in the corpus.
    Delimiter,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Pitch(p) => write!(f, "{p}"),
            Symbol::Rest => f.write_str(REST_TOKEN),
            Symbol::Hold => f.write_str(HOLD_TOKEN),
            Symbol::Delimiter => f.write_str(DELIMITER_TOKEN),
        }
    }
}

/// A token string that is not part of the alphabet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a melody symbol: `{token}`")]
pub struct SymbolParseError {
    pub token: String,
}

impl FromStr for Symbol {
    type Err = SymbolParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            REST_TOKEN => Ok(Symbol::Rest),
            HOLD_TOKEN => Ok(Symbol::Hold),
            DELIMITER_TOKEN => Ok(Symbol::Delimiter),
            _ => match s.parse::<u8>() {
                Ok(p) if p <= MAX_MIDI_PITCH => Ok(Symbol::Pitch(p)),
                _ => Err(SymbolParseError {
                    token: s.to_string(),
                }),
            },
        }
    }
}

/// Join symbols into the whitespace-separated text form.
pub fn symbols_to_string(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(Symbol::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
