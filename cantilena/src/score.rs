// Symbolic score data model.
//
// Scores enter the pipeline as JSON documents: parts containing measures,
// each measure carrying an optional explicit key signature and a list of
// note/rest/chord events with quarter-length durations. The hierarchy
// exists for the key normalizer, which inspects the first measure of the
// first part; everything downstream works on the flattened event stream.
//
// Event kinds this version does not know about deserialize as
// `Event::Unknown` so one exotic event cannot sink a whole score — the
// encoder counts and skips them.
//
// Durations are quarter-lengths (1.0 = one quarter note). MIDI pitch
// 60 = C4.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An ordered sequence of musical events, grouped into parts and measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub measures: Vec<Measure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    /// Explicit key signature, when the source notation carried one.
    #[serde(default)]
    pub key: Option<KeySignature>,
    pub events: Vec<Event>,
}

/// A single notated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Event {
    Note { pitch: u8, duration: f64 },
    Rest { duration: f64 },
    /// Simultaneous pitches sharing one notated duration.
    Chord { pitches: Vec<u8>, duration: f64 },
    /// Any event kind this version does not understand.
    #[serde(other)]
    Unknown,
}

impl Event {
    /// Quarter-length duration, `None` for unknown event kinds.
    pub fn duration(&self) -> Option<f64> {
        match self {
            Event::Note { duration, .. }
            | Event::Rest { duration }
            | Event::Chord { duration, .. } => Some(*duration),
            Event::Unknown => None,
        }
    }
}

/// An explicit key signature: tonic pitch class plus mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySignature {
    /// Pitch class of the tonic (0 = C, 2 = D, 9 = A, ...).
    pub tonic_pc: u8,
    pub mode: KeyMode,
}

/// Key mode. Anything other than major or minor (church modes, "none",
/// free-form strings from upstream notation software) maps to `Other`,
/// which the key normalizer treats as "skip transposition".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KeyMode {
    Major,
    Minor,
    Other,
}

impl From<String> for KeyMode {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "major" => KeyMode::Major,
            "minor" => KeyMode::Minor,
            _ => KeyMode::Other,
        }
    }
}

impl From<KeyMode> for String {
    fn from(mode: KeyMode) -> Self {
        match mode {
            KeyMode::Major => "major".to_string(),
            KeyMode::Minor => "minor".to_string(),
            KeyMode::Other => "other".to_string(),
        }
    }
}

impl Score {
    /// All events in temporal order, across parts and measures.
    pub fn flatten(&self) -> impl Iterator<Item = &Event> {
        self.parts
            .iter()
            .flat_map(|part| part.measures.iter())
            .flat_map(|measure| measure.events.iter())
    }

    /// The key signature of the first measure of the first part, if any.
    pub fn first_key(&self) -> Option<KeySignature> {
        self.parts.first()?.measures.first()?.key
    }

    /// Parse a score from its JSON text form.
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a score from a JSON file.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }
}
