// Time-step encoding of scores into the symbolic alphabet.
//
// Each note or rest becomes its onset symbol followed by hold markers, one
// symbol per `time_step` quarter-lengths, so a quarter note at the default
// 0.25 step encodes as ["60", "_", "_", "_"].
//
// Chords "fire once": every chord pitch emits exactly one single-step
// onset symbol with no hold run, collapsing polyphony into a burst of
// onsets. This matches the corpus the models are trained on; changing it
// would invalidate every persisted vocabulary and model.
//
// Problem events never abort an encode. Out-of-range pitches, unknown
// event kinds, and events whose duration rounds to zero steps are skipped,
// logged, and counted in `EncodeStats`.

use crate::score::{Event, Score};
use crate::symbol::{MAX_MIDI_PITCH, Symbol};
use log::warn;

/// Default quarter-lengths per time step (a 16th note).
pub const DEFAULT_TIME_STEP: f64 = 0.25;

/// Counters for events the encoder skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Pitches outside the MIDI range.
    pub bad_pitches: usize,
    /// Events whose duration rounded to zero time steps.
    pub too_short: usize,
    /// Event kinds the score model could not classify.
    pub unknown_events: usize,
}

impl EncodeStats {
    /// Total events (or chord pitches) dropped from the encoding.
    pub fn skipped(&self) -> usize {
        self.bad_pitches + self.too_short + self.unknown_events
    }
}

/// Encode a score into the flat time-step symbol sequence.
///
/// The score should already be duration-vetted and key-normalized; the
/// encoder itself only guards against conditions that would corrupt the
/// token stream.
pub fn encode_score(score: &Score, time_step: f64) -> (Vec<Symbol>, EncodeStats) {
    let mut symbols = Vec::new();
    let mut stats = EncodeStats::default();

    for event in score.flatten() {
        match event {
            Event::Note { pitch, duration } => {
                if *pitch > MAX_MIDI_PITCH {
                    warn!("invalid MIDI pitch {pitch}, skipping");
                    stats.bad_pitches += 1;
                    continue;
                }
                push_with_holds(
                    Symbol::Pitch(*pitch),
                    *duration,
                    time_step,
                    &mut symbols,
                    &mut stats,
                );
            }
            Event::Rest { duration } => {
                push_with_holds(Symbol::Rest, *duration, time_step, &mut symbols, &mut stats);
            }
            Event::Chord { pitches, .. } => {
                // Fire once: one single-step onset per chord pitch.
                for &pitch in pitches {
                    if pitch > MAX_MIDI_PITCH {
                        warn!("invalid MIDI pitch {pitch} in chord, skipping");
                        stats.bad_pitches += 1;
                        continue;
                    }
                    symbols.push(Symbol::Pitch(pitch));
                }
            }
            Event::Unknown => {
                warn!("unknown event kind, skipping");
                stats.unknown_events += 1;
            }
        }
    }

    (symbols, stats)
}

/// Append an onset symbol and its hold run: `round(duration / time_step)`
/// steps total. A duration that rounds to zero steps emits nothing and is
/// counted in `too_short`.
fn push_with_holds(
    symbol: Symbol,
    duration: f64,
    time_step: f64,
    out: &mut Vec<Symbol>,
    stats: &mut EncodeStats,
) {
    let steps = (duration / time_step).round() as usize;
    if steps == 0 {
        warn!("duration {duration} shorter than half a time step, skipping");
        stats.too_short += 1;
        return;
    }
    out.push(symbol);
    for _ in 1..steps {
        out.push(Symbol::Hold);
    }
}
