// Key normalization: transposing scores to C major / A minor.
//
// The corpus and the generated melodies live in one canonical key so the
// sequence model never has to learn transposition invariance. A score with
// an explicit major or minor key signature in its first measure is shifted
// so the tonic lands on C (major) or A (minor); anything else — no part,
// no measure, no key signature, or an unsupported mode — passes through
// unchanged. Skipping is not an error: plenty of real notation carries no
// usable key, and those scores are still worth encoding as-is.
//
// The interval is wrapped to the minimal shift in [-6, +6) semitones so
// melodies stay in their original register.

use crate::score::{Event, KeyMode, Score};
use log::debug;

/// Pitch class of C, the major-mode target.
const MAJOR_TARGET_PC: i16 = 0;
/// Pitch class of A, the minor-mode target.
const MINOR_TARGET_PC: i16 = 9;

/// Transpose a score to C major or A minor, keyed off the first measure of
/// the first part. Consumes the score and returns the normalized one;
/// callers that need the original keep a clone.
pub fn transpose_to_c(score: Score) -> Score {
    let Some(key) = score.first_key() else {
        debug!("no explicit key signature; transposition skipped");
        return score;
    };

    let target = match key.mode {
        KeyMode::Major => MAJOR_TARGET_PC,
        KeyMode::Minor => MINOR_TARGET_PC,
        KeyMode::Other => {
            debug!("unsupported mode; transposition skipped");
            return score;
        }
    };

    let offset = minimal_offset(i16::from(key.tonic_pc % 12), target);
    transpose_score(score, offset)
}

/// Shift every pitch in the score by `offset` semitones, clamped to the
/// MIDI range.
pub fn transpose_score(mut score: Score, offset: i16) -> Score {
    if offset == 0 {
        return score;
    }
    for part in &mut score.parts {
        for measure in &mut part.measures {
            for event in &mut measure.events {
                match event {
                    Event::Note { pitch, .. } => *pitch = shift(*pitch, offset),
                    Event::Chord { pitches, .. } => {
                        for pitch in pitches {
                            *pitch = shift(*pitch, offset);
                        }
                    }
                    Event::Rest { .. } | Event::Unknown => {}
                }
            }
        }
    }
    score
}

/// The minimal semitone offset in [-6, +6) that moves `from_pc` to `to_pc`.
fn minimal_offset(from_pc: i16, to_pc: i16) -> i16 {
    (to_pc - from_pc + 18).rem_euclid(12) - 6
}

fn shift(pitch: u8, offset: i16) -> u8 {
    (i16::from(pitch) + offset).clamp(0, 127) as u8
}
