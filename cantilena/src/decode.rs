// Decoding token streams back into timed note events.
//
// The inverse of the encoder: a run of hold markers after an onset symbol
// collapses into one event whose duration is the run length times the
// step duration. The scan keeps one pending onset; each new onset flushes
// the previous one, and the end of input flushes the last — trailing holds
// included, so ["60", "_", "_", "r", "_"] at step 1 decodes to a 3-beat
// note and a 2-beat rest.
//
// Leading holds with nothing to extend are dropped. A delimiter flushes
// the pending event and is itself discarded — generated melodies never
// contain one, but seeds pasted from a corpus might.

use crate::score::Event;
use crate::symbol::{Symbol, SymbolParseError};

/// Decode a melody's token strings into note/rest events.
///
/// `step_duration` is the quarter-length of one raw time step and should
/// match the `time_step` the corpus was encoded with. An empty input
/// decodes to no events; a single onset token to exactly one.
pub fn decode_melody<S: AsRef<str>>(
    tokens: &[S],
    step_duration: f64,
) -> Result<Vec<Event>, SymbolParseError> {
    let mut events = Vec::new();
    let mut pending: Option<Symbol> = None;
    let mut step_counter = 0usize;

    for token in tokens {
        let symbol: Symbol = token.as_ref().parse()?;
        match symbol {
            Symbol::Hold => {
                if pending.is_some() {
                    step_counter += 1;
                }
            }
            Symbol::Delimiter => {
                flush(&mut events, pending.take(), step_counter, step_duration);
                step_counter = 0;
            }
            onset => {
                flush(&mut events, pending.take(), step_counter, step_duration);
                pending = Some(onset);
                step_counter = 1;
            }
        }
    }
    flush(&mut events, pending.take(), step_counter, step_duration);

    Ok(events)
}

fn flush(events: &mut Vec<Event>, pending: Option<Symbol>, steps: usize, step_duration: f64) {
    let Some(symbol) = pending else {
        return;
    };
    let duration = steps as f64 * step_duration;
    match symbol {
        Symbol::Pitch(pitch) => events.push(Event::Note { pitch, duration }),
        Symbol::Rest => events.push(Event::Rest { duration }),
        Symbol::Hold | Symbol::Delimiter => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_hold_runs_into_durations() {
        let events = decode_melody(&["60", "_", "_", "r", "_"], 1.0).unwrap();
        assert_eq!(
            events,
            [
                Event::Note {
                    pitch: 60,
                    duration: 3.0,
                },
                Event::Rest { duration: 2.0 },
            ]
        );
    }

    #[test]
    fn empty_input_decodes_to_nothing() {
        let events = decode_melody::<&str>(&[], 0.25).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn single_onset_is_one_event_of_one_step() {
        let events = decode_melody(&["60"], 0.25).unwrap();
        assert_eq!(
            events,
            [Event::Note {
                pitch: 60,
                duration: 0.25,
            }]
        );
    }

    #[test]
    fn leading_holds_are_dropped() {
        let events = decode_melody(&["_", "_", "62", "_"], 0.25).unwrap();
        assert_eq!(
            events,
            [Event::Note {
                pitch: 62,
                duration: 0.5,
            }]
        );
    }

    #[test]
    fn delimiter_flushes_and_disappears() {
        let events = decode_melody(&["60", "_", "/", "_", "r"], 1.0).unwrap();
        // The hold after the delimiter has nothing to extend.
        assert_eq!(
            events,
            [
                Event::Note {
                    pitch: 60,
                    duration: 2.0,
                },
                Event::Rest { duration: 1.0 },
            ]
        );
    }

    #[test]
    fn unknown_token_is_a_parse_error() {
        let err = decode_melody(&["60", "banana"], 0.25).unwrap_err();
        assert_eq!(err.token, "banana");
    }

    #[test]
    fn step_duration_scales_every_event() {
        let events = decode_melody(&["60", "_", "r"], 0.5).unwrap();
        assert_eq!(
            events,
            [
                Event::Note {
                    pitch: 60,
                    duration: 1.0,
                },
                Event::Rest { duration: 0.5 },
            ]
        );
    }
}
