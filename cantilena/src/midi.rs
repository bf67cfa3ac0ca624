// MIDI output for decoded melodies.
//
// Renders the stream decoder's events into a Standard MIDI File for
// playback: a tempo track plus a single melody track, SMF Format 1.
// Quarter-length durations map to ticks at 480 per quarter note. Rests
// produce no messages — they accumulate into the delta time of the next
// note-on.
//
// Uses the `midly` crate for MIDI writing.

use crate::error::PipelineError;
use crate::score::Event;
use midly::{
    Format, Header, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Note-on velocity for rendered melodies.
const VELOCITY: u8 = 80;

/// Render melody events to MIDI and write to a file.
pub fn write_melody_midi(
    events: &[Event],
    path: &Path,
    tempo_bpm: u16,
) -> Result<(), PipelineError> {
    let smf = events_to_smf(events, tempo_bpm);
    smf.save(path)?;
    Ok(())
}

/// Convert melody events to an in-memory SMF.
fn events_to_smf(events: &[Event], tempo_bpm: u16) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo track
    let mut tempo_track: Track<'static> = Vec::new();
    let tempo_microseconds = 60_000_000 / u32::from(tempo_bpm.max(1));
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    // Track 1: the melody
    let channel = u4::new(0);
    let mut track: Track<'static> = Vec::new();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::TrackName(b"Melody")),
    });

    let mut pending_delta: u32 = 0;
    for event in events {
        match event {
            Event::Note { pitch, duration } => {
                track.push(TrackEvent {
                    delta: u28::new(pending_delta),
                    kind: TrackEventKind::Midi {
                        channel,
                        message: MidiMessage::NoteOn {
                            key: u7::new(*pitch),
                            vel: u7::new(VELOCITY),
                        },
                    },
                });
                track.push(TrackEvent {
                    delta: u28::new(duration_ticks(*duration)),
                    kind: TrackEventKind::Midi {
                        channel,
                        message: MidiMessage::NoteOff {
                            key: u7::new(*pitch),
                            vel: u7::new(0),
                        },
                    },
                });
                pending_delta = 0;
            }
            Event::Rest { duration } => {
                pending_delta += duration_ticks(*duration);
            }
            // Chords and unknown events never come out of the decoder.
            Event::Chord { .. } | Event::Unknown => {}
        }
    }

    track.push(TrackEvent {
        delta: u28::new(pending_delta),
        kind: TrackEventKind::Meta(midly::MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    smf
}

fn duration_ticks(quarter_length: f64) -> u32 {
    (quarter_length * f64::from(TICKS_PER_QUARTER)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tempo_track_plus_melody_track() {
        let events = [
            Event::Note {
                pitch: 60,
                duration: 1.0,
            },
            Event::Rest { duration: 0.5 },
            Event::Note {
                pitch: 64,
                duration: 0.25,
            },
        ];
        let smf = events_to_smf(&events, 120);
        assert_eq!(smf.tracks.len(), 2);
        // Track name + 2 on/off pairs + end of track.
        assert_eq!(smf.tracks[1].len(), 6);
    }

    #[test]
    fn rests_accumulate_into_the_next_delta() {
        let events = [
            Event::Rest { duration: 1.0 },
            Event::Note {
                pitch: 60,
                duration: 0.25,
            },
        ];
        let smf = events_to_smf(&events, 120);
        let note_on = &smf.tracks[1][1];
        assert_eq!(note_on.delta.as_int(), 480);
    }

    #[test]
    fn note_durations_become_note_off_deltas() {
        let events = [Event::Note {
            pitch: 72,
            duration: 2.0,
        }];
        let smf = events_to_smf(&events, 90);
        let note_off = &smf.tracks[1][2];
        assert_eq!(note_off.delta.as_int(), 960);
    }

    #[test]
    fn writes_a_nonempty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("melody.mid");
        let events = [Event::Note {
            pitch: 60,
            duration: 1.0,
        }];
        write_melody_midi(&events, &path, 120).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[..4], b"MThd");
    }
}
