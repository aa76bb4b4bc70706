//! Parser for the game's per-difficulty JSON chart files.
//!
//! A chart is a list of gameplay notes; each note that actually sounds
//! carries a `sounds` array with per-sound timing, pitch, and velocity:
//!
//! ```json
//! { "notes": [
//!     { "_time": 1.5, "sounds": [ { "w": 0.0, "d": 0.5, "p": 60, "v": 100 } ] }
//! ] }
//! ```
//!
//! All timing in the chart is in seconds. Everything is mapped to integer
//! ticks here, through one shared constant, so that sequences parsed from
//! different difficulty files are directly comparable.

use crate::note::{Note, NoteSequence};
use crate::{Error, Result};
use serde::Deserialize;

/// Ticks per second of chart time: 480 PPQ at the fixed 120 BPM emission
/// tempo puts 960 ticks in one second.
pub const TICKS_PER_SECOND: f64 = 960.0;

/// Velocity assigned when a sound carries no `v` field.
pub const DEFAULT_VELOCITY: u8 = 100;

/// Upper bound on any single chart time value, in ticks. Keeps
/// onset + duration arithmetic inside u64 range.
const MAX_TICK: u64 = 1 << 62;

#[derive(Debug, Deserialize)]
struct RawChart {
    notes: Vec<RawNote>,
}

#[derive(Debug, Deserialize)]
struct RawNote {
    /// Absolute onset in seconds. Missing on notes at the very start of
    /// the song, which play at time 0.
    #[serde(rename = "_time")]
    time: Option<f64>,
    /// Missing or null for gameplay-only taps that make no sound.
    #[serde(default)]
    sounds: Option<Vec<RawSound>>,
}

#[derive(Debug, Deserialize)]
struct RawSound {
    /// Onset delay in seconds, relative to the note's `_time`.
    w: Option<f64>,
    /// Duration in seconds. Missing means "same as the previous sound".
    d: Option<f64>,
    /// Pitch, already a MIDI note number in the chart format.
    p: i64,
    v: Option<i64>,
}

/// Parse one difficulty's raw chart into a normalized note sequence.
///
/// Fails with [`Error::MalformedChart`] when the JSON does not match the
/// chart shape, a time field is negative or non-finite, or the first sound
/// of the chart has no duration to inherit. Fails with
/// [`Error::UnknownPitch`] when a pitch falls outside 0..=127 (the chart's
/// pitch encoding is the MIDI note number itself, so anything else has no
/// mapping).
pub fn parse_chart(raw: &str, difficulty: &str) -> Result<NoteSequence> {
    let chart: RawChart =
        serde_json::from_str(raw).map_err(|e| Error::MalformedChart(e.to_string()))?;

    let mut notes: Vec<Note> = Vec::new();
    for raw_note in &chart.notes {
        let Some(sounds) = &raw_note.sounds else {
            continue;
        };
        let base = raw_note.time.unwrap_or(0.0);

        for sound in sounds {
            let onset_tick = seconds_to_ticks(base + sound.w.unwrap_or(0.0))?;

            let duration_ticks = match sound.d {
                Some(d) => seconds_to_ticks(d)?,
                None => match notes.last() {
                    Some(prev) => prev.duration_ticks(),
                    None => {
                        return Err(Error::MalformedChart(
                            "first sound has no duration and no previous note to inherit from"
                                .to_string(),
                        ))
                    }
                },
            };

            let pitch = u8::try_from(sound.p)
                .ok()
                .filter(|p| *p <= 127)
                .ok_or(Error::UnknownPitch { pitch: sound.p })?;

            // Shipped charts contain out-of-range velocities; they are
            // rendered silent, not dropped.
            let velocity = match sound.v {
                Some(v) if (0..=127).contains(&v) => v as u8,
                Some(_) => 0,
                None => DEFAULT_VELOCITY,
            };

            let offset_tick = onset_tick.checked_add(duration_ticks).ok_or_else(|| {
                Error::MalformedChart(format!(
                    "note at tick {onset_tick} with duration {duration_ticks} overflows"
                ))
            })?;

            notes.push(Note {
                onset_tick,
                offset_tick,
                pitch,
                velocity,
            });
        }
    }

    Ok(NoteSequence::new(difficulty, notes))
}

fn seconds_to_ticks(seconds: f64) -> Result<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(Error::MalformedChart(format!(
            "time value {seconds} is negative or not finite"
        )));
    }
    let ticks = (seconds * TICKS_PER_SECOND).round();
    if ticks > MAX_TICK as f64 {
        return Err(Error::MalformedChart(format!(
            "time value {seconds}s is beyond the supported range"
        )));
    }
    Ok(ticks as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_a_plain_chart() {
        let raw = r#"{ "notes": [
            { "_time": 0.5, "sounds": [ { "w": 0.0, "d": 0.25, "p": 60, "v": 90 } ] },
            { "_time": 1.0, "sounds": [ { "d": 0.5, "p": 64, "v": 80 } ] }
        ] }"#;

        let seq = parse_chart(raw, "easy").unwrap();
        assert_eq!(seq.difficulty(), "easy");
        assert_eq!(
            seq.notes(),
            &[
                Note {
                    onset_tick: 480,
                    offset_tick: 720,
                    pitch: 60,
                    velocity: 90
                },
                Note {
                    onset_tick: 960,
                    offset_tick: 1440,
                    pitch: 64,
                    velocity: 80
                },
            ]
        );
    }

    #[test]
    fn missing_time_means_song_start() {
        let raw = r#"{ "notes": [
            { "sounds": [ { "d": 0.25, "p": 72, "v": 100 } ] }
        ] }"#;

        let seq = parse_chart(raw, "easy").unwrap();
        assert_eq!(seq.notes()[0].onset_tick, 0);
    }

    #[test]
    fn w_delays_the_onset() {
        let raw = r#"{ "notes": [
            { "_time": 1.0, "sounds": [
                { "w": 0.0, "d": 0.25, "p": 60, "v": 100 },
                { "w": 0.125, "d": 0.25, "p": 64, "v": 100 }
            ] }
        ] }"#;

        let seq = parse_chart(raw, "easy").unwrap();
        assert_eq!(seq.notes()[0].onset_tick, 960);
        assert_eq!(seq.notes()[1].onset_tick, 1080);
    }

    #[test]
    fn soundless_notes_are_skipped() {
        let raw = r#"{ "notes": [
            { "_time": 0.5 },
            { "_time": 1.0, "sounds": null },
            { "_time": 2.0, "sounds": [ { "d": 0.25, "p": 60, "v": 100 } ] }
        ] }"#;

        let seq = parse_chart(raw, "easy").unwrap();
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn missing_duration_inherits_from_previous_note() {
        let raw = r#"{ "notes": [
            { "_time": 0.0, "sounds": [ { "d": 0.5, "p": 60, "v": 100 } ] },
            { "_time": 1.0, "sounds": [ { "p": 62, "v": 100 } ] }
        ] }"#;

        let seq = parse_chart(raw, "easy").unwrap();
        assert_eq!(seq.notes()[1].duration_ticks(), 480);
    }

    #[test]
    fn missing_duration_on_first_sound_is_malformed() {
        let raw = r#"{ "notes": [
            { "_time": 0.0, "sounds": [ { "p": 60, "v": 100 } ] }
        ] }"#;

        assert!(matches!(
            parse_chart(raw, "easy"),
            Err(Error::MalformedChart(_))
        ));
    }

    #[test]
    fn missing_pitch_is_malformed() {
        let raw = r#"{ "notes": [
            { "_time": 0.0, "sounds": [ { "d": 0.5, "v": 100 } ] }
        ] }"#;

        assert!(matches!(
            parse_chart(raw, "easy"),
            Err(Error::MalformedChart(_))
        ));
    }

    #[test]
    fn out_of_range_pitch_is_unknown() {
        let raw = r#"{ "notes": [
            { "_time": 0.0, "sounds": [ { "d": 0.5, "p": 300, "v": 100 } ] }
        ] }"#;

        assert!(matches!(
            parse_chart(raw, "easy"),
            Err(Error::UnknownPitch { pitch: 300 })
        ));
    }

    #[test]
    fn negative_velocity_becomes_silent() {
        let raw = r#"{ "notes": [
            { "_time": 0.0, "sounds": [ { "d": 0.5, "p": 60, "v": -1 } ] }
        ] }"#;

        let seq = parse_chart(raw, "easy").unwrap();
        assert_eq!(seq.notes()[0].velocity, 0);
    }

    #[test]
    fn missing_velocity_takes_the_default() {
        let raw = r#"{ "notes": [
            { "_time": 0.0, "sounds": [ { "d": 0.5, "p": 60 } ] }
        ] }"#;

        let seq = parse_chart(raw, "easy").unwrap();
        assert_eq!(seq.notes()[0].velocity, DEFAULT_VELOCITY);
    }

    #[test]
    fn negative_time_is_malformed() {
        let raw = r#"{ "notes": [
            { "_time": -1.0, "sounds": [ { "d": 0.5, "p": 60, "v": 100 } ] }
        ] }"#;

        assert!(matches!(
            parse_chart(raw, "easy"),
            Err(Error::MalformedChart(_))
        ));
    }

    #[test]
    fn absurd_time_is_malformed_not_a_panic() {
        // Schema-valid but astronomically large; must come back as an
        // error so one bad chart cannot take down a batch run.
        let raw = r#"{ "notes": [
            { "_time": 1e18, "sounds": [ { "d": 1e18, "p": 60, "v": 100 } ] }
        ] }"#;

        assert!(matches!(
            parse_chart(raw, "easy"),
            Err(Error::MalformedChart(_))
        ));
    }

    #[test]
    fn not_json_is_malformed() {
        assert!(matches!(
            parse_chart("definitely not json", "easy"),
            Err(Error::MalformedChart(_))
        ));
    }
}
