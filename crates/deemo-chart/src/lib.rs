//! Deemo chart extraction and MIDI emission.
//!
//! This crate turns the game's per-difficulty JSON chart files into
//! normalized note sequences, detects divergences between difficulties of
//! the same song, decides which sequences become outputs, and writes them
//! as standard MIDI files.
//!
//! # Example
//!
//! ```
//! use deemo_chart::{parse_chart, sequence_to_midi};
//!
//! let raw = r#"{ "notes": [
//!     { "_time": 0.5, "sounds": [ { "d": 0.25, "p": 60, "v": 100 } ] }
//! ] }"#;
//!
//! let seq = parse_chart(raw, "easy").unwrap();
//! let midi = sequence_to_midi(&seq).unwrap();
//! assert_eq!(&midi[0..4], b"MThd");
//! ```

pub mod chart;
pub mod compare;
pub mod midi_writer;
pub mod note;
pub mod select;

pub use chart::{parse_chart, DEFAULT_VELOCITY, TICKS_PER_SECOND};
pub use compare::{compare, MismatchKind, MismatchReport};
pub use midi_writer::sequence_to_midi;
pub use note::{Note, NoteSequence};
pub use select::{select, Selection, SelectionPolicy};

/// Errors from chart extraction and MIDI emission.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed chart: {0}")]
    MalformedChart(String),

    #[error("pitch {pitch} is outside the MIDI range 0..=127")]
    UnknownPitch { pitch: i64 },

    #[error("MIDI encoding error: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, Error>;
