use serde::{Deserialize, Serialize};

/// A single extracted note with absolute tick timing.
///
/// `offset_tick == onset_tick` encodes an instantaneous note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub onset_tick: u64,
    pub offset_tick: u64,
    pub pitch: u8,
    pub velocity: u8,
}

impl Note {
    pub fn duration_ticks(&self) -> u64 {
        self.offset_tick.saturating_sub(self.onset_tick)
    }
}

/// The notes of one difficulty of a song, sorted by onset then pitch.
///
/// The sequence is read-only after construction; comparison and selection
/// only ever borrow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSequence {
    difficulty: String,
    notes: Vec<Note>,
}

impl NoteSequence {
    /// Build a sequence, sorting by onset then pitch so two parses of the
    /// same chart always agree on note order.
    pub fn new(difficulty: impl Into<String>, mut notes: Vec<Note>) -> Self {
        notes.sort_by(|a, b| a.onset_tick.cmp(&b.onset_tick).then(a.pitch.cmp(&b.pitch)));
        Self {
            difficulty: difficulty.into(),
            notes,
        }
    }

    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Total length of the sequence: the latest note offset (0 if empty).
    pub fn total_ticks(&self) -> u64 {
        self.notes.iter().map(|n| n.offset_tick).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn note(onset: u64, offset: u64, pitch: u8) -> Note {
        Note {
            onset_tick: onset,
            offset_tick: offset,
            pitch,
            velocity: 100,
        }
    }

    #[test]
    fn construction_sorts_by_onset_then_pitch() {
        let seq = NoteSequence::new(
            "easy",
            vec![note(480, 960, 64), note(0, 480, 72), note(0, 480, 60)],
        );

        let pitches: Vec<u8> = seq.notes().iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![60, 72, 64]);
    }

    #[test]
    fn sort_is_deterministic_across_input_orders() {
        let a = NoteSequence::new("a", vec![note(0, 10, 60), note(0, 10, 62), note(5, 20, 61)]);
        let b = NoteSequence::new("a", vec![note(5, 20, 61), note(0, 10, 62), note(0, 10, 60)]);
        assert_eq!(a, b);
    }

    #[test]
    fn total_ticks_is_max_offset() {
        let seq = NoteSequence::new("hard", vec![note(0, 1200, 60), note(480, 960, 64)]);
        assert_eq!(seq.total_ticks(), 1200);
    }

    #[test]
    fn empty_sequence_has_zero_length() {
        let seq = NoteSequence::new("easy", vec![]);
        assert!(seq.is_empty());
        assert_eq!(seq.total_ticks(), 0);
    }
}
