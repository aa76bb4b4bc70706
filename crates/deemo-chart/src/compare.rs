//! Pairwise comparison of note sequences across difficulties.
//!
//! Different difficulties of one song nominally encode the same melody, so
//! any divergence is worth surfacing. Divergences are classified, in
//! precedence order: a differing total length or note count is a
//! [`MismatchKind::LengthMismatch`] (the musical shape changed); equal
//! counts with differing per-note fields is a
//! [`MismatchKind::NotesMismatch`] (fine detail changed).

use crate::note::NoteSequence;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    Identical,
    LengthMismatch {
        ticks_a: u64,
        ticks_b: u64,
        count_a: usize,
        count_b: usize,
    },
    NotesMismatch {
        /// Index of the first note that differs in any field.
        first_index: usize,
        /// Number of indices that differ, out of `total`.
        differing: usize,
        total: usize,
    },
}

/// Result of comparing two difficulties of the same song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MismatchReport {
    pub a: String,
    pub b: String,
    pub kind: MismatchKind,
}

impl MismatchReport {
    pub fn is_identical(&self) -> bool {
        matches!(self.kind, MismatchKind::Identical)
    }

    /// One human-readable warning line, for batch output.
    pub fn describe(&self) -> String {
        match self.kind {
            MismatchKind::Identical => format!("{} vs {}: identical", self.a, self.b),
            MismatchKind::LengthMismatch {
                ticks_a,
                ticks_b,
                count_a,
                count_b,
            } => format!(
                "{} vs {}: length mismatch ({} vs {} ticks, {} vs {} notes)",
                self.a, self.b, ticks_a, ticks_b, count_a, count_b
            ),
            MismatchKind::NotesMismatch {
                first_index,
                differing,
                total,
            } => format!(
                "{} vs {}: notes mismatch ({}/{} ({:.2}%) notes, first at index {})",
                self.a,
                self.b,
                differing,
                total,
                differing as f64 / total.max(1) as f64 * 100.0,
                first_index
            ),
        }
    }
}

/// Compare two note sequences of the same song.
///
/// Symmetric in `kind`: swapping the arguments swaps the per-side detail
/// fields but never changes the classification.
pub fn compare(a: &NoteSequence, b: &NoteSequence) -> MismatchReport {
    let kind = if a.total_ticks() != b.total_ticks() || a.len() != b.len() {
        MismatchKind::LengthMismatch {
            ticks_a: a.total_ticks(),
            ticks_b: b.total_ticks(),
            count_a: a.len(),
            count_b: b.len(),
        }
    } else {
        let mut first_index = None;
        let mut differing = 0;
        for (i, (na, nb)) in a.notes().iter().zip(b.notes()).enumerate() {
            if na != nb {
                differing += 1;
                first_index.get_or_insert(i);
            }
        }
        match first_index {
            Some(first_index) => MismatchKind::NotesMismatch {
                first_index,
                differing,
                total: a.len(),
            },
            None => MismatchKind::Identical,
        }
    };

    MismatchReport {
        a: a.difficulty().to_string(),
        b: b.difficulty().to_string(),
        kind,
    }
}
