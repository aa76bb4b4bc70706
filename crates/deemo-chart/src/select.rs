//! Decides which difficulty sequences of a song become MIDI outputs.
//!
//! All distinct difficulty pairs are compared. When every pair agrees the
//! sequences are interchangeable and one suffices. When they diverge, the
//! default is to emit every difficulty; `one_only` instead keeps the
//! sequence with the most notes, breaking ties uniformly at random through
//! the caller-supplied rng so tests can pin the outcome with a seed.

use crate::compare::{compare, MismatchKind, MismatchReport};
use crate::note::NoteSequence;
use rand::Rng;

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionPolicy {
    /// Emit a single sequence per song even when difficulties diverge.
    pub one_only: bool,
    /// Drop length-mismatch warnings from the result. Never affects which
    /// sequences are selected.
    pub suppress_length: bool,
    /// Drop notes-mismatch warnings from the result. Never affects which
    /// sequences are selected.
    pub suppress_notes: bool,
}

/// Outcome of resolving one song's difficulties.
#[derive(Debug)]
pub struct Selection {
    pub selected: Vec<NoteSequence>,
    /// Warning lines for the mismatching pairs, already filtered by the
    /// policy's suppress flags.
    pub warnings: Vec<String>,
    /// Every pairwise report, unfiltered.
    pub reports: Vec<MismatchReport>,
}

impl Selection {
    pub fn has_mismatch(&self) -> bool {
        self.reports.iter().any(|r| !r.is_identical())
    }
}

/// Resolve which of a song's sequences to emit under the given policy.
pub fn select(
    sequences: Vec<NoteSequence>,
    policy: &SelectionPolicy,
    rng: &mut impl Rng,
) -> Selection {
    let mut reports = Vec::new();
    for i in 0..sequences.len() {
        for j in (i + 1)..sequences.len() {
            reports.push(compare(&sequences[i], &sequences[j]));
        }
    }

    let mut warnings = Vec::new();
    for report in &reports {
        let suppressed = match report.kind {
            MismatchKind::Identical => continue,
            MismatchKind::LengthMismatch { .. } => policy.suppress_length,
            MismatchKind::NotesMismatch { .. } => policy.suppress_notes,
        };
        if !suppressed {
            warnings.push(report.describe());
        }
    }

    let all_identical = reports.iter().all(|r| r.is_identical());

    let mut sequences = sequences;
    let selected = if all_identical {
        // Interchangeable (or fewer than two); one is enough.
        sequences.truncate(1);
        sequences
    } else if policy.one_only {
        let max_len = sequences.iter().map(|s| s.len()).max().unwrap_or(0);
        let tied: Vec<usize> = sequences
            .iter()
            .enumerate()
            .filter(|(_, s)| s.len() == max_len)
            .map(|(i, _)| i)
            .collect();
        let pick = tied[rng.gen_range(0..tied.len())];
        vec![sequences.swap_remove(pick)]
    } else {
        sequences
    };

    Selection {
        selected,
        warnings,
        reports,
    }
}
