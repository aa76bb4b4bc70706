//! Batch driver: walk a songs directory and process every song in it.
//!
//! One song maps to one subdirectory holding a chart file per difficulty.
//! Each song is parsed, its difficulties reconciled, and (in extract mode)
//! the selected sequences written out. Failures are recorded per song and
//! never abort the rest of the batch.

use anyhow::{Context, Result};
use deemo_chart::{
    parse_chart, select, sequence_to_midi, MismatchKind, NoteSequence, SelectionPolicy,
};
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CHART_EXTENSIONS: &[&str] = &["json", "txt"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SongStatus {
    /// All difficulties agreed; one file emitted.
    Clean,
    /// Difficulties diverged; output still emitted per policy.
    WarnedAndEmitted,
    /// Parse, encoding, or I/O failure; nothing emitted for this song.
    Failed(String),
}

#[derive(Debug)]
pub struct SongOutcome {
    pub song: String,
    pub status: SongStatus,
    /// Mismatch warning lines, already filtered by the suppress flags.
    pub warnings: Vec<String>,
    pub length_mismatch: bool,
    pub notes_mismatch: bool,
}

/// Append-only collection of per-song outcomes for one run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<SongOutcome>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SongStatus::Failed(_)))
            .count()
    }

    pub fn length_mismatch_songs(&self) -> usize {
        self.outcomes.iter().filter(|o| o.length_mismatch).count()
    }

    pub fn notes_mismatch_songs(&self) -> usize {
        self.outcomes.iter().filter(|o| o.notes_mismatch).count()
    }

    /// Per-song warning and failure lines, in processing order.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for outcome in &self.outcomes {
            for warning in &outcome.warnings {
                lines.push(format!("{}: {}", outcome.song, warning));
            }
            if let SongStatus::Failed(reason) = &outcome.status {
                lines.push(format!("{}: failed: {}", outcome.song, reason));
            }
        }
        lines
    }
}

/// Process every song under `songs_dir`. With an output directory, write
/// the selected MIDI files; without one this is a dry run (check mode).
///
/// Only the inability to read the songs directory itself is an error; any
/// per-song failure becomes a recorded [`SongStatus::Failed`].
pub fn run(
    songs_dir: &Path,
    output_dir: Option<&Path>,
    policy: &SelectionPolicy,
    rng: &mut impl Rng,
) -> Result<BatchSummary> {
    let mut song_dirs: Vec<PathBuf> = fs::read_dir(songs_dir)
        .with_context(|| format!("reading songs directory {}", songs_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    song_dirs.sort();

    let pb = ProgressBar::new(song_dirs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.green/dim}] {pos}/{len} {msg:.dim}")
            .unwrap()
            .progress_chars("█▓▒░ "),
    );

    let mut summary = BatchSummary::default();
    for song_dir in &song_dirs {
        let song = file_stem(song_dir);
        pb.set_message(song.clone());
        summary
            .outcomes
            .push(process_song(song, song_dir, output_dir, policy, rng));
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(summary)
}

fn process_song(
    song: String,
    song_dir: &Path,
    output_dir: Option<&Path>,
    policy: &SelectionPolicy,
    rng: &mut impl Rng,
) -> SongOutcome {
    match try_process_song(&song, song_dir, output_dir, policy, rng) {
        Ok(outcome) => outcome,
        Err(reason) => SongOutcome {
            song,
            status: SongStatus::Failed(reason),
            warnings: Vec::new(),
            length_mismatch: false,
            notes_mismatch: false,
        },
    }
}

fn try_process_song(
    song: &str,
    song_dir: &Path,
    output_dir: Option<&Path>,
    policy: &SelectionPolicy,
    rng: &mut impl Rng,
) -> std::result::Result<SongOutcome, String> {
    let charts = chart_files(song_dir).map_err(|e| format!("listing charts: {e}"))?;
    if charts.is_empty() {
        return Err("no chart files".to_string());
    }

    // `easy.json` and `easy.txt` would both claim the difficulty label
    // "easy" and therefore the same output file name.
    let mut labels = std::collections::HashSet::new();
    for chart_path in &charts {
        let difficulty = file_stem(chart_path);
        if !labels.insert(difficulty.clone()) {
            return Err(format!("duplicate difficulty '{difficulty}'"));
        }
    }

    let mut sequences: Vec<NoteSequence> = Vec::with_capacity(charts.len());
    for chart_path in &charts {
        let difficulty = file_stem(chart_path);
        let raw = fs::read_to_string(chart_path).map_err(|e| format!("{difficulty}: {e}"))?;
        let seq = parse_chart(&raw, &difficulty).map_err(|e| format!("{difficulty}: {e}"))?;
        debug!(song, difficulty = seq.difficulty(), notes = seq.len(), "parsed chart");
        sequences.push(seq);
    }

    let selection = select(sequences, policy, rng);
    let mismatch = selection.has_mismatch();
    let length_mismatch = selection
        .reports
        .iter()
        .any(|r| matches!(r.kind, MismatchKind::LengthMismatch { .. }));
    let notes_mismatch = selection
        .reports
        .iter()
        .any(|r| matches!(r.kind, MismatchKind::NotesMismatch { .. }));

    if let Some(output_dir) = output_dir {
        let single = selection.selected.len() == 1;
        for seq in &selection.selected {
            let name = if single {
                format!("{song}.mid")
            } else {
                format!("{}_{}.mid", song, seq.difficulty())
            };
            let bytes = sequence_to_midi(seq).map_err(|e| e.to_string())?;
            let path = output_dir.join(name);
            fs::write(&path, bytes).map_err(|e| format!("writing {}: {e}", path.display()))?;
        }
    }

    Ok(SongOutcome {
        song: song.to_string(),
        status: if mismatch {
            SongStatus::WarnedAndEmitted
        } else {
            SongStatus::Clean
        },
        warnings: selection.warnings,
        length_mismatch,
        notes_mismatch,
    })
}

/// The song's chart files: one per difficulty, sorted for determinism.
fn chart_files(song_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(song_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| CHART_EXTENSIONS.contains(&ext))
        })
        .collect();
    files.sort();
    Ok(files)
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
