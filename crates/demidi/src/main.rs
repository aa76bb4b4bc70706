//! demidi - convert Deemo chart files to standard MIDI
//!
//! Subcommands:
//! - `demidi single <chart> <output>` - convert one chart file
//! - `demidi check <songs_dir>` - dry run comparing difficulties per song
//! - `demidi extract <songs_dir> <output_dir>` - convert a whole directory

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deemo_chart::SelectionPolicy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::info;

mod batch;

#[derive(Parser)]
#[command(name = "demidi")]
#[command(about = "Convert Deemo songs to standard MIDI files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single chart file to a MIDI file
    Single {
        /// Path to the chart JSON file
        chart: PathBuf,

        /// Path of the MIDI file to write
        output: PathBuf,
    },

    /// Compare the difficulties of every song without writing anything
    Check {
        /// Directory with one subdirectory per song
        songs_dir: PathBuf,

        /// Silence length-mismatch warnings
        #[arg(long)]
        suppress_length: bool,

        /// Silence notes-mismatch warnings
        #[arg(long)]
        suppress_notes: bool,
    },

    /// Convert every song in a directory to MIDI files
    Extract {
        /// Directory with one subdirectory per song
        songs_dir: PathBuf,

        /// Directory to write the MIDI files into
        output_dir: PathBuf,

        /// Emit one MIDI per song even when difficulties diverge,
        /// keeping the difficulty with the most notes
        #[arg(long)]
        one_only: bool,

        /// Seed for the tie-break between equally sized difficulties
        #[arg(long, env = "DEMIDI_SEED")]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Single { chart, output } => {
            let raw = std::fs::read_to_string(&chart)
                .with_context(|| format!("reading chart {}", chart.display()))?;
            let seq = deemo_chart::parse_chart(&raw, &batch::file_stem(&chart))?;
            let midi = deemo_chart::sequence_to_midi(&seq)?;
            std::fs::write(&output, midi)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(notes = seq.len(), output = %output.display(), "converted chart");
        }

        Commands::Check {
            songs_dir,
            suppress_length,
            suppress_notes,
        } => {
            let policy = SelectionPolicy {
                one_only: false,
                suppress_length,
                suppress_notes,
            };
            let mut rng = StdRng::from_entropy();
            let summary = batch::run(&songs_dir, None, &policy, &mut rng)?;

            for line in summary.report_lines() {
                println!("{line}");
            }
            println!("Comparison done.");
            println!(
                "{}/{} ({:.2}%) songs have difficulties with different lengths.",
                summary.length_mismatch_songs(),
                summary.total(),
                percent(summary.length_mismatch_songs(), summary.total()),
            );
            println!(
                "{}/{} ({:.2}%) songs have difficulties with different notes.",
                summary.notes_mismatch_songs(),
                summary.total(),
                percent(summary.notes_mismatch_songs(), summary.total()),
            );
            exit_for(summary.failed());
        }

        Commands::Extract {
            songs_dir,
            output_dir,
            one_only,
            seed,
        } => {
            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("creating output directory {}", output_dir.display()))?;
            let policy = SelectionPolicy {
                one_only,
                ..Default::default()
            };
            let mut rng = seed
                .map(StdRng::seed_from_u64)
                .unwrap_or_else(StdRng::from_entropy);
            let summary = batch::run(&songs_dir, Some(&output_dir), &policy, &mut rng)?;

            for line in summary.report_lines() {
                println!("{line}");
            }
            println!(
                "Extracted {}/{} songs ({} failed).",
                summary.total() - summary.failed(),
                summary.total(),
                summary.failed(),
            );
            exit_for(summary.failed());
        }
    }

    Ok(())
}

fn percent(part: usize, total: usize) -> f64 {
    part as f64 / total.max(1) as f64 * 100.0
}

/// Batch modes succeed even with warnings, but a failed song must be
/// visible in the exit status.
fn exit_for(failed: usize) -> ! {
    std::process::exit(if failed > 0 { 1 } else { 0 });
}
