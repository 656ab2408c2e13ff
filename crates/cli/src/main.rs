//! landseq CLI - temporal consistency filtering of land-cover stacks

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use landseq_algorithms::temporal::{filter_stack, Catalogue, FilterParams, FilterReport};
use landseq_core::io::{Sink, StackMetadata, TiffStore};
use landseq_core::{LabelDomain, LabelStack, YearRange};
use landseq_parallel::ProcessingMode;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "landseq")]
#[command(author, version, about = "Temporal consistency filter for land-cover stacks", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the temporal filter to a classification stack
    Filter {
        /// Input multi-page TIFF, one page per year
        input: PathBuf,
        /// Output TIFF; a JSON sidecar with the same stem is written next to it
        output: PathBuf,
        /// Rule catalogue as JSON (default: built-in wetland catalogue)
        #[arg(short, long)]
        catalogue: Option<PathBuf>,
        /// Version tag recorded in the output metadata
        #[arg(long, default_value = "1")]
        version_tag: String,
        /// Processing stage recorded in the output metadata
        #[arg(long, default_value = "temporal")]
        stage: String,
        /// First year to filter (default: first year of the input)
        #[arg(long)]
        first_year: Option<i32>,
        /// Last year to filter (default: last year of the input)
        #[arg(long)]
        last_year: Option<i32>,
        /// Largest admissible class code
        #[arg(long, default_value = "34")]
        max_label: u8,
        /// Tile edge length in pixels
        #[arg(short, long, default_value = "256")]
        tile_size: usize,
        /// Worker threads (1 = sequential, default: all cores)
        #[arg(short = 'j', long)]
        threads: Option<usize>,
    },
    /// Show information about a classification stack
    Info {
        /// Input multi-page TIFF
        input: PathBuf,
    },
    /// Print the built-in rule catalogue as JSON
    Catalogue {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Store addressing exactly the file the user named, and the stack name in it
fn open_store(path: &Path) -> Result<(TiffStore, String)> {
    TiffStore::for_stack_path(path).with_context(|| format!("Invalid stack path: {}", path.display()))
}

fn read_stack(path: &Path) -> Result<(LabelStack, Option<StackMetadata>)> {
    let pb = spinner("Reading stack...");
    let (store, name) = open_store(path)?;
    let stack = store
        .load_all(&name)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let metadata = store
        .load_metadata(&name)
        .context("Failed to read metadata sidecar")?;
    pb.finish_and_clear();
    info!(
        "Input: {} x {}, years {}",
        stack.cols(),
        stack.rows(),
        stack.years()
    );
    Ok((stack, metadata))
}

fn load_catalogue(path: Option<&Path>) -> Result<Catalogue> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read catalogue {}", path.display()))?;
            let catalogue = Catalogue::from_json(&text).context("Failed to parse catalogue")?;
            debug!("Loaded {} rules from {}", catalogue.len(), path.display());
            Ok(catalogue)
        }
        None => Ok(Catalogue::wetlands()),
    }
}

fn processing_mode(threads: Option<usize>) -> Result<ProcessingMode> {
    match threads {
        None => Ok(ProcessingMode::Parallel),
        Some(0) => bail!("--threads must be at least 1"),
        Some(1) => Ok(ProcessingMode::Sequential),
        Some(n) => Ok(ProcessingMode::ParallelWith(n)),
    }
}

fn print_report(report: &FilterReport) {
    let share = if report.pixels == 0 {
        0.0
    } else {
        100.0 * report.changed_pixels as f64 / report.pixels as f64
    };
    println!(
        "  Changed pixels: {} of {} ({:.2}%)",
        report.changed_pixels, report.pixels, share
    );
    println!("  Changed cells: {}", report.changed_cells);
    for (year, count) in report.changes_per_year.iter().filter(|(_, n)| *n > 0) {
        println!("    {}: {}", year, count);
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Filter {
            input,
            output,
            catalogue,
            version_tag,
            stage,
            first_year,
            last_year,
            max_label,
            tile_size,
            threads,
        } => {
            let (stack, _) = read_stack(&input)?;
            let years = YearRange::new(
                first_year.unwrap_or(stack.years().first()),
                last_year.unwrap_or(stack.years().last()),
            )
            .context("Invalid year range")?;
            let stack = if years == stack.years() {
                stack
            } else {
                stack
                    .slice_years(years)
                    .context("Requested years are not in the input")?
            };

            let params = FilterParams {
                catalogue: load_catalogue(catalogue.as_deref())?,
                domain: LabelDomain::new(0, max_label).context("Invalid label domain")?,
                tile_size,
                mode: processing_mode(threads)?,
            };

            let pb = spinner("Filtering...");
            let start = Instant::now();
            let result = filter_stack(&stack, &params).context("Temporal filter failed")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            let pb = spinner("Writing output...");
            let (mut sink, name) = open_store(&output)?;
            let metadata = StackMetadata::new(name, version_tag, stage, result.stack.years())
                .with_property("source", input.display().to_string())
                .with_property("rules", params.catalogue.len().to_string());
            sink.save(&result.stack, &metadata)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            pb.finish_and_clear();

            println!("Filtered stack saved to: {}", output.display());
            println!("  Processing time: {:.2?}", elapsed);
            print_report(&result.report);
        }

        Commands::Info { input } => {
            let (stack, metadata) = read_stack(&input)?;
            let (rows, cols) = stack.shape();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} pixels)", cols, rows, rows * cols);
            println!("Years: {} ({} layers)", stack.years(), stack.years().len());
            if let Some(meta) = metadata {
                println!("Version: {}", meta.version);
                println!("Stage: {}", meta.stage);
                for (key, value) in &meta.properties {
                    println!("  {}: {}", key, value);
                }
            }
            println!("\nClass counts:");
            for year in stack.years().iter() {
                let counts = stack.class_counts(year)?;
                let line: Vec<String> = counts
                    .iter()
                    .map(|(label, n)| format!("{}={}", label, n))
                    .collect();
                println!("  {}: {}", year, line.join(" "));
            }
        }

        Commands::Catalogue { output } => {
            let json = Catalogue::wetlands().to_json_pretty()?;
            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Catalogue saved to: {}", path.display());
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_store_uses_named_file() {
        let (store, name) = open_store(Path::new("out/filtered.tiff")).unwrap();
        assert_eq!(store.stack_path(&name), PathBuf::from("out/filtered.tiff"));
    }

    #[test]
    fn test_processing_mode_from_threads() {
        assert_eq!(processing_mode(None).unwrap(), ProcessingMode::Parallel);
        assert_eq!(processing_mode(Some(1)).unwrap(), ProcessingMode::Sequential);
        assert_eq!(processing_mode(Some(4)).unwrap(), ProcessingMode::ParallelWith(4));
        assert!(processing_mode(Some(0)).is_err());
    }
}
