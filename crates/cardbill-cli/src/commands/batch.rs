//! Batch processing command for multiple bill files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::{debug, error, warn};

use cardbill_core::format_amount;

use super::process::{build_processor, extract_file, is_no_data, is_supported, render, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching the input files
    #[arg(required = true)]
    input: String,

    /// Output directory (default: next to each input)
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file (default: from config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Also write a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR and use only PDF text extraction
    #[arg(long)]
    text_only: bool,
}

/// Outcome for one input file.
enum Outcome {
    Written {
        output: PathBuf,
        transactions: usize,
        total_amount: Option<Decimal>,
    },
    NoData,
    Failed(String),
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    outcome: Outcome,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;
    let format = OutputFormat::resolve(args.format, None, &config);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && is_supported(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let processor = build_processor(&config, args.model_dir.as_deref(), args.text_only);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files",
            )?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();

        let outcome = match extract_file(&path, &processor) {
            Ok(extraction) => {
                for warning in &extraction.warnings {
                    warn!("{}: {}", path.display(), warning);
                }
                let output = output_path(&path, args.output_dir.as_deref(), format);
                let written = render(&extraction.table, format, &config)
                    .and_then(|content| Ok(fs::write(&output, content)?));
                match written {
                    Ok(()) => {
                        debug!("Wrote output to {}", output.display());
                        let summary = extraction.table.summary();
                        Outcome::Written {
                            output,
                            transactions: summary.transactions,
                            total_amount: summary.total_amount,
                        }
                    }
                    Err(e) => Outcome::Failed(e.to_string()),
                }
            }
            Err(e) if is_no_data(&e) => Outcome::NoData,
            Err(e) => Outcome::Failed(e.to_string()),
        };

        if let Outcome::Failed(ref message) = outcome {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", path.display(), message);
            } else {
                pb.abandon();
                error!("Failed to process {}: {}", path.display(), message);
                anyhow::bail!("Processing failed for {}: {}", path.display(), message);
            }
        }

        results.push(FileResult {
            path,
            outcome,
            processing_time_ms: file_start.elapsed().as_millis() as u64,
        });
        pb.inc(1);
    }

    pb.finish_and_clear();

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let written = results
        .iter()
        .filter(|r| matches!(r.outcome, Outcome::Written { .. }))
        .count();
    let empty: Vec<_> = results
        .iter()
        .filter(|r| matches!(r.outcome, Outcome::NoData))
        .collect();
    let failed: Vec<_> = results
        .iter()
        .filter(|r| matches!(r.outcome, Outcome::Failed(_)))
        .collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} written, {} without transactions, {} failed",
        style(written).green(),
        style(empty.len()).blue(),
        style(failed.len()).red()
    );

    for result in &empty {
        println!(
            "{} No transactions found in {}",
            style("ℹ").blue(),
            result.path.display()
        );
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            if let Outcome::Failed(ref message) = result.outcome {
                println!("  - {}: {}", result.path.display(), message);
            }
        }
    }

    Ok(())
}

/// `<stem>_transactions.<ext>` in `output_dir`, or beside the input.
fn output_path(input: &Path, output_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bill");
    let name = format!("{}_transactions.{}", stem, format.extension());

    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "output",
        "transactions",
        "total_amount",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time = result.processing_time_ms.to_string();

        match &result.outcome {
            Outcome::Written {
                output,
                transactions,
                total_amount,
            } => wtr.write_record([
                filename,
                "success",
                &output.display().to_string(),
                &transactions.to_string(),
                &total_amount.map(format_amount).unwrap_or_default(),
                &time,
                "",
            ])?,
            Outcome::NoData => {
                wtr.write_record([filename, "no_data", "", "0", "", &time, ""])?
            }
            Outcome::Failed(message) => {
                wtr.write_record([filename, "error", "", "", "", &time, message])?
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("bills/march.pdf"), None, OutputFormat::Csv),
            PathBuf::from("bills/march_transactions.csv")
        );
        assert_eq!(
            output_path(Path::new("bills/march.pdf"), Some(Path::new("out")), OutputFormat::Xlsx),
            PathBuf::from("out/march_transactions.xlsx")
        );
    }
}
