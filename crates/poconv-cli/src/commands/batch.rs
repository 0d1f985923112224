//! Batch processing command for multiple purchase orders.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::{debug, error, warn};

use poconv_core::models::item::total_line_cost;
use poconv_core::{Conversion, Converter, PoError};

use super::convert::{OutputFormat, format_items};
use super::{InputKind, SourceArgs, load_config, read_transcript};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    source: SourceArgs,
}

/// Outcome class written to the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    NoContent,
    NoItems,
    Error,
}

impl Status {
    fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::NoContent => "no_content",
            Status::NoItems => "no_items",
            Status::Error => "error",
        }
    }

    fn of(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<PoError>() {
            Some(PoError::NoContentExtracted { .. }) => Status::NoContent,
            Some(PoError::NoItemsMatched { .. }) => Status::NoItems,
            _ => Status::Error,
        }
    }
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    status: Status,
    items: usize,
    line_cost_total: Decimal,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.source.apply(&mut config);
    let converter = Converter::new(config)?;

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| InputKind::from_path(p).is_some())
        .collect();
    files.sort();

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

    let multi_progress = MultiProgress::new();
    let overall_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    let page_pb = multi_progress.add(ProgressBar::new(0));

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        overall_pb.set_message(path.display().to_string());
        let outcome = process_single_file(&path, &converter, &args, &page_pb);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(conversion) => {
                if let Some(output_dir) = &args.output_dir {
                    write_output(output_dir, &path, &conversion, args.format)?;
                }
                results.push(ProcessResult {
                    path,
                    status: Status::Ok,
                    items: conversion.items.len(),
                    line_cost_total: total_line_cost(&conversion.items),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if !args.continue_on_error {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
                warn!("Failed to process {}: {}", path.display(), error_msg);
                results.push(ProcessResult {
                    path,
                    status: Status::of(&e),
                    items: 0,
                    line_cost_total: Decimal::ZERO,
                    error: Some(error_msg),
                    processing_time_ms,
                });
            }
        }

        overall_pb.inc(1);
    }

    page_pb.finish_and_clear();
    overall_pb.finish_with_message("Complete");

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

    let failed: Vec<_> = results.iter().filter(|r| r.status != Status::Ok).collect();
    let total_items: usize = results.iter().map(|r| r.items).sum();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} items",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red(),
        total_items
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {} [{}]: {}",
                result.path.display(),
                result.status.as_str(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    converter: &Converter,
    args: &BatchArgs,
    pb: &ProgressBar,
) -> anyhow::Result<Conversion> {
    pb.reset();
    let transcript = read_transcript(path, converter.config(), args.source.ocr_text, pb)?;
    let conversion = converter.convert_transcript(transcript)?;
    if !conversion.dropped.is_empty() {
        warn!(
            "{}: {} item rows skipped for lack of a quantity",
            path.display(),
            conversion.dropped.len()
        );
    }
    Ok(conversion)
}

fn write_output(
    output_dir: &Path,
    input: &Path,
    conversion: &Conversion,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let output_name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("order");
    let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));

    fs::write(&output_path, format_items(&conversion.items, format)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "items",
        "line_cost_total",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        wtr.write_record([
            filename,
            result.status.as_str(),
            &result.items.to_string(),
            &result.line_cost_total.to_string(),
            &result.processing_time_ms.to_string(),
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
