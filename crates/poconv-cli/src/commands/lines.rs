//! Lines command - show the transcript the reconstructor sees.
//!
//! Markers: `*` item row, `x` item-shaped row dropped for lack of a quantity.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Args;
use console::style;

use poconv_core::{PoConfig, Reconstructor};

use super::{SourceArgs, load_config, page_progress_bar, read_transcript};

/// Arguments for the lines command.
#[derive(Args)]
pub struct LinesArgs {
    /// Input file (PDF, image, or extracted .txt)
    #[arg(required = true)]
    input: PathBuf,

    /// Only print anchor candidates
    #[arg(long)]
    anchors_only: bool,

    #[command(flatten)]
    source: SourceArgs,
}

pub async fn run(args: LinesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config: PoConfig = load_config(config_path)?;
    args.source.apply(&mut config);
    config.validate()?;

    let pb = page_progress_bar();
    let transcript = read_transcript(&args.input, &config, args.source.ocr_text, &pb);
    pb.finish_and_clear();
    let transcript = transcript?;

    let reconstructor = Reconstructor::new(config.reconstruct.clone());
    let report = reconstructor.reconstruct_with_report(&transcript);
    let dropped: HashSet<usize> = report.dropped.iter().copied().collect();
    let candidates: HashSet<usize> = report.candidates.iter().copied().collect();

    println!(
        "{} lines from {} via {}",
        transcript.lines.len(),
        args.input.display(),
        transcript.method
    );

    let prepared = reconstructor.prepare_transcript(&transcript);
    for (line, prep) in transcript.lines.iter().zip(&prepared) {
        let marker = if dropped.contains(&line.index) {
            "x"
        } else if candidates.contains(&line.index) {
            "*"
        } else {
            " "
        };
        if args.anchors_only && marker == " " {
            continue;
        }
        let page = line.page.map(|p| format!("p{}", p)).unwrap_or_default();
        println!("{} {:>4} {:<4} {}", marker, line.index, page, prep.original);
        if prep.normalized != prep.original {
            println!("  {:>4} {:<4} -> {}", "", "", prep.normalized);
        }
    }

    println!();
    println!(
        "{} {} item rows, {} dropped, {} empty pages",
        style("ℹ").blue(),
        report.items.len(),
        report.dropped.len(),
        transcript.empty_pages.len()
    );

    Ok(())
}
