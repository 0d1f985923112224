//! Convert command - extract line items from a single purchase order.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, ValueEnum};
use console::style;
use tracing::{debug, info};

use poconv_core::export;
use poconv_core::models::item::total_line_cost;
use poconv_core::{Converter, LineItem, PoError, Reconstructor, Transcript};

use super::{SourceArgs, load_config, page_progress_bar, read_transcript};

/// Arguments for the convert command.
#[derive(Args)]
pub struct ConvertArgs {
    /// Input file (PDF, image, or extracted .txt)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Print the extracted lines to stderr before the items
    #[arg(long)]
    show_text: bool,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// CSV with the purchase-order column header
    Csv,
    /// JSON array of line items
    Json,
    /// Aligned table with item count and cost total
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ConvertArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.source.apply(&mut config);
    let converter = Converter::new(config)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Converting file: {}", args.input.display());

    let pb = page_progress_bar();
    let transcript = read_transcript(&args.input, converter.config(), args.source.ocr_text, &pb);
    pb.finish_and_clear();

    let transcript = match transcript {
        Ok(t) => t,
        Err(e) => {
            if let Some(PoError::NoContentExtracted { .. }) = e.downcast_ref::<PoError>() {
                eprintln!(
                    "{} No text could be extracted. If this is a scanned document, try --mode ocr.",
                    style("!").yellow()
                );
            }
            return Err(e);
        }
    };

    if args.show_text {
        print_transcript(&transcript, converter.reconstructor());
    }

    let conversion = match converter.convert_transcript(transcript) {
        Ok(c) => c,
        Err(PoError::NoItemsMatched { transcript }) => {
            eprintln!(
                "{} No line items matched. Extracted lines follow for diagnosis:",
                style("!").yellow()
            );
            print_transcript(&transcript, converter.reconstructor());
            anyhow::bail!(
                "no line items matched in {} extracted lines",
                transcript.lines.len()
            );
        }
        Err(e) => return Err(e.into()),
    };

    if !conversion.dropped.is_empty() {
        eprintln!(
            "{} {} item rows skipped for lack of a quantity (lines {:?})",
            style("!").yellow(),
            conversion.dropped.len(),
            conversion.dropped
        );
    }

    let output = format_items(&conversion.items, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Wrote {} items to {}",
            style("✓").green(),
            conversion.items.len(),
            output_path.display()
        );
    } else {
        print!("{}", output);
    }

    debug!(
        "Converted {} items (total {}) in {:?}",
        conversion.items.len(),
        total_line_cost(&conversion.items),
        start.elapsed()
    );

    Ok(())
}

pub fn format_items(items: &[LineItem], format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Csv => export::to_csv_string(items)?,
        OutputFormat::Json => export::to_json(items)? + "\n",
        OutputFormat::Text => export::to_text_table(items),
    })
}

/// Print raw lines, and their corrected form where it differs, to stderr.
pub fn print_transcript(transcript: &Transcript, reconstructor: &Reconstructor) {
    let prepared = reconstructor.prepare_transcript(transcript);
    for (line, prep) in transcript.lines.iter().zip(&prepared) {
        let page = line.page.map(|p| format!("p{}", p)).unwrap_or_default();
        eprintln!("{:>4} {:<4} {}", line.index, page, prep.original);
        if prep.normalized != prep.original {
            eprintln!("{:>4} {:<4} {} {}", "", "", style("->").dim(), prep.normalized);
        }
    }
}
