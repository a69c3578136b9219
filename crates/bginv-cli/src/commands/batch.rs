//! Batch command - generate invoices for many documents.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use bginv_core::{DocumentKind, GeneratedInvoice};

use super::{build_pipeline, PipelineArgs};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching the input documents
    #[arg(required = true)]
    input: String,

    /// Supplier company ID from the supplier table
    #[arg(short, long, required = true)]
    supplier: String,

    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Write a CSV summary of every document to this file
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

/// Outcome for one document.
struct BatchResult {
    path: PathBuf,
    invoice: Option<GeneratedInvoice>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| DocumentKind::from_path(p).is_some())
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} documents to process",
        style("ℹ").blue(),
        files.len()
    );

    let pipeline = build_pipeline(config_path, &args.pipeline)?;

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(files.len() as u64)
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents")?
            .progress_chars("=>-"),
    );

    // One at a time: invoice numbers are issued in file order.
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let file_start = Instant::now();
        let outcome = pipeline.generate(&args.supplier, &path).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(invoice) => results.push(BatchResult {
                path,
                invoice: Some(invoice),
                error: None,
                processing_time_ms,
            }),
            Err(e) if args.continue_on_error => {
                warn!("Failed to process {}: {}", path.display(), e);
                results.push(BatchResult {
                    path,
                    invoice: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                });
            }
            Err(e) => {
                progress.abandon();
                error!("Failed to process {}: {}", path.display(), e);
                anyhow::bail!("Processing {} failed: {}", path.display(), e);
            }
        }

        progress.inc(1);
    }

    progress.finish_and_clear();

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful: Vec<_> = results.iter().filter(|r| r.invoice.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    for result in &successful {
        if let Some(invoice) = &result.invoice {
            println!(
                "{} {} -> {} ({})",
                style("✓").green(),
                result.path.display(),
                invoice.invoice_number,
                invoice.file_path.display()
            );
        }
    }

    eprintln!();
    eprintln!(
        "{} Processed {} documents in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed documents:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[BatchResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "invoice_number",
        "invoice_date",
        "recipient",
        "currency",
        "total_bgn",
        "output_file",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(invoice) = &result.invoice {
            let document = &invoice.document;
            wtr.write_record([
                filename,
                "success",
                &invoice.invoice_number,
                &document.date.format("%d.%m.%Y").to_string(),
                &invoice.result.recipient.name,
                &document.totals.currency,
                &document.totals.grand_total.to_string(),
                &invoice.file_path.display().to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
