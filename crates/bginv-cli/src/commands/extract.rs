//! Extract command - show what would go on an invoice without issuing one.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use bginv_core::{ExtractedText, ExtractionResult, SupplierHint, SupplierStore};

use super::{build_pipeline, PipelineArgs};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input document (PDF or DOCX)
    #[arg(required = true)]
    input: PathBuf,

    /// Supplier company ID, so the supplier is never taken as recipient
    #[arg(short, long)]
    supplier: Option<String>,

    /// Print only the extracted text
    #[arg(long)]
    text_only: bool,

    /// Output file (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Serialize)]
struct ExtractOutput<'a> {
    document: &'a ExtractedText,
    #[serde(flatten)]
    result: &'a ExtractionResult,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let pipeline = build_pipeline(config_path, &args.pipeline)?;

    let hint = match &args.supplier {
        Some(id) => pipeline.store().get(id)?.hint(),
        None => SupplierHint::default(),
    };

    info!("Extracting fields from {}", args.input.display());
    let extracted = pipeline.extract_text(&args.input).await?;

    let output = if args.text_only {
        extracted.text.clone()
    } else {
        let result = pipeline.analyze_text(&extracted.text, &hint).await?;
        serde_json::to_string_pretty(&ExtractOutput {
            document: &extracted,
            result: &result,
        })?
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}
