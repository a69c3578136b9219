//! Process command - generate an invoice from a single document.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use bginv_core::{ApiResponse, DocumentKind, InvoiceError};

use super::{build_pipeline, PipelineArgs};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Supplier company ID from the supplier table
    #[arg(short, long, required = true)]
    supplier: String,

    /// Input document (PDF or DOCX), or "-" to read it from stdin
    #[arg(required = true)]
    input: String,

    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Include details of unexpected errors in the response
    #[arg(long)]
    debug: bool,

    /// Pretty-print the response
    #[arg(long)]
    pretty: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let (response, status) = match respond(&args, config_path).await {
        Ok(outcome) => outcome,
        Err(e) => (unexpected(&e.to_string(), args.debug), 500),
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", json);

    debug!("Total processing time: {:?}", start.elapsed());

    if !response.success {
        anyhow::bail!("Invoice generation failed (status {})", status);
    }
    Ok(())
}

async fn respond(args: &ProcessArgs, config_path: Option<&str>) -> anyhow::Result<(ApiResponse, u16)> {
    let pipeline = build_pipeline(config_path, &args.pipeline)?;

    // Removed when dropped, after the pipeline is done with it.
    let stdin_copy = if args.input == "-" {
        match stdin_to_tempfile()? {
            Ok(file) => Some(file),
            Err(e) => return Ok((ApiResponse::failure(&e), e.status_code())),
        }
    } else {
        None
    };

    let input = match &stdin_copy {
        Some(file) => file.path().to_path_buf(),
        None => PathBuf::from(&args.input),
    };

    info!("Generating invoice for supplier {} from {}", args.supplier, input.display());

    let (mut response, status) = pipeline.process(&args.supplier, &input).await;
    if status == 500 {
        let message = response.errors.join("; ");
        response = unexpected(&message, args.debug);
    }

    Ok((response, status))
}

/// Copy stdin into a temporary file named after its detected type.
fn stdin_to_tempfile() -> anyhow::Result<Result<NamedTempFile, InvoiceError>> {
    let mut data = Vec::new();
    std::io::stdin().read_to_end(&mut data)?;

    let suffix = match DocumentKind::sniff(&data) {
        Some(DocumentKind::Pdf) => ".pdf",
        Some(DocumentKind::Docx) => ".docx",
        None => {
            return Ok(Err(InvoiceError::UnsupportedDocument(
                "stdin is neither PDF nor DOCX".to_string(),
            )));
        }
    };

    let mut file = tempfile::Builder::new()
        .prefix("bginv-stdin-")
        .suffix(suffix)
        .tempfile()?;
    file.write_all(&data)?;
    file.flush()?;

    debug!("Copied {} bytes from stdin to {}", data.len(), file.path().display());
    Ok(Ok(file))
}

/// Failure envelope that hides internal details unless asked for.
fn unexpected(message: &str, debug: bool) -> ApiResponse {
    let error = if debug {
        format!("unexpected error: {}", message)
    } else {
        "unexpected error".to_string()
    };

    ApiResponse {
        success: false,
        data: None,
        errors: vec![error],
        warnings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_hides_details() {
        assert_eq!(unexpected("disk full", false).errors, vec!["unexpected error"]);
        assert_eq!(
            unexpected("disk full", true).errors,
            vec!["unexpected error: disk full"]
        );
    }
}
