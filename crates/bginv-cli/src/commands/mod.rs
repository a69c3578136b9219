//! Subcommands and the configuration and pipeline setup they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod process;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use tracing::debug;

use bginv_core::{BginvConfig, CsvSupplierStore, InvoicePipeline};

/// Overrides common to the commands that run the pipeline.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Supplier table (CSV)
    #[arg(long)]
    suppliers: Option<PathBuf>,

    /// Directory for generated invoices
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Directory holding the invoice templates
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Skip the exchange rate and translation services
    #[arg(long)]
    offline: bool,
}

impl PipelineArgs {
    fn apply(&self, config: &mut BginvConfig) {
        if let Some(path) = &self.suppliers {
            config.suppliers.path = path.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.documents.output_dir = dir.clone();
        }
        if let Some(dir) = &self.templates {
            config.documents.template_dir = dir.clone();
        }
    }
}

/// `<config dir>/bginv/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bginv")
        .join("config.json")
}

/// The file given with `--config`, else the default file when present,
/// else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<BginvConfig> {
    if let Some(path) = config_path {
        debug!("Loading config from {}", path);
        return BginvConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        return BginvConfig::from_file(&default_path).map_err(|e| {
            anyhow::anyhow!("Failed to load config {}: {}", default_path.display(), e)
        });
    }

    Ok(BginvConfig::default())
}

/// Pipeline over the CSV supplier table.
pub fn build_pipeline(
    config_path: Option<&str>,
    args: &PipelineArgs,
) -> anyhow::Result<InvoicePipeline<CsvSupplierStore>> {
    let mut config = load_config(config_path)?;
    args.apply(&mut config);

    let store = Arc::new(CsvSupplierStore::new(config.suppliers.path.clone()));

    if args.offline {
        Ok(InvoicePipeline::offline(config, store))
    } else {
        Ok(InvoicePipeline::new(config, store)?)
    }
}
