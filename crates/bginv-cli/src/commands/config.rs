//! Config command - manage configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use bginv_core::BginvConfig;

use super::default_config_path;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Write a configuration file with the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Get one value (e.g. "currency.nearby_days")
    Get { key: String },

    /// Set one value; JSON values are parsed, anything else is a string
    Set { key: String, value: String },

    /// Show the configuration file path
    Path,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show => {
            if !path.exists() {
                eprintln!(
                    "{} No config file at {}, showing defaults.",
                    style("ℹ").blue(),
                    path.display()
                );
            }
            let config = load_at(&path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            save(&BginvConfig::default(), &path)?;
            eprintln!("{} Created {}", style("✓").green(), path.display());
        }
        ConfigCommand::Get { key } => {
            let json = serde_json::to_value(load_at(&path)?)?;
            println!("{}", serde_json::to_string_pretty(lookup(&json, &key)?)?);
        }
        ConfigCommand::Set { key, value } => {
            let mut json = serde_json::to_value(load_at(&path)?)?;
            let parsed = serde_json::from_str(&value).unwrap_or(Value::String(value));
            assign(&mut json, &key, parsed.clone())?;

            let config: BginvConfig = serde_json::from_value(json)
                .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
            save(&config, &path)?;
            eprintln!("{} Set {} = {}", style("✓").green(), key, parsed);
        }
        ConfigCommand::Path => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!(
                    "{} Not created yet. Run 'bginv config init' to create it.",
                    style("ℹ").yellow()
                );
            }
        }
    }

    Ok(())
}

/// The file at `path`, or defaults when it does not exist yet.
fn load_at(path: &Path) -> anyhow::Result<BginvConfig> {
    if path.exists() {
        BginvConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))
    } else {
        Ok(BginvConfig::default())
    }
}

fn save(config: &BginvConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(path)?;
    Ok(())
}

/// Value at a dotted key path.
fn lookup<'a>(json: &'a Value, key: &str) -> anyhow::Result<&'a Value> {
    key.split('.').try_fold(json, |current, part| {
        current
            .get(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))
    })
}

/// Replace the value at an existing dotted key path.
fn assign(json: &mut Value, key: &str, value: Value) -> anyhow::Result<()> {
    let mut current = json;
    for part in key.split('.') {
        current = current
            .get_mut(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
    }
    *current = value;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested() {
        let json = serde_json::to_value(BginvConfig::default()).unwrap();
        assert_eq!(lookup(&json, "extraction.max_service_lines").unwrap(), &json!(5));
        assert!(lookup(&json, "extraction.nope").is_err());
    }

    #[test]
    fn test_assign_existing_only() {
        let mut json = serde_json::to_value(BginvConfig::default()).unwrap();
        assign(&mut json, "currency.nearby_days", json!(3)).unwrap();
        assert!(assign(&mut json, "currency.unknown", json!(1)).is_err());

        let config: BginvConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.currency.nearby_days, 3);
    }
}
