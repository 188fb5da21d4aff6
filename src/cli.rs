//! Command-line interface definitions using clap

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::config::{ConfigSource, StaticConfig};

const DEFAULT_SAMPLE_PATH: &str = "config.example.toml";

/// crudkit - enterprise CRUD backend skeleton
#[derive(Parser, Debug)]
#[command(name = "crudkit")]
#[command(version)]
#[command(about = "User center CRUD service", long_about = None)]
pub struct Cli {
    /// Base configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    /// Environment profile, loads config.<profile>.toml on top of the base file
    #[arg(long, short = 'p', global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn config_source(&self) -> ConfigSource {
        ConfigSource::new(self.config.clone(), self.profile.clone())
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration after all overrides
    Show,
}

/// 写出配置模板
pub fn generate_config(output_path: Option<&str>, force: bool) -> Result<String> {
    let path = output_path.unwrap_or(DEFAULT_SAMPLE_PATH);
    if Path::new(path).exists() && !force {
        bail!("{} already exists, use --force to overwrite", path);
    }

    StaticConfig::write_sample_config(path)
        .with_context(|| format!("Failed to write {}", path))?;
    Ok(path.to_string())
}

/// 渲染生效配置
pub fn show_config(source: &ConfigSource) -> Result<String> {
    let config = StaticConfig::load(source)?;
    toml::to_string_pretty(&config).context("Failed to render configuration")
}
