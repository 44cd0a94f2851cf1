//! Command-line interface for feedwatch

use crate::config::{Config, Profile};
use crate::error::Result;
use crate::output::OutputFormat;
use crate::schema::RowLayout;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "feedwatch")]
#[command(about = "Announces course-registration feed changes to a Discord channel")]
#[command(version)]
pub struct Cli {
    /// Read environment variables from this file instead of ./.env
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Startup validation profile: "strict" or "lenient"
    #[arg(long, value_parser = Profile::parse)]
    pub profile: Option<Profile>,

    /// Row layout of the feed: "current" or "legacy"
    #[arg(long, value_parser = RowLayout::parse)]
    pub layout: Option<RowLayout>,

    /// Seconds between polls (must be > 0)
    #[arg(long, value_parser = validate_positive)]
    pub interval: Option<u64>,

    /// Changes per message (must be > 0)
    #[arg(long, value_parser = validate_positive)]
    pub batch_size: Option<u64>,

    /// Skip snapshots with rows too short for the layout instead of announcing them
    #[arg(long)]
    pub reject_malformed: bool,

    /// Run a single poll cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Print messages to stdout instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Dry-run output format: "pretty", "json"
    #[arg(long, default_value = "pretty", value_parser = OutputFormat::parse)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of `config`
    pub fn apply(&self, mut config: Config) -> Result<Config> {
        if let Some(profile) = self.profile {
            config.profile = profile;
        }
        if let Some(layout) = &self.layout {
            config.layout = layout.clone();
        }
        if let Some(secs) = self.interval {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(size) = self.batch_size {
            config.batch_size = size as usize;
        }
        if self.reject_malformed {
            config.reject_malformed = true;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Validate that a numeric option is greater than 0
fn validate_positive(s: &str) -> std::result::Result<u64, String> {
    let n: u64 = s
        .parse()
        .map_err(|_| format!("Invalid value: '{}'. Must be a positive integer.", s))?;

    if n == 0 {
        return Err("Value must be greater than 0".to_string());
    }

    Ok(n)
}
