//! CLI definition and argument parsing for guestmount-cli.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use guestmount::MountOptions;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "guestmount", author, version, about = "Bridge host directories into guests")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
#[non_exhaustive]
pub enum Commands {
    /// Check a guest is ready to receive a mount
    Probe(crate::commands::probe::ProbeArgs),
}

// ============================================================================
// GLOBAL FLAGS
// ============================================================================

#[derive(Args, Debug, Clone)]
pub struct GlobalFlags {
    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// guestmount home directory (logs are written under <home>/logs)
    #[arg(long, global = true, env = guestmount_shared::constants::env::HOME)]
    pub home: Option<PathBuf>,
}

impl GlobalFlags {
    pub fn logs_dir(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|home| home.join("logs"))
    }

    /// Load mount options from `config`, or the defaults when absent.
    pub fn load_options(&self, config: Option<&Path>) -> anyhow::Result<MountOptions> {
        let options = match config {
            Some(path) => MountOptions::from_json_file(path)?,
            None => MountOptions::default(),
        };
        options.validate()?;
        Ok(options)
    }
}

// ============================================================================
// Tests
// ============================================================================
