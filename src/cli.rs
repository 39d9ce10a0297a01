//! Command-line flags, parsed with `clap`'s derive API.
//! `--print-config` is an operator convenience for inspecting the
//! effective configuration without an interactive wizard.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "auditrs", about = "Forward Linux audit events to a log pipeline")]
pub struct Cli {
    /// Path to the TOML configuration file (required).
    #[arg(long)]
    pub config: PathBuf,

    /// Write a pprof-compatible CPU profile here while running.
    #[arg(long)]
    pub cpuprofile: Option<PathBuf>,

    /// Load, validate, and print the effective configuration, then exit.
    #[arg(long)]
    pub print_config: bool,
}
