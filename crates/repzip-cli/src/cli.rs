//! Command-line arguments.

use crate::logging::LogFormat;
use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use repzip_core::{Compression, PermissionPolicy, TimeOverride};
use std::path::PathBuf;

/// Build and inspect reproducible ZIP archives
#[derive(Parser, Debug)]
#[command(name = "repzip")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
pub struct GlobalOpts {
    /// Payload format on stdout
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Archive the entries of a directory that match the given patterns
    Build(BuildArgs),

    /// List the entries of an archive
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Directory the patterns are matched against
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Include the whole subtree of every matched directory
    #[arg(short, long)]
    pub recursive: bool,

    /// Compression method (stored, deflated, bzip2, lzma; lzma is written as
    /// XZ, ZIP method 95, which some unzip tools cannot read) [env: REPZIP_COMPRESSION]
    #[arg(long)]
    pub compression: Option<Compression>,

    /// Timestamp for every entry: an ISO date "YYYY-MM-DD", or comma-separated
    /// fields "YYYY[,MM,DD,hh,mm,ss]". Overrides SOURCE_DATE_EPOCH.
    #[arg(long)]
    pub time: Option<TimeOverride>,

    /// Permission policy (fixed, executable) [env: REPZIP_PERMISSIONS]
    #[arg(long)]
    pub permissions: Option<PermissionPolicy>,

    /// Archive to write
    pub output: PathBuf,

    /// Glob patterns relative to the root
    #[arg(required = true)]
    pub patterns: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Archive to read
    pub archive: PathBuf,

    /// Decompress every file entry and check its CRC
    #[arg(long)]
    pub verify: bool,
}
