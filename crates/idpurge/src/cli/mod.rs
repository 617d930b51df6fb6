pub mod purge;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "idpurge")]
#[command(about = "Find and remove traces of retired email identities", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(required = true, num_args = 1.., help = "Email address(es) to purge")]
    pub identities: Vec<String>,

    #[arg(long, help = "Apply changes (default is a preview that changes nothing)")]
    pub execute: bool,

    #[arg(long, short = 'y', help = "Delete browser profiles without prompting (SSH keys always prompt)")]
    pub yes: bool,

    #[arg(
        long,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds to wait for an answer before treating it as no"
    )]
    pub timeout: Option<u64>,

    #[arg(long, help = "Path to idpurge.toml")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Directory for the audit log")]
    pub log_dir: Option<PathBuf>,

    #[arg(long, help = "Scan this directory instead of the current user's home")]
    pub home: Option<PathBuf>,

    #[arg(long, help = "Also write the report as JSON to this path")]
    pub json: Option<PathBuf>,

    #[arg(long, short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, short = 'q', conflicts_with = "verbose", help = "Suppress non-error output")]
    pub quiet: bool,
}

pub fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
