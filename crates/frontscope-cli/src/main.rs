//! frontscope CLI - microphone array diagnostics for voice front-end devices.

mod commands;

use clap::{Parser, Subcommand};
use frontscope_config::FrontscopeConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "frontscope")]
#[command(author, version, about = "Voice front-end diagnostics CLI", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config, then built-in values)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plot magnitude-squared coherence between every microphone pair
    Coherence(commands::coherence::CoherenceArgs),

    /// Track the delay between the two channels of a stereo recording
    Correlate(commands::correlate::CorrelateArgs),

    /// Plot AEC filter coefficients read from the device
    AecFilter(commands::aec_filter::AecFilterArgs),

    /// Print an NLModel matrix read from the device
    Nlmodel(commands::nlmodel::NlModelArgs),

    /// Generate a C string table for an enum in a header
    EnumTable(commands::enum_table::EnumTableArgs),
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = FrontscopeConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Coherence(args) => commands::coherence::run(args, &config),
        Commands::Correlate(args) => commands::correlate::run(args, &config),
        Commands::AecFilter(args) => commands::aec_filter::run(args, &config),
        Commands::Nlmodel(args) => commands::nlmodel::run(args, &config),
        Commands::EnumTable(args) => commands::enum_table::run(args),
    }
}
