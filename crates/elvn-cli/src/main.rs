#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "elvn: inspect, merge and prune sync journals",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Config file to use instead of `<data dir>/sync.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    const fn output_mode(&self) -> OutputMode {
        OutputMode::from_json_flag(self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Decode a journal",
        long_about = "Decode every line of a journal file (stdin when FILE is absent) and report lines that could not be decoded.",
        after_help = "EXAMPLES:\n    # Decode the journal of another device\n    elvn decode ~/phone/history\n\n    # Decode from a pipe as JSON\n    cat history | elvn decode --json"
    )]
    Decode(cmd::decode::DecodeArgs),

    #[command(
        about = "Encode one event",
        long_about = "Build a raw event line from a kind and an item payload, optionally appending it to the journal.",
        after_help = "EXAMPLES:\n    # Print a raw line\n    elvn encode --kind create --item 'l{\"color\":\"b\",\"label\":\"Work\"}'\n\n    # Append it to the configured journal\n    elvn encode --kind done --item '<payload>' --append"
    )]
    Encode(cmd::encode::EncodeArgs),

    #[command(
        about = "Merge two journals",
        long_about = "Merge a local and a remote journal and print the winning event for every item.",
        after_help = "EXAMPLES:\n    # Merge two device journals\n    elvn merge history remote/history\n\n    # Show the replayed items\n    elvn merge history remote/history --items"
    )]
    Merge(cmd::merge::MergeArgs),

    #[command(
        about = "Drop stale events",
        long_about = "Rewrite the journal without events older than the staleness window.",
        after_help = "EXAMPLES:\n    # Use the configured window\n    elvn prune\n\n    # Preview a one-week window\n    elvn prune --days 7 --dry-run"
    )]
    Prune(cmd::prune::PruneArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("ELVN_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "elvn=debug,info"
        } else {
            "elvn=info,warn"
        })
    });

    let format = env::var("ELVN_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    let config = cli.config.as_deref();

    match &cli.command {
        Commands::Decode(args) => cmd::decode::run_decode(args, output),
        Commands::Encode(args) => cmd::encode::run_encode(args, output, config),
        Commands::Merge(args) => cmd::merge::run_merge(args, output),
        Commands::Prune(args) => cmd::prune::run_prune(args, output, config),
    }
}
