use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod lock;
mod notifier;
mod presenter;

use context::AppContext;

const DEFAULT_FILTER: &str = "eyecare=info,eyecare_core=info";
const VERBOSE_FILTER: &str = "eyecare=debug,eyecare_core=debug";

#[derive(Parser)]
#[command(name = "eyecare", version, about = "20-20-20 eye care reminder")]
struct Cli {
    /// Directory holding eyecare.db and config.toml
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reminder loop in the foreground
    Run {
        /// Restore the saved session but do not start work when idle
        #[arg(long)]
        no_autostart: bool,
    },
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Settings management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Completed cycle statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
}

fn init_logging(verbose: bool, ctx: &AppContext) {
    let directive = if verbose {
        VERBOSE_FILTER
    } else {
        ctx.config.log.filter.as_deref().unwrap_or(DEFAULT_FILTER)
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let result = AppContext::load(cli.data_dir).and_then(|ctx| {
        init_logging(cli.verbose, &ctx);
        ctx.report_config_fallback();
        match cli.command {
            Commands::Run { no_autostart } => commands::run::run(&ctx, no_autostart),
            Commands::Timer { action } => commands::timer::run(&ctx, action),
            Commands::Config { action } => commands::config::run(&ctx, action),
            Commands::Stats { action } => commands::stats::run(&ctx, action),
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
