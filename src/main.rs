//! Black Forest CLI - play matches between scripted teams and print maps.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Black Forest - a two-team capture and rescue battle on a grid
#[derive(Parser, Debug)]
#[command(name = "blackforest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every command.
#[derive(ClapArgs, Debug)]
struct MatchArgs {
    /// TOML match configuration (default: built-in settings)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Map width
    #[arg(long)]
    width: Option<i32>,

    /// Map height
    #[arg(long)]
    height: Option<i32>,
}

impl MatchArgs {
    fn into_parts(
        self,
        max_ticks: Option<u64>,
        sequential: bool,
    ) -> (Option<PathBuf>, cli::Overrides) {
        let overrides = cli::Overrides {
            seed: self.seed,
            width: self.width,
            height: self.height,
            max_ticks,
            sequential,
        };
        (self.config, overrides)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a single match
    Run {
        #[command(flatten)]
        settings: MatchArgs,

        /// Tick limit before the match is a draw
        #[arg(short = 't', long)]
        max_ticks: Option<u64>,

        /// Let agents act one after another (reproducible)
        #[arg(long)]
        sequential: bool,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Suppress the match banner
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print a generated map
    Map {
        #[command(flatten)]
        settings: MatchArgs,
    },
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("black_forest=info")),
        1 => EnvFilter::new("black_forest=debug"),
        _ => EnvFilter::new("black_forest=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match args.command {
        Commands::Run {
            settings,
            max_ticks,
            sequential,
            format,
            quiet,
        } => {
            let (config, overrides) = settings.into_parts(max_ticks, sequential);
            cli::run::execute(config, overrides, format, quiet)
        }

        Commands::Map { settings } => {
            let (config, overrides) = settings.into_parts(None, false);
            cli::map::execute(config, overrides)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_run_flags_parse() {
        let args = Args::try_parse_from([
            "blackforest", "-v", "run", "--seed", "7", "--sequential", "--format", "json",
        ])
        .unwrap();
        assert_eq!(args.verbose, 1);
        let Commands::Run {
            settings,
            sequential,
            format,
            ..
        } = args.command
        else {
            panic!("expected run");
        };
        assert_eq!(settings.seed, Some(7));
        assert!(sequential);
        assert_eq!(format, cli::OutputFormat::Json);
    }
}
