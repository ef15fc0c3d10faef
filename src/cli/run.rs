//! Run command implementation.

use std::path::PathBuf;

use black_forest::simulation::run_match;

use super::output::format_match_text;
use super::{load_config, CliError, OutputFormat, Overrides};

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the configuration is rejected or the match fails.
pub(crate) fn execute(
    config: Option<PathBuf>,
    overrides: Overrides,
    format: OutputFormat,
    quiet: bool,
) -> Result<(), CliError> {
    let config = load_config(config.as_deref(), overrides)?;

    if !quiet && format == OutputFormat::Text {
        println!(
            "Running match on a {}x{} map with seed {}...",
            config.width, config.height, config.seed
        );
        println!(
            "Roster per team: {} warriors, {} archers, {} priests, {} gatherers",
            config.roster.warriors,
            config.roster.archers,
            config.roster.priests,
            config.roster.gatherers
        );
        println!();
    }

    let result = run_match(&config)?;

    match format {
        OutputFormat::Text => {
            print!("{}", format_match_text(&result));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
