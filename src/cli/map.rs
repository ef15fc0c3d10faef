//! Map command implementation.

use std::path::PathBuf;

use black_forest::game::World;

use super::output::format_map;
use super::{load_config, CliError, Overrides};

/// Print the generated layout for the configured seed and dimensions.
///
/// # Errors
///
/// Returns an error if the configuration is rejected or generation fails.
pub(crate) fn execute(config: Option<PathBuf>, overrides: Overrides) -> Result<(), CliError> {
    let config = load_config(config.as_deref(), overrides)?;
    let world = World::generate(&config)?;
    let view = world.view()?;
    println!("Map {}x{} (seed {})", config.width, config.height, config.seed);
    print!("{}", format_map(&view));
    Ok(())
}
