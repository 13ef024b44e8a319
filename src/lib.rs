//! Draws an HTML world map: capital markers over countries colored by
//! population.

pub mod capitals;
pub mod classify;
pub mod config;
pub mod map;
pub mod regions;
pub mod render;
pub mod server;
pub mod table;
pub mod types;

use anyhow::{Context, Result};
use config::AppConfig;
use table::Table;
use tracing::info;

/// Reads both inputs, builds the map and writes it to the configured
/// output path. Nothing is written unless every step succeeds.
pub fn generate(config: &AppConfig) -> Result<()> {
    info!("Reading capitals from {:?}", config.capitals_filepath);
    let table = Table::from_path(&config.capitals_filepath)
        .with_context(|| format!("Failed to read capitals file: {:?}", config.capitals_filepath))?;

    info!("Reading population from {:?}", config.population_filepath);
    let features = regions::load_regions(&config.population_filepath)?;

    let world_map = map::build_world_map(config, &table, features)?;
    render::save(&world_map, &config.output_map_filepath)
}
