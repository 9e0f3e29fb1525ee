use std::path::PathBuf;

use anyhow::Result;

mod config;
mod terminal;

fn main() -> Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_PATH));
    let config = config::load(&path)?;

    shelf_logging::initialize(&config.log_destination(), config.log_level());
    shelf_logging::shelf_info!("Starting shelf with config {:?}", path);

    terminal::run_app(config)
}
