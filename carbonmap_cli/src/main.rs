mod cli;
mod display;
mod error;

use std::path::Path;

use anyhow::Result;
use carbonmap::config::Config;
use clap::Parser;
use cli::{Cli, RunCommand};
use error::CarbonMapCliResult;
use log::{debug, warn};

const DEFAULT_LOGGING_LEVEL: &str = "warn";

#[tokio::main]
async fn main() -> Result<()> {
    // Set RUST_LOG to `DEFAULT_LOGGING_LEVEL` if not set
    let _ =
        std::env::var("RUST_LOG").map_err(|_| std::env::set_var("RUST_LOG", DEFAULT_LOGGING_LEVEL));
    pretty_env_logger::init_timed();
    let args = Cli::parse();
    debug!("args: {args:?}");
    let config: Config = read_config_from_toml()?;
    debug!("config: {config:?}");

    if let Some(command) = args.command {
        command.run(config).await?;
    }
    Ok(())
}

fn read_config_from_toml() -> CarbonMapCliResult<Config> {
    // macOS: ~/Library/Application Support/carbonmap/config.toml
    match dirs::config_dir() {
        Some(dir) => read_config_file(&dir.join("carbonmap").join("config.toml")),
        None => {
            warn!("No config directory found, using default config");
            Ok(Config::default())
        }
    }
}

fn read_config_file(file_path: &Path) -> CarbonMapCliResult<Config> {
    match std::fs::read_to_string(file_path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}
