//! SceneSync CLI
//!
//! Command-line front end for a scene production project file.
//!
//! # Usage
//!
//! ```bash
//! scenesync readiness scene.json
//! scenesync windows scene.yaml --json
//! scenesync preview scene.json --seek 12.5
//! scenesync render scene.json --language fr --resolution 4K
//! scenesync queue scene.json --mode selected --ids seg-2,seg-3
//! scenesync frames scene.json seg-2 --frame-type start -o scene.json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use scenesync::app::DefaultAppContainer;
use scenesync::cli::{commands, Cli};
use scenesync::config_initialization::initialize_configuration_hierarchy;
use scenesync::utils::logging::{LoggingConfig, LoggingSystem};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = initialize_configuration_hierarchy(&cli)?;

    let logging = LoggingSystem::new(LoggingConfig::from_settings(
        &config.logging.level,
        config.logging.json,
    )?);
    logging.initialize();
    logging.log_system_info();

    let container = DefaultAppContainer::new(config)?;

    info!("Executing {} command", command_name(&cli.command));
    let result = commands::execute(cli.command, &container).await;
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

fn command_name(command: &scenesync::cli::Commands) -> &'static str {
    use scenesync::cli::Commands;
    match command {
        Commands::Readiness(_) => "readiness",
        Commands::Windows(_) => "windows",
        Commands::Preview(_) => "preview",
        Commands::Render(_) => "render",
        Commands::Queue(_) => "queue",
        Commands::Frames(_) => "frames",
    }
}
