//! Configuration initialization and hierarchy management

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::adapters::toml_config::{AppConfig, TomlConfigAdapter};
use crate::cli::{Cli, Commands};

/// Environment variables mapped onto configuration keys
pub const ENV_MAPPINGS: &[(&str, &str)] = &[
    ("SCENESYNC_RENDER_BASE_URL", "render_base_url"),
    ("SCENESYNC_RENDER_POLL_INTERVAL_SECS", "render_poll_interval_secs"),
    ("SCENESYNC_RENDER_MAX_POLL_ATTEMPTS", "render_max_poll_attempts"),
    ("SCENESYNC_RENDER_RESOLUTION", "render_resolution"),
    ("SCENESYNC_RENDER_FPS", "render_fps"),
    ("SCENESYNC_PLAYBACK_TICK_MS", "playback_tick_ms"),
    ("SCENESYNC_PLAYBACK_DRIFT_THRESHOLD_SECS", "playback_drift_threshold_secs"),
    ("SCENESYNC_GENERATION_BASE_URL", "generation_base_url"),
    ("SCENESYNC_GENERATION_INTER_ITEM_DELAY_SECS", "generation_inter_item_delay_secs"),
    ("SCENESYNC_GENERATION_RATE_LIMIT_BACKOFF_SECS", "generation_rate_limit_backoff_secs"),
    ("SCENESYNC_LOG_LEVEL", "log_level"),
    ("SCENESYNC_LOG_JSON", "log_json"),
];

/// Build the effective configuration following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli) -> Result<AppConfig> {
    let mut adapter = TomlConfigAdapter::new();

    load_config_file(&mut adapter, cli.config.as_deref())?;
    let env_overrides = apply_environment(&mut adapter, std::env::vars())?;
    let cli_overrides = apply_cli_overrides(&mut adapter, cli)?;

    let config = adapter.into_config();
    config.validate().context("Invalid configuration")?;
    debug!(env_overrides, cli_overrides, "Configuration hierarchy resolved");
    Ok(config)
}

/// Load the explicit config file, or the default location when it exists
fn load_config_file(adapter: &mut TomlConfigAdapter, explicit: Option<&Path>) -> Result<()> {
    match explicit {
        Some(path) => {
            adapter
                .load_config(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?;
            info!("Loading configuration from: {}", path.display());
        }
        None => {
            let path = TomlConfigAdapter::default_config_path();
            if path.exists() {
                adapter
                    .load_config(&path)
                    .with_context(|| format!("Failed to load config file {}", path.display()))?;
                info!("Loading configuration from: {}", path.display());
            }
        }
    }
    Ok(())
}

/// Apply `SCENESYNC_*` variables; returns the number applied
pub fn apply_environment<I>(adapter: &mut TomlConfigAdapter, vars: I) -> Result<usize>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut applied = 0;
    for (name, value) in vars {
        let Some((_, key)) = ENV_MAPPINGS.iter().find(|(env, _)| *env == name) else {
            continue;
        };
        adapter
            .set_config(key, &value)
            .with_context(|| format!("Invalid value in {}", name))?;
        debug!("Found environment override: {} = {}", name, value);
        applied += 1;
    }
    Ok(applied)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(adapter: &mut TomlConfigAdapter, cli: &Cli) -> Result<usize> {
    let mut overrides = Vec::new();

    if let Some(level) = &cli.log_level {
        overrides.push(("log_level", level.clone()));
    }
    if cli.json_logs {
        overrides.push(("log_json", "true".to_string()));
    }

    match &cli.command {
        Commands::Render(args) => {
            if let Some(url) = &args.base_url {
                overrides.push(("render_base_url", url.clone()));
            }
            if let Some(resolution) = &args.resolution {
                overrides.push(("render_resolution", resolution.clone()));
            }
            if let Some(fps) = args.fps {
                overrides.push(("render_fps", fps.to_string()));
            }
        }
        Commands::Queue(args) => {
            if let Some(url) = &args.base_url {
                overrides.push(("generation_base_url", url.clone()));
            }
        }
        Commands::Frames(args) => {
            if let Some(url) = &args.base_url {
                overrides.push(("generation_base_url", url.clone()));
            }
        }
        _ => {}
    }

    for (key, value) in &overrides {
        adapter.set_config(key, value)?;
    }
    Ok(overrides.len())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_environment_overrides_file_values() {
        let mut adapter = TomlConfigAdapter::new();
        adapter.config_mut().render.fps = 30;

        let applied = apply_environment(
            &mut adapter,
            vars(&[
                ("SCENESYNC_RENDER_FPS", "60"),
                ("SCENESYNC_LOG_LEVEL", "debug"),
                ("PATH", "/usr/bin"),
            ]),
        )
        .unwrap();

        assert_eq!(applied, 2);
        assert_eq!(adapter.config().render.fps, 60);
        assert_eq!(adapter.config().logging.level, "debug");
    }

    #[test]
    fn test_bad_environment_value_is_reported() {
        let mut adapter = TomlConfigAdapter::new();
        let err = apply_environment(&mut adapter, vars(&[("SCENESYNC_RENDER_FPS", "many")])).unwrap_err();
        assert!(err.to_string().contains("SCENESYNC_RENDER_FPS"));
    }

    #[test]
    fn test_cli_wins_over_environment() {
        let mut adapter = TomlConfigAdapter::new();
        apply_environment(&mut adapter, vars(&[("SCENESYNC_RENDER_RESOLUTION", "720p")])).unwrap();

        let cli = Cli::parse_from([
            "scenesync",
            "--log-level",
            "warn",
            "render",
            "scene.json",
            "--resolution",
            "4K",
        ]);
        let applied = apply_cli_overrides(&mut adapter, &cli).unwrap();

        assert_eq!(applied, 2);
        assert_eq!(adapter.config().render.resolution, "4K");
        assert_eq!(adapter.config().logging.level, "warn");
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenesync.toml");
        std::fs::write(&path, "[playback]\ntick_ms = 50\n").unwrap();

        let mut adapter = TomlConfigAdapter::new();
        load_config_file(&mut adapter, Some(&path)).unwrap();
        assert_eq!(adapter.config().playback.tick_ms, 50);

        let missing = dir.path().join("nope.toml");
        assert!(load_config_file(&mut adapter, Some(&missing)).is_err());
    }
}
