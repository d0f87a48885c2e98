//! CLI module for SceneSync
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// SceneSync scene production engine
///
/// Headless front end for anchor readiness, audio track placement, preview
/// playback, render jobs and the video generation queue of one scene project.
#[derive(Parser, Debug)]
#[command(name = "scenesync")]
#[command(about = "SceneSync - Scene timeline, preview sync and render control")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report keyframe anchoring progress of every segment
    Readiness(args::ReadinessArgs),
    /// Show where each audio track and clip lands on the timeline
    Windows(args::WindowsArgs),
    /// Play the scene on a simulated clock and report sync state
    Preview(args::PreviewArgs),
    /// Submit the scene to the render service and wait for the result
    Render(args::RenderArgs),
    /// Run the video generation queue
    Queue(args::QueueArgs),
    /// Generate start and/or end keyframes for one segment
    Frames(args::FramesArgs),
}
