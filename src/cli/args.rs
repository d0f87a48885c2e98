//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the readiness command
#[derive(Args, Debug)]
pub struct ReadinessArgs {
    /// Project file (.json, .yaml or .yml)
    pub project: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the windows command
#[derive(Args, Debug)]
pub struct WindowsArgs {
    /// Project file (.json, .yaml or .yml)
    pub project: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the preview command
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Project file (.json, .yaml or .yml)
    pub project: PathBuf,

    /// Media speed multiplier for real-time playback
    #[arg(long, default_value = "1.0")]
    pub speed: f64,

    /// Start position in seconds
    #[arg(long)]
    pub seek: Option<f64>,

    /// Play in wall-clock time instead of fast-forwarding
    #[arg(long)]
    pub realtime: bool,

    /// Report the playback state every N seconds of timeline
    #[arg(long, default_value = "1.0")]
    pub report_every: f64,
}

/// Arguments for the render command
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Project file (.json, .yaml or .yml)
    pub project: PathBuf,

    /// Language of the production stream
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Output resolution (720p, 1080p, 4K)
    #[arg(long)]
    pub resolution: Option<String>,

    /// Frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Render service base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Print the request payload and exit without submitting
    #[arg(long)]
    pub dry_run: bool,

    /// Write the project with its updated production streams here
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the queue command
#[derive(Args, Debug)]
pub struct QueueArgs {
    /// Project file (.json, .yaml or .yml)
    pub project: PathBuf,

    /// Dispatch mode (approved_only, all, selected)
    #[arg(long, default_value = "approved_only")]
    pub mode: String,

    /// Segment ids for the selected mode
    #[arg(long, value_delimiter = ',')]
    pub ids: Vec<String>,

    /// Approve segments before dispatching
    #[arg(long, value_delimiter = ',')]
    pub approve: Vec<String>,

    /// Lock segments before dispatching
    #[arg(long, value_delimiter = ',')]
    pub lock: Vec<String>,

    /// Unlock segments before dispatching
    #[arg(long, value_delimiter = ',')]
    pub unlock: Vec<String>,

    /// Generation service base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Only list what would be sent
    #[arg(long)]
    pub dry_run: bool,

    /// Write the updated project here
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the frames command
#[derive(Args, Debug)]
pub struct FramesArgs {
    /// Project file (.json, .yaml or .yml)
    pub project: PathBuf,

    /// Segment to generate keyframes for
    pub segment: String,

    /// Which keyframe(s) to generate (start, end, both)
    #[arg(long, default_value = "both")]
    pub frame_type: String,

    /// Generation service base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Write the updated project here
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
