//! SceneSync library
//!
//! Headless engine for one scene of a video production: segment anchoring and
//! readiness, audio track window resolution, synchronized audio/video preview
//! playback with elastic freeze, render job control and the video generation queue.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{AudioTrack, AudioTrackKind, SceneProject, Segment, Take};
pub use domain::store::SegmentStore;
pub use error::{SceneSyncError, SceneSyncResult};
