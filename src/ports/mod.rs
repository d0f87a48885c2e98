// Ports - Interface definitions (contracts)

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for the external render/mux service
#[async_trait]
pub trait RenderServicePort: Send + Sync {
    /// Submit a render job for a scene and return the remote job id
    async fn submit_render(&self, scene_id: &str, request: &RenderRequest) -> Result<String, DomainError>;

    /// Fetch the current status of a submitted job
    async fn poll_render(&self, job_id: &str) -> Result<RenderPollResponse, DomainError>;
}

/// Port for the external video generation API
#[async_trait]
pub trait GenerationPort: Send + Sync {
    /// Generate a video take for one segment.
    ///
    /// Implementations map a rate-limit response to `DomainError::RateLimited`.
    async fn generate_video(&self, request: &GenerationRequest) -> Result<GeneratedAsset, DomainError>;

    /// Generate the start and/or end keyframe image for one segment
    async fn generate_frames(&self, request: &FrameRequest) -> Result<GeneratedFrames, DomainError>;
}

/// Port for cooperative sleeping, injected so retry loops run without real timers in tests
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Handle to one repeating timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

/// Port for repeating timers driving the elastic playback clock
pub trait IntervalScheduler: Send {
    /// Start a repeating timer; ticks are delivered to the session by the driver
    fn start_interval(&mut self, period: Duration) -> TimerToken;

    /// Cancel a timer; unknown or already-cancelled tokens are ignored
    fn cancel(&mut self, token: TimerToken);
}

/// Port for one playable media resource (video clip or audio clip)
pub trait MediaElement: Send {
    /// URL currently loaded
    fn source(&self) -> &str;

    /// Load a new source, resetting the playhead
    fn load(&mut self, url: &str) -> Result<(), DomainError>;

    /// Start playback; may be rejected (autoplay policy and similar)
    fn play(&mut self) -> Result<(), DomainError>;

    fn pause(&mut self);

    fn seek(&mut self, seconds: f64);

    /// Reported playhead position in seconds
    fn position(&self) -> f64;

    /// Media duration if known
    fn duration(&self) -> Option<f64>;

    fn is_paused(&self) -> bool;

    fn set_volume(&mut self, volume: f64);
}

/// Port creating media elements for URLs
pub trait MediaFactory: Send {
    fn create(&self, url: &str) -> Box<dyn MediaElement>;
}

/// Render request body sent to the render service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub resolution: Resolution,
    pub fps: u32,
    pub audio_config: AudioMixConfig,
    pub segments: Vec<RenderSegment>,
    pub audio_tracks: RenderAudioTracks,
    pub text_overlays: Vec<TextOverlay>,
}

/// Which tracks go into the mix and at what level
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMixConfig {
    pub include_narration: bool,
    pub include_dialogue: bool,
    pub include_music: bool,
    pub include_sfx: bool,
    pub include_segment_audio: bool,
    pub language: String,
    pub narration_volume: f64,
    pub dialogue_volume: f64,
    pub music_volume: f64,
    pub sfx_volume: f64,
}

/// Audio used from a segment's own clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentAudioSource {
    Original,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSegment {
    pub segment_id: String,
    pub sequence_index: usize,
    pub video_url: String,
    pub start_time: f64,
    pub end_time: f64,
    pub audio_source: SegmentAudioSource,
    pub audio_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderAudioTracks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<Vec<RenderAudioClip>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<Vec<RenderAudioClip>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music: Option<Vec<RenderAudioClip>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sfx: Option<Vec<RenderAudioClip>>,
}

impl RenderAudioTracks {
    pub fn slot_mut(&mut self, kind: AudioTrackKind) -> &mut Option<Vec<RenderAudioClip>> {
        match kind {
            AudioTrackKind::Narration => &mut self.narration,
            AudioTrackKind::Dialogue => &mut self.dialogue,
            AudioTrackKind::Music => &mut self.music,
            AudioTrackKind::Sfx => &mut self.sfx,
        }
    }

    pub fn clip_count(&self) -> usize {
        [&self.narration, &self.dialogue, &self.music, &self.sfx]
            .iter()
            .filter_map(|slot| slot.as_ref())
            .map(Vec::len)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderAudioClip {
    pub url: String,
    pub start_time: f64,
    pub duration: f64,
    pub volume: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
}

/// Remote job status as reported by the render service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RemoteRenderStatus {
    #[serde(rename = "RENDERING", alias = "PROCESSING", alias = "QUEUED", alias = "PENDING")]
    Rendering,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    Failed,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPollResponse {
    pub status: RemoteRenderStatus,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of a video generation call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub segment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_type: Option<FrameType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub reference_images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAsset {
    pub asset_url: String,
    #[serde(default)]
    pub duration_sec: Option<f64>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub last_frame_url: Option<String>,
}

/// Body of a keyframe generation call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRequest {
    pub segment_id: String,
    pub frame_type: FrameType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFrames {
    #[serde(default)]
    pub start_frame_url: Option<String>,
    #[serde(default)]
    pub end_frame_url: Option<String>,
}
