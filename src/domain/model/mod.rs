// Domain models - Core types and data structures

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// How a segment joins the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransitionType {
    #[default]
    Cut,
    Continue,
    Fade,
    Dissolve,
}

/// Keyframe anchoring lifecycle of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorStatus {
    #[default]
    Pending,
    StartLocked,
    EndPending,
    FullyAnchored,
}

impl AnchorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorStatus::Pending => "pending",
            AnchorStatus::StartLocked => "start-locked",
            AnchorStatus::EndPending => "end-pending",
            AnchorStatus::FullyAnchored => "fully-anchored",
        }
    }
}

impl fmt::Display for AnchorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frame(s) produced by a single frame-generation action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    Start,
    End,
    Both,
}

impl FrameType {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.to_lowercase().as_str() {
            "start" => Ok(FrameType::Start),
            "end" => Ok(FrameType::End),
            "both" => Ok(FrameType::Both),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid frame type: {}. Valid types: start, end, both",
                value
            ))),
        }
    }
}

/// Generation status of a take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakeStatus {
    #[default]
    Pending,
    Generating,
    Complete,
    Error,
}

/// One generated video asset attempt for a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Take {
    pub id: String,
    #[serde(default)]
    pub status: TakeStatus,
    #[serde(default)]
    pub asset_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub last_frame_url: Option<String>,
    #[serde(default)]
    pub duration_sec: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub external_render_ref: Option<String>,
}

impl Take {
    /// Create a take that has been requested but not generated yet
    pub fn pending() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: TakeStatus::Pending,
            asset_url: None,
            thumbnail_url: None,
            last_frame_url: None,
            duration_sec: 0.0,
            created_at: Utc::now(),
            external_render_ref: None,
        }
    }

    /// Create a finished take for a generated asset
    pub fn complete(asset_url: impl Into<String>, duration_sec: f64) -> Self {
        Self {
            status: TakeStatus::Complete,
            asset_url: Some(asset_url.into()),
            duration_sec,
            ..Self::pending()
        }
    }

    pub fn is_playable(&self) -> bool {
        self.status == TakeStatus::Complete && self.asset_url.is_some()
    }
}

/// A fixed-duration slice of scene video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub sequence_index: usize,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub transition: TransitionType,
    #[serde(default)]
    pub anchor_status: AnchorStatus,
    #[serde(default)]
    pub start_frame_url: Option<String>,
    #[serde(default)]
    pub end_frame_url: Option<String>,
    #[serde(default)]
    pub takes: Vec<Take>,
    #[serde(default)]
    pub active_asset_url: Option<String>,
}

impl Segment {
    /// Create a new segment, validating that it has a positive length
    pub fn new(
        id: impl Into<String>,
        sequence_index: usize,
        start_time: f64,
        end_time: f64,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if !start_time.is_finite() || !end_time.is_finite() || end_time <= start_time {
            return Err(DomainError::InvalidTimeRange(format!(
                "segment {} must end after it starts ({} >= {})",
                id, start_time, end_time
            )));
        }

        Ok(Self {
            id,
            sequence_index,
            start_time,
            end_time,
            transition: TransitionType::Cut,
            anchor_status: AnchorStatus::Pending,
            start_frame_url: None,
            end_frame_url: None,
            takes: Vec::new(),
            active_asset_url: None,
        })
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Append a new take; existing takes are superseded, never edited
    pub fn add_take(&mut self, take: Take) {
        self.takes.push(take);
    }

    /// Bind a completed take as the segment's active asset
    pub fn activate_take(&mut self, take_id: &str) -> Result<(), DomainError> {
        let take = self
            .takes
            .iter()
            .find(|t| t.id == take_id)
            .ok_or_else(|| DomainError::NotFound(format!("take {} on segment {}", take_id, self.id)))?;

        if !take.is_playable() {
            return Err(DomainError::BadArgs(format!(
                "take {} is not complete and cannot be activated",
                take_id
            )));
        }

        self.active_asset_url = take.asset_url.clone();
        Ok(())
    }

    /// The take currently bound to `active_asset_url`
    pub fn active_take(&self) -> Option<&Take> {
        let url = self.active_asset_url.as_deref()?;
        self.takes
            .iter()
            .rev()
            .find(|t| t.asset_url.as_deref() == Some(url))
    }
}

/// Kind of audio track in the mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioTrackKind {
    Narration,
    Dialogue,
    Music,
    Sfx,
}

impl AudioTrackKind {
    pub const ALL: [AudioTrackKind; 4] = [
        AudioTrackKind::Narration,
        AudioTrackKind::Dialogue,
        AudioTrackKind::Music,
        AudioTrackKind::Sfx,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioTrackKind::Narration => "narration",
            AudioTrackKind::Dialogue => "dialogue",
            AudioTrackKind::Music => "music",
            AudioTrackKind::Sfx => "sfx",
        }
    }
}

impl fmt::Display for AudioTrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker for "through the last segment"
pub const TO_LAST_SEGMENT: i64 = -1;

/// Binds a track's playback window to a segment range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioTrackConfig {
    pub enabled: bool,
    pub volume: f64,
    pub start_segment: usize,
    pub end_segment: i64,
    pub duration: Option<f64>,
    pub start_offset: f64,
}

impl Default for AudioTrackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 1.0,
            start_segment: 0,
            end_segment: TO_LAST_SEGMENT,
            duration: None,
            start_offset: 0.0,
        }
    }
}

impl AudioTrackConfig {
    /// Set volume, clamped into [0, 1]
    pub fn set_volume(&mut self, volume: f64) {
        self.volume = clamp_volume(volume);
    }

    /// Resolve `end_segment` against the current segment count
    pub fn resolved_end_segment(&self, segment_count: usize) -> Option<usize> {
        if segment_count == 0 {
            return None;
        }
        let last = segment_count - 1;
        let start = self.start_segment.min(last);
        let end = if self.end_segment < 0 {
            last
        } else {
            (self.end_segment as usize).min(last)
        };
        Some(end.max(start))
    }
}

pub(crate) fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        return 0.0;
    }
    volume.clamp(0.0, 1.0)
}

/// Per-line overrides for dialogue clips
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioClipConfig {
    pub id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl AudioClipConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            volume: None,
            start_time: None,
            duration: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Media behind an audio track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioClipSource {
    pub id: String,
    pub url: String,
    pub duration: f64,
    #[serde(default)]
    pub character: Option<String>,
}

/// One mixer track: its window binding plus the clips it plays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    pub kind: AudioTrackKind,
    #[serde(default)]
    pub config: AudioTrackConfig,
    #[serde(default)]
    pub clips: Vec<AudioClipSource>,
    #[serde(default)]
    pub clip_configs: Vec<AudioClipConfig>,
}

impl AudioTrack {
    pub fn new(kind: AudioTrackKind, clips: Vec<AudioClipSource>) -> Self {
        Self {
            kind,
            config: AudioTrackConfig::default(),
            clips,
            clip_configs: Vec::new(),
        }
    }

    pub fn clip_config(&self, clip_id: &str) -> Option<&AudioClipConfig> {
        self.clip_configs.iter().find(|c| c.id == clip_id)
    }

    /// Insert or replace the override for one clip
    pub fn upsert_clip_config(&mut self, config: AudioClipConfig) {
        match self.clip_configs.iter_mut().find(|c| c.id == config.id) {
            Some(existing) => *existing = config,
            None => self.clip_configs.push(config),
        }
    }
}

/// Absolute time window of a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackWindow {
    pub start_time: f64,
    pub end_time: f64,
}

impl TrackWindow {
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }
}

/// A clip placed on the global timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedClip {
    pub clip_id: String,
    pub url: String,
    pub start_time: f64,
    pub duration: f64,
    pub volume: f64,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
}

impl ResolvedClip {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// Text burned into the render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    pub text: String,
    pub start_time: f64,
    pub duration: f64,
    #[serde(default)]
    pub position: Option<String>,
}

/// Output resolution accepted by the render service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "720p")]
    Hd720,
    #[default]
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "4K")]
    Uhd4k,
}

impl Resolution {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.to_lowercase().as_str() {
            "720p" => Ok(Resolution::Hd720),
            "1080p" => Ok(Resolution::Hd1080),
            "4k" | "2160p" => Ok(Resolution::Uhd4k),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid resolution: {}. Valid values: 720p, 1080p, 4K",
                value
            ))),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Resolution::Hd720 => (1280, 720),
            Resolution::Hd1080 => (1920, 1080),
            Resolution::Uhd4k => (3840, 2160),
        }
    }
}

/// Local lifecycle of a render job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStatus {
    #[default]
    Idle,
    Preparing,
    Rendering,
    Complete,
    Error,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderJob {
    pub id: Option<String>,
    pub status: RenderStatus,
    pub progress: f64,
    pub download_url: Option<String>,
    pub error: Option<String>,
}

impl RenderJob {
    /// Preparing or rendering; a new job may not start
    pub fn is_active(&self) -> bool {
        matches!(self.status, RenderStatus::Preparing | RenderStatus::Rendering)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Rendering,
    Complete,
}

/// A rendered output bound to one language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionStream {
    pub id: String,
    pub language: String,
    pub status: StreamStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp4_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProductionStream {
    pub fn rendering(language: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            language: language.into(),
            status: StreamStatus::Rendering,
            mp4_url: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Approval state of a segment in the generation queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalStatus {
    #[default]
    AutoReady,
    UserApproved,
    Locked,
    Rendering,
    Rendered,
    Error,
}

/// Selection rule for a batch generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchMode {
    /// Everything except AutoReady, Locked and in-flight Rendering items
    ApprovedOnly,
    All,
    Selected(Vec<String>),
}

impl DispatchMode {
    /// Parse mode name; `selected` takes the explicit id list
    pub fn parse(mode: &str, ids: Vec<String>) -> Result<Self, DomainError> {
        match mode.to_lowercase().as_str() {
            "approved_only" | "approved-only" => Ok(DispatchMode::ApprovedOnly),
            "all" => Ok(DispatchMode::All),
            "selected" => {
                if ids.is_empty() {
                    return Err(DomainError::BadArgs(
                        "selected mode requires at least one segment id".to_string(),
                    ));
                }
                Ok(DispatchMode::Selected(ids))
            }
            _ => Err(DomainError::BadArgs(format!(
                "Invalid dispatch mode: {}. Valid modes: approved_only, all, selected",
                mode
            ))),
        }
    }
}

/// One entry of the generation queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub segment_id: String,
    #[serde(default)]
    pub approval_status: ApprovalStatus,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub reference_images: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl QueueItem {
    pub fn new(segment_id: impl Into<String>, approval_status: ApprovalStatus) -> Self {
        Self {
            segment_id: segment_id.into(),
            approval_status,
            prompt: None,
            negative_prompt: None,
            reference_images: Vec::new(),
            error: None,
        }
    }
}

/// Everything the engine needs about one scene, as read from a project file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneProject {
    pub scene_id: String,
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub audio_tracks: Vec<AudioTrack>,
    #[serde(default)]
    pub text_overlays: Vec<TextOverlay>,
    #[serde(default)]
    pub queue: Vec<QueueItem>,
    /// Production ledger: one entry per rendered or rendering language
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub production_streams: Vec<ProductionStream>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rendered_url: Option<String>,
}

#[cfg(test)]
mod tests;
