// Timeline interactor - Preview clock shared by segment video and audio tracks

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::adapters::toml_config::PlaybackConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::domain::store::SegmentStore;
use crate::ports::*;

pub mod driver;

pub use driver::{RealtimePlaybackDriver, VirtualPlaybackDriver};

const EPSILON: f64 = 1e-6;

/// Tunables of a preview session
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSettings {
    /// Period of the elastic-extension timer
    pub tick: Duration,
    /// Audio is hard-seeked only when it drifts further than this
    pub drift_threshold: f64,
    /// Spacing of dialogue lines without an explicit start
    pub dialogue_stagger: f64,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            drift_threshold: 0.5,
            dialogue_stagger: DEFAULT_DIALOGUE_STAGGER_SECS,
        }
    }
}

impl From<&PlaybackConfig> for TimelineSettings {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            tick: config.tick(),
            drift_threshold: config.drift_threshold_secs,
            dialogue_stagger: config.dialogue_stagger_secs,
        }
    }
}

/// Observable playback state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineState {
    pub current_segment_index: usize,
    pub current_time: f64,
    pub is_playing: bool,
    pub is_video_frozen: bool,
}

/// Resolved placement of one track, for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub kind: AudioTrackKind,
    pub enabled: bool,
    pub window: TrackWindow,
    pub audio_end: Option<f64>,
    pub clips: Vec<ResolvedClip>,
}

struct TrackPlayer {
    kind: AudioTrackKind,
    track_enabled: bool,
    clip: ResolvedClip,
    element: Box<dyn MediaElement>,
}

/// One preview session: segment video, N audio tracks, one clock.
///
/// All mutation goes through the command methods. `halt_playback` is the only
/// path that clears `is_playing`, and it always cancels the elastic timer.
pub struct TimelineSession {
    store: SegmentStore,
    tracks: Vec<AudioTrack>,
    settings: TimelineSettings,
    media: Box<dyn MediaFactory>,
    scheduler: Box<dyn IntervalScheduler>,
    video: Box<dyn MediaElement>,
    loaded_segment: Option<usize>,
    players: Vec<TrackPlayer>,
    segment_starts: Vec<f64>,
    video_total: f64,
    audio_end: f64,
    total_duration: f64,
    state: TimelineState,
    elastic_timer: Option<TimerToken>,
    last_finished_at: Option<f64>,
}

impl TimelineSession {
    /// Create a session; segments are validated and ordered, one track per kind
    pub fn new(
        segments: Vec<Segment>,
        tracks: Vec<AudioTrack>,
        settings: TimelineSettings,
        media: Box<dyn MediaFactory>,
        scheduler: Box<dyn IntervalScheduler>,
    ) -> Result<Self, DomainError> {
        let store = SegmentStore::new(segments)?;
        Self::validate_tracks(&tracks)?;

        let video = media.create("");
        let mut session = Self {
            store,
            tracks,
            settings,
            media,
            scheduler,
            video,
            loaded_segment: None,
            players: Vec::new(),
            segment_starts: Vec::new(),
            video_total: 0.0,
            audio_end: 0.0,
            total_duration: 0.0,
            state: TimelineState::default(),
            elastic_timer: None,
            last_finished_at: None,
        };

        session.refresh_timeline();
        if !session.store.is_empty() {
            session.ensure_video_loaded(0);
        }

        info!(
            segments = session.store.len(),
            tracks = session.tracks.len(),
            video_total = session.video_total,
            total = session.total_duration,
            "Preview session created"
        );
        Ok(session)
    }

    fn validate_tracks(tracks: &[AudioTrack]) -> Result<(), DomainError> {
        let mut kinds = HashSet::new();
        for track in tracks {
            if !kinds.insert(track.kind) {
                return Err(DomainError::BadArgs(format!(
                    "more than one {} track configured",
                    track.kind
                )));
            }
        }
        Ok(())
    }

    pub fn state(&self) -> &TimelineState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn segments(&self) -> &[Segment] {
        self.store.segments()
    }

    pub fn tracks(&self) -> &[AudioTrack] {
        &self.tracks
    }

    pub fn video_total_duration(&self) -> f64 {
        self.video_total
    }

    pub fn audio_end_time(&self) -> f64 {
        self.audio_end
    }

    /// `max(video total, latest audio end)`
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn segment_start_time(&self, index: usize) -> f64 {
        self.segment_starts
            .get(index)
            .copied()
            .unwrap_or(self.video_total)
    }

    /// Whether the elastic-extension timer is outstanding
    pub fn elastic_active(&self) -> bool {
        self.elastic_timer.is_some()
    }

    /// Global time at which the last playback run auto-stopped
    pub fn last_finished_at(&self) -> Option<f64> {
        self.last_finished_at
    }

    pub fn readiness(&self) -> Readiness {
        self.store.readiness()
    }

    /// Resolved windows and clip placements of every track
    pub fn track_summaries(&self) -> Vec<TrackSummary> {
        let segments = self.store.segments();
        let stagger = self.settings.dialogue_stagger;
        self.tracks
            .iter()
            .map(|track| TrackSummary {
                kind: track.kind,
                enabled: track.config.enabled,
                window: TrackResolver::resolve_track_window(&track.config, segments),
                audio_end: TrackResolver::track_audio_end(track, segments, stagger),
                clips: TrackResolver::resolve_clips(track, segments, stagger),
            })
            .collect()
    }

    // ----- commands -----

    pub fn play(&mut self) {
        if self.state.is_playing {
            return;
        }
        if self.total_duration <= 0.0 {
            warn!("Nothing to play: timeline is empty");
            return;
        }
        if self.state.current_time >= self.total_duration - EPSILON {
            self.reset_to_start();
        }

        self.state.is_playing = true;
        self.last_finished_at = None;
        info!(at = self.state.current_time, "Playback started");

        if self.state.current_time >= self.video_total - EPSILON {
            self.enter_elastic();
        } else {
            let index = self.state.current_segment_index;
            if self.ensure_video_loaded(index) {
                self.play_video();
            } else {
                self.advance_from(index + 1);
            }
        }
        self.sync_audio();
    }

    pub fn pause(&mut self) {
        if !self.state.is_playing {
            return;
        }
        self.halt_playback();
        info!(at = self.state.current_time, "Playback paused");
    }

    /// Halt playback and return to the beginning
    pub fn stop(&mut self) {
        self.halt_playback();
        self.reset_to_start();
        info!("Playback stopped");
    }

    /// Scrub to global time `t`.
    ///
    /// Video is located with `t` clamped to the video length; the clock keeps the
    /// unclamped value so audio beyond the video still resolves.
    pub fn seek(&mut self, t: f64) {
        let t = if t.is_finite() { t.max(0.0) } else { 0.0 };
        self.cancel_elastic_timer();
        self.state.is_video_frozen = false;

        let video_t = t.min(self.video_total);
        let mut located = true;
        if let Some((index, local)) = TimelineMath::locate(self.store.segments(), video_t) {
            self.state.current_segment_index = index;
            located = self.ensure_video_loaded(index);
            if located {
                self.video.seek(local);
            }
        }
        self.state.current_time = t;
        debug!(to = t, segment = self.state.current_segment_index, "Seek");

        if self.state.is_playing {
            if t >= self.total_duration - EPSILON {
                self.finish_playback(self.total_duration);
                return;
            }
            if t >= self.video_total - EPSILON {
                self.enter_elastic();
            } else if located {
                self.play_video();
            } else {
                let next = self.state.current_segment_index + 1;
                self.advance_from(next);
            }
        } else {
            self.video.pause();
        }
        self.sync_audio();
    }

    /// Replace one track's configuration; total duration and sync follow immediately
    pub fn set_track_config(&mut self, kind: AudioTrackKind, mut config: AudioTrackConfig) -> Result<(), DomainError> {
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.kind == kind)
            .ok_or_else(|| DomainError::NotFound(format!("{} track", kind)))?;

        config.set_volume(config.volume);
        track.config = config;
        debug!(track = %kind, "Track configuration updated");
        self.after_configuration_change();
        Ok(())
    }

    /// Override one dialogue line
    pub fn set_clip_config(&mut self, kind: AudioTrackKind, config: AudioClipConfig) -> Result<(), DomainError> {
        if kind != AudioTrackKind::Dialogue {
            return Err(DomainError::BadArgs(format!(
                "per-clip overrides apply to dialogue only, not {}",
                kind
            )));
        }
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.kind == kind)
            .ok_or_else(|| DomainError::NotFound(format!("{} track", kind)))?;
        if !track.clips.iter().any(|c| c.id == config.id) {
            return Err(DomainError::NotFound(format!("dialogue clip {}", config.id)));
        }

        track.upsert_clip_config(config);
        self.after_configuration_change();
        Ok(())
    }

    /// Replace the whole track list
    pub fn replace_tracks(&mut self, tracks: Vec<AudioTrack>) -> Result<(), DomainError> {
        Self::validate_tracks(&tracks)?;
        self.tracks = tracks;
        self.after_configuration_change();
        Ok(())
    }

    /// Re-segmentation: swap the segment list, keeping the clock where it was
    pub fn replace_segments(&mut self, segments: Vec<Segment>) -> Result<(), DomainError> {
        self.store.replace_all(segments)?;
        self.loaded_segment = None;
        self.refresh_timeline();
        let t = self.state.current_time.min(self.total_duration);
        self.seek(t);
        Ok(())
    }

    /// Write generated keyframes back to a segment
    pub fn apply_frames(
        &mut self,
        segment_id: &str,
        frame_type: FrameType,
        start_url: Option<String>,
        end_url: Option<String>,
    ) -> Result<AnchorStatus, DomainError> {
        self.store.apply_frames(segment_id, frame_type, start_url, end_url)
    }

    /// Attach a take to a segment; activating it reloads the clip if it is on screen
    pub fn record_take(&mut self, segment_id: &str, take: Take, activate: bool) -> Result<(), DomainError> {
        self.store.record_take(segment_id, take, activate)?;
        if activate {
            self.invalidate_segment(segment_id);
        }
        Ok(())
    }

    pub fn activate_take(&mut self, segment_id: &str, take_id: &str) -> Result<(), DomainError> {
        self.store.activate_take(segment_id, take_id)?;
        self.invalidate_segment(segment_id);
        Ok(())
    }

    // ----- media events -----

    /// Pull the video element's playhead, as a `timeupdate`/`ended` listener would
    pub fn on_frame(&mut self) {
        if !self.state.is_playing || self.state.is_video_frozen {
            return;
        }
        let index = self.state.current_segment_index;
        let Some(segment_duration) = self.store.segments().get(index).map(Segment::duration) else {
            return;
        };

        let position = self.video.position();
        let clip_end = self.video.duration().unwrap_or(segment_duration);
        if position >= clip_end - EPSILON {
            self.on_video_ended();
        } else {
            self.on_video_time_update(position);
        }
    }

    /// Local clip time of the active segment advanced
    pub fn on_video_time_update(&mut self, local: f64) {
        if !self.state.is_playing || self.state.is_video_frozen {
            return;
        }
        let index = self.state.current_segment_index;
        let Some(segment) = self.store.segments().get(index) else {
            return;
        };

        let local = local.clamp(0.0, segment.duration());
        self.state.current_time = self.segment_start_time(index) + local;
        self.sync_audio();
    }

    /// Active segment's clip finished
    pub fn on_video_ended(&mut self) {
        if !self.state.is_playing || self.state.is_video_frozen {
            return;
        }
        let next = self.state.current_segment_index + 1;
        self.advance_from(next);
        self.sync_audio();
    }

    /// Active segment's clip failed; it counts as a zero-length clip
    pub fn on_video_error(&mut self, message: &str) {
        warn!(
            segment = self.state.current_segment_index,
            error = message,
            "Segment clip failed during playback; skipping"
        );
        self.loaded_segment = None;
        self.on_video_ended();
    }

    /// Elastic-extension timer fired
    pub fn on_timer_tick(&mut self, token: TimerToken) {
        if self.elastic_timer != Some(token) {
            trace!(?token, "Ignoring stale timer tick");
            return;
        }
        if !self.state.is_playing {
            self.cancel_elastic_timer();
            return;
        }

        self.state.current_time += self.settings.tick.as_secs_f64();
        if self.state.current_time >= self.audio_end - EPSILON {
            self.state.current_time = self.audio_end;
            self.finish_playback(self.audio_end);
            return;
        }
        self.sync_audio();
    }

    // ----- internals -----

    fn refresh_timeline(&mut self) {
        let segments = self.store.segments();
        self.segment_starts = (0..segments.len())
            .map(|i| TimelineMath::segment_start_time(segments, i))
            .collect();
        self.video_total = TimelineMath::video_total_duration(segments);
        self.audio_end = TrackResolver::max_audio_end(&self.tracks, segments, self.settings.dialogue_stagger);
        self.total_duration = self.video_total.max(self.audio_end);
        self.rebuild_players();

        debug!(
            video_total = self.video_total,
            audio_end = self.audio_end,
            total = self.total_duration,
            "Timeline recomputed"
        );
    }

    fn rebuild_players(&mut self) {
        for player in &mut self.players {
            player.element.pause();
        }

        let segments = self.store.segments();
        let mut players = Vec::new();
        for track in &self.tracks {
            for clip in TrackResolver::resolve_clips(track, segments, self.settings.dialogue_stagger) {
                let mut element = self.media.create(&clip.url);
                element.set_volume(clip.volume);
                players.push(TrackPlayer {
                    kind: track.kind,
                    track_enabled: track.config.enabled,
                    clip,
                    element,
                });
            }
        }
        self.players = players;
    }

    fn after_configuration_change(&mut self) {
        self.refresh_timeline();
        if self.state.is_playing
            && self.state.is_video_frozen
            && self.state.current_time >= self.audio_end - EPSILON
        {
            // The audio that kept the frozen frame alive is gone
            self.finish_playback(self.state.current_time);
            return;
        }
        self.sync_audio();
    }

    fn invalidate_segment(&mut self, segment_id: &str) {
        let Some(index) = self.store.segments().iter().position(|s| s.id == segment_id) else {
            return;
        };
        if self.loaded_segment == Some(index) {
            self.loaded_segment = None;
            if self.state.current_segment_index == index && !self.state.is_video_frozen {
                let t = self.state.current_time;
                self.seek(t);
            }
        }
    }

    fn ensure_video_loaded(&mut self, index: usize) -> bool {
        if self.loaded_segment == Some(index) {
            return true;
        }
        let Some(segment) = self.store.segments().get(index) else {
            return false;
        };

        let Some(url) = segment.active_asset_url.clone() else {
            warn!(segment = %segment.id, "Segment has no active take; treating as zero-length");
            self.loaded_segment = None;
            return false;
        };

        match self.video.load(&url) {
            Ok(()) => {
                self.loaded_segment = Some(index);
                true
            }
            Err(e) => {
                warn!(segment = %segment.id, error = %e, "Segment clip failed to load; treating as zero-length");
                self.loaded_segment = None;
                false
            }
        }
    }

    fn play_video(&mut self) {
        if let Err(e) = self.video.play() {
            debug!(error = %e, "Video play() rejected; keeping requested state");
        }
    }

    fn advance_from(&mut self, mut next: usize) {
        while next < self.store.len() {
            if self.ensure_video_loaded(next) {
                self.state.current_segment_index = next;
                self.state.current_time = self.segment_start_time(next);
                self.video.seek(0.0);
                if self.state.is_playing {
                    self.play_video();
                }
                debug!(segment = next, at = self.state.current_time, "Advanced to next segment");
                return;
            }
            next += 1;
        }
        self.reach_video_end();
    }

    fn reach_video_end(&mut self) {
        self.state.current_segment_index = self.store.len().saturating_sub(1);
        self.state.current_time = self.video_total;

        if self.audio_end > self.video_total + EPSILON {
            info!(
                video_total = self.video_total,
                audio_end = self.audio_end,
                "Audio outlasts video; freezing last frame"
            );
            self.enter_elastic();
        } else {
            self.finish_playback(self.video_total);
        }
    }

    fn enter_elastic(&mut self) {
        self.state.is_video_frozen = true;
        self.video.pause();
        self.cancel_elastic_timer();
        self.elastic_timer = Some(self.scheduler.start_interval(self.settings.tick));
    }

    fn cancel_elastic_timer(&mut self) {
        if let Some(token) = self.elastic_timer.take() {
            self.scheduler.cancel(token);
        }
    }

    /// The single path from playing to not playing
    fn halt_playback(&mut self) {
        self.state.is_playing = false;
        self.cancel_elastic_timer();
        self.video.pause();
        for player in &mut self.players {
            player.element.pause();
        }
    }

    fn finish_playback(&mut self, at: f64) {
        self.halt_playback();
        self.last_finished_at = Some(at);
        info!(at, "Playback reached the end");
        self.reset_to_start();
    }

    fn reset_to_start(&mut self) {
        self.state.current_time = 0.0;
        self.state.current_segment_index = 0;
        self.state.is_video_frozen = false;
        if self.ensure_video_loaded(0) {
            self.video.seek(0.0);
        }
        self.sync_audio();
    }

    /// Start, pause or re-seek every audio clip against the global clock
    fn sync_audio(&mut self) {
        let t = self.state.current_time;
        let playing = self.state.is_playing;
        let threshold = self.settings.drift_threshold;

        for player in &mut self.players {
            let clip = &player.clip;
            let audible = playing
                && player.track_enabled
                && clip.enabled
                && t >= clip.start_time
                && t < clip.end_time();

            if audible {
                let local = t - clip.start_time;
                let drift = (player.element.position() - local).abs();
                if drift > threshold {
                    trace!(track = %player.kind, clip = %clip.clip_id, drift, "Correcting audio drift");
                    player.element.seek(local);
                }
                if player.element.is_paused() {
                    if let Err(e) = player.element.play() {
                        debug!(track = %player.kind, error = %e, "Audio play() rejected");
                    }
                }
            } else if !player.element.is_paused() {
                player.element.pause();
            }
        }
    }
}

impl Drop for TimelineSession {
    fn drop(&mut self) {
        self.cancel_elastic_timer();
    }
}
