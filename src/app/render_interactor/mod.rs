// Render interactor - Submits the scene to the render service and tracks the job

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::adapters::toml_config::AppConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Polling schedule for a submitted job
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    /// Multiplier applied per attempt; `None` polls at a fixed interval
    pub backoff: Option<f64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 120,
            backoff: None,
        }
    }
}

impl RetryPolicy {
    /// Delay before poll number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Some(factor) if factor > 1.0 => {
                let exponent = attempt.saturating_sub(1).min(16) as i32;
                self.interval.mul_f64(factor.powi(exponent))
            }
            _ => self.interval,
        }
    }
}

/// Output settings for render payloads
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub resolution: Resolution,
    pub fps: u32,
    pub include_segment_audio: bool,
    pub segment_audio_volume: f64,
    pub dialogue_stagger: f64,
    pub retry: RetryPolicy,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            fps: 24,
            include_segment_audio: false,
            segment_audio_volume: 1.0,
            dialogue_stagger: DEFAULT_DIALOGUE_STAGGER_SECS,
            retry: RetryPolicy::default(),
        }
    }
}

impl RenderSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        Ok(Self {
            resolution: Resolution::parse(&config.render.resolution)?,
            fps: config.render.fps,
            include_segment_audio: config.render.include_segment_audio,
            segment_audio_volume: clamp_volume(config.render.segment_audio_volume),
            dialogue_stagger: config.playback.dialogue_stagger_secs,
            retry: RetryPolicy {
                interval: config.render.poll_interval(),
                max_attempts: config.render.max_poll_attempts,
                backoff: None,
            },
        })
    }
}

/// Callback invoked with a snapshot after every job state change
pub type JobObserver = Arc<dyn Fn(&RenderJob) + Send + Sync>;

#[derive(Default)]
struct ControllerState {
    job: RenderJob,
    streams: Vec<ProductionStream>,
    last_rendered_url: Option<String>,
}

/// Drives one render job at a time: `Idle → Preparing → Rendering → Complete | Error`
pub struct RenderJobController {
    render_service: Arc<dyn RenderServicePort>,
    sleeper: Arc<dyn Sleeper>,
    settings: RenderSettings,
    state: Mutex<ControllerState>,
    observer: Option<JobObserver>,
}

impl RenderJobController {
    pub fn new(render_service: Arc<dyn RenderServicePort>, sleeper: Arc<dyn Sleeper>, settings: RenderSettings) -> Self {
        Self {
            render_service,
            sleeper,
            settings,
            state: Mutex::new(ControllerState::default()),
            observer: None,
        }
    }

    /// Seed the production ledger with streams recorded earlier
    pub fn with_streams(self, streams: Vec<ProductionStream>) -> Self {
        self.lock().streams = streams;
        self
    }

    pub fn with_last_rendered_url(self, url: Option<String>) -> Self {
        self.lock().last_rendered_url = url;
        self
    }

    pub fn with_observer(mut self, observer: JobObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn job(&self) -> RenderJob {
        self.lock().job.clone()
    }

    pub fn streams(&self) -> Vec<ProductionStream> {
        self.lock().streams.clone()
    }

    pub fn last_rendered_url(&self) -> Option<String> {
        self.lock().last_rendered_url.clone()
    }

    /// Return a finished job to Idle
    pub fn reset(&self) -> Result<(), DomainError> {
        let mut state = self.lock();
        if state.job.is_active() {
            return Err(DomainError::RenderInProgress);
        }
        state.job = RenderJob::default();
        Ok(())
    }

    /// Build the render payload for a scene.
    ///
    /// Only segments with an active asset are sent; their times stay on the
    /// full timeline so audio positions line up. Enabled tracks contribute their
    /// audible clips with absolute times.
    pub fn build_request(
        project: &SceneProject,
        language: &str,
        settings: &RenderSettings,
    ) -> Result<RenderRequest, DomainError> {
        let mut ordered = project.segments.clone();
        ordered.sort_by_key(|s| s.sequence_index);

        let audio_source = if settings.include_segment_audio {
            SegmentAudioSource::Original
        } else {
            SegmentAudioSource::None
        };

        let segments: Vec<RenderSegment> = ordered
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| {
                let video_url = segment.active_asset_url.clone()?;
                Some(RenderSegment {
                    segment_id: segment.id.clone(),
                    sequence_index: segment.sequence_index,
                    video_url,
                    start_time: TimelineMath::segment_start_time(&ordered, index),
                    end_time: TimelineMath::segment_end_time(&ordered, index),
                    audio_source,
                    audio_volume: settings.segment_audio_volume,
                })
            })
            .collect();

        if segments.is_empty() {
            return Err(DomainError::InvalidPayload(format!(
                "scene {} has no segment with an active take",
                project.scene_id
            )));
        }

        let mut audio_tracks = RenderAudioTracks::default();
        let mut audio_config = AudioMixConfig {
            include_narration: false,
            include_dialogue: false,
            include_music: false,
            include_sfx: false,
            include_segment_audio: settings.include_segment_audio,
            language: language.to_string(),
            narration_volume: 1.0,
            dialogue_volume: 1.0,
            music_volume: 1.0,
            sfx_volume: 1.0,
        };

        for track in &project.audio_tracks {
            let volume = clamp_volume(track.config.volume);
            let clips: Vec<RenderAudioClip> = if track.config.enabled {
                TrackResolver::resolve_clips(track, &ordered, settings.dialogue_stagger)
                    .into_iter()
                    .filter(|c| c.enabled && c.duration > 0.0)
                    .map(|c| RenderAudioClip {
                        url: c.url,
                        start_time: c.start_time,
                        duration: c.duration,
                        volume: c.volume,
                        character: c.character,
                    })
                    .collect()
            } else {
                Vec::new()
            };

            let included = !clips.is_empty();
            match track.kind {
                AudioTrackKind::Narration => {
                    audio_config.include_narration = included;
                    audio_config.narration_volume = volume;
                }
                AudioTrackKind::Dialogue => {
                    audio_config.include_dialogue = included;
                    audio_config.dialogue_volume = volume;
                }
                AudioTrackKind::Music => {
                    audio_config.include_music = included;
                    audio_config.music_volume = volume;
                }
                AudioTrackKind::Sfx => {
                    audio_config.include_sfx = included;
                    audio_config.sfx_volume = volume;
                }
            }
            if included {
                *audio_tracks.slot_mut(track.kind) = Some(clips);
            }
        }

        Ok(RenderRequest {
            resolution: settings.resolution,
            fps: settings.fps,
            audio_config,
            segments,
            audio_tracks,
            text_overlays: project.text_overlays.clone(),
        })
    }

    /// Render the scene for one language and wait for the outcome
    pub async fn start_render(&self, project: &SceneProject, language: &str) -> Result<RenderJob, DomainError> {
        self.begin()?;
        let _cancel = CancelOnDrop {
            controller: self,
            language,
        };
        info!(scene = %project.scene_id, language, "Preparing render");

        let request = match Self::build_request(project, language, &self.settings) {
            Ok(request) => request,
            Err(e) => return Err(self.fail(language, e)),
        };
        debug!(
            segments = request.segments.len(),
            audio_clips = request.audio_tracks.clip_count(),
            "Render payload built"
        );

        let job_id = match self.render_service.submit_render(&project.scene_id, &request).await {
            Ok(job_id) => job_id,
            Err(e) => return Err(self.fail(language, e)),
        };

        self.update(|state| {
            state.job.id = Some(job_id.clone());
            state.job.status = RenderStatus::Rendering;
            state.streams.retain(|s| !(s.language == language && s.status == StreamStatus::Rendering));
            state.streams.push(ProductionStream::rendering(language));
        });
        info!(job_id = %job_id, "Render job submitted");

        self.poll_until_done(&job_id, language).await
    }

    fn begin(&self) -> Result<(), DomainError> {
        {
            let mut state = self.lock();
            if state.job.is_active() {
                warn!("Render requested while another is in flight");
                return Err(DomainError::RenderInProgress);
            }
            state.job = RenderJob {
                status: RenderStatus::Preparing,
                ..RenderJob::default()
            };
        }
        self.notify();
        Ok(())
    }

    async fn poll_until_done(&self, job_id: &str, language: &str) -> Result<RenderJob, DomainError> {
        let policy = &self.settings.retry;

        for attempt in 1..=policy.max_attempts {
            self.sleeper.sleep(policy.delay_for(attempt)).await;

            let response = match self.render_service.poll_render(job_id).await {
                Ok(response) => response,
                Err(e) if e.is_transient() => {
                    warn!(job_id, attempt, error = %e, "Render poll failed; will retry");
                    continue;
                }
                Err(e) => return Err(self.fail(language, e)),
            };

            match response.status {
                RemoteRenderStatus::Rendering => {
                    if let Some(progress) = response.progress {
                        self.update(|state| state.job.progress = progress.clamp(0.0, 100.0));
                    }
                    debug!(job_id, attempt, progress = ?response.progress, "Render in progress");
                }
                RemoteRenderStatus::Completed => {
                    let Some(url) = response.download_url else {
                        return Err(self.fail(
                            language,
                            DomainError::RenderFailed("render completed without a download URL".to_string()),
                        ));
                    };
                    return Ok(self.complete(job_id, language, url));
                }
                RemoteRenderStatus::Failed => {
                    let message = response.error.unwrap_or_else(|| "render failed".to_string());
                    return Err(self.fail(language, DomainError::RenderFailed(message)));
                }
            }
        }

        Err(self.fail(
            language,
            DomainError::RenderTimeout {
                attempts: policy.max_attempts,
            },
        ))
    }

    fn complete(&self, job_id: &str, language: &str, url: String) -> RenderJob {
        let job = self.update(|state| {
            state.job.status = RenderStatus::Complete;
            state.job.progress = 100.0;
            state.job.download_url = Some(url.clone());
            state.last_rendered_url = Some(url.clone());
            if let Some(stream) = state
                .streams
                .iter_mut()
                .find(|s| s.language == language && s.status == StreamStatus::Rendering)
            {
                stream.status = StreamStatus::Complete;
                stream.mp4_url = Some(url.clone());
                stream.completed_at = Some(Utc::now());
            }
        });
        info!(job_id, url = %url, "Render complete");
        job
    }

    fn fail(&self, language: &str, err: DomainError) -> DomainError {
        let message = err.to_string();
        self.update(|state| {
            state.job.status = RenderStatus::Error;
            state.job.error = Some(message.clone());
            state.streams.retain(|s| !(s.language == language && s.status == StreamStatus::Rendering));
        });
        error!(error = %message, "Render failed");
        err
    }

    fn cancel(&self, language: &str) {
        let active = self.lock().job.is_active();
        if !active {
            return;
        }
        self.update(|state| {
            state.job.status = RenderStatus::Error;
            state.job.error = Some(RENDER_CANCELLED.to_string());
            state.streams.retain(|s| !(s.language == language && s.status == StreamStatus::Rendering));
        });
        warn!(language, "Render cancelled before it finished");
    }

    fn update<F>(&self, change: F) -> RenderJob
    where
        F: FnOnce(&mut ControllerState),
    {
        let job = {
            let mut state = self.lock();
            change(&mut state);
            state.job.clone()
        };
        if let Some(observer) = &self.observer {
            observer(&job);
        }
        job
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            observer(&self.job());
        }
    }
}

/// Error message recorded when a render future is dropped mid-flight
pub const RENDER_CANCELLED: &str = "render cancelled";

/// Held for the lifetime of `start_render`; a job still active when it drops was abandoned
struct CancelOnDrop<'a> {
    controller: &'a RenderJobController,
    language: &'a str,
}

impl Drop for CancelOnDrop<'_> {
    fn drop(&mut self) {
        self.controller.cancel(self.language);
    }
}
