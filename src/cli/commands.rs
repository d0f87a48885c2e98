//! Command implementations

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::adapters::project_file::ProjectFileAdapter;
use crate::adapters::simulated_media::SimulatedMediaFactory;
use crate::adapters::timers::{ManualScheduler, TokioIntervalScheduler};
use crate::app::container::AppContainer;
use crate::app::render_interactor::RenderJobController;
use crate::app::timeline_interactor::{
    RealtimePlaybackDriver, TimelineSession, TimelineSettings, VirtualPlaybackDriver,
};
use crate::cli::args::{FramesArgs, PreviewArgs, QueueArgs, ReadinessArgs, RenderArgs, WindowsArgs};
use crate::cli::Commands;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::domain::store::SegmentStore;
use crate::utils::logging::{ProgressConfig, ProgressReporter};
use crate::utils::Utils;

/// Dispatch a parsed command
pub async fn execute(command: Commands, container: &dyn AppContainer) -> Result<()> {
    match command {
        Commands::Readiness(args) => readiness(args),
        Commands::Windows(args) => windows(args, container),
        Commands::Preview(args) => preview(args, container).await,
        Commands::Render(args) => render(args, container).await,
        Commands::Queue(args) => queue(args, container).await,
        Commands::Frames(args) => frames(args, container).await,
    }
}

fn load_project(path: &std::path::Path) -> Result<SceneProject> {
    ProjectFileAdapter::load(path).with_context(|| format!("Failed to load project {}", path.display()))
}

/// Execute the readiness command
pub fn readiness(args: ReadinessArgs) -> Result<()> {
    let project = load_project(&args.project)?;
    let readiness = AnchorClassifier::aggregate_readiness(&project.segments);

    if args.json {
        let segments: Vec<serde_json::Value> = project
            .segments
            .iter()
            .map(|s| serde_json::json!({ "id": s.id, "anchorStatus": s.anchor_status }))
            .collect();
        let body = serde_json::json!({ "readiness": readiness, "segments": segments });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Scene {}", project.scene_id);
    for segment in &project.segments {
        println!(
            "  {:<16} {:>9} - {:<9} {}",
            segment.id,
            Utils::format_timecode(segment.start_time),
            Utils::format_timecode(segment.end_time),
            segment.anchor_status
        );
    }
    println!(
        "{}/{} fully anchored ({:.0}%), {} partial, {} pending",
        readiness.fully_anchored,
        readiness.total,
        readiness.progress_percent,
        readiness.partial,
        readiness.pending
    );
    if readiness.is_ready() {
        println!("Ready for generation");
    }
    Ok(())
}

/// Execute the windows command
pub fn windows(args: WindowsArgs, container: &dyn AppContainer) -> Result<()> {
    let project = load_project(&args.project)?;
    let stagger = container.timeline_settings().dialogue_stagger;
    let segments = &project.segments;

    let video_total = TimelineMath::video_total_duration(segments);
    let audio_end = TrackResolver::max_audio_end(&project.audio_tracks, segments, stagger);
    let total = video_total.max(audio_end);

    if args.json {
        let tracks: Vec<serde_json::Value> = project
            .audio_tracks
            .iter()
            .map(|track| {
                serde_json::json!({
                    "kind": track.kind,
                    "enabled": track.config.enabled,
                    "window": TrackResolver::resolve_track_window(&track.config, segments),
                    "audioEnd": TrackResolver::track_audio_end(track, segments, stagger),
                    "clips": TrackResolver::resolve_clips(track, segments, stagger),
                })
            })
            .collect();
        let body = serde_json::json!({
            "videoTotalDuration": video_total,
            "audioEndTime": audio_end,
            "totalDuration": total,
            "tracks": tracks,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!(
        "Video {}  audio end {}  total {}",
        Utils::format_timecode(video_total),
        Utils::format_timecode(audio_end),
        Utils::format_timecode(total)
    );
    for track in &project.audio_tracks {
        let window = TrackResolver::resolve_track_window(&track.config, segments);
        println!(
            "{:<10} {:<8} window {} - {}  volume {:.2}",
            track.kind,
            if track.config.enabled { "enabled" } else { "disabled" },
            Utils::format_timecode(window.start_time),
            Utils::format_timecode(window.end_time),
            track.config.volume
        );
        for clip in TrackResolver::resolve_clips(track, segments, stagger) {
            println!(
                "  {:<14} {} - {}  vol {:.2}{}{}",
                clip.clip_id,
                Utils::format_timecode(clip.start_time),
                Utils::format_timecode(clip.end_time()),
                clip.volume,
                clip.character.as_deref().map(|c| format!("  [{}]", c)).unwrap_or_default(),
                if clip.enabled { "" } else { "  (muted)" }
            );
        }
    }
    if audio_end > video_total {
        println!(
            "Elastic: last frame holds for {:.1}s",
            audio_end - video_total
        );
    }
    Ok(())
}

/// Register the real media durations of a project with the simulated factory
fn simulated_media_for(project: &SceneProject) -> SimulatedMediaFactory {
    let media = SimulatedMediaFactory::new();
    for segment in &project.segments {
        if let Some(url) = &segment.active_asset_url {
            let duration = segment
                .active_take()
                .map(|t| t.duration_sec)
                .filter(|d| *d > 0.0)
                .unwrap_or_else(|| segment.duration());
            media.set_duration(url.clone(), duration);
        }
    }
    for track in &project.audio_tracks {
        for clip in &track.clips {
            media.set_duration(clip.url.clone(), clip.duration);
        }
    }
    media
}

fn report_line(session: &TimelineSession) -> String {
    let state = session.state();
    format!(
        "{} / {}  segment {}{}{}",
        Utils::format_timecode(state.current_time),
        Utils::format_timecode(session.total_duration()),
        state.current_segment_index,
        if state.is_playing { "  playing" } else { "  stopped" },
        if state.is_video_frozen { "  (frame held)" } else { "" }
    )
}

/// Execute the preview command
pub async fn preview(args: PreviewArgs, container: &dyn AppContainer) -> Result<()> {
    let project = load_project(&args.project)?;
    let settings: TimelineSettings = container.timeline_settings();
    let media = simulated_media_for(&project);
    let report_every = args.report_every.max(0.1);

    if args.realtime {
        let (scheduler, mut ticks) = TokioIntervalScheduler::with_speed(args.speed);
        let mut session = TimelineSession::new(
            project.segments,
            project.audio_tracks,
            settings.clone(),
            Box::new(media.clone()),
            Box::new(scheduler),
        )?;
        start_session(&mut session, args.seek)?;

        let driver = RealtimePlaybackDriver::new(media, settings.tick, args.speed);
        let mut next_report = 0.0;
        driver
            .run(&mut session, &mut ticks, |session| {
                if session.state().current_time >= next_report {
                    println!("{}", report_line(session));
                    next_report = session.state().current_time + report_every;
                }
            })
            .await;
        finish_preview(&session);
        return Ok(());
    }

    let scheduler = ManualScheduler::new();
    let mut session = TimelineSession::new(
        project.segments,
        project.audio_tracks,
        settings.clone(),
        Box::new(media.clone()),
        Box::new(scheduler.clone()),
    )?;
    start_session(&mut session, args.seek)?;

    let driver = VirtualPlaybackDriver::new(media, scheduler, settings.tick);
    let tick = settings.tick.as_secs_f64();
    let max_steps = ((session.total_duration() / tick).ceil() as usize + 1) * 2 + 100;
    let mut next_report = 0.0;
    let mut steps = 0;
    while session.is_playing() && steps < max_steps {
        if session.state().current_time >= next_report {
            println!("{}", report_line(&session));
            next_report = session.state().current_time + report_every;
        }
        driver.step(&mut session);
        steps += 1;
    }
    if session.is_playing() {
        warn!(steps, "Preview did not finish; stopping");
        session.stop();
    }
    finish_preview(&session);
    Ok(())
}

fn start_session(session: &mut TimelineSession, seek: Option<f64>) -> Result<()> {
    if session.total_duration() <= 0.0 {
        anyhow::bail!("Nothing to preview: the scene has no playable video or audio");
    }
    if let Some(t) = seek {
        session.seek(t);
    }
    info!(
        video_total = session.video_total_duration(),
        total = session.total_duration(),
        "Starting preview"
    );
    session.play();
    Ok(())
}

fn finish_preview(session: &TimelineSession) {
    match session.last_finished_at() {
        Some(at) => println!("Playback finished at {}", Utils::format_timecode(at)),
        None => println!("Playback stopped at {}", Utils::format_timecode(session.state().current_time)),
    }
}

/// Execute the render command
pub async fn render(args: RenderArgs, container: &dyn AppContainer) -> Result<()> {
    let mut project = load_project(&args.project)?;

    if args.dry_run {
        let settings = container.render_settings()?;
        let request = RenderJobController::build_request(&project, &args.language, &settings)?;
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    let reporter = ProgressReporter::new(ProgressConfig {
        enabled: true,
        bar_width: 20,
    });
    let controller = container
        .render_controller()?
        .with_streams(project.production_streams.clone())
        .with_last_rendered_url(project.last_rendered_url.clone())
        .with_observer(Arc::new(move |job: &RenderJob| {
            if job.status == RenderStatus::Rendering {
                reporter.update_progress(job.progress, "rendering");
            }
        }));

    let mut operation = ProgressReporter::new(ProgressConfig {
        enabled: true,
        bar_width: 20,
    });
    operation.start_operation(format!("render of scene {} ({})", project.scene_id, args.language));
    let result = controller.start_render(&project, &args.language).await;
    operation.complete_operation(result.is_ok());

    if let Some(output) = &args.output {
        project.production_streams = controller.streams();
        project.last_rendered_url = controller.last_rendered_url();
        ProjectFileAdapter::save(output, &project)
            .with_context(|| format!("Failed to write project {}", output.display()))?;
    }

    let job = result.context("Render failed")?;
    if let Some(url) = job.download_url {
        println!("{}", url);
    }
    Ok(())
}

/// Execute the queue command
pub async fn queue(args: QueueArgs, container: &dyn AppContainer) -> Result<()> {
    let mut project = load_project(&args.project)?;

    let items = if project.queue.is_empty() {
        project
            .segments
            .iter()
            .map(|s| QueueItem::new(s.id.clone(), ApprovalStatus::AutoReady))
            .collect()
    } else {
        project.queue.clone()
    };

    let mut queue = container.generation_queue(items);
    for id in &args.unlock {
        queue.unlock(id)?;
    }
    for id in &args.approve {
        queue.approve(id)?;
    }
    for id in &args.lock {
        queue.lock(id)?;
    }

    let mode = DispatchMode::parse(&args.mode, args.ids.clone())?;
    if args.dry_run {
        for id in queue.select(&mode) {
            println!("{}", id);
        }
        return Ok(());
    }

    let mut store = SegmentStore::new(project.segments.clone())?;
    let report = queue.dispatch(&mode, &mut store).await;

    println!(
        "Generated {} of {} segment(s); {} failed; {} rate-limit pause(s)",
        report.rendered.len(),
        report.attempted.len(),
        report.failed.len(),
        report.rate_limit_pauses
    );
    for (id, error) in &report.failed {
        println!("  {}: {}", id, error);
    }

    if let Some(output) = &args.output {
        project.segments = store.segments().to_vec();
        project.queue = queue.items().to_vec();
        ProjectFileAdapter::save(output, &project)
            .with_context(|| format!("Failed to write project {}", output.display()))?;
    }
    Ok(())
}

/// Execute the frames command
pub async fn frames(args: FramesArgs, container: &dyn AppContainer) -> Result<()> {
    let mut project = load_project(&args.project)?;
    let frame_type = FrameType::parse(&args.frame_type)?;

    let mut store = SegmentStore::new(project.segments.clone())?;
    let mut queue = container.generation_queue(project.queue.clone());
    let status = queue
        .generate_frames(&args.segment, frame_type, &mut store)
        .await
        .with_context(|| format!("Frame generation failed for segment {}", args.segment))?;

    let readiness = store.readiness();
    println!("{} {}", args.segment, status);
    println!(
        "{}/{} fully anchored ({:.0}%)",
        readiness.fully_anchored, readiness.total, readiness.progress_percent
    );

    if let Some(output) = &args.output {
        project.segments = store.segments().to_vec();
        ProjectFileAdapter::save(output, &project)
            .with_context(|| format!("Failed to write project {}", output.display()))?;
    }
    Ok(())
}
