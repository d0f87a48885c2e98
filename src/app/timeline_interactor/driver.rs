// Playback drivers - Feed media and timer events into a preview session

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use super::TimelineSession;
use crate::adapters::simulated_media::SimulatedMediaFactory;
use crate::adapters::timers::ManualScheduler;
use crate::ports::TimerToken;

/// Steps a session on a virtual clock, as fast as the CPU allows.
///
/// The session must have been built with this driver's media factory and
/// scheduler. Each step advances media by `step`, reports the video playhead,
/// then fires the timers that were outstanding before the step.
pub struct VirtualPlaybackDriver {
    media: SimulatedMediaFactory,
    scheduler: ManualScheduler,
    step: Duration,
}

impl VirtualPlaybackDriver {
    pub fn new(media: SimulatedMediaFactory, scheduler: ManualScheduler, step: Duration) -> Self {
        Self { media, scheduler, step }
    }

    pub fn step(&self, session: &mut TimelineSession) {
        let due = self.scheduler.active_tokens();
        self.media.advance(self.step.as_secs_f64());
        session.on_frame();
        for token in due {
            session.on_timer_tick(token);
        }
    }

    /// Step until playback halts or `max_steps` is reached; returns steps taken
    pub fn run_until_stopped(&self, session: &mut TimelineSession, max_steps: usize) -> usize {
        let mut steps = 0;
        while session.is_playing() && steps < max_steps {
            self.step(session);
            steps += 1;
        }
        debug!(steps, "Virtual playback finished");
        steps
    }

    /// Step until the clock reaches `t` or playback halts
    pub fn run_until(&self, session: &mut TimelineSession, t: f64, max_steps: usize) -> usize {
        let mut steps = 0;
        while session.is_playing() && session.state().current_time < t && steps < max_steps {
            self.step(session);
            steps += 1;
        }
        steps
    }
}

/// Drives a session in wall-clock time with tokio timers.
///
/// The session must use a `TokioIntervalScheduler` whose tick receiver is
/// handed to [`RealtimePlaybackDriver::run`]. `speed` scales media time; build
/// the scheduler with [`TokioIntervalScheduler::with_speed`] at the same rate so
/// the held-frame clock keeps pace.
///
/// [`TokioIntervalScheduler::with_speed`]: crate::adapters::timers::TokioIntervalScheduler::with_speed
pub struct RealtimePlaybackDriver {
    media: SimulatedMediaFactory,
    frame: Duration,
    speed: f64,
}

impl RealtimePlaybackDriver {
    pub fn new(media: SimulatedMediaFactory, frame: Duration, speed: f64) -> Self {
        Self {
            media,
            frame,
            speed: if speed.is_finite() && speed > 0.0 { speed } else { 1.0 },
        }
    }

    /// Run until playback halts or Ctrl-C; `on_frame` sees the session after every frame
    pub async fn run<F>(
        &self,
        session: &mut TimelineSession,
        ticks: &mut UnboundedReceiver<TimerToken>,
        mut on_frame: F,
    ) where
        F: FnMut(&TimelineSession),
    {
        let mut frames = tokio::time::interval(self.frame);
        frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let dt = self.frame.as_secs_f64() * self.speed;

        while session.is_playing() {
            tokio::select! {
                _ = frames.tick() => {
                    self.media.advance(dt);
                    session.on_frame();
                    on_frame(session);
                }
                Some(token) = ticks.recv() => {
                    session.on_timer_tick(token);
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted; stopping preview");
                    session.stop();
                }
            }
        }
    }
}
