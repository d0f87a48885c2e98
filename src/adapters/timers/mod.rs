// Timer adapters - Sleepers and interval schedulers

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ports::*;

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately and records the requested durations
#[derive(Debug, Clone, Default)]
pub struct VirtualSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl VirtualSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, Vec<Duration>> {
        self.slept.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.log().clone()
    }

    /// Sum of every requested sleep
    pub fn total(&self) -> Duration {
        self.log().iter().sum()
    }
}

#[async_trait]
impl Sleeper for VirtualSleeper {
    async fn sleep(&self, duration: Duration) {
        self.log().push(duration);
        // Still a suspension point so other tasks get a turn
        tokio::task::yield_now().await;
    }
}

/// Interval scheduler spawning one tokio task per timer.
///
/// Each tick sends the timer's token on the channel returned by `new`; the
/// preview driver forwards it to the session.
pub struct TokioIntervalScheduler {
    sender: mpsc::UnboundedSender<TimerToken>,
    tasks: HashMap<TimerToken, JoinHandle<()>>,
    next_id: u64,
    speed: f64,
}

impl TokioIntervalScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        Self::with_speed(1.0)
    }

    /// Scheduler whose timers fire `speed` times faster than their nominal period,
    /// so timeline ticks keep pace with media played at the same rate
    pub fn with_speed(speed: f64) -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                tasks: HashMap::new(),
                next_id: 1,
                speed: if speed.is_finite() && speed > 0.0 { speed } else { 1.0 },
            },
            receiver,
        )
    }

    pub fn active_timers(&self) -> usize {
        self.tasks.len()
    }

    /// Wall-clock period used for a timer of nominal `period`
    pub fn scaled_period(&self, period: Duration) -> Duration {
        period.div_f64(self.speed).max(Duration::from_millis(1))
    }
}

impl IntervalScheduler for TokioIntervalScheduler {
    fn start_interval(&mut self, period: Duration) -> TimerToken {
        let token = TimerToken(self.next_id);
        self.next_id += 1;

        let sender = self.sender.clone();
        let period = self.scaled_period(period);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if sender.send(token).is_err() {
                    break;
                }
            }
        });

        self.tasks.insert(token, handle);
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some(handle) = self.tasks.remove(&token) {
            handle.abort();
        }
    }
}

impl Drop for TokioIntervalScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

#[derive(Debug, Default)]
struct ManualState {
    active: BTreeSet<TimerToken>,
    periods: HashMap<TimerToken, Duration>,
    started: u64,
    cancelled: u64,
}

/// Scheduler that never fires by itself; the owner decides when timers tick.
///
/// Clones share state, so a test can keep a handle while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tokens of timers started and not yet cancelled
    pub fn active_tokens(&self) -> Vec<TimerToken> {
        self.state().active.iter().copied().collect()
    }

    pub fn period(&self, token: TimerToken) -> Option<Duration> {
        self.state().periods.get(&token).copied()
    }

    pub fn started_count(&self) -> u64 {
        self.state().started
    }

    pub fn cancelled_count(&self) -> u64 {
        self.state().cancelled
    }
}

impl IntervalScheduler for ManualScheduler {
    fn start_interval(&mut self, period: Duration) -> TimerToken {
        let mut state = self.state();
        state.started += 1;
        let token = TimerToken(state.started);
        state.active.insert(token);
        state.periods.insert(token, period);
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        let mut state = self.state();
        if state.active.remove(&token) {
            state.cancelled += 1;
        }
    }
}
