// Simulated media adapter - Headless media elements with a virtual playhead

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::domain::errors::*;
use crate::ports::*;

#[derive(Debug, Clone, Default)]
struct MediaState {
    url: String,
    position: f64,
    duration: Option<f64>,
    paused: bool,
    volume: f64,
    loaded: bool,
    ended: bool,
    seeks: u32,
}

#[derive(Debug, Default)]
struct Registry {
    durations: HashMap<String, f64>,
    failing_urls: HashSet<String>,
    reject_play: bool,
    elements: Vec<Weak<Mutex<MediaState>>>,
}

/// Factory and controller for simulated media elements.
///
/// Clones share the same registry. The driver advances every playing element
/// with [`SimulatedMediaFactory::advance`].
#[derive(Debug, Clone, Default)]
pub struct SimulatedMediaFactory {
    registry: Arc<Mutex<Registry>>,
}

impl SimulatedMediaFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Elements still owned by someone; dropped ones are pruned
    fn live_elements(&self) -> Vec<Arc<Mutex<MediaState>>> {
        let mut registry = self.registry();
        registry.elements.retain(|e| e.strong_count() > 0);
        registry.elements.iter().filter_map(Weak::upgrade).collect()
    }

    /// Register the real duration behind a URL
    pub fn with_duration(self, url: impl Into<String>, seconds: f64) -> Self {
        self.registry().durations.insert(url.into(), seconds);
        self
    }

    pub fn set_duration(&self, url: impl Into<String>, seconds: f64) {
        self.registry().durations.insert(url.into(), seconds);
    }

    /// Make every load of this URL fail
    pub fn fail_url(&self, url: impl Into<String>) {
        self.registry().failing_urls.insert(url.into());
    }

    /// Make every `play()` reject, as a browser autoplay policy would
    pub fn set_reject_play(&self, reject: bool) {
        self.registry().reject_play = reject;
    }

    /// Advance every playing element by `dt` seconds; returns URLs that reached their end
    pub fn advance(&self, dt: f64) -> Vec<String> {
        let elements = self.live_elements();
        let mut ended = Vec::new();
        for element in elements {
            let mut state = lock(&element);
            if state.paused || !state.loaded || state.ended {
                continue;
            }
            state.position += dt;
            if let Some(duration) = state.duration {
                if state.position >= duration {
                    state.position = duration;
                    state.paused = true;
                    state.ended = true;
                    ended.push(state.url.clone());
                }
            }
        }
        ended
    }

    /// Snapshot of all elements currently loaded with `url`
    pub fn probe(&self, url: &str) -> Vec<MediaProbe> {
        self.live_elements()
            .iter()
            .map(|e| lock(e).clone())
            .filter(|s| s.url == url)
            .map(|s| MediaProbe {
                position: s.position,
                paused: s.paused,
                volume: s.volume,
                seeks: s.seeks,
            })
            .collect()
    }

    /// Number of elements currently playing
    pub fn playing_count(&self) -> usize {
        self.live_elements()
            .iter()
            .filter(|e| {
                let state = lock(e);
                state.loaded && !state.paused
            })
            .count()
    }
}

/// Observable state of one simulated element
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProbe {
    pub position: f64,
    pub paused: bool,
    pub volume: f64,
    pub seeks: u32,
}

fn lock(state: &Arc<Mutex<MediaState>>) -> MutexGuard<'_, MediaState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MediaFactory for SimulatedMediaFactory {
    fn create(&self, url: &str) -> Box<dyn MediaElement> {
        let state = Arc::new(Mutex::new(MediaState {
            paused: true,
            volume: 1.0,
            ..MediaState::default()
        }));
        self.registry().elements.push(Arc::downgrade(&state));

        let mut element = SimulatedMedia {
            state,
            factory: self.clone(),
            url: String::new(),
        };
        // Creation never fails; a bad URL surfaces on the first explicit load
        let _ = element.load(url);
        Box::new(element)
    }
}

/// One simulated media element
pub struct SimulatedMedia {
    state: Arc<Mutex<MediaState>>,
    factory: SimulatedMediaFactory,
    url: String,
}

impl MediaElement for SimulatedMedia {
    fn source(&self) -> &str {
        &self.url
    }

    fn load(&mut self, url: &str) -> Result<(), DomainError> {
        let (failing, duration) = {
            let registry = self.factory.registry();
            (
                registry.failing_urls.contains(url),
                registry.durations.get(url).copied(),
            )
        };

        self.url = url.to_string();
        let mut state = lock(&self.state);
        state.url = url.to_string();
        state.position = 0.0;
        state.paused = true;
        state.ended = false;
        state.seeks = 0;
        if failing {
            state.loaded = false;
            state.duration = None;
            return Err(DomainError::MediaError(format!("failed to load {}", url)));
        }
        state.loaded = true;
        state.duration = duration;
        Ok(())
    }

    fn play(&mut self) -> Result<(), DomainError> {
        if self.factory.registry().reject_play {
            return Err(DomainError::MediaError("play() rejected".to_string()));
        }
        let mut state = lock(&self.state);
        if !state.loaded {
            return Err(DomainError::MediaError(format!("{} is not loaded", state.url)));
        }
        if !state.ended {
            state.paused = false;
        }
        Ok(())
    }

    fn pause(&mut self) {
        lock(&self.state).paused = true;
    }

    fn seek(&mut self, seconds: f64) {
        let mut state = lock(&self.state);
        let target = match state.duration {
            Some(duration) => seconds.clamp(0.0, duration),
            None => seconds.max(0.0),
        };
        state.position = target;
        state.ended = state.duration.is_some_and(|d| target >= d);
        state.seeks += 1;
    }

    fn position(&self) -> f64 {
        lock(&self.state).position
    }

    fn duration(&self) -> Option<f64> {
        lock(&self.state).duration
    }

    fn is_paused(&self) -> bool {
        lock(&self.state).paused
    }

    fn set_volume(&mut self, volume: f64) {
        lock(&self.state).volume = volume;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_reports_end() {
        let factory = SimulatedMediaFactory::new().with_duration("clip.mp4", 1.0);
        let mut element = factory.create("clip.mp4");
        element.play().unwrap();

        assert!(factory.advance(0.6).is_empty());
        assert_eq!(factory.advance(0.6), vec!["clip.mp4".to_string()]);
        assert_eq!(element.position(), 1.0);
        assert!(element.is_paused());
    }

    #[test]
    fn test_paused_elements_do_not_move() {
        let factory = SimulatedMediaFactory::new().with_duration("a.mp3", 10.0);
        let element = factory.create("a.mp3");
        factory.advance(2.0);
        assert_eq!(element.position(), 0.0);
    }

    #[test]
    fn test_failing_url_and_rejected_play() {
        let factory = SimulatedMediaFactory::new();
        factory.fail_url("broken.mp4");
        let mut element = factory.create("ok.mp4");
        assert!(element.load("broken.mp4").is_err());
        assert!(element.play().is_err());

        factory.set_reject_play(true);
        let mut other = factory.create("ok.mp4");
        assert!(other.play().is_err());
        assert_eq!(factory.playing_count(), 0);
    }

    #[test]
    fn test_dropped_elements_are_forgotten() {
        let factory = SimulatedMediaFactory::new().with_duration("a.mp3", 10.0);
        let mut element = factory.create("a.mp3");
        element.play().unwrap();
        drop(element);
        assert!(factory.probe("a.mp3").is_empty());
        assert_eq!(factory.playing_count(), 0);
    }

    #[test]
    fn test_seek_counts() {
        let factory = SimulatedMediaFactory::new().with_duration("a.mp3", 10.0);
        let mut element = factory.create("a.mp3");
        element.seek(4.0);
        element.seek(40.0);
        let probe = &factory.probe("a.mp3")[0];
        assert_eq!(probe.position, 10.0);
        assert_eq!(probe.seeks, 2);
    }
}
