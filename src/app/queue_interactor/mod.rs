// Queue interactor - Sequential video generation with approval gating and rate-limit backoff

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::adapters::toml_config::GenerationConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::store::SegmentStore;
use crate::ports::*;

/// Pacing of a dispatch run
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSettings {
    /// Pause between two generation calls
    pub inter_item_delay: Duration,
    /// Wait used when a rate-limit response carries no retry hint
    pub rate_limit_backoff: Duration,
    pub max_rate_limit_retries: u32,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            inter_item_delay: Duration::from_secs(6),
            rate_limit_backoff: Duration::from_secs(60),
            max_rate_limit_retries: 5,
        }
    }
}

impl From<&GenerationConfig> for QueueSettings {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            inter_item_delay: Duration::from_secs(config.inter_item_delay_secs),
            rate_limit_backoff: Duration::from_secs(config.rate_limit_backoff_secs),
            max_rate_limit_retries: config.max_rate_limit_retries,
        }
    }
}

/// What the queue is doing right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum QueueState {
    Idle,
    Running {
        segment_id: String,
        position: usize,
        total: usize,
    },
    Paused {
        segment_id: String,
        remaining_secs: u64,
    },
}

/// Outcome of one dispatch run
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    /// Segment ids in the order they were sent
    pub attempted: Vec<String>,
    pub rendered: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub rate_limit_pauses: u32,
}

pub type QueueObserver = Arc<dyn Fn(&QueueState) + Send + Sync>;

/// Per-segment approval state plus the batch dispatcher
pub struct GenerationQueue {
    generation: Arc<dyn GenerationPort>,
    sleeper: Arc<dyn Sleeper>,
    settings: QueueSettings,
    items: Vec<QueueItem>,
    state: QueueState,
    observer: Option<QueueObserver>,
}

impl GenerationQueue {
    pub fn new(
        generation: Arc<dyn GenerationPort>,
        sleeper: Arc<dyn Sleeper>,
        settings: QueueSettings,
        items: Vec<QueueItem>,
    ) -> Self {
        Self {
            generation,
            sleeper,
            settings,
            items,
            state: QueueState::Idle,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: QueueObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn item(&self, segment_id: &str) -> Option<&QueueItem> {
        self.items.iter().find(|i| i.segment_id == segment_id)
    }

    pub fn state(&self) -> &QueueState {
        &self.state
    }

    fn item_mut(&mut self, segment_id: &str) -> Result<&mut QueueItem, DomainError> {
        self.items
            .iter_mut()
            .find(|i| i.segment_id == segment_id)
            .ok_or_else(|| DomainError::NotFound(format!("queue item {}", segment_id)))
    }

    /// Mark a segment ready for generation
    pub fn approve(&mut self, segment_id: &str) -> Result<(), DomainError> {
        let item = self.item_mut(segment_id)?;
        match item.approval_status {
            ApprovalStatus::Locked => Err(DomainError::BadArgs(format!(
                "segment {} is locked; unlock it first",
                segment_id
            ))),
            ApprovalStatus::Rendering => Err(DomainError::BadArgs(format!(
                "segment {} is being generated",
                segment_id
            ))),
            _ => {
                item.approval_status = ApprovalStatus::UserApproved;
                item.error = None;
                Ok(())
            }
        }
    }

    /// Protect a segment from regeneration
    pub fn lock(&mut self, segment_id: &str) -> Result<(), DomainError> {
        let item = self.item_mut(segment_id)?;
        if item.approval_status == ApprovalStatus::Rendering {
            return Err(DomainError::BadArgs(format!(
                "segment {} is being generated",
                segment_id
            )));
        }
        item.approval_status = ApprovalStatus::Locked;
        Ok(())
    }

    /// Release a lock; the segment returns as approved
    pub fn unlock(&mut self, segment_id: &str) -> Result<(), DomainError> {
        let item = self.item_mut(segment_id)?;
        if item.approval_status != ApprovalStatus::Locked {
            return Err(DomainError::BadArgs(format!("segment {} is not locked", segment_id)));
        }
        item.approval_status = ApprovalStatus::UserApproved;
        Ok(())
    }

    /// Segment ids a dispatch in `mode` would send, in order
    pub fn select(&self, mode: &DispatchMode) -> Vec<String> {
        match mode {
            DispatchMode::ApprovedOnly => self
                .items
                .iter()
                .filter(|i| {
                    !matches!(
                        i.approval_status,
                        ApprovalStatus::AutoReady | ApprovalStatus::Locked | ApprovalStatus::Rendering
                    )
                })
                .map(|i| i.segment_id.clone())
                .collect(),
            DispatchMode::All => {
                let eligible = self.items.iter().filter(|i| {
                    !matches!(i.approval_status, ApprovalStatus::Locked | ApprovalStatus::Rendering)
                });
                let (approved, rest): (Vec<&QueueItem>, Vec<&QueueItem>) =
                    eligible.partition(|i| i.approval_status == ApprovalStatus::UserApproved);
                approved
                    .into_iter()
                    .chain(rest)
                    .map(|i| i.segment_id.clone())
                    .collect()
            }
            DispatchMode::Selected(ids) => {
                let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
                for id in ids {
                    if self.item(id).is_none() {
                        warn!(segment = %id, "Selected segment is not in the queue");
                    }
                }
                self.items
                    .iter()
                    .filter(|i| wanted.contains(i.segment_id.as_str()))
                    .filter(|i| i.approval_status != ApprovalStatus::Locked)
                    .map(|i| i.segment_id.clone())
                    .collect()
            }
        }
    }

    /// Generate every selected segment, one at a time.
    ///
    /// Successful results are recorded as active takes on `store`. A failed item
    /// does not stop the batch.
    pub async fn dispatch(&mut self, mode: &DispatchMode, store: &mut SegmentStore) -> DispatchReport {
        let selected = self.select(mode);
        let total = selected.len();
        let mut report = DispatchReport::default();
        info!(?mode, count = total, "Dispatching generation batch");

        for (position, segment_id) in selected.iter().enumerate() {
            if position > 0 {
                debug!(delay = ?self.settings.inter_item_delay, "Waiting before next generation call");
                self.sleeper.sleep(self.settings.inter_item_delay).await;
            }

            self.set_state(QueueState::Running {
                segment_id: segment_id.clone(),
                position: position + 1,
                total,
            });
            report.attempted.push(segment_id.clone());

            match self.generate_one(segment_id, position, total, store, &mut report).await {
                Ok(()) => {
                    self.mark(segment_id, ApprovalStatus::Rendered, None);
                    report.rendered.push(segment_id.clone());
                }
                Err(e) => {
                    error!(segment = %segment_id, error = %e, "Generation failed");
                    self.mark(segment_id, ApprovalStatus::Error, Some(e.to_string()));
                    report.failed.push((segment_id.clone(), e.to_string()));
                }
            }
        }

        self.set_state(QueueState::Idle);
        info!(
            rendered = report.rendered.len(),
            failed = report.failed.len(),
            "Generation batch finished"
        );
        report
    }

    async fn generate_one(
        &mut self,
        segment_id: &str,
        position: usize,
        total: usize,
        store: &mut SegmentStore,
        report: &mut DispatchReport,
    ) -> Result<(), DomainError> {
        let segment_duration = store
            .get(segment_id)
            .map(Segment::duration)
            .ok_or_else(|| DomainError::NotFound(format!("segment {}", segment_id)))?;

        let request = {
            let item = self.item_mut(segment_id)?;
            item.approval_status = ApprovalStatus::Rendering;
            item.error = None;
            GenerationRequest {
                segment_id: segment_id.to_string(),
                frame_type: None,
                prompt: item.prompt.clone(),
                negative_prompt: item.negative_prompt.clone(),
                reference_images: item.reference_images.clone(),
            }
        };

        let mut rate_limit_hits = 0;
        let asset = loop {
            match self.generation.generate_video(&request).await {
                Ok(asset) => break asset,
                Err(DomainError::RateLimited { retry_after_secs }) => {
                    rate_limit_hits += 1;
                    if rate_limit_hits > self.settings.max_rate_limit_retries {
                        return Err(DomainError::RateLimited { retry_after_secs });
                    }
                    let wait = retry_after_secs.unwrap_or(self.settings.rate_limit_backoff.as_secs());
                    warn!(segment = %segment_id, wait, attempt = rate_limit_hits, "Rate limited; pausing queue");
                    report.rate_limit_pauses += 1;
                    self.countdown(segment_id, wait).await;
                    self.set_state(QueueState::Running {
                        segment_id: segment_id.to_string(),
                        position: position + 1,
                        total,
                    });
                }
                Err(e) => return Err(e),
            }
        };

        let mut take = Take::complete(asset.asset_url, asset.duration_sec.unwrap_or(segment_duration));
        take.thumbnail_url = asset.thumbnail_url;
        take.last_frame_url = asset.last_frame_url;
        store.record_take(segment_id, take, true)?;
        info!(segment = %segment_id, "Generated take recorded");
        Ok(())
    }

    /// Generate keyframes for one segment and write them back to `store`.
    ///
    /// Returns the re-derived anchor status. The queue item's prompts are used
    /// when the segment has one; frame generation is allowed for any approval status.
    pub async fn generate_frames(
        &mut self,
        segment_id: &str,
        frame_type: FrameType,
        store: &mut SegmentStore,
    ) -> Result<AnchorStatus, DomainError> {
        if store.get(segment_id).is_none() {
            return Err(DomainError::NotFound(format!("segment {}", segment_id)));
        }
        let (prompt, negative_prompt) = self
            .item(segment_id)
            .map(|i| (i.prompt.clone(), i.negative_prompt.clone()))
            .unwrap_or_default();
        let request = FrameRequest {
            segment_id: segment_id.to_string(),
            frame_type,
            prompt,
            negative_prompt,
        };
        info!(segment = %segment_id, ?frame_type, "Generating keyframes");

        let result = self.request_frames(&request).await;
        if self.state != QueueState::Idle {
            self.set_state(QueueState::Idle);
        }
        let frames = result?;

        let status = store.apply_frames(segment_id, frame_type, frames.start_frame_url, frames.end_frame_url)?;
        info!(segment = %segment_id, status = %status, "Keyframes applied");
        Ok(status)
    }

    async fn request_frames(&mut self, request: &FrameRequest) -> Result<GeneratedFrames, DomainError> {
        let mut rate_limit_hits = 0;
        loop {
            match self.generation.generate_frames(request).await {
                Err(DomainError::RateLimited { retry_after_secs }) => {
                    rate_limit_hits += 1;
                    if rate_limit_hits > self.settings.max_rate_limit_retries {
                        return Err(DomainError::RateLimited { retry_after_secs });
                    }
                    let wait = retry_after_secs.unwrap_or(self.settings.rate_limit_backoff.as_secs());
                    warn!(segment = %request.segment_id, wait, attempt = rate_limit_hits, "Rate limited; pausing frame generation");
                    self.countdown(&request.segment_id, wait).await;
                }
                other => return other,
            }
        }
    }

    async fn countdown(&mut self, segment_id: &str, seconds: u64) {
        for remaining in (1..=seconds).rev() {
            self.set_state(QueueState::Paused {
                segment_id: segment_id.to_string(),
                remaining_secs: remaining,
            });
            self.sleeper.sleep(Duration::from_secs(1)).await;
        }
    }

    fn mark(&mut self, segment_id: &str, status: ApprovalStatus, error: Option<String>) {
        if let Ok(item) = self.item_mut(segment_id) {
            item.approval_status = status;
            item.error = error;
        }
    }

    fn set_state(&mut self, state: QueueState) {
        self.state = state;
        if let Some(observer) = &self.observer {
            observer(&self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::adapters::timers::VirtualSleeper;

    #[derive(Default)]
    struct ScriptedGeneration {
        responses: Mutex<HashMap<String, VecDeque<Result<GeneratedAsset, DomainError>>>>,
        frame_errors: Mutex<VecDeque<DomainError>>,
        always_rate_limited: HashSet<String>,
        calls: Mutex<Vec<String>>,
        frame_calls: Mutex<Vec<FrameRequest>>,
    }

    impl ScriptedGeneration {
        fn script(self, segment_id: &str, responses: Vec<Result<GeneratedAsset, DomainError>>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(segment_id.to_string(), responses.into());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationPort for ScriptedGeneration {
        async fn generate_video(&self, request: &GenerationRequest) -> Result<GeneratedAsset, DomainError> {
            self.calls.lock().unwrap().push(request.segment_id.clone());
            if self.always_rate_limited.contains(&request.segment_id) {
                return Err(DomainError::RateLimited { retry_after_secs: None });
            }
            let scripted = self
                .responses
                .lock()
                .unwrap()
                .get_mut(&request.segment_id)
                .and_then(VecDeque::pop_front);
            scripted.unwrap_or_else(|| Ok(asset(&request.segment_id)))
        }

        async fn generate_frames(&self, request: &FrameRequest) -> Result<GeneratedFrames, DomainError> {
            self.frame_calls.lock().unwrap().push(request.clone());
            if let Some(err) = self.frame_errors.lock().unwrap().pop_front() {
                return Err(err);
            }
            let url = |edge: &str| Some(format!("https://cdn/frames/{}-{}.png", request.segment_id, edge));
            Ok(match request.frame_type {
                FrameType::Start => GeneratedFrames {
                    start_frame_url: url("start"),
                    end_frame_url: None,
                },
                FrameType::End => GeneratedFrames {
                    start_frame_url: None,
                    end_frame_url: url("end"),
                },
                FrameType::Both => GeneratedFrames {
                    start_frame_url: url("start"),
                    end_frame_url: url("end"),
                },
            })
        }
    }

    fn asset(segment_id: &str) -> GeneratedAsset {
        GeneratedAsset {
            asset_url: format!("https://cdn/gen/{}.mp4", segment_id),
            duration_sec: Some(5.2),
            thumbnail_url: None,
            last_frame_url: Some(format!("https://cdn/gen/{}-last.png", segment_id)),
        }
    }

    fn store(ids: &[&str]) -> SegmentStore {
        let segments = ids
            .iter()
            .enumerate()
            .map(|(i, id)| Segment::new(*id, i, i as f64 * 5.0, (i + 1) as f64 * 5.0).unwrap())
            .collect();
        SegmentStore::new(segments).unwrap()
    }

    fn items(statuses: &[(&str, ApprovalStatus)]) -> Vec<QueueItem> {
        statuses.iter().map(|(id, s)| QueueItem::new(*id, *s)).collect()
    }

    fn queue(generation: Arc<ScriptedGeneration>, sleeper: Arc<VirtualSleeper>, items: Vec<QueueItem>) -> GenerationQueue {
        GenerationQueue::new(generation, sleeper, QueueSettings::default(), items)
    }

    #[tokio::test]
    async fn test_approved_only_dispatch() {
        use ApprovalStatus::*;
        let generation = Arc::new(ScriptedGeneration::default());
        let sleeper = Arc::new(VirtualSleeper::new());
        let mut queue = queue(
            generation.clone(),
            sleeper.clone(),
            items(&[("a", AutoReady), ("b", UserApproved), ("c", Locked), ("d", UserApproved)]),
        );
        let mut store = store(&["a", "b", "c", "d"]);

        let report = queue.dispatch(&DispatchMode::ApprovedOnly, &mut store).await;

        assert_eq!(generation.calls(), vec!["b", "d"]);
        assert_eq!(report.rendered, vec!["b", "d"]);
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(6)]);
        assert_eq!(queue.item("b").unwrap().approval_status, Rendered);
        assert_eq!(queue.item("a").unwrap().approval_status, AutoReady);
        assert_eq!(queue.item("c").unwrap().approval_status, Locked);
        assert_eq!(*queue.state(), QueueState::Idle);

        let segment = store.get("d").unwrap();
        assert_eq!(segment.active_asset_url.as_deref(), Some("https://cdn/gen/d.mp4"));
        assert_eq!(segment.active_take().unwrap().duration_sec, 5.2);
        assert!(store.get("a").unwrap().active_asset_url.is_none());
    }

    #[test]
    fn test_selection_modes() {
        use ApprovalStatus::*;
        let queue = queue(
            Arc::new(ScriptedGeneration::default()),
            Arc::new(VirtualSleeper::new()),
            items(&[
                ("a", AutoReady),
                ("b", UserApproved),
                ("c", Locked),
                ("d", Rendering),
                ("e", Error),
                ("f", UserApproved),
                ("g", Rendered),
            ]),
        );

        // Previously approved items stay eligible after they render or fail
        assert_eq!(queue.select(&DispatchMode::ApprovedOnly), vec!["b", "e", "f", "g"]);
        assert_eq!(queue.select(&DispatchMode::All), vec!["b", "f", "a", "e", "g"]);
        let selected = DispatchMode::Selected(vec!["e".into(), "c".into(), "a".into(), "zz".into()]);
        assert_eq!(queue.select(&selected), vec!["a", "e"]);
    }

    #[tokio::test]
    async fn test_rate_limit_pauses_then_resumes() {
        let generation = Arc::new(ScriptedGeneration::default().script(
            "a",
            vec![Err(DomainError::RateLimited { retry_after_secs: Some(3) })],
        ));
        let sleeper = Arc::new(VirtualSleeper::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut queue = queue(
            generation.clone(),
            sleeper.clone(),
            items(&[("a", ApprovalStatus::UserApproved)]),
        )
        .with_observer(Arc::new(move |state: &QueueState| sink.lock().unwrap().push(state.clone())));
        let mut store = store(&["a"]);

        let report = queue.dispatch(&DispatchMode::ApprovedOnly, &mut store).await;

        assert_eq!(report.rendered, vec!["a"]);
        assert_eq!(report.rate_limit_pauses, 1);
        assert_eq!(generation.calls(), vec!["a", "a"]);
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(1); 3]);

        let countdown: Vec<u64> = seen
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                QueueState::Paused { remaining_secs, .. } => Some(*remaining_secs),
                _ => None,
            })
            .collect();
        assert_eq!(countdown, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion_marks_error_and_continues() {
        let generation = Arc::new(ScriptedGeneration {
            always_rate_limited: HashSet::from(["a".to_string()]),
            ..ScriptedGeneration::default()
        });
        let sleeper = Arc::new(VirtualSleeper::new());
        let settings = QueueSettings {
            inter_item_delay: Duration::from_secs(6),
            rate_limit_backoff: Duration::from_secs(2),
            max_rate_limit_retries: 2,
        };
        let mut queue = GenerationQueue::new(
            generation.clone(),
            sleeper.clone(),
            settings,
            items(&[("a", ApprovalStatus::UserApproved), ("b", ApprovalStatus::UserApproved)]),
        );
        let mut store = store(&["a", "b"]);

        let report = queue.dispatch(&DispatchMode::ApprovedOnly, &mut store).await;

        assert_eq!(generation.calls(), vec!["a", "a", "a", "b"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.rendered, vec!["b"]);
        assert_eq!(queue.item("a").unwrap().approval_status, ApprovalStatus::Error);
        assert!(queue.item("a").unwrap().error.is_some());
        assert_eq!(sleeper.total(), Duration::from_secs(4 + 6));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let generation = Arc::new(ScriptedGeneration::default().script(
            "a",
            vec![Err(DomainError::ServiceUnavailable("model overloaded".into()))],
        ));
        let mut queue = queue(
            generation.clone(),
            Arc::new(VirtualSleeper::new()),
            items(&[("a", ApprovalStatus::AutoReady), ("b", ApprovalStatus::AutoReady)]),
        );
        let mut store = store(&["a", "b"]);

        let report = queue.dispatch(&DispatchMode::All, &mut store).await;

        assert_eq!(report.attempted, vec!["a", "b"]);
        assert_eq!(report.rendered, vec!["b"]);
        let failed = queue.item("a").unwrap();
        assert_eq!(failed.approval_status, ApprovalStatus::Error);
        assert!(failed.error.as_ref().unwrap().contains("model overloaded"));
    }

    #[tokio::test]
    async fn test_missing_segment_is_not_sent() {
        let generation = Arc::new(ScriptedGeneration::default());
        let mut queue = queue(
            generation.clone(),
            Arc::new(VirtualSleeper::new()),
            items(&[("ghost", ApprovalStatus::UserApproved)]),
        );
        let mut store = store(&["a"]);

        let report = queue.dispatch(&DispatchMode::ApprovedOnly, &mut store).await;
        assert!(generation.calls().is_empty());
        assert_eq!(report.failed[0].0, "ghost");
    }

    #[test]
    fn test_approval_transitions() {
        let mut queue = queue(
            Arc::new(ScriptedGeneration::default()),
            Arc::new(VirtualSleeper::new()),
            items(&[("a", ApprovalStatus::AutoReady)]),
        );

        queue.lock("a").unwrap();
        assert!(matches!(queue.approve("a"), Err(DomainError::BadArgs(_))));
        queue.unlock("a").unwrap();
        assert_eq!(queue.item("a").unwrap().approval_status, ApprovalStatus::UserApproved);
        assert!(queue.unlock("a").is_err());
        assert!(matches!(queue.approve("zz"), Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_frame_generation_walks_anchor_lifecycle() {
        let generation = Arc::new(ScriptedGeneration::default());
        generation
            .frame_errors
            .lock()
            .unwrap()
            .push_back(DomainError::RateLimited { retry_after_secs: Some(2) });
        let sleeper = Arc::new(VirtualSleeper::new());
        let mut prompted = QueueItem::new("a", ApprovalStatus::AutoReady);
        prompted.prompt = Some("harbour at dawn".into());
        let mut queue = queue(generation.clone(), sleeper.clone(), vec![prompted]);
        let mut store = store(&["a", "b"]);
        assert_eq!(store.get("a").unwrap().anchor_status, AnchorStatus::Pending);

        let status = queue.generate_frames("a", FrameType::Start, &mut store).await.unwrap();
        assert_eq!(status, AnchorStatus::StartLocked);
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(1); 2]);
        assert_eq!(*queue.state(), QueueState::Idle);

        let status = queue.generate_frames("a", FrameType::End, &mut store).await.unwrap();
        assert_eq!(status, AnchorStatus::FullyAnchored);

        let segment = store.get("a").unwrap();
        assert_eq!(segment.start_frame_url.as_deref(), Some("https://cdn/frames/a-start.png"));
        assert_eq!(segment.end_frame_url.as_deref(), Some("https://cdn/frames/a-end.png"));
        assert_eq!(store.readiness().fully_anchored, 1);

        let calls = generation.frame_calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].prompt.as_deref(), Some("harbour at dawn"));
        assert_eq!(calls[2].frame_type, FrameType::End);
    }

    #[tokio::test]
    async fn test_frame_generation_failure_leaves_segment_untouched() {
        let generation = Arc::new(ScriptedGeneration::default());
        generation
            .frame_errors
            .lock()
            .unwrap()
            .push_back(DomainError::ServiceUnavailable("image model down".into()));
        let mut queue = queue(generation.clone(), Arc::new(VirtualSleeper::new()), vec![]);
        let mut store = store(&["a"]);

        let err = queue.generate_frames("a", FrameType::Both, &mut store).await.unwrap_err();
        assert!(matches!(err, DomainError::ServiceUnavailable(_)));
        assert_eq!(store.get("a").unwrap().anchor_status, AnchorStatus::Pending);

        let err = queue.generate_frames("ghost", FrameType::Both, &mut store).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert_eq!(generation.frame_calls.lock().unwrap().len(), 1);
    }
}
