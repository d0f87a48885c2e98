// Segment store - Ordered segments owned by one production session

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::domain::rules::{AnchorClassifier, Readiness, TimelineMath};

/// Ordered, validated segment sequence.
///
/// Segments are never removed one by one; re-segmentation replaces the whole list.
#[derive(Debug, Clone, Default)]
pub struct SegmentStore {
    segments: Vec<Segment>,
}

impl SegmentStore {
    pub fn new(segments: Vec<Segment>) -> Result<Self, DomainError> {
        let mut store = Self::default();
        store.replace_all(segments)?;
        Ok(store)
    }

    /// Replace every segment after validating lengths and ordering keys
    pub fn replace_all(&mut self, mut segments: Vec<Segment>) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for segment in &segments {
            if !(segment.end_time > segment.start_time) {
                return Err(DomainError::InvalidTimeRange(format!(
                    "segment {} must end after it starts ({} >= {})",
                    segment.id, segment.start_time, segment.end_time
                )));
            }
            if !seen.insert(segment.sequence_index) {
                return Err(DomainError::BadArgs(format!(
                    "duplicate sequence index {}",
                    segment.sequence_index
                )));
            }
        }

        segments.sort_by_key(|s| s.sequence_index);
        for pair in segments.windows(2) {
            if (pair[1].start_time - pair[0].end_time).abs() > 1e-3 {
                warn!(
                    previous = %pair[0].id,
                    next = %pair[1].id,
                    "Segments are not contiguous; timeline uses durations only"
                );
            }
        }
        for segment in &mut segments {
            segment.anchor_status = AnchorClassifier::compute_anchor_status(segment);
        }

        debug!(count = segments.len(), "Segment list replaced");
        self.segments = segments;
        Ok(())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, segment_id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == segment_id)
    }

    fn get_mut(&mut self, segment_id: &str) -> Result<&mut Segment, DomainError> {
        self.segments
            .iter_mut()
            .find(|s| s.id == segment_id)
            .ok_or_else(|| DomainError::NotFound(format!("segment {}", segment_id)))
    }

    /// Write back keyframe URLs produced by the image generator and re-derive the anchor status
    pub fn apply_frames(
        &mut self,
        segment_id: &str,
        frame_type: FrameType,
        start_url: Option<String>,
        end_url: Option<String>,
    ) -> Result<AnchorStatus, DomainError> {
        let (start_url, end_url) = match (frame_type, start_url, end_url) {
            (FrameType::Start, Some(start), _) => (Some(start), None),
            (FrameType::End, _, Some(end)) => (None, Some(end)),
            (FrameType::Both, Some(start), Some(end)) => (Some(start), Some(end)),
            (frame_type, _, _) => {
                return Err(DomainError::BadArgs(format!(
                    "missing frame URL for frame type {:?}",
                    frame_type
                )))
            }
        };

        let segment = self.get_mut(segment_id)?;
        if start_url.is_some() {
            segment.start_frame_url = start_url;
        }
        if end_url.is_some() {
            segment.end_frame_url = end_url;
        }
        segment.anchor_status = AnchorClassifier::compute_anchor_status(segment);

        debug!(segment = segment_id, status = %segment.anchor_status, "Frames applied");
        Ok(segment.anchor_status)
    }

    /// Append a take and optionally bind it as the active asset
    pub fn record_take(&mut self, segment_id: &str, take: Take, activate: bool) -> Result<(), DomainError> {
        let segment = self.get_mut(segment_id)?;
        if activate && !take.is_playable() {
            return Err(DomainError::BadArgs(format!(
                "take {} is not complete and cannot be activated",
                take.id
            )));
        }
        let take_id = take.id.clone();
        segment.add_take(take);
        if activate {
            segment.activate_take(&take_id)?;
        }
        Ok(())
    }

    pub fn activate_take(&mut self, segment_id: &str, take_id: &str) -> Result<(), DomainError> {
        self.get_mut(segment_id)?.activate_take(take_id)
    }

    pub fn segment_start_time(&self, index: usize) -> f64 {
        TimelineMath::segment_start_time(&self.segments, index)
    }

    pub fn video_total_duration(&self) -> f64 {
        TimelineMath::video_total_duration(&self.segments)
    }

    pub fn readiness(&self) -> Readiness {
        AnchorClassifier::aggregate_readiness(&self.segments)
    }
}
