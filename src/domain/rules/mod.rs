// Domain rules - Business logic and policies

use serde::Serialize;

use crate::domain::model::*;

/// Default spacing between dialogue lines that carry no explicit start time
pub const DEFAULT_DIALOGUE_STAGGER_SECS: f64 = 3.0;

/// Derives anchor status from which keyframes exist
pub struct AnchorClassifier;

impl AnchorClassifier {
    /// Classify a segment purely from the presence of its start/end frame URLs
    pub fn compute_anchor_status(segment: &Segment) -> AnchorStatus {
        Self::classify(
            segment.start_frame_url.is_some(),
            segment.end_frame_url.is_some(),
        )
    }

    pub fn classify(has_start: bool, has_end: bool) -> AnchorStatus {
        match (has_start, has_end) {
            (true, true) => AnchorStatus::FullyAnchored,
            (true, false) => AnchorStatus::StartLocked,
            // End frame without a start frame only exists while generation is in flight
            (false, true) => AnchorStatus::EndPending,
            (false, false) => AnchorStatus::Pending,
        }
    }

    /// Reduce a segment list to readiness counters
    pub fn aggregate_readiness(segments: &[Segment]) -> Readiness {
        let mut readiness = Readiness {
            total: segments.len(),
            ..Readiness::default()
        };

        for segment in segments {
            match Self::compute_anchor_status(segment) {
                AnchorStatus::FullyAnchored => readiness.fully_anchored += 1,
                AnchorStatus::StartLocked | AnchorStatus::EndPending => readiness.partial += 1,
                AnchorStatus::Pending => readiness.pending += 1,
            }
        }

        readiness.progress_percent = if readiness.total == 0 {
            0.0
        } else {
            readiness.fully_anchored as f64 / readiness.total as f64 * 100.0
        };
        readiness
    }
}

/// Aggregate keyframe readiness of a scene
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub total: usize,
    pub fully_anchored: usize,
    pub partial: usize,
    pub pending: usize,
    pub progress_percent: f64,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.total > 0 && self.fully_anchored == self.total
    }
}

/// Timeline arithmetic over the ordered segment list
pub struct TimelineMath;

impl TimelineMath {
    /// Sum of durations of segments `[0, index)`
    pub fn segment_start_time(segments: &[Segment], index: usize) -> f64 {
        segments
            .iter()
            .take(index)
            .map(Segment::duration)
            .sum()
    }

    /// End of segment `index` on the concatenated timeline
    pub fn segment_end_time(segments: &[Segment], index: usize) -> f64 {
        Self::segment_start_time(segments, index + 1)
    }

    pub fn video_total_duration(segments: &[Segment]) -> f64 {
        segments.iter().map(Segment::duration).sum()
    }

    /// Locate the segment owning global time `t` and the offset inside it.
    /// Times at or past the end resolve to the end of the last segment.
    pub fn locate(segments: &[Segment], t: f64) -> Option<(usize, f64)> {
        if segments.is_empty() {
            return None;
        }

        let t = t.max(0.0);
        let mut start = 0.0;
        for (index, segment) in segments.iter().enumerate() {
            let end = start + segment.duration();
            if t < end {
                return Some((index, t - start));
            }
            start = end;
        }

        let last = segments.len() - 1;
        Some((last, segments[last].duration()))
    }
}

/// Converts segment-bound track configuration into absolute timeline positions
pub struct TrackResolver;

impl TrackResolver {
    /// Resolve a track's segment range into absolute seconds
    pub fn resolve_track_window(config: &AudioTrackConfig, segments: &[Segment]) -> TrackWindow {
        let Some(end_index) = config.resolved_end_segment(segments.len()) else {
            return TrackWindow {
                start_time: config.start_offset,
                end_time: config.start_offset,
            };
        };

        let start_index = config.start_segment.min(segments.len() - 1);
        let start_time = TimelineMath::segment_start_time(segments, start_index) + config.start_offset;
        let end_time = TimelineMath::segment_end_time(segments, end_index).max(start_time);

        TrackWindow {
            start_time,
            end_time,
        }
    }

    /// Place every clip of a track on the global timeline.
    ///
    /// Dialogue lines take their start from the clip override or `index * stagger`,
    /// and their volume from the override or the track volume. Other tracks lay their
    /// clips back to back from the window start. A track-level duration trims
    /// everything past `window.start + duration`.
    pub fn resolve_clips(track: &AudioTrack, segments: &[Segment], stagger: f64) -> Vec<ResolvedClip> {
        let window = Self::resolve_track_window(&track.config, segments);
        let track_volume = clamp_volume(track.config.volume);

        let mut resolved = Vec::with_capacity(track.clips.len());
        let mut cursor = window.start_time;
        for (index, source) in track.clips.iter().enumerate() {
            let clip = match track.kind {
                AudioTrackKind::Dialogue => {
                    let overrides = track.clip_config(&source.id);
                    let offset = overrides
                        .and_then(|c| c.start_time)
                        .unwrap_or(index as f64 * stagger);
                    ResolvedClip {
                        clip_id: source.id.clone(),
                        url: source.url.clone(),
                        start_time: window.start_time + offset.max(0.0),
                        duration: overrides
                            .and_then(|c| c.duration)
                            .unwrap_or(source.duration)
                            .max(0.0),
                        volume: overrides
                            .and_then(|c| c.volume)
                            .map(clamp_volume)
                            .unwrap_or(track_volume),
                        enabled: overrides.map(|c| c.enabled).unwrap_or(true),
                        character: source.character.clone(),
                    }
                }
                _ => {
                    let clip = ResolvedClip {
                        clip_id: source.id.clone(),
                        url: source.url.clone(),
                        start_time: cursor,
                        duration: source.duration.max(0.0),
                        volume: track_volume,
                        enabled: true,
                        character: source.character.clone(),
                    };
                    cursor += clip.duration;
                    clip
                }
            };
            resolved.push(clip);
        }

        if let Some(limit) = track.config.duration {
            let cutoff = window.start_time + limit.max(0.0);
            resolved.retain(|c| c.start_time < cutoff);
            for clip in &mut resolved {
                clip.duration = clip.duration.min(cutoff - clip.start_time);
            }
        }

        resolved
    }

    /// Latest end time of the audible clips of an enabled track
    pub fn track_audio_end(track: &AudioTrack, segments: &[Segment], stagger: f64) -> Option<f64> {
        if !track.config.enabled {
            return None;
        }

        Self::resolve_clips(track, segments, stagger)
            .iter()
            .filter(|c| c.enabled)
            .map(ResolvedClip::end_time)
            .fold(None, |acc: Option<f64>, end| Some(acc.map_or(end, |a| a.max(end))))
    }

    /// Latest audio end across all enabled tracks, 0 when nothing plays
    pub fn max_audio_end(tracks: &[AudioTrack], segments: &[Segment], stagger: f64) -> f64 {
        tracks
            .iter()
            .filter_map(|t| Self::track_audio_end(t, segments, stagger))
            .fold(0.0, f64::max)
    }

    /// `max(video total, latest audio end)`
    pub fn total_duration(tracks: &[AudioTrack], segments: &[Segment], stagger: f64) -> f64 {
        TimelineMath::video_total_duration(segments).max(Self::max_audio_end(tracks, segments, stagger))
    }
}
