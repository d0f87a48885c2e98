// Unit tests for domain models

#[cfg(test)]
mod tests {
    use crate::domain::errors::*;
    use crate::domain::model::*;

    #[test]
    fn test_segment_creation() {
        let segment = Segment::new("seg-1", 0, 2.0, 7.5).unwrap();
        assert_eq!(segment.duration(), 5.5);
        assert_eq!(segment.anchor_status, AnchorStatus::Pending);
        assert!(segment.takes.is_empty());
    }

    #[test]
    fn test_segment_invalid_range() {
        assert!(matches!(
            Segment::new("seg-1", 0, 5.0, 5.0),
            Err(DomainError::InvalidTimeRange(_))
        ));
        assert!(Segment::new("seg-1", 0, 5.0, 1.0).is_err());
        assert!(Segment::new("seg-1", 0, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_activate_take_binds_asset_url() {
        let mut segment = Segment::new("seg-1", 0, 0.0, 5.0).unwrap();
        let first = Take::complete("https://cdn/first.mp4", 5.0);
        let second = Take::complete("https://cdn/second.mp4", 5.0);
        let second_id = second.id.clone();
        segment.add_take(first);
        segment.add_take(second);

        segment.activate_take(&second_id).unwrap();
        assert_eq!(segment.active_asset_url.as_deref(), Some("https://cdn/second.mp4"));
        assert_eq!(segment.active_take().unwrap().id, second_id);
    }

    #[test]
    fn test_activate_take_rejects_unfinished_or_unknown() {
        let mut segment = Segment::new("seg-1", 0, 0.0, 5.0).unwrap();
        let pending = Take::pending();
        let pending_id = pending.id.clone();
        segment.add_take(pending);

        assert!(matches!(segment.activate_take(&pending_id), Err(DomainError::BadArgs(_))));
        assert!(matches!(segment.activate_take("missing"), Err(DomainError::NotFound(_))));
        assert!(segment.active_asset_url.is_none());
    }

    #[test]
    fn test_track_config_defaults() {
        let config = AudioTrackConfig::default();
        assert!(config.enabled);
        assert_eq!(config.volume, 1.0);
        assert_eq!(config.end_segment, TO_LAST_SEGMENT);
        assert_eq!(config.start_offset, 0.0);
    }

    #[test]
    fn test_track_config_volume_clamped() {
        let mut config = AudioTrackConfig::default();
        config.set_volume(1.7);
        assert_eq!(config.volume, 1.0);
        config.set_volume(-0.2);
        assert_eq!(config.volume, 0.0);
    }

    #[test]
    fn test_resolved_end_segment() {
        let mut config = AudioTrackConfig::default();
        assert_eq!(config.resolved_end_segment(0), None);
        assert_eq!(config.resolved_end_segment(3), Some(2));

        config.end_segment = 1;
        assert_eq!(config.resolved_end_segment(3), Some(1));

        config.end_segment = 10;
        assert_eq!(config.resolved_end_segment(3), Some(2));

        // End before start resolves to the start segment
        config.start_segment = 2;
        config.end_segment = 0;
        assert_eq!(config.resolved_end_segment(3), Some(2));
    }

    #[test]
    fn test_upsert_clip_config() {
        let mut track = AudioTrack::new(AudioTrackKind::Dialogue, vec![]);
        track.upsert_clip_config(AudioClipConfig::new("line-1"));
        let mut updated = AudioClipConfig::new("line-1");
        updated.volume = Some(0.4);
        track.upsert_clip_config(updated);

        assert_eq!(track.clip_configs.len(), 1);
        assert_eq!(track.clip_config("line-1").unwrap().volume, Some(0.4));
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!(Resolution::parse("720p").unwrap(), Resolution::Hd720);
        assert_eq!(Resolution::parse("4K").unwrap(), Resolution::Uhd4k);
        assert_eq!(Resolution::default().dimensions(), (1920, 1080));
        assert!(Resolution::parse("8k").is_err());
    }

    #[test]
    fn test_dispatch_mode_parse() {
        assert_eq!(DispatchMode::parse("approved_only", vec![]).unwrap(), DispatchMode::ApprovedOnly);
        assert_eq!(DispatchMode::parse("ALL", vec![]).unwrap(), DispatchMode::All);
        assert_eq!(
            DispatchMode::parse("selected", vec!["a".into()]).unwrap(),
            DispatchMode::Selected(vec!["a".into()])
        );
        assert!(DispatchMode::parse("selected", vec![]).is_err());
        assert!(DispatchMode::parse("random", vec![]).is_err());
    }

    #[test]
    fn test_frame_type_parse() {
        assert_eq!(FrameType::parse("Both").unwrap(), FrameType::Both);
        assert!(FrameType::parse("middle").is_err());
    }

    #[test]
    fn test_render_job_activity() {
        let mut job = RenderJob::default();
        assert_eq!(job.status, RenderStatus::Idle);
        assert!(!job.is_active());
        job.status = RenderStatus::Rendering;
        assert!(job.is_active());
        job.status = RenderStatus::Error;
        assert!(!job.is_active());
    }

    #[test]
    fn test_scene_project_deserializes_camel_case() {
        let json = r#"{
            "sceneId": "scene-1",
            "segments": [
                {"id": "s0", "sequenceIndex": 0, "startTime": 0.0, "endTime": 5.0,
                 "transition": "FADE", "startFrameUrl": "a.png"}
            ],
            "audioTracks": [
                {"kind": "narration", "config": {"volume": 0.8, "endSegment": -1},
                 "clips": [{"id": "n1", "url": "n.mp3", "duration": 20.0}]}
            ],
            "queue": [{"segmentId": "s0", "approvalStatus": "user-approved"}]
        }"#;

        let project: SceneProject = serde_json::from_str(json).unwrap();
        assert_eq!(project.segments[0].transition, TransitionType::Fade);
        assert_eq!(project.audio_tracks[0].config.volume, 0.8);
        assert!(project.audio_tracks[0].config.enabled);
        assert_eq!(project.queue[0].approval_status, ApprovalStatus::UserApproved);
    }
}
