use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PROJECT_JSON: &str = r#"{
  "sceneId": "scene-7",
  "segments": [
    {
      "id": "seg-0", "sequenceIndex": 0, "startTime": 0.0, "endTime": 5.0,
      "startFrameUrl": "https://cdn.example/0-start.png",
      "endFrameUrl": "https://cdn.example/0-end.png",
      "takes": [{ "id": "t0", "status": "complete", "assetUrl": "https://cdn.example/seg-0.mp4",
                  "durationSec": 5.0, "createdAt": "2026-01-01T00:00:00Z" }],
      "activeAssetUrl": "https://cdn.example/seg-0.mp4"
    },
    {
      "id": "seg-1", "sequenceIndex": 1, "startTime": 5.0, "endTime": 10.0,
      "startFrameUrl": "https://cdn.example/1-start.png",
      "takes": [{ "id": "t1", "status": "complete", "assetUrl": "https://cdn.example/seg-1.mp4",
                  "durationSec": 5.0, "createdAt": "2026-01-01T00:00:00Z" }],
      "activeAssetUrl": "https://cdn.example/seg-1.mp4"
    },
    { "id": "seg-2", "sequenceIndex": 2, "startTime": 10.0, "endTime": 15.0 }
  ],
  "audioTracks": [
    {
      "kind": "narration",
      "clips": [{ "id": "narr-1", "url": "https://cdn.example/narration.mp3", "duration": 12.0 }]
    },
    {
      "kind": "dialogue",
      "config": { "startSegment": 1 },
      "clips": [
        { "id": "line-1", "url": "https://cdn.example/line-1.mp3", "duration": 2.0, "character": "Ava" },
        { "id": "line-2", "url": "https://cdn.example/line-2.mp3", "duration": 2.0, "character": "Ben" }
      ]
    }
  ],
  "queue": [
    { "segmentId": "seg-0", "approvalStatus": "rendered" },
    { "segmentId": "seg-1", "approvalStatus": "user-approved" },
    { "segmentId": "seg-2", "approvalStatus": "auto-ready" }
  ]
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("scene.json"), PROJECT_JSON).unwrap();
        Self { dir }
    }

    fn project(&self) -> String {
        self.dir.path().join("scene.json").to_string_lossy().into_owned()
    }

    /// Command isolated from any user configuration
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("scenesync").unwrap();
        cmd.env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .env_remove("RUST_LOG");
        cmd
    }
}

#[test]
fn test_readiness_reports_anchor_progress() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["readiness", &fixture.project()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scene scene-7"))
        .stdout(predicate::str::contains("start-locked"))
        .stdout(predicate::str::contains("1/3 fully anchored (33%), 1 partial, 1 pending"));
}

#[test]
fn test_readiness_json() {
    let fixture = Fixture::new();
    let output = fixture
        .cmd()
        .args(["readiness", &fixture.project(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["readiness"]["total"], 3);
    assert_eq!(body["readiness"]["fullyAnchored"], 1);
    assert_eq!(body["segments"][2]["anchorStatus"], "pending");
}

#[test]
fn test_windows_places_dialogue_lines() {
    let fixture = Fixture::new();
    let output = fixture
        .cmd()
        .args(["windows", &fixture.project(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["videoTotalDuration"], 15.0);
    assert_eq!(body["audioEndTime"], 12.0);
    let dialogue = &body["tracks"][1];
    assert_eq!(dialogue["window"]["startTime"], 5.0);
    assert_eq!(dialogue["clips"][0]["startTime"], 5.0);
    assert_eq!(dialogue["clips"][1]["startTime"], 8.0);
    assert_eq!(dialogue["clips"][1]["character"], "Ben");
}

#[test]
fn test_preview_runs_to_the_end() {
    let fixture = Fixture::new();
    // seg-2 has no video yet, so playback ends with the last playable clip
    fixture
        .cmd()
        .args(["preview", &fixture.project(), "--report-every", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("00:00.000 / 00:15.000"))
        .stdout(predicate::str::contains("Playback finished at"));
}

#[test]
fn test_render_dry_run_prints_payload() {
    let fixture = Fixture::new();
    let output = fixture
        .cmd()
        .args(["render", &fixture.project(), "--dry-run", "--language", "fr", "--resolution", "720p"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["resolution"], "720p");
    assert_eq!(body["audioConfig"]["language"], "fr");
    assert_eq!(body["segments"].as_array().unwrap().len(), 2);
    assert_eq!(body["audioTracks"]["dialogue"].as_array().unwrap().len(), 2);
}

#[test]
fn test_render_rejects_unknown_resolution() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["render", &fixture.project(), "--dry-run", "--resolution", "8k"])
        .assert()
        .failure();
}

#[test]
fn test_queue_dry_run_lists_selection() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["queue", &fixture.project(), "--dry-run"])
        .assert()
        .success()
        .stdout("seg-0\nseg-1\n");

    fixture
        .cmd()
        .args(["queue", &fixture.project(), "--dry-run", "--mode", "all", "--lock", "seg-0"])
        .assert()
        .success()
        .stdout("seg-1\nseg-2\n");
}

#[test]
fn test_queue_rejects_selected_without_ids() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["queue", &fixture.project(), "--dry-run", "--mode", "selected"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("selected mode requires"));
}

#[test]
fn test_missing_project_fails() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["readiness", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_frames_rejects_bad_input_before_calling_service() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["frames", &fixture.project(), "seg-2", "--frame-type", "middle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid frame type"));

    fixture
        .cmd()
        .args(["frames", &fixture.project(), "seg-9", "--base-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("seg-9"));
}
