// Project file adapter - Reads and writes scene projects as JSON or YAML

use std::path::Path;

use tracing::{debug, info};

use crate::domain::model::SceneProject;
use crate::domain::store::SegmentStore;
use crate::error::{SceneSyncError, SceneSyncResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormat {
    Json,
    Yaml,
}

impl ProjectFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> SceneSyncResult<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("json") => Ok(ProjectFormat::Json),
            Some("yaml") | Some("yml") => Ok(ProjectFormat::Yaml),
            _ => Err(SceneSyncError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

pub struct ProjectFileAdapter;

impl ProjectFileAdapter {
    /// Load a project and normalize its segments (ordered, anchor status derived)
    pub fn load(path: &Path) -> SceneSyncResult<SceneProject> {
        if !path.exists() {
            return Err(SceneSyncError::ProjectNotFound {
                path: path.display().to_string(),
            });
        }

        let format = ProjectFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let project = Self::parse(&content, format)?;
        info!(
            path = %path.display(),
            scene = %project.scene_id,
            segments = project.segments.len(),
            tracks = project.audio_tracks.len(),
            "Project loaded"
        );
        Ok(project)
    }

    pub fn parse(content: &str, format: ProjectFormat) -> SceneSyncResult<SceneProject> {
        let mut project: SceneProject = match format {
            ProjectFormat::Json => serde_json::from_str(content)?,
            ProjectFormat::Yaml => serde_yaml::from_str(content)?,
        };

        if project.scene_id.trim().is_empty() {
            return Err(SceneSyncError::InvalidProject {
                message: "sceneId must not be empty".to_string(),
            });
        }

        let store = SegmentStore::new(std::mem::take(&mut project.segments))?;
        project.segments = store.segments().to_vec();
        debug!(segments = project.segments.len(), "Project segments normalized");
        Ok(project)
    }

    pub fn save(path: &Path, project: &SceneProject) -> SceneSyncResult<()> {
        let content = match ProjectFormat::from_path(path)? {
            ProjectFormat::Json => serde_json::to_string_pretty(project)?,
            ProjectFormat::Yaml => serde_yaml::to_string(project)?,
        };
        std::fs::write(path, content)?;
        info!(path = %path.display(), "Project saved");
        Ok(())
    }
}
