//! Project and log entry records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Preset color palette offered when creating a project.
pub const PROJECT_COLORS: [&str; 8] = [
    "#00ff9f", // green
    "#00d4ff", // cyan
    "#b967ff", // purple
    "#ff6b6b", // coral
    "#ffd93d", // gold
    "#6bcb77", // fresh green
    "#4d96ff", // sky blue
    "#ff8fab", // rose
];

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Paused,
    Completed,
}

impl ProjectStatus {
    /// Human-readable label for dashboards and status chips.
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "In progress",
            ProjectStatus::Paused => "On hold",
            ProjectStatus::Completed => "Done",
        }
    }

    /// Accent color associated with the status.
    pub fn color(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "#00ff9f",
            ProjectStatus::Paused => "#ffd93d",
            ProjectStatus::Completed => "#00d4ff",
        }
    }
}

/// A project. The name doubles as the link anchor for `[[Name]]` tokens,
/// so it is expected to be unique within a user's namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        status: ProjectStatus,
        color: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            status,
            color: color.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A timestamped log entry owned by a project.
///
/// `content` is raw markdown and may contain `[[anchor]]` link tokens and
/// `{{IMG:id:payload}}` image placeholders; both are interpreted at render
/// time only. The title is the second segment of a qualified link anchor
/// (`Project name/Title`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(
        project_id: Uuid,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            title: title.into(),
            content: content.into(),
            tags: dedup_tags(tags),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Collapse duplicate tags, keeping first occurrence order. Tags are
/// case-sensitive free-form strings.
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

/// Full snapshot of the store: every project and every log entry.
///
/// This is the bulk-read shape used for reference-index construction and is
/// also the JSON store's on-disk format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppData {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl AppData {
    /// Logs belonging to a project, newest created first.
    pub fn logs_for_project(&self, project_id: Uuid) -> Vec<&LogEntry> {
        let mut logs: Vec<&LogEntry> = self
            .logs
            .iter()
            .filter(|l| l.project_id == project_id)
            .collect();
        logs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        logs
    }

    /// Most recently updated logs across all projects.
    pub fn recent_logs(&self, limit: usize) -> Vec<&LogEntry> {
        let mut logs: Vec<&LogEntry> = self.logs.iter().collect();
        logs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        logs.truncate(limit);
        logs
    }

    pub fn project_log_count(&self, project_id: Uuid) -> usize {
        self.logs
            .iter()
            .filter(|l| l.project_id == project_id)
            .count()
    }
}
