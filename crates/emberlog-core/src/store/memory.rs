//! In-memory reference store
//!
//! The default backend and the fixture used across editor tests. State is a
//! single [`AppData`] snapshot behind an async `RwLock`.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::model::{dedup_tags, AppData, LogEntry, Project};
use crate::store::{ContentStore, LogPatch, NewProject, ProjectPatch, StoreError, StoreResult};

/// In-memory [`ContentStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<AppData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot (used by persistent backends that
    /// load state at open time, and by tests).
    pub fn with_data(data: AppData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create_project(&self, new: NewProject) -> StoreResult<Project> {
        let project = Project::new(new.name, new.description, new.status, new.color);
        debug!(project_id = %project.id, name = %project.name, "create project");
        self.data.write().await.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<()> {
        let mut data = self.data.write().await;
        let project = data
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::ProjectNotFound { id })?;
        apply_project_patch(project, patch);
        Ok(())
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<()> {
        let mut data = self.data.write().await;
        if !data.projects.iter().any(|p| p.id == id) {
            return Err(StoreError::ProjectNotFound { id });
        }
        let logs_before = data.logs.len();
        data.projects.retain(|p| p.id != id);
        data.logs.retain(|l| l.project_id != id);
        debug!(
            project_id = %id,
            cascaded = logs_before - data.logs.len(),
            "delete project"
        );
        Ok(())
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let data = self.data.read().await;
        Ok(data.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn create_log(
        &self,
        project_id: Uuid,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> StoreResult<LogEntry> {
        let mut data = self.data.write().await;
        let project = data
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or(StoreError::ProjectNotFound { id: project_id })?;
        project.updated_at = Utc::now();

        let log = LogEntry::new(project_id, title, content, tags);
        debug!(log_id = %log.id, project_id = %project_id, "create log entry");
        data.logs.push(log.clone());
        Ok(log)
    }

    async fn update_log(&self, id: Uuid, patch: LogPatch) -> StoreResult<()> {
        let mut data = self.data.write().await;
        let log = data
            .logs
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(StoreError::LogNotFound { id })?;

        let now = Utc::now();
        if let Some(title) = patch.title {
            log.title = title;
        }
        if let Some(content) = patch.content {
            log.content = content;
        }
        if let Some(tags) = patch.tags {
            log.tags = dedup_tags(tags);
        }
        log.updated_at = now;
        let project_id = log.project_id;

        // Touch the owning project as a side effect of the entry changing.
        if let Some(project) = data.projects.iter_mut().find(|p| p.id == project_id) {
            project.updated_at = now;
        }
        Ok(())
    }

    async fn delete_log(&self, id: Uuid) -> StoreResult<()> {
        let mut data = self.data.write().await;
        data.logs.retain(|l| l.id != id);
        Ok(())
    }

    async fn get_log(&self, id: Uuid) -> StoreResult<Option<LogEntry>> {
        let data = self.data.read().await;
        Ok(data.logs.iter().find(|l| l.id == id).cloned())
    }

    async fn snapshot(&self) -> StoreResult<AppData> {
        Ok(self.data.read().await.clone())
    }
}

fn apply_project_patch(project: &mut Project, patch: ProjectPatch) {
    if let Some(name) = patch.name {
        project.name = name;
    }
    if let Some(description) = patch.description {
        project.description = description;
    }
    if let Some(status) = patch.status {
        project.status = status;
    }
    if let Some(color) = patch.color {
        project.color = color;
    }
    project.updated_at = Utc::now();
}
