//! Content store abstraction
//!
//! Durable record storage for [`Project`] and [`LogEntry`] records. The
//! editor layer never talks to a backend directly; it receives snapshots
//! and hands save requests back to the surrounding application, which calls
//! into an implementation of [`ContentStore`].
//!
//! Implementations must uphold two invariants:
//! - deleting a project also deletes all of its log entries (no orphans),
//! - creating or updating a log entry refreshes the owning project's
//!   `updated_at` as a side effect.

pub mod error;
pub mod memory;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{AppData, LogEntry, Project, ProjectStatus};

/// Fields for creating a project.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub color: String,
}

/// Partial update of a project. `None` fields are left unchanged;
/// `updated_at` is always refreshed.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub color: Option<String>,
}

/// Partial update of a log entry. `None` fields are left unchanged;
/// the entry's and the owning project's `updated_at` are always refreshed.
#[derive(Debug, Clone, Default)]
pub struct LogPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Record CRUD over projects and log entries.
///
/// All operations return [`StoreResult`]; persist failures are surfaced to
/// the caller as transient errors and never panic.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Create a project, assigning id and timestamps.
    async fn create_project(&self, new: NewProject) -> StoreResult<Project>;

    /// Apply a partial update to a project.
    async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<()>;

    /// Delete a project and, atomically, every log entry it owns.
    async fn delete_project(&self, id: Uuid) -> StoreResult<()>;

    /// Fetch one project, or `None` if it does not exist.
    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Create a log entry under a project, assigning id and timestamps and
    /// touching the parent project.
    async fn create_log(
        &self,
        project_id: Uuid,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> StoreResult<LogEntry>;

    /// Apply a partial update to a log entry, touching the parent project.
    async fn update_log(&self, id: Uuid, patch: LogPatch) -> StoreResult<()>;

    /// Delete one log entry. Idempotent.
    async fn delete_log(&self, id: Uuid) -> StoreResult<()>;

    /// Fetch one log entry, or `None` if it does not exist.
    async fn get_log(&self, id: Uuid) -> StoreResult<Option<LogEntry>>;

    /// Bulk read of all projects and logs, for index construction.
    async fn snapshot(&self) -> StoreResult<AppData>;
}

/// Blanket implementation so stores can be shared behind `Arc`.
#[async_trait]
impl<T: ContentStore + ?Sized> ContentStore for std::sync::Arc<T> {
    async fn create_project(&self, new: NewProject) -> StoreResult<Project> {
        (**self).create_project(new).await
    }

    async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<()> {
        (**self).update_project(id, patch).await
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<()> {
        (**self).delete_project(id).await
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        (**self).get_project(id).await
    }

    async fn create_log(
        &self,
        project_id: Uuid,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> StoreResult<LogEntry> {
        (**self).create_log(project_id, title, content, tags).await
    }

    async fn update_log(&self, id: Uuid, patch: LogPatch) -> StoreResult<()> {
        (**self).update_log(id, patch).await
    }

    async fn delete_log(&self, id: Uuid) -> StoreResult<()> {
        (**self).delete_log(id).await
    }

    async fn get_log(&self, id: Uuid) -> StoreResult<Option<LogEntry>> {
        (**self).get_log(id).await
    }

    async fn snapshot(&self) -> StoreResult<AppData> {
        (**self).snapshot().await
    }
}
