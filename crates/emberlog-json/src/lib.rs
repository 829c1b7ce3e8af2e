//! JSON-file persistence
//!
//! A [`ContentStore`] backed by a single pretty-printed JSON file. State
//! lives in an in-memory [`MemoryStore`]; every mutation delegates to it and
//! then rewrites the file atomically (write to a temp file in the same
//! directory, then rename over the target), so a crash mid-write never
//! leaves a truncated data file behind.
//!
//! Snapshots are small (a personal tracker, not a database), so whole-file
//! rewrites are fine.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use emberlog_core::model::{AppData, LogEntry, Project};
use emberlog_core::store::{
    ContentStore, LogPatch, MemoryStore, NewProject, ProjectPatch, StoreError, StoreResult,
};

/// File-backed [`ContentStore`].
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    inner: MemoryStore,
    /// Serializes file rewrites so concurrent mutations cannot interleave
    /// a stale snapshot over a newer one.
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// A missing file starts empty. A file that fails to parse is treated
    /// as empty with a warning rather than refusing to start; the next
    /// save replaces it.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<AppData>(&raw) {
                Ok(data) => {
                    debug!(
                        path = %path.display(),
                        projects = data.projects.len(),
                        logs = data.logs.len(),
                        "loaded data file"
                    );
                    data
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "data file unreadable, starting empty");
                    AppData::default()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => AppData::default(),
            Err(error) => return Err(StoreError::Io(error)),
        };

        Ok(Self {
            path,
            inner: MemoryStore::with_data(data),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current snapshot to disk atomically.
    async fn persist(&self) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let data = self.inner.snapshot().await?;
        let json = serde_json::to_vec_pretty(&data)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        debug!(path = %self.path.display(), bytes = json.len(), "persisted data file");
        Ok(())
    }
}

#[async_trait]
impl ContentStore for JsonStore {
    async fn create_project(&self, new: NewProject) -> StoreResult<Project> {
        let project = self.inner.create_project(new).await?;
        self.persist().await?;
        Ok(project)
    }

    async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<()> {
        self.inner.update_project(id, patch).await?;
        self.persist().await
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<()> {
        self.inner.delete_project(id).await?;
        self.persist().await
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        self.inner.get_project(id).await
    }

    async fn create_log(
        &self,
        project_id: Uuid,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> StoreResult<LogEntry> {
        let log = self.inner.create_log(project_id, title, content, tags).await?;
        self.persist().await?;
        Ok(log)
    }

    async fn update_log(&self, id: Uuid, patch: LogPatch) -> StoreResult<()> {
        self.inner.update_log(id, patch).await?;
        self.persist().await
    }

    async fn delete_log(&self, id: Uuid) -> StoreResult<()> {
        self.inner.delete_log(id).await?;
        self.persist().await
    }

    async fn get_log(&self, id: Uuid) -> StoreResult<Option<LogEntry>> {
        self.inner.get_log(id).await
    }

    async fn snapshot(&self) -> StoreResult<AppData> {
        self.inner.snapshot().await
    }
}
