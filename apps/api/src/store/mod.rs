//! Application record store.
//!
//! Handlers only see `Arc<dyn ApplicationStore>`; the Postgres backend is the
//! production implementation and the in-memory one backs handler tests.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationPatch, NewApplication};
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Application {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome of an update. `replaced_resume_path` is the file the record
/// pointed at before the update, set only when the update changed it.
#[derive(Debug, Clone)]
pub struct UpdatedApplication {
    pub application: Application,
    pub replaced_resume_path: Option<String>,
}

impl UpdatedApplication {
    pub fn new(previous_resume_path: String, application: Application) -> Self {
        let replaced_resume_path =
            (previous_resume_path != application.resume_path).then_some(previous_resume_path);
        Self {
            application,
            replaced_resume_path,
        }
    }
}

/// CRUD over application records. Implementations normalize and validate
/// every record before it is written.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn create(&self, new: NewApplication) -> Result<Application, StoreError>;

    /// All records, newest first.
    async fn find_all(&self) -> Result<Vec<Application>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Application, StoreError>;

    /// Merges `patch` over the stored record and re-validates the result.
    /// The previous resume path is read under the same lock as the write.
    async fn update_by_id(
        &self,
        id: Uuid,
        patch: ApplicationPatch,
    ) -> Result<UpdatedApplication, StoreError>;

    /// Removes the record and returns what was removed.
    async fn delete_by_id(&self, id: Uuid) -> Result<Application, StoreError>;
}
