use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored job application. The resume file at `resume_path` is owned by
/// this record and removed together with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub resume_path: String,
    pub resume_file_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field values for a record that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub name: String,
    pub email: String,
    pub resume_path: String,
    pub resume_file_name: String,
}

/// Location of a resume file inside the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeRef {
    pub path: String,
    pub file_name: String,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub resume: Option<ResumeRef>,
}

impl ApplicationPatch {
    /// Merges the patch over an existing record, producing the candidate
    /// values that must pass validation before they are persisted.
    pub fn merge_onto(&self, current: &Application) -> NewApplication {
        let (resume_path, resume_file_name) = match &self.resume {
            Some(resume) => (resume.path.clone(), resume.file_name.clone()),
            None => (
                current.resume_path.clone(),
                current.resume_file_name.clone(),
            ),
        };

        NewApplication {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            email: self.email.clone().unwrap_or_else(|| current.email.clone()),
            resume_path,
            resume_file_name,
        }
    }
}
