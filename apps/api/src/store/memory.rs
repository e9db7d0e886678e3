use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationPatch, NewApplication};
use crate::store::{ApplicationStore, StoreError, UpdatedApplication};
use crate::validation::validate_application;

/// In-process store used by handler tests. Records are kept in insertion order.
#[derive(Default)]
pub struct MemoryApplicationStore {
    records: RwLock<Vec<Application>>,
}

impl MemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn create(&self, new: NewApplication) -> Result<Application, StoreError> {
        let new = validate_application(new)?;
        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            resume_path: new.resume_path,
            resume_file_name: new.resume_file_name,
            created_at: now,
            updated_at: now,
        };
        self.records.write().await.push(application.clone());
        Ok(application)
    }

    async fn find_all(&self) -> Result<Vec<Application>, StoreError> {
        let mut all: Vec<Application> = self.records.read().await.iter().rev().cloned().collect();
        // stable: equal timestamps keep reverse insertion order
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Application, StoreError> {
        self.records
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        patch: ApplicationPatch,
    ) -> Result<UpdatedApplication, StoreError> {
        let mut records = self.records.write().await;
        let current = records
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let merged = validate_application(patch.merge_onto(current))?;
        let previous_resume_path = current.resume_path.clone();
        current.name = merged.name;
        current.email = merged.email;
        current.resume_path = merged.resume_path;
        current.resume_file_name = merged.resume_file_name;
        current.updated_at = Utc::now();
        Ok(UpdatedApplication::new(previous_resume_path, current.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Application, StoreError> {
        let mut records = self.records.write().await;
        let index = records
            .iter()
            .position(|a| a.id == id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(records.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ResumeRef;

    fn new_application(name: &str, email: &str) -> NewApplication {
        NewApplication {
            name: name.to_string(),
            email: email.to_string(),
            resume_path: format!("uploads/{name}.pdf"),
            resume_file_name: format!("{name}.pdf"),
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_and_assigns_id() {
        let store = MemoryApplicationStore::new();
        let created = store
            .create(new_application(" Ada Lovelace ", "ADA@EX.com"))
            .await
            .unwrap();
        assert_eq!(created.name, "Ada Lovelace");
        assert_eq!(created.email, "ada@ex.com");
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(store.find_by_id(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_record() {
        let store = MemoryApplicationStore::new();
        let err = store
            .create(new_application("A", "not-an-email"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_find_all_is_newest_first() {
        let store = MemoryApplicationStore::new();
        let a = store.create(new_application("Alpha", "a@ex.com")).await.unwrap();
        let b = store.create(new_application("Bravo", "b@ex.com")).await.unwrap();

        let ids: Vec<Uuid> = store.find_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_update_revalidates_merged_record() {
        let store = MemoryApplicationStore::new();
        let created = store.create(new_application("Alpha", "a@ex.com")).await.unwrap();

        let err = store
            .update_by_id(
                created.id,
                ApplicationPatch {
                    email: Some("broken".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.find_by_id(created.id).await.unwrap().email, "a@ex.com");
    }

    #[tokio::test]
    async fn test_update_reports_replaced_resume_only_when_it_changes() {
        let store = MemoryApplicationStore::new();
        let created = store.create(new_application("Alpha", "a@ex.com")).await.unwrap();

        let renamed = store
            .update_by_id(
                created.id,
                ApplicationPatch {
                    name: Some("Alpha Prime".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.application.name, "Alpha Prime");
        assert!(renamed.replaced_resume_path.is_none());

        let replaced = store
            .update_by_id(
                created.id,
                ApplicationPatch {
                    resume: Some(ResumeRef {
                        path: "uploads/new.pdf".to_string(),
                        file_name: "new.pdf".to_string(),
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(replaced.application.resume_path, "uploads/new.pdf");
        assert_eq!(
            replaced.replaced_resume_path.as_deref(),
            Some(created.resume_path.as_str())
        );
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let store = MemoryApplicationStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.find_by_id(id).await,
            Err(StoreError::NotFound(missing)) if missing == id
        ));
        assert!(matches!(
            store.update_by_id(id, ApplicationPatch::default()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_by_id(id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_returns_removed_record() {
        let store = MemoryApplicationStore::new();
        let created = store.create(new_application("Alpha", "a@ex.com")).await.unwrap();
        let deleted = store.delete_by_id(created.id).await.unwrap();
        assert_eq!(deleted.id, created.id);
        assert_eq!(store.len().await, 0);
    }
}
