use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationPatch, NewApplication};
use crate::store::{ApplicationStore, StoreError, UpdatedApplication};
use crate::validation::validate_application;

/// Postgres-backed store over the `applications` table.
#[derive(Clone)]
pub struct PgApplicationStore {
    pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn create(&self, new: NewApplication) -> Result<Application, StoreError> {
        let new = validate_application(new)?;

        let application: Application = sqlx::query_as(
            r#"
            INSERT INTO applications (name, email, resume_path, resume_file_name)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.resume_path)
        .bind(&new.resume_file_name)
        .fetch_one(&self.pool)
        .await?;

        info!("Created application {}", application.id);
        Ok(application)
    }

    async fn find_all(&self) -> Result<Vec<Application>, StoreError> {
        let applications =
            sqlx::query_as("SELECT * FROM applications ORDER BY created_at DESC, seq DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(applications)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Application, StoreError> {
        let application: Option<Application> =
            sqlx::query_as("SELECT * FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        application.ok_or(StoreError::NotFound(id))
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        patch: ApplicationPatch,
    ) -> Result<UpdatedApplication, StoreError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<Application> =
            sqlx::query_as("SELECT * FROM applications WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let current = current.ok_or(StoreError::NotFound(id))?;

        let merged = validate_application(patch.merge_onto(&current))?;

        let updated: Application = sqlx::query_as(
            r#"
            UPDATE applications
            SET name = $1, email = $2, resume_path = $3, resume_file_name = $4,
                updated_at = now()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&merged.name)
        .bind(&merged.email)
        .bind(&merged.resume_path)
        .bind(&merged.resume_file_name)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Updated application {id}");
        Ok(UpdatedApplication::new(current.resume_path, updated))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Application, StoreError> {
        let deleted: Option<Application> =
            sqlx::query_as("DELETE FROM applications WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let deleted = deleted.ok_or(StoreError::NotFound(id))?;

        info!("Deleted application {id}");
        Ok(deleted)
    }
}
