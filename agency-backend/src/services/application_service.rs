use crate::error::{Error, Result};
use crate::models::job_application::JobApplication;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
}

impl ApplicationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        status: &str,
        notes: Option<&str>,
    ) -> Result<JobApplication> {
        let application = sqlx::query_as::<_, JobApplication>(
            r#"
            INSERT INTO job_applications (candidate_id, job_id, status, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, candidate_id, job_id, status, notes, created_at, updated_at
            "#,
        )
        .bind(candidate_id)
        .bind(job_id)
        .bind(status)
        .bind(notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(application)
    }

    pub async fn get(&self, id: Uuid) -> Result<JobApplication> {
        sqlx::query_as::<_, JobApplication>(
            r#"SELECT id, candidate_id, job_id, status, notes, created_at, updated_at FROM job_applications WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))
    }

    pub async fn list_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<JobApplication>> {
        let rows = sqlx::query_as::<_, JobApplication>(
            r#"SELECT id, candidate_id, job_id, status, notes, created_at, updated_at FROM job_applications WHERE candidate_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<JobApplication>> {
        let rows = sqlx::query_as::<_, JobApplication>(
            r#"SELECT id, candidate_id, job_id, status, notes, created_at, updated_at FROM job_applications WHERE job_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn update(
        &self,
        id: Uuid,
        status: Option<&str>,
        notes: Option<&str>,
    ) -> Result<JobApplication> {
        sqlx::query_as::<_, JobApplication>(
            r#"
            UPDATE job_applications
            SET status = COALESCE($2, status), notes = COALESCE($3, notes), updated_at = NOW()
            WHERE id = $1
            RETURNING id, candidate_id, job_id, status, notes, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM job_applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Application not found".to_string()));
        }
        Ok(())
    }
}
