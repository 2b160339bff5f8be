use crate::dto::job_dto::{CreateJobPayload, JobListQuery, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::job::Job;
use sqlx::PgPool;
use uuid::Uuid;

const JOB_COLUMNS: &str = r#"
    id, job_code, title, company, location, description, requirements,
    salary_from, salary_to, status, created_at, updated_at
"#;

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
}

impl JobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, payload: CreateJobPayload) -> Result<Job> {
        let status = payload.status.clone().unwrap_or_else(|| "open".to_string());
        let query = format!(
            r#"
            INSERT INTO jobs (
                job_code, title, company, location, description, requirements,
                salary_from, salary_to, status
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            RETURNING {}
            "#,
            JOB_COLUMNS
        );
        let job = sqlx::query_as::<_, Job>(&query)
            .bind(&payload.job_code)
            .bind(&payload.title)
            .bind(&payload.company)
            .bind(&payload.location)
            .bind(&payload.description)
            .bind(&payload.requirements)
            .bind(payload.salary_from)
            .bind(payload.salary_to)
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> Result<Job> {
        let query = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))
    }

    /// Exact match on `job_code`, as used by the email intake.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Job>> {
        let query = format!("SELECT {} FROM jobs WHERE job_code = $1", JOB_COLUMNS);
        let job = sqlx::query_as::<_, Job>(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    pub async fn list(&self, params: &JobListQuery) -> Result<Vec<Job>> {
        let query = format!(
            r#"
            SELECT {} FROM jobs
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR title ILIKE '%' || $2 || '%' OR job_code = $2)
            ORDER BY created_at DESC
            "#,
            JOB_COLUMNS
        );
        let jobs = sqlx::query_as::<_, Job>(&query)
            .bind(&params.status)
            .bind(&params.search)
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    pub async fn update(&self, id: Uuid, payload: &UpdateJobPayload) -> Result<Job> {
        let query = format!(
            r#"
            UPDATE jobs
            SET
                job_code = COALESCE($2, job_code),
                title = COALESCE($3, title),
                company = COALESCE($4, company),
                location = COALESCE($5, location),
                description = COALESCE($6, description),
                requirements = COALESCE($7, requirements),
                salary_from = COALESCE($8, salary_from),
                salary_to = COALESCE($9, salary_to),
                status = COALESCE($10, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            JOB_COLUMNS
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(&payload.job_code)
            .bind(&payload.title)
            .bind(&payload.company)
            .bind(&payload.location)
            .bind(&payload.description)
            .bind(&payload.requirements)
            .bind(payload.salary_from)
            .bind(payload.salary_to)
            .bind(&payload.status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Job not found".to_string()));
        }
        Ok(())
    }
}
