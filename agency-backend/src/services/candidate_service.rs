use crate::dto::candidate_dto::{CandidateListQuery, UpdateCandidatePayload};
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, NewCandidate};
use sqlx::PgPool;
use uuid::Uuid;

const MAX_PAGE: i64 = 1_000_000;

const CANDIDATE_COLUMNS: &str = r#"
    id, first_name, last_name, email, mobile, phone, city, profession, cv_path, cv_content,
    status, recruitment_source, notes, created_at, updated_at
"#;

#[derive(Clone)]
pub struct CandidateService {
    pool: PgPool,
}

pub struct CandidateList {
    pub items: Vec<Candidate>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl CandidateService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Plain insert with no duplicate checks. The email intake relies on
    /// this; see `create_checked` for the operator-facing path.
    pub async fn create(&self, candidate: NewCandidate) -> Result<Candidate> {
        let query = format!(
            r#"
            INSERT INTO candidates (
                first_name, last_name, email, mobile, phone, city, profession,
                cv_path, cv_content, status, recruitment_source, notes
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            RETURNING {}
            "#,
            CANDIDATE_COLUMNS
        );
        let created = sqlx::query_as::<_, Candidate>(&query)
            .bind(&candidate.first_name)
            .bind(&candidate.last_name)
            .bind(&candidate.email)
            .bind(&candidate.mobile)
            .bind(&candidate.phone)
            .bind(&candidate.city)
            .bind(&candidate.profession)
            .bind(&candidate.cv_path)
            .bind(&candidate.cv_content)
            .bind(&candidate.status)
            .bind(&candidate.recruitment_source)
            .bind(&candidate.notes)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    /// Insert that rejects a non-empty email already on file.
    pub async fn create_checked(&self, candidate: NewCandidate) -> Result<Candidate> {
        if let Some(email) = candidate.email.as_deref().filter(|e| !e.trim().is_empty()) {
            if self.email_taken(email, None).await? {
                return Err(Error::Conflict(
                    "A candidate with this email address already exists.".to_string(),
                ));
            }
        }
        self.create(candidate).await
    }

    pub async fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM candidates
            WHERE lower(email) = lower($1) AND ($2::uuid IS NULL OR id <> $2)
            LIMIT 1
            "#,
        )
        .bind(email.trim())
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    pub async fn get(&self, id: Uuid) -> Result<Candidate> {
        let query = format!("SELECT {} FROM candidates WHERE id = $1", CANDIDATE_COLUMNS);
        sqlx::query_as::<_, Candidate>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))
    }

    pub async fn list(&self, params: &CandidateListQuery) -> Result<CandidateList> {
        let (page, per_page, offset) = page_window(params.page, params.per_page);
        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let filter = r#"
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR recruitment_source = $2)
              AND ($3::text IS NULL OR to_tsvector('simple',
                    coalesce(first_name, '') || ' ' || coalesce(last_name, '') || ' ' ||
                    coalesce(email, '') || ' ' || coalesce(profession, '') || ' ' ||
                    coalesce(cv_content, '')) @@ plainto_tsquery('simple', $3))
        "#;

        let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM candidates {}", filter))
            .bind(&params.status)
            .bind(&params.source)
            .bind(search)
            .fetch_one(&self.pool)
            .await?;

        let query = format!(
            "SELECT {} FROM candidates {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
            CANDIDATE_COLUMNS, filter
        );
        let items = sqlx::query_as::<_, Candidate>(&query)
            .bind(&params.status)
            .bind(&params.source)
            .bind(search)
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(CandidateList {
            items,
            total: total.0,
            page,
            per_page,
        })
    }

    pub async fn list_all(&self) -> Result<Vec<Candidate>> {
        let query = format!(
            "SELECT {} FROM candidates ORDER BY created_at DESC",
            CANDIDATE_COLUMNS
        );
        let candidates = sqlx::query_as::<_, Candidate>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(candidates)
    }

    pub async fn update(&self, id: Uuid, payload: &UpdateCandidatePayload) -> Result<Candidate> {
        if let Some(email) = payload.email.as_deref().filter(|e| !e.trim().is_empty()) {
            if self.email_taken(email, Some(id)).await? {
                return Err(Error::Conflict(
                    "A candidate with this email address already exists.".to_string(),
                ));
            }
        }

        let query = format!(
            r#"
            UPDATE candidates
            SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                mobile = COALESCE($5, mobile),
                phone = COALESCE($6, phone),
                city = COALESCE($7, city),
                profession = COALESCE($8, profession),
                status = COALESCE($9, status),
                recruitment_source = COALESCE($10, recruitment_source),
                notes = COALESCE($11, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CANDIDATE_COLUMNS
        );
        sqlx::query_as::<_, Candidate>(&query)
            .bind(id)
            .bind(&payload.first_name)
            .bind(&payload.last_name)
            .bind(&payload.email)
            .bind(&payload.mobile)
            .bind(&payload.phone)
            .bind(&payload.city)
            .bind(&payload.profession)
            .bind(&payload.status)
            .bind(&payload.recruitment_source)
            .bind(&payload.notes)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))
    }

    pub async fn update_cv(
        &self,
        id: Uuid,
        cv_path: &str,
        cv_content: Option<&str>,
    ) -> Result<Candidate> {
        let query = format!(
            r#"
            UPDATE candidates
            SET cv_path = $1, cv_content = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            CANDIDATE_COLUMNS
        );
        sqlx::query_as::<_, Candidate>(&query)
            .bind(cv_path)
            .bind(cv_content)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Candidate not found".to_string()));
        }
        Ok(())
    }
}

/// Normalised `(page, per_page, offset)`: page in `1..=MAX_PAGE`, per_page in
/// `1..=200` (default 25).
fn page_window(page: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let per_page = per_page.unwrap_or(25).clamp(1, 200);
    (page, per_page, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_25() {
        assert_eq!(page_window(None, None), (1, 25, 0));
        assert_eq!(page_window(Some(3), Some(10)), (3, 10, 20));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(page_window(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(page_window(Some(-5), Some(10_000)), (1, 200, 0));
    }

    #[test]
    fn huge_page_does_not_overflow_offset() {
        let (page, per_page, offset) = page_window(Some(i64::MAX), Some(i64::MAX));
        assert_eq!(page, MAX_PAGE);
        assert_eq!(per_page, 200);
        assert_eq!(offset, (MAX_PAGE - 1) * 200);
    }
}
