use crate::error::Result;
use crate::models::candidate_event::{CandidateEvent, NewCandidateEvent};
use sqlx::PgPool;
use uuid::Uuid;

/// Writes and reads the per-candidate audit trail. Entries are never
/// updated or removed except by cascading candidate deletion.
#[derive(Clone)]
pub struct CandidateEventService {
    pool: PgPool,
}

impl CandidateEventService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, event: NewCandidateEvent) -> Result<CandidateEvent> {
        let row = sqlx::query_as::<_, CandidateEvent>(
            r#"
            INSERT INTO candidate_events (candidate_id, event_type, description, metadata)
            VALUES ($1, $2, $3, $4)
            RETURNING id, candidate_id, event_type, description, metadata, created_at
            "#,
        )
        .bind(event.candidate_id)
        .bind(&event.event_type)
        .bind(&event.description)
        .bind(&event.metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<CandidateEvent>> {
        let rows = sqlx::query_as::<_, CandidateEvent>(
            r#"
            SELECT id, candidate_id, event_type, description, metadata, created_at
            FROM candidate_events
            WHERE candidate_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
