use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

pub const EVENT_CANDIDATE_CREATED: &str = "candidate_created";
pub const EVENT_CV_UPDATED: &str = "cv_updated";
pub const EVENT_STATUS_CHANGED: &str = "status_changed";
pub const EVENT_APPLICATION_CREATED: &str = "application_created";

/// Append-only audit entry attached to a candidate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateEvent {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub event_type: String,
    pub description: String,
    pub metadata: Option<JsonValue>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCandidateEvent {
    pub candidate_id: Uuid,
    pub event_type: String,
    pub description: String,
    pub metadata: Option<JsonValue>,
}
