use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_NEW: &str = "new";
pub const SOURCE_EMAIL: &str = "email";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub profession: Option<String>,
    pub cv_path: Option<String>,
    pub cv_content: Option<String>,
    pub status: String,
    pub recruitment_source: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Insert shape shared by the email intake and the manual create endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCandidate {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub profession: Option<String>,
    pub cv_path: Option<String>,
    pub cv_content: Option<String>,
    pub status: String,
    pub recruitment_source: Option<String>,
    pub notes: Option<String>,
}
