use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::candidate::{Candidate, NewCandidate, STATUS_NEW};
use crate::services::candidate_service::CandidateList;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCandidatePayload {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub profession: Option<String>,
    pub status: Option<String>,
    pub recruitment_source: Option<String>,
    pub notes: Option<String>,
}

impl From<CreateCandidatePayload> for NewCandidate {
    fn from(p: CreateCandidatePayload) -> Self {
        Self {
            first_name: p.first_name.trim().to_string(),
            last_name: p.last_name.trim().to_string(),
            email: p
                .email
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty()),
            mobile: p.mobile,
            phone: p.phone,
            city: p.city,
            profession: p.profession,
            cv_path: None,
            cv_content: None,
            status: p.status.unwrap_or_else(|| STATUS_NEW.to_string()),
            recruitment_source: p.recruitment_source.or_else(|| Some("manual".to_string())),
            notes: p.notes,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCandidatePayload {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub profession: Option<String>,
    #[validate(length(min = 1))]
    pub status: Option<String>,
    pub recruitment_source: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateListQuery {
    pub status: Option<String>,
    pub source: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CandidateListResponse {
    pub items: Vec<Candidate>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl From<CandidateList> for CandidateListResponse {
    fn from(list: CandidateList) -> Self {
        let total_pages = if list.total == 0 {
            0
        } else {
            (list.total + list.per_page - 1) / list.per_page
        };
        Self {
            items: list.items,
            total: list.total,
            page: list.page,
            per_page: list.per_page,
            total_pages,
        }
    }
}
