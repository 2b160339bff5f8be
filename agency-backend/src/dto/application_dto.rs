use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::job_application::APPLICATION_STATUSES;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateApplicationPayload {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    #[validate(custom(function = "validate_application_status"))]
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateApplicationPayload {
    #[validate(custom(function = "validate_application_status"))]
    pub status: Option<String>,
    pub notes: Option<String>,
}

fn validate_application_status(status: &str) -> Result<(), ValidationError> {
    if APPLICATION_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_application_status"))
    }
}
