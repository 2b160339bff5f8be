use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const JOB_STATUSES: &[&str] = &["open", "on_hold", "closed"];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobPayload {
    #[validate(custom(function = "validate_job_code"))]
    pub job_code: Option<String>,
    #[validate(length(min = 1))]
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub salary_from: Option<Decimal>,
    pub salary_to: Option<Decimal>,
    #[validate(custom(function = "validate_job_status"))]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateJobPayload {
    #[validate(custom(function = "validate_job_code"))]
    pub job_code: Option<String>,
    #[validate(length(min = 1))]
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub salary_from: Option<Decimal>,
    pub salary_to: Option<Decimal>,
    #[validate(custom(function = "validate_job_status"))]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Job codes are what applicants quote in email subjects, so they must be
/// a plain digit run the intake can find.
pub fn validate_job_code(code: &str) -> Result<(), ValidationError> {
    if code.len() >= 4 && code.len() <= 10 && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("job_code_must_be_4_to_10_digits"))
    }
}

fn validate_job_status(status: &str) -> Result<(), ValidationError> {
    if JOB_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_job_status"))
    }
}
