use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ViewCandidates,
    EditCandidates,
    DeleteCandidates,
    ManageJobs,
    ManageApplications,
    ViewReports,
    RunIngestion,
}

use Permission::*;

const ROLE_PERMISSIONS: &[(&str, &[Permission])] = &[
    (
        "admin",
        &[
            ViewCandidates,
            EditCandidates,
            DeleteCandidates,
            ManageJobs,
            ManageApplications,
            ViewReports,
            RunIngestion,
        ],
    ),
    (
        "manager",
        &[
            ViewCandidates,
            EditCandidates,
            DeleteCandidates,
            ManageJobs,
            ManageApplications,
            ViewReports,
        ],
    ),
    (
        "recruiter",
        &[ViewCandidates, EditCandidates, ManageApplications],
    ),
    ("viewer", &[ViewCandidates]),
];

pub fn role_allows(role: &str, permission: Permission) -> bool {
    ROLE_PERMISSIONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(role))
        .is_some_and(|(_, granted)| granted.contains(&permission))
}

impl Claims {
    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or_default()
    }

    pub fn require(&self, permission: Permission) -> Result<()> {
        if role_allows(self.role(), permission) {
            Ok(())
        } else {
            tracing::warn!(sub = %self.sub, role = self.role(), ?permission, "Permission denied");
            Err(Error::Forbidden("forbidden".to_string()))
        }
    }
}

pub fn decode_token(token: &str, secret: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .ok()
        .map(|data| data.claims)
}

/// Validates the bearer token and stores its `Claims` as a request
/// extension for the handlers to check permissions against.
pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"missing_authorization"})),
        )
            .into_response();
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"bad_authorization"})),
        )
            .into_response();
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"unsupported_scheme"})),
        )
            .into_response();
    };

    match decode_token(token, &state.jwt_secret) {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"invalid_token"})),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn claims(role: Option<&str>) -> Claims {
        Claims {
            sub: "user-1".to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn only_admin_runs_ingestion() {
        assert!(role_allows("admin", RunIngestion));
        assert!(!role_allows("manager", RunIngestion));
        assert!(!role_allows("recruiter", RunIngestion));
        assert!(!role_allows("viewer", RunIngestion));
    }

    #[test]
    fn roles_match_case_insensitively() {
        assert!(role_allows("Manager", ManageJobs));
        assert!(role_allows("RECRUITER", ManageApplications));
    }

    #[test]
    fn viewer_is_read_only() {
        assert!(role_allows("viewer", ViewCandidates));
        assert!(!role_allows("viewer", EditCandidates));
        assert!(!role_allows("viewer", ViewReports));
    }

    #[test]
    fn unknown_or_missing_role_is_denied() {
        assert!(claims(None).require(ViewCandidates).is_err());
        assert!(claims(Some("intern")).require(ViewCandidates).is_err());
        assert!(claims(Some("recruiter")).require(EditCandidates).is_ok());
    }

    #[test]
    fn decodes_tokens_signed_with_the_same_secret() {
        let token = encode(
            &Header::default(),
            &claims(Some("admin")),
            &EncodingKey::from_secret(b"secret-a"),
        )
        .unwrap();
        assert_eq!(decode_token(&token, "secret-a").unwrap().role(), "admin");
        assert!(decode_token(&token, "secret-b").is_none());
    }
}
