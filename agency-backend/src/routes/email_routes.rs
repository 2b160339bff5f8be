use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde_json::json;

use crate::error::{Error, Result};
use crate::middleware::auth::{Claims, Permission};
use crate::AppState;

/// Runs one intake cycle immediately. Waits behind a cycle that is
/// already in progress.
pub async fn check_email(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    claims.require(Permission::RunIngestion)?;
    let intake = state
        .intake
        .as_ref()
        .ok_or_else(|| Error::BadRequest("Email ingestion is not configured".to_string()))?;

    tracing::info!(by = %claims.sub, "Manual email check requested");
    let report = intake.run_cycle().await;
    Ok(Json(report))
}

pub async fn email_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    claims.require(Permission::RunIngestion)?;
    let body = match &state.intake {
        Some(intake) => {
            let settings = intake.mailbox().settings();
            json!({
                "configured": true,
                "host": settings.host,
                "mailbox": settings.mailbox,
                "user": settings.user,
                "last_cycle": intake.last_report().await,
            })
        }
        None => json!({ "configured": false, "last_cycle": null }),
    };
    Ok(Json(body))
}
