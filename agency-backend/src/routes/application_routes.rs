use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::application_dto::{CreateApplicationPayload, UpdateApplicationPayload};
use crate::error::Result;
use crate::middleware::auth::{Claims, Permission};
use crate::models::candidate_event::{
    NewCandidateEvent, EVENT_APPLICATION_CREATED, EVENT_STATUS_CHANGED,
};
use crate::models::job_application::STATUS_SUBMITTED;
use crate::routes::candidate_routes::record_event;
use crate::AppState;

pub async fn create_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateApplicationPayload>,
) -> Result<impl IntoResponse> {
    claims.require(Permission::ManageApplications)?;
    payload.validate()?;

    state.candidate_service.get(payload.candidate_id).await?;
    let job = state.job_service.get(payload.job_id).await?;

    let application = state
        .application_service
        .create(
            payload.candidate_id,
            payload.job_id,
            payload.status.as_deref().unwrap_or(STATUS_SUBMITTED),
            payload.notes.as_deref(),
        )
        .await?;

    record_event(
        &state,
        NewCandidateEvent {
            candidate_id: application.candidate_id,
            event_type: EVENT_APPLICATION_CREATED.to_string(),
            description: format!("Applied to {}", job.title),
            metadata: Some(json!({
                "application_id": application.id,
                "job_id": job.id,
                "job_code": job.job_code,
                "created_by": claims.sub,
            })),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn update_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApplicationPayload>,
) -> Result<impl IntoResponse> {
    claims.require(Permission::ManageApplications)?;
    payload.validate()?;

    let before = state.application_service.get(id).await?;
    let application = state
        .application_service
        .update(id, payload.status.as_deref(), payload.notes.as_deref())
        .await?;

    if before.status != application.status {
        record_event(
            &state,
            NewCandidateEvent {
                candidate_id: application.candidate_id,
                event_type: EVENT_STATUS_CHANGED.to_string(),
                description: format!(
                    "Application status changed from {} to {}",
                    before.status, application.status
                ),
                metadata: Some(json!({
                    "application_id": application.id,
                    "job_id": application.job_id,
                    "from": before.status,
                    "to": application.status,
                    "changed_by": claims.sub,
                })),
            },
        )
        .await;
    }

    Ok(Json(application))
}

pub async fn delete_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    claims.require(Permission::ManageApplications)?;
    state.application_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
