use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::candidate_dto::{
    CandidateListQuery, CandidateListResponse, CreateCandidatePayload, UpdateCandidatePayload,
};
use crate::error::{Error, Result};
use crate::middleware::auth::{Claims, Permission};
use crate::models::candidate::NewCandidate;
use crate::models::candidate_event::{
    NewCandidateEvent, EVENT_CANDIDATE_CREATED, EVENT_CV_UPDATED, EVENT_STATUS_CHANGED,
};
use crate::services::export_service::ExportService;
use crate::services::intake_service::save_cv_file;
use crate::utils::attachments::is_cv_attachment;
use crate::AppState;

pub async fn list_candidates(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<CandidateListQuery>,
) -> Result<Json<CandidateListResponse>> {
    claims.require(Permission::ViewCandidates)?;
    let list = state.candidate_service.list(&params).await?;
    Ok(Json(list.into()))
}

pub async fn create_candidate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCandidatePayload>,
) -> Result<impl IntoResponse> {
    claims.require(Permission::EditCandidates)?;
    payload.validate()?;

    let candidate = state
        .candidate_service
        .create_checked(NewCandidate::from(payload))
        .await?;

    record_event(
        &state,
        NewCandidateEvent {
            candidate_id: candidate.id,
            event_type: EVENT_CANDIDATE_CREATED.to_string(),
            description: format!("Candidate created manually by {}", claims.sub),
            metadata: Some(json!({ "created_by": claims.sub })),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(candidate)))
}

pub async fn get_candidate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require(Permission::ViewCandidates)?;
    let candidate = state.candidate_service.get(id).await?;
    Ok(Json(candidate))
}

pub async fn update_candidate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateCandidatePayload>,
) -> Result<impl IntoResponse> {
    claims.require(Permission::EditCandidates)?;
    payload.validate()?;
    payload.email = payload.email.map(|e| e.trim().to_lowercase());

    let before = state.candidate_service.get(id).await?;
    let candidate = state.candidate_service.update(id, &payload).await?;

    if before.status != candidate.status {
        record_event(
            &state,
            NewCandidateEvent {
                candidate_id: id,
                event_type: EVENT_STATUS_CHANGED.to_string(),
                description: format!(
                    "Status changed from {} to {}",
                    before.status, candidate.status
                ),
                metadata: Some(json!({
                    "from": before.status,
                    "to": candidate.status,
                    "changed_by": claims.sub,
                })),
            },
        )
        .await;
    }

    Ok(Json(candidate))
}

pub async fn delete_candidate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require(Permission::DeleteCandidates)?;
    state.candidate_service.delete(id).await?;
    tracing::info!(candidate_id = %id, by = %claims.sub, "Candidate deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Replaces the stored CV with the uploaded `cv` field and re-runs text
/// extraction over it.
pub async fn update_candidate_cv(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    claims.require(Permission::EditCandidates)?;
    state.candidate_service.get(id).await?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("cv") {
            continue;
        }
        let filename = field.file_name().unwrap_or("cv.bin").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        if !data.is_empty() {
            upload = Some((filename, content_type, data));
            break;
        }
    }

    let Some((filename, content_type, data)) = upload else {
        return Err(Error::BadRequest("No valid CV file provided".into()));
    };
    if !is_cv_attachment(&filename, &content_type) {
        return Err(Error::BadRequest(format!(
            "File {} is not a supported CV format",
            filename
        )));
    }

    let (disk_path, cv_path) = save_cv_file(&state.uploads_dir, &filename, &data).await?;
    let text = state.extractor.extract_text_from_file(&disk_path).await;
    let candidate = state
        .candidate_service
        .update_cv(id, &cv_path, (!text.is_empty()).then_some(text.as_str()))
        .await?;

    record_event(
        &state,
        NewCandidateEvent {
            candidate_id: id,
            event_type: EVENT_CV_UPDATED.to_string(),
            description: format!("CV replaced with {}", filename),
            metadata: Some(json!({
                "file": filename,
                "cv_path": cv_path,
                "size": data.len(),
                "text_len": text.len(),
                "uploaded_by": claims.sub,
            })),
        },
    )
    .await;

    Ok(Json(candidate))
}

pub async fn get_candidate_events(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require(Permission::ViewCandidates)?;
    state.candidate_service.get(id).await?;
    let events = state.event_service.list_for_candidate(id).await?;
    Ok(Json(events))
}

pub async fn get_candidate_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require(Permission::ViewCandidates)?;
    state.candidate_service.get(id).await?;
    let applications = state.application_service.list_for_candidate(id).await?;
    Ok(Json(applications))
}

pub async fn export_candidates(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    claims.require(Permission::ViewReports)?;
    let candidates = state.candidate_service.list_all().await?;
    let bytes = ExportService::generate_candidates_xlsx(&candidates)?;
    let filename = format!(
        "candidates_{}.xlsx",
        chrono::Utc::now().format("%Y%m%d_%H%M")
    );

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}

/// Event writes never fail the request that triggered them.
pub(crate) async fn record_event(state: &AppState, event: NewCandidateEvent) {
    let candidate_id = event.candidate_id;
    let event_type = event.event_type.clone();
    if let Err(e) = state.event_service.record(event).await {
        tracing::error!(%candidate_id, %event_type, error = %e, "Failed to record candidate event");
    }
}
