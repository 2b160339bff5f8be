use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::job_dto::{CreateJobPayload, JobListQuery, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::middleware::auth::{Claims, Permission};
use crate::models::job::Job;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 201, description = "Job created successfully", body = Json<Job>),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Job code already in use")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    claims.require(Permission::ManageJobs)?;
    payload.validate()?;
    check_salary_range(payload.salary_from, payload.salary_to)?;
    let job = state.job_service.create(payload).await?;
    tracing::info!(job_id = %job.id, job_code = ?job.job_code, "Job created");
    Ok((StatusCode::CREATED, Json(job)))
}

#[utoipa::path(
    patch,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    request_body = UpdateJobPayload,
    responses(
        (status = 200, description = "Job updated successfully", body = Json<Job>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<Json<Job>> {
    claims.require(Permission::ManageJobs)?;
    payload.validate()?;
    check_salary_range(payload.salary_from, payload.salary_to)?;
    let job = state.job_service.update(id, &payload).await?;
    Ok(Json(job))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 204, description = "Job deleted successfully"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    claims.require(Permission::ManageJobs)?;
    state.job_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/jobs",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("search" = Option<String>, Query, description = "Title substring or exact job code")
    ),
    responses(
        (status = 200, description = "List of jobs", body = [Job])
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<JobListQuery>,
) -> Result<Json<Vec<Job>>> {
    claims.require(Permission::ViewCandidates)?;
    let jobs = state.job_service.list(&params).await?;
    Ok(Json(jobs))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job details", body = Json<Job>),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>> {
    claims.require(Permission::ViewCandidates)?;
    let job = state.job_service.get(id).await?;
    Ok(Json(job))
}

pub async fn list_job_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require(Permission::ViewCandidates)?;
    state.job_service.get(id).await?;
    let applications = state.application_service.list_for_job(id).await?;
    Ok(Json(applications))
}

fn check_salary_range(
    from: Option<rust_decimal::Decimal>,
    to: Option<rust_decimal::Decimal>,
) -> Result<()> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(Error::BadRequest(
            "salary_from must not exceed salary_to".to_string(),
        )),
        _ => Ok(()),
    }
}
