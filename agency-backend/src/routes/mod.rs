pub mod application_routes;
pub mod candidate_routes;
pub mod email_routes;
pub mod health;
pub mod job_routes;
pub mod report_routes;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::middleware::{auth::require_bearer_auth, rate_limit};
use crate::AppState;

/// All application routes. `/uploads` and the outer layers (CORS, tracing,
/// body limit) are added by the binary.
pub fn build_router(state: AppState, api_rps: u32) -> Router {
    let api = Router::new()
        .route(
            "/api/candidates",
            get(candidate_routes::list_candidates).post(candidate_routes::create_candidate),
        )
        .route(
            "/api/candidates/export",
            get(candidate_routes::export_candidates),
        )
        .route(
            "/api/candidates/:id",
            get(candidate_routes::get_candidate)
                .patch(candidate_routes::update_candidate)
                .delete(candidate_routes::delete_candidate),
        )
        .route(
            "/api/candidates/:id/cv",
            patch(candidate_routes::update_candidate_cv),
        )
        .route(
            "/api/candidates/:id/events",
            get(candidate_routes::get_candidate_events),
        )
        .route(
            "/api/candidates/:id/applications",
            get(candidate_routes::get_candidate_applications),
        )
        .route(
            "/api/jobs",
            get(job_routes::list_jobs).post(job_routes::create_job),
        )
        .route(
            "/api/jobs/:id",
            get(job_routes::get_job)
                .patch(job_routes::update_job)
                .delete(job_routes::delete_job),
        )
        .route(
            "/api/jobs/:id/applications",
            get(job_routes::list_job_applications),
        )
        .route(
            "/api/job-applications",
            post(application_routes::create_application),
        )
        .route(
            "/api/job-applications/:id",
            patch(application_routes::update_application)
                .delete(application_routes::delete_application),
        )
        .route("/api/reports/summary", get(report_routes::get_summary))
        .route("/api/email/check", post(email_routes::check_email))
        .route("/api/email/status", get(email_routes::email_status))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::RateLimiter::new(api_rps),
            rate_limit::rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .with_state(state)
}
