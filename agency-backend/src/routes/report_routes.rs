use axum::{extract::State, Extension, Json};

use crate::error::Result;
use crate::middleware::auth::{Claims, Permission};
use crate::services::report_service::SummaryReport;
use crate::AppState;

pub async fn get_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SummaryReport>> {
    claims.require(Permission::ViewReports)?;
    let summary = state.report_service.summary().await?;
    Ok(Json(summary))
}
