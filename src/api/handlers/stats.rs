//! # Stats handler

use axum::{extract::State, Json};

use crate::{
    api::extractors::AdminUser,
    error::Result,
    models::{ApiResponse, DashboardStats},
    services::AppState,
};

/// GET /api/admin/stats
pub async fn get_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<DashboardStats>>> {
    let stats = state.stats_service.dashboard().await?;
    Ok(Json(ApiResponse::success(stats)))
}
