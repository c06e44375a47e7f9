// src/handlers/dashboard.rs

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::dashboard::DashboardStats,
};

// GET /api/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses((status = 200, description = "Indicadores dos últimos 30 dias", body = DashboardStats)),
    security(("api_jwt" = []))
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .dashboard_service
        .get_stats(&user, Utc::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stats))
}
