// src/handlers/legacy.rs
//
// Rotas do formato antigo (sem login), servidas sobre as mesmas tabelas.

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::legacy::{LegacyCreateVisit, LegacyCreated, LegacyStats, LegacyUser, LegacyVisit},
};

// GET /api/legacy/stats
#[utoipa::path(
    get,
    path = "/api/legacy/stats",
    tag = "Legacy",
    responses((status = 200, description = "Indicadores no formato antigo", body = LegacyStats))
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .dashboard_service
        .get_legacy_stats(Utc::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stats))
}

// GET /api/legacy/visits
#[utoipa::path(
    get,
    path = "/api/legacy/visits",
    tag = "Legacy",
    responses((status = 200, description = "Todas as visitas", body = Vec<LegacyVisit>))
)]
pub async fn list_visits(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let visits = app_state
        .visit_service
        .list_all()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(visits.iter().map(LegacyVisit::from).collect::<Vec<_>>()))
}

// POST /api/legacy/visits
#[utoipa::path(
    post,
    path = "/api/legacy/visits",
    tag = "Legacy",
    request_body = LegacyCreateVisit,
    responses(
        (status = 200, description = "Visita registrada", body = LegacyCreated),
        (status = 400, description = "Dados inválidos")
    )
)]
pub async fn create_visit(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LegacyCreateVisit>,
) -> Result<impl IntoResponse, ApiError> {
    let id = app_state
        .visit_service
        .create_legacy_visit(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(LegacyCreated { id }))
}

// GET /api/legacy/users
#[utoipa::path(
    get,
    path = "/api/legacy/users",
    tag = "Legacy",
    responses((status = 200, description = "Todos os usuários", body = Vec<LegacyUser>))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .user_service
        .list_all()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users.iter().map(LegacyUser::from).collect::<Vec<_>>()))
}
