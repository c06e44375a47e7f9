// src/handlers/visits.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        client::Client,
        visit::{
            CreateVisitPayload, HomeSummary, UpdateVisitPayload, Visit, VisitListQuery,
            VisitListResponse,
        },
    },
};

// POST /api/visits
#[utoipa::path(
    post,
    path = "/api/visits",
    tag = "Visits",
    request_body = CreateVisitPayload,
    responses(
        (status = 201, description = "Visita registrada", body = Visit),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_visit(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateVisitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let visit = app_state
        .visit_service
        .create_visit(&user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(visit)))
}

// GET /api/visits
#[utoipa::path(
    get,
    path = "/api/visits",
    tag = "Visits",
    params(VisitListQuery),
    responses((status = 200, description = "Visitas visíveis ao usuário", body = VisitListResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_visits(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<VisitListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .visit_service
        .list_visits(&user, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(response))
}

// GET /api/visits/home
#[utoipa::path(
    get,
    path = "/api/visits/home",
    tag = "Visits",
    responses((status = 200, description = "Resumo da tela inicial", body = HomeSummary)),
    security(("api_jwt" = []))
)]
pub async fn home_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .visit_service
        .home_summary(&user, Utc::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}

// GET /api/visits/{id}
#[utoipa::path(
    get,
    path = "/api/visits/{id}",
    tag = "Visits",
    params(("id" = Uuid, Path, description = "ID da visita")),
    responses(
        (status = 200, description = "Visita", body = Visit),
        (status = 404, description = "Visita não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_visit(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let visit = app_state
        .visit_service
        .get_visit(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(visit))
}

// PUT /api/visits/{id}
#[utoipa::path(
    put,
    path = "/api/visits/{id}",
    tag = "Visits",
    params(("id" = Uuid, Path, description = "ID da visita")),
    request_body = UpdateVisitPayload,
    responses(
        (status = 200, description = "Visita atualizada", body = Visit),
        (status = 403, description = "Sem permissão"),
        (status = 404, description = "Visita não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_visit(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVisitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let visit = app_state
        .visit_service
        .update_visit(&user, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(visit))
}

// DELETE /api/visits/{id}
#[utoipa::path(
    delete,
    path = "/api/visits/{id}",
    tag = "Visits",
    params(("id" = Uuid, Path, description = "ID da visita")),
    responses(
        (status = 204, description = "Visita excluída"),
        (status = 403, description = "Sem permissão"),
        (status = 404, description = "Visita não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_visit(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .visit_service
        .delete_visit(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Visits",
    responses((status = 200, description = "Clientes cadastrados", body = Vec<Client>)),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let clients = app_state
        .visit_service
        .list_clients()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(clients))
}
