// src/handlers/users.rs

use axum::{
    extract::{Multipart, Path, Query, State},
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
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOnly, Privileged, RequireRole},
    },
    models::{
        auth::Profile,
        profile::{
            AvatarResponse, CreateUserPayload, InteractionsQuery, InteractionsResponse,
            SetRolePayload, UpdateProfilePayload, UserListQuery,
        },
    },
};

// =============================================================================
//  PERFIL PRÓPRIO
// =============================================================================

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses((status = 200, description = "Perfil do usuário logado", body = Profile)),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<Profile> {
    Json(user)
}

// PUT /api/users/me
#[utoipa::path(
    put,
    path = "/api/users/me",
    tag = "Users",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Perfil atualizado", body = Profile),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_me(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let profile = app_state
        .user_service
        .update_me(&user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(profile))
}

// POST /api/users/me/avatar (multipart, campo "file")
#[utoipa::path(
    post,
    path = "/api/users/me/avatar",
    tag = "Users",
    responses(
        (status = 200, description = "Avatar salvo", body = AvatarResponse),
        (status = 400, description = "Arquivo inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_avatar(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| to_api(AppError::InvalidUpload(e.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| to_api(AppError::InvalidUpload(e.body_text())))?;

        let avatar_url = app_state
            .user_service
            .upload_avatar(&user, &original_name, &bytes)
            .await
            .map_err(to_api)?;

        return Ok(Json(AvatarResponse { avatar_url }));
    }

    Err(to_api(AppError::InvalidUpload("campo 'file' ausente".into())))
}

// GET /api/users/me/interactions?month=AAAA-MM
#[utoipa::path(
    get,
    path = "/api/users/me/interactions",
    tag = "Users",
    params(InteractionsQuery),
    responses(
        (status = 200, description = "Visitas do usuário no mês", body = InteractionsResponse),
        (status = 400, description = "Mês inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn my_interactions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<InteractionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let month = query
        .month
        .unwrap_or_else(|| Utc::now().format("%Y-%m").to_string());

    let count = app_state
        .visit_service
        .monthly_interactions(&user, &month)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(InteractionsResponse { month, count }))
}

// =============================================================================
//  ADMINISTRAÇÃO
// =============================================================================

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Usuários", body = Vec<Profile>),
        (status = 403, description = "Apenas gestores e administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Privileged>,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .user_service
        .list_users(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = Profile),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let profile = app_state
        .user_service
        .create_user(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(profile)))
}

// PATCH /api/users/{id}/active
#[utoipa::path(
    patch,
    path = "/api/users/{id}/active",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Status alternado", body = Profile),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_active(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = app_state
        .user_service
        .toggle_active(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(profile))
}

// PATCH /api/users/{id}/role
#[utoipa::path(
    patch,
    path = "/api/users/{id}/role",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = SetRolePayload,
    responses(
        (status = 200, description = "Cargo alterado", body = Profile),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = app_state
        .user_service
        .set_role(id, payload.role)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(profile))
}

// DELETE /api/users/{id}
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 204, description = "Usuário excluído"),
        (status = 400, description = "Não é possível excluir a si mesmo"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .user_service
        .delete_user(&admin, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
