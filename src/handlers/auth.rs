// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{
        AuthResponse, ChangePasswordPayload, ForgotPasswordPayload, LoginUserPayload,
        RegisterUserPayload, ResetPasswordPayload,
    },
};

// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 200, description = "Conta criada", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let token = app_state
        .auth_service
        .register_user(&payload.email, &payload.password, &payload.full_name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(AuthResponse { token }))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login realizado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas"),
        (status = 403, description = "Conta desativada")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let token = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(AuthResponse { token }))
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 204, description = "Sessões encerradas")),
    security(("api_jwt" = []))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .auth_service
        .logout(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/auth/password/forgot
#[utoipa::path(
    post,
    path = "/api/auth/password/forgot",
    tag = "Auth",
    request_body = ForgotPasswordPayload,
    responses((status = 202, description = "Pedido aceito (existindo ou não a conta)"))
)]
pub async fn forgot_password(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ForgotPasswordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .auth_service
        .request_password_reset(&payload.email)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::ACCEPTED)
}

// POST /api/auth/password/reset
#[utoipa::path(
    post,
    path = "/api/auth/password/reset",
    tag = "Auth",
    request_body = ResetPasswordPayload,
    responses(
        (status = 204, description = "Senha redefinida"),
        (status = 400, description = "Token inválido ou expirado")
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .auth_service
        .reset_password(payload.token, &payload.new_password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// PUT /api/auth/password
#[utoipa::path(
    put,
    path = "/api/auth/password",
    tag = "Auth",
    request_body = ChangePasswordPayload,
    responses((status = 200, description = "Senha alterada, novo token", body = AuthResponse)),
    security(("api_jwt" = []))
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let token = app_state
        .auth_service
        .change_password(&user, &payload.new_password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(AuthResponse { token }))
}
