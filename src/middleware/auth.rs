// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::Profile,
};

// O middleware em si: valida o Bearer e pendura o perfil na requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store));
    };

    let user = app_state
        .auth_service
        .validate_token(bearer.token())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
pub struct AuthenticatedUser(pub Profile);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<Profile>() {
            return Ok(AuthenticatedUser(user.clone()));
        }

        let app_state = AppState::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());
        Err(AppError::InvalidToken.to_api_error(&Locale::from_header(header), &app_state.i18n_store))
    }
}
