// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{Profile, Role},
};

/// 1. O Trait que define quais cargos passam
pub trait RoleRequirement: Send + Sync + 'static {
    fn allows(role: Role) -> bool;
}

/// 2. O Extractor (Guardião). Depende do `auth_guard` ter rodado antes.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleRequirement,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_header(
            parts
                .headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok()),
        );

        let user = parts
            .extensions
            .get::<Profile>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        if !T::allows(user.role) {
            tracing::warn!(user_id = %user.id, role = user.role.as_str(), "Acesso negado por cargo");
            return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS REQUISITOS (TIPOS)
// ---

/// Gestores e administradores.
pub struct Privileged;
impl RoleRequirement for Privileged {
    fn allows(role: Role) -> bool {
        role.is_privileged()
    }
}

pub struct AdminOnly;
impl RoleRequirement for AdminOnly {
    fn allows(role: Role) -> bool {
        role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, models::profile::tests::profile};
    use axum::http::Request;
    use sqlx::postgres::PgPoolOptions;

    fn state() -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/small_checklist_test")
            .unwrap();
        AppState::from_pool(pool, Config::new("postgres://localhost/small_checklist_test", "segredo")).unwrap()
    }

    fn parts_for(user: Option<Profile>) -> Parts {
        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        if let Some(user) = user {
            parts.extensions.insert(user);
        }
        parts
    }

    #[test]
    fn requirements_match_roles() {
        assert!(Privileged::allows(Role::Manager));
        assert!(!Privileged::allows(Role::Salesperson));
        assert!(AdminOnly::allows(Role::Admin));
        assert!(!AdminOnly::allows(Role::Manager));
    }

    #[tokio::test]
    async fn salesperson_is_forbidden_on_privileged_routes() {
        let state = state();
        let mut parts = parts_for(Some(profile("Ricardo", "ricardo@visitlog.com", Role::Salesperson)));

        let rejection = RequireRole::<Privileged>::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();

        assert_eq!(rejection.status, axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn manager_passes_privileged_but_not_admin_only() {
        let state = state();
        let manager = profile("Ana", "ana@visitlog.com", Role::Manager);

        let mut parts = parts_for(Some(manager.clone()));
        assert!(RequireRole::<Privileged>::from_request_parts(&mut parts, &state).await.is_ok());

        let mut parts = parts_for(Some(manager));
        let rejection = RequireRole::<AdminOnly>::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert_eq!(rejection.status, axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_profile_is_unauthorized() {
        let state = state();
        let mut parts = parts_for(None);

        let rejection = RequireRole::<AdminOnly>::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();

        assert_eq!(rejection.status, axum::http::StatusCode::UNAUTHORIZED);
    }
}
