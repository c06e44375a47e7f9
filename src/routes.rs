// src/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::auth::auth_guard,
    services::user_service::{AVATAR_URL_PREFIX, MAX_AVATAR_BYTES},
};

// Folga para os cabeçalhos do multipart
const AVATAR_BODY_LIMIT: usize = MAX_AVATAR_BYTES + 64 * 1024;

pub fn build_router(app_state: AppState) -> Router {
    let auth_layer = || axum_middleware::from_fn_with_state(app_state.clone(), auth_guard);

    // Autenticação: públicas + as que exigem sessão
    let auth_routes = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/password", put(handlers::auth::change_password))
        .route_layer(auth_layer())
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/password/forgot", post(handlers::auth::forgot_password))
        .route("/password/reset", post(handlers::auth::reset_password));

    let user_routes = Router::new()
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/me",
            get(handlers::users::get_me).put(handlers::users::update_me),
        )
        .route(
            "/me/avatar",
            post(handlers::users::upload_avatar).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        .route("/me/interactions", get(handlers::users::my_interactions))
        .route("/{id}", delete(handlers::users::delete_user))
        .route("/{id}/active", patch(handlers::users::toggle_active))
        .route("/{id}/role", patch(handlers::users::set_role))
        .route_layer(auth_layer());

    let visit_routes = Router::new()
        .route(
            "/",
            get(handlers::visits::list_visits).post(handlers::visits::create_visit),
        )
        .route("/home", get(handlers::visits::home_summary))
        .route(
            "/{id}",
            get(handlers::visits::get_visit)
                .put(handlers::visits::update_visit)
                .delete(handlers::visits::delete_visit),
        )
        .route_layer(auth_layer());

    let client_routes = Router::new()
        .route("/", get(handlers::visits::list_clients))
        .route_layer(auth_layer());

    let dashboard_routes = Router::new()
        .route("/stats", get(handlers::dashboard::get_stats))
        .route_layer(auth_layer());

    // O WebSocket valida o token por conta própria (vem na query)
    let notification_routes = Router::new()
        .route(
            "/",
            get(handlers::notifications::list_notifications)
                .delete(handlers::notifications::clear_notifications),
        )
        .route("/read", post(handlers::notifications::mark_all_read))
        .route("/{id}", delete(handlers::notifications::dismiss_notification))
        .route_layer(auth_layer())
        .route("/ws", get(handlers::notifications::notifications_ws));

    let geo_routes = Router::new()
        .route("/reverse", get(handlers::geo::reverse_geocode))
        .route_layer(auth_layer());

    let legacy_routes = Router::new()
        .route("/stats", get(handlers::legacy::get_stats))
        .route(
            "/visits",
            get(handlers::legacy::list_visits).post(handlers::legacy::create_visit),
        )
        .route("/users", get(handlers::legacy::list_users));

    let cors = cors_layer(&app_state.config.cors_origins);
    let avatars = ServeDir::new(&app_state.config.avatar_dir);

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/visits", visit_routes)
        .nest("/api/clients", client_routes)
        .nest("/api/dashboard", dashboard_routes)
        .nest("/api/notifications", notification_routes)
        .nest("/api/geo", geo_routes)
        .nest("/api/legacy", legacy_routes)
        .nest_service(AVATAR_URL_PREFIX, avatars)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Origem CORS inválida ignorada");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}
