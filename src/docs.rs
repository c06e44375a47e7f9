// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,
        handlers::auth::change_password,

        // --- Users ---
        handlers::users::get_me,
        handlers::users::update_me,
        handlers::users::upload_avatar,
        handlers::users::my_interactions,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::toggle_active,
        handlers::users::set_role,
        handlers::users::delete_user,

        // --- Visits ---
        handlers::visits::create_visit,
        handlers::visits::list_visits,
        handlers::visits::home_summary,
        handlers::visits::get_visit,
        handlers::visits::update_visit,
        handlers::visits::delete_visit,
        handlers::visits::list_clients,

        // --- Dashboard ---
        handlers::dashboard::get_stats,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::mark_all_read,
        handlers::notifications::dismiss_notification,
        handlers::notifications::clear_notifications,
        handlers::notifications::notifications_ws,

        // --- Geo ---
        handlers::geo::reverse_geocode,

        // --- Legacy ---
        handlers::legacy::get_stats,
        handlers::legacy::list_visits,
        handlers::legacy::create_visit,
        handlers::legacy::list_users,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::Profile,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::ForgotPasswordPayload,
            models::auth::ResetPasswordPayload,
            models::auth::ChangePasswordPayload,
            models::auth::AuthResponse,

            // --- Users ---
            models::profile::UpdateProfilePayload,
            models::profile::CreateUserPayload,
            models::profile::SetRolePayload,
            models::profile::InteractionsResponse,
            models::profile::AvatarResponse,

            // --- Visits ---
            models::visit::VisitType,
            models::visit::VisitResult,
            models::visit::ClientCategory,
            models::visit::Visit,
            models::visit::CreateVisitPayload,
            models::visit::UpdateVisitPayload,
            models::visit::VisitListResponse,
            models::visit::HomeSummary,
            models::client::Client,

            // --- Dashboard ---
            models::dashboard::DashboardStats,
            models::dashboard::PeriodBucket,
            models::dashboard::RankingEntry,

            // --- Notifications ---
            models::notification::NotificationKind,
            models::notification::Notification,
            models::notification::NotificationList,
            models::notification::NewVisitEvent,

            // --- Geo ---
            models::geo::GeoLocation,

            // --- Legacy ---
            models::legacy::LegacyStats,
            models::legacy::LegacyPeriod,
            models::legacy::LegacyVisit,
            models::legacy::LegacyCreateVisit,
            models::legacy::LegacyCreated,
            models::legacy::LegacyUser,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação, sessão e recuperação de senha"),
        (name = "Users", description = "Perfil próprio e administração de usuários"),
        (name = "Visits", description = "Registro e consulta de visitas"),
        (name = "Dashboard", description = "Indicadores e gráficos gerenciais"),
        (name = "Notifications", description = "Avisos de novas visitas (gestores)"),
        (name = "Geo", description = "Geocodificação reversa"),
        (name = "Legacy", description = "Rotas do formato antigo, sem login")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_documents_every_area() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/visits"));
        assert!(paths.contains_key("/api/visits/{id}"));
        assert!(paths.contains_key("/api/notifications/ws"));
        assert!(paths.contains_key("/api/legacy/stats"));

        let schemes = &doc.components.as_ref().map(|c| c.security_schemes.clone()).unwrap_or_default();
        assert!(schemes.contains_key("api_jwt"));
    }
}
