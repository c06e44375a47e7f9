// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{ClientRepository, UserRepository, VisitRepository},
    services::{
        auth::AuthService, dashboard_service::DashboardService, geocoding::GeocodingService,
        notification_service::NotificationHub, user_service::UserService,
        visit_service::VisitService,
    },
};

pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_AVATAR_DIR: &str = "uploads/avatars";

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub geocoder_url: String,
    pub avatar_dir: PathBuf,
    /// Vazio = qualquer origem
    pub cors_origins: Vec<String>,
    pub seed_demo: bool,
}

impl Config {
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            avatar_dir: PathBuf::from(DEFAULT_AVATAR_DIR),
            cors_origins: Vec::new(),
            seed_demo: false,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let mut config = Self::new(database_url, jwt_secret);

        if let Ok(addr) = env::var("SERVER_ADDR") {
            config.server_addr = addr;
        }
        if let Ok(url) = env::var("GEOCODER_URL") {
            config.geocoder_url = url;
        }
        if let Ok(dir) = env::var("AVATAR_DIR") {
            config.avatar_dir = PathBuf::from(dir);
        }
        if let Ok(origins) = env::var("CORS_ORIGINS") {
            config.cors_origins = parse_origins(&origins);
        }
        config.seed_demo = env::var("SEED_DEMO")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(config)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,
    pub notification_hub: Arc<NotificationHub>,

    pub auth_service: AuthService,
    pub user_service: UserService,
    pub visit_service: VisitService,
    pub dashboard_service: DashboardService,
    pub geocoding_service: GeocodingService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::from_pool(db_pool, config)
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn from_pool(db_pool: PgPool, config: Config) -> anyhow::Result<Self> {
        let user_repo = UserRepository::new(db_pool.clone());
        let client_repo = ClientRepository::new(db_pool.clone());
        let visit_repo = VisitRepository::new(db_pool.clone());

        let notification_hub = Arc::new(NotificationHub::new());

        let auth_service = AuthService::new(user_repo.clone(), config.jwt_secret.clone(), db_pool.clone());
        let user_service = UserService::new(
            user_repo.clone(),
            auth_service.clone(),
            config.avatar_dir.clone(),
            notification_hub.clone(),
            db_pool.clone(),
        );
        let visit_service = VisitService::new(
            visit_repo.clone(),
            client_repo,
            user_repo,
            notification_hub.clone(),
            db_pool.clone(),
        );
        let dashboard_service = DashboardService::new(visit_repo);
        let geocoding_service = GeocodingService::new(config.geocoder_url.clone())?;

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: Arc::new(I18nStore::new()),
            notification_hub,
            auth_service,
            user_service,
            visit_service,
            dashboard_service,
            geocoding_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" http://localhost:5173, ,https://app.exemplo.com "),
            vec!["http://localhost:5173", "https://app.exemplo.com"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let config = Config::new("postgres://x", "segredo");
        assert_eq!(config.server_addr, "0.0.0.0:3000");
        assert_eq!(config.avatar_dir, PathBuf::from("uploads/avatars"));
        assert!(!config.seed_demo);
    }
}
