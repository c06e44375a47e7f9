//src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use small_checklist::{
    config::{AppState, Config},
    db::{seed, ClientRepository, UserRepository},
    routes::build_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, nível info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if app_state.config.seed_demo {
        seed::seed_demo(
            &UserRepository::new(app_state.db_pool.clone()),
            &ClientRepository::new(app_state.db_pool.clone()),
            &app_state.db_pool,
        )
        .await?;
    }

    let addr = app_state.config.server_addr.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&addr)
        .await
        .context("Falha ao iniciar o listener TCP")?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}
