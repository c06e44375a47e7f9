// src/db/seed.rs
//
// Dados de demonstração para ambientes locais (SEED_DEMO=true).

use crate::{
    common::error::AppError,
    db::{ClientRepository, UserRepository},
    models::{auth::Role, visit::ClientCategory},
    services::auth::hash_password,
};

pub const DEMO_PASSWORD: &str = "123456";

const DEMO_USERS: &[(&str, &str, Role)] = &[
    ("Ricardo Mendes", "ricardo@visitlog.com", Role::Salesperson),
    ("Ana Silva", "ana@visitlog.com", Role::Manager),
    ("João Silva", "joao@visitlog.com", Role::Admin),
];

const DEMO_CLIENTS: &[(&str, &str, &str)] = &[
    ("Supermercados Alvorada", "12.345.678/0001-01", "Belo Horizonte-MG"),
    ("Farmácia Vida Saudável", "98.765.432/0001-99", "Nova Lima-MG"),
];

/// Só semeia um banco vazio. Retorna `true` se inseriu algo.
pub async fn seed_demo(
    user_repo: &UserRepository,
    client_repo: &ClientRepository,
    pool: &sqlx::PgPool,
) -> Result<bool, AppError> {
    if user_repo.count().await? > 0 {
        return Ok(false);
    }

    let password_hash = hash_password(DEMO_PASSWORD).await?;

    let mut tx = pool.begin().await?;

    for (name, email, role) in DEMO_USERS {
        user_repo
            .create_user(&mut *tx, email, &password_hash, name, *role)
            .await?;
    }

    for (name, tax_id, region) in DEMO_CLIENTS {
        client_repo
            .find_or_create(
                &mut *tx,
                name,
                Some(tax_id),
                Some(region),
                Some(ClientCategory::Other),
            )
            .await?;
    }

    tx.commit().await?;

    tracing::info!(
        "🌱 Banco semeado com {} usuários e {} clientes de demonstração.",
        DEMO_USERS.len(),
        DEMO_CLIENTS.len()
    );
    Ok(true)
}
