// src/db/client_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::{client::Client, visit::ClientCategory},
};

#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Busca o cliente pelo nome ou cria. Dados novos (CNPJ, região, categoria)
    /// sobrescrevem os antigos; campos ausentes mantêm o que já estava gravado.
    pub async fn find_or_create<'e, E>(
        &self,
        executor: E,
        name: &str,
        tax_id: Option<&str>,
        region: Option<&str>,
        category: Option<ClientCategory>,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, tax_id, region, category)
            VALUES ($1, $2, $3, COALESCE($4, 'posto'::client_category))
            ON CONFLICT (name) DO UPDATE SET
                tax_id = COALESCE(EXCLUDED.tax_id, clients.tax_id),
                region = COALESCE(EXCLUDED.region, clients.region),
                category = COALESCE($4, clients.category)
            RETURNING id, name, tax_id, region, category, created_at
            "#,
        )
        .bind(name)
        .bind(tax_id)
        .bind(region)
        .bind(category)
        .fetch_one(executor)
        .await?;

        Ok(client)
    }

    pub async fn list_all(&self) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>(
            "SELECT id, name, tax_id, region, category, created_at FROM clients ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }
}
