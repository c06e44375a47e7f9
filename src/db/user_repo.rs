// src/db/user_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{Profile, Role},
};

const PROFILE_COLUMNS: &str = r#"
    id, email, password_hash, full_name, phone, avatar_url,
    role, active, token_version, created_at, updated_at
"#;

// O repositório de perfis, responsável pelas tabelas 'profiles' e 'password_resets'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, AppError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE email = $1");
        let maybe_user = sqlx::query_as::<_, Profile>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");
        let maybe_user = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    // Cria um novo perfil. E-mail duplicado vira EmailAlreadyExists.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        email: &str,
        password_hash: &str,
        full_name: &str,
        role: Role,
    ) -> Result<Profile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO profiles (email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROFILE_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, Profile>(&sql)
            .bind(email)
            .bind(password_hash)
            .bind(full_name)
            .bind(role)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation()
                        && db_err.constraint() == Some("profiles_email_key")
                    {
                        return AppError::EmailAlreadyExists;
                    }
                }
                e.into()
            })?;

        Ok(user)
    }

    pub async fn list_all(&self) -> Result<Vec<Profile>, AppError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY full_name ASC");
        let users = sqlx::query_as::<_, Profile>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// IDs de gestores e administradores ativos (destinatários das notificações).
    pub async fn list_privileged_active_ids<'e, E>(&self, executor: E) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM profiles
            WHERE active = TRUE AND role IN ('admin', 'gestor')
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }

    pub async fn first_admin_id(&self) -> Result<Option<Uuid>, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM profiles WHERE role = 'admin' ORDER BY created_at ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        full_name: &str,
        phone: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Option<Profile>, AppError> {
        let sql = format!(
            r#"
            UPDATE profiles
            SET full_name = $2, phone = $3, avatar_url = COALESCE($4, avatar_url), updated_at = NOW()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .bind(full_name)
            .bind(phone)
            .bind(avatar_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn set_avatar(&self, id: Uuid, avatar_url: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE profiles SET avatar_url = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(avatar_url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn toggle_active(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        let sql = format!(
            r#"
            UPDATE profiles SET active = NOT active, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<Profile>, AppError> {
        let sql = format!(
            r#"
            UPDATE profiles SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  SESSÕES E SENHAS
    // =========================================================================

    /// Invalida todos os tokens já emitidos. Retorna a nova versão.
    pub async fn bump_token_version<'e, E>(&self, executor: E, id: Uuid) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let version = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE profiles SET token_version = token_version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING token_version
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::UserNotFound)?;
        Ok(version)
    }

    /// Troca a senha e derruba as sessões antigas na mesma instrução.
    pub async fn update_password<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        password_hash: &str,
    ) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let version = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE profiles
            SET password_hash = $2, token_version = token_version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING token_version
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::UserNotFound)?;
        Ok(version)
    }

    pub async fn create_reset_token<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        token: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO password_resets (token, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Marca o token como usado. Só devolve o usuário se ainda era válido.
    pub async fn consume_reset_token<'e, E>(
        &self,
        executor: E,
        token: Uuid,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE password_resets SET used_at = NOW()
            WHERE token = $1 AND used_at IS NULL AND expires_at > NOW()
            RETURNING user_id
            "#,
        )
        .bind(token)
        .fetch_optional(executor)
        .await?;
        Ok(user_id)
    }
}
