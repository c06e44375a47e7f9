// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, Profile, Role},
};

const TOKEN_TTL_DAYS: i64 = 7;
const RESET_TTL_HOURS: i64 = 1;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    pool: PgPool,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, pool: PgPool) -> Self {
        Self { user_repo, jwt_secret, pool }
    }

    /// Cadastro público: todo novo perfil nasce como vendedor.
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<String, AppError> {
        let hashed_password = hash_password(password).await?;

        let new_user = self
            .user_repo
            .create_user(
                &self.pool,
                &normalize_email(email),
                &hashed_password,
                full_name.trim(),
                Role::Salesperson,
            )
            .await?;

        tracing::info!(user_id = %new_user.id, "👤 Novo usuário cadastrado");
        self.create_token(new_user.id, new_user.token_version)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }
        if !user.active {
            return Err(AppError::InactiveAccount);
        }

        self.create_token(user.id, user.token_version)
    }

    /// Encerra todas as sessões do usuário.
    pub async fn logout(&self, user: &Profile) -> Result<(), AppError> {
        self.user_repo.bump_token_version(&self.pool, user.id).await?;
        Ok(())
    }

    pub async fn validate_token(&self, token: &str) -> Result<Profile, AppError> {
        let claims = self.decode_claims(token)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        // Token emitido antes de um logout ou troca de senha
        if user.token_version != claims.ver {
            return Err(AppError::InvalidToken);
        }
        if !user.active {
            return Err(AppError::InactiveAccount);
        }

        Ok(user)
    }

    /// Gera um token de recuperação se o e-mail existir. A entrega do e-mail
    /// fica com o operador: o link sai no log.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<Uuid>, AppError> {
        let Some(user) = self.user_repo.find_by_email(&normalize_email(email)).await? else {
            tracing::info!("Recuperação de senha pedida para e-mail desconhecido");
            return Ok(None);
        };

        let token = self.issue_reset_token(&self.pool, user.id).await?;
        log_reset_token(user.id, token);
        Ok(Some(token))
    }

    /// Grava um token de recuperação válido por uma hora. Quem chama decide
    /// a transação e registra o token depois de confirmá-la.
    pub async fn issue_reset_token<'e, E>(&self, executor: E, user_id: Uuid) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let token = Uuid::new_v4();
        let expires_at = Utc::now() + chrono::Duration::hours(RESET_TTL_HOURS);

        self.user_repo
            .create_reset_token(executor, user_id, token, expires_at)
            .await?;

        Ok(token)
    }

    pub async fn reset_password(&self, token: Uuid, new_password: &str) -> Result<(), AppError> {
        let hashed_password = hash_password(new_password).await?;

        // Consumir o token e gravar a senha juntos: ou os dois, ou nenhum
        let mut tx = self.pool.begin().await?;

        let user_id = self
            .user_repo
            .consume_reset_token(&mut *tx, token)
            .await?
            .ok_or(AppError::InvalidResetToken)?;

        self.user_repo
            .update_password(&mut *tx, user_id, &hashed_password)
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user_id, "🔑 Senha redefinida via token de recuperação");
        Ok(())
    }

    /// Troca a senha do usuário logado e devolve um token novo
    /// (os antigos deixam de valer).
    pub async fn change_password(&self, user: &Profile, new_password: &str) -> Result<String, AppError> {
        let hashed_password = hash_password(new_password).await?;
        let version = self
            .user_repo
            .update_password(&self.pool, user.id, &hashed_password)
            .await?;

        self.create_token(user.id, version)
    }

    pub fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }

    pub fn create_token(&self, user_id: Uuid, version: i32) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: user_id,
            ver: version,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

// Sem serviço de e-mail: o token sai no log para o operador repassar
pub fn log_reset_token(user_id: Uuid, token: Uuid) {
    tracing::info!(user_id = %user_id, reset_token = %token, "✉️ Token de recuperação de senha emitido");
}

pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}
