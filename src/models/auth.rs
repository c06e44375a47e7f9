// src/models/auth.rs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Mapeia o CREATE TYPE user_role do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "user_role")]
pub enum Role {
    #[sqlx(rename = "admin")]
    #[serde(rename = "admin")]
    Admin,
    #[sqlx(rename = "gestor")]
    #[serde(rename = "gestor")]
    Manager,
    #[sqlx(rename = "vendedor")]
    #[serde(rename = "vendedor")]
    Salesperson,
}

impl Role {
    /// Administradores e gestores veem todas as visitas e recebem notificações.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "gestor",
            Role::Salesperson => "vendedor",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    // Aceita qualquer caixa: "ADMIN" (legado) e "admin" (atual)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "gestor" => Ok(Role::Manager),
            "vendedor" => Ok(Role::Salesperson),
            other => Err(format!("cargo desconhecido: {other}")),
        }
    }
}

// Representa um perfil vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub full_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub active: bool,

    #[serde(skip_serializing)]
    pub token_version: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub full_name: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    pub token: Uuid,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub new_password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub ver: i32,   // token_version do perfil quando o token foi emitido
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued At
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_legacy_and_current_casing() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("gestor".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!(" Vendedor ".parse::<Role>().unwrap(), Role::Salesperson);
        assert!("diretor".parse::<Role>().is_err());
    }

    #[test]
    fn only_admin_and_manager_are_privileged() {
        assert!(Role::Admin.is_privileged());
        assert!(Role::Manager.is_privileged());
        assert!(!Role::Salesperson.is_privileged());
    }

    #[test]
    fn role_serializes_to_database_values() {
        assert_eq!(serde_json::to_value(Role::Manager).unwrap(), "gestor");
        assert_eq!(Role::Salesperson.as_str(), "vendedor");
    }
}
