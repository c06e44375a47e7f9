// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erros de domínio e de infraestrutura. Nunca vão direto para o cliente:
// os handlers convertem com `to_api_error`, que traduz a mensagem.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Conta desativada")]
    InactiveAccount,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Visita não encontrada")]
    VisitNotFound,

    #[error("Notificação não encontrada")]
    NotificationNotFound,

    #[error("Token de recuperação inválido ou expirado")]
    InvalidResetToken,

    #[error("Administrador não pode excluir a própria conta")]
    CannotDeleteSelf,

    #[error("O campo details deve ser um objeto JSON")]
    DetailsNotObject,

    #[error("Mês inválido (esperado AAAA-MM)")]
    InvalidMonth,

    #[error("Data inválida (esperado AAAA-MM-DD)")]
    InvalidDate,

    #[error("Upload inválido: {0}")]
    InvalidUpload(String),

    #[error("Geocodificação indisponível: {0}")]
    GeocodingUnavailable(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de E/S: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    /// Status HTTP e chave de tradução de cada variante.
    pub fn status_and_key(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "email_already_exists"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::InactiveAccount => (StatusCode::FORBIDDEN, "inactive_account"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found"),
            AppError::VisitNotFound => (StatusCode::NOT_FOUND, "visit_not_found"),
            AppError::NotificationNotFound => (StatusCode::NOT_FOUND, "notification_not_found"),
            AppError::InvalidResetToken => (StatusCode::BAD_REQUEST, "invalid_reset_token"),
            AppError::CannotDeleteSelf => (StatusCode::BAD_REQUEST, "cannot_delete_self"),
            AppError::DetailsNotObject => (StatusCode::BAD_REQUEST, "details_not_object"),
            AppError::InvalidMonth => (StatusCode::BAD_REQUEST, "invalid_month"),
            AppError::InvalidDate => (StatusCode::BAD_REQUEST, "invalid_date"),
            AppError::InvalidUpload(_) => (StatusCode::BAD_REQUEST, "invalid_upload"),
            AppError::GeocodingUnavailable(_) => (StatusCode::BAD_GATEWAY, "geocoding_unavailable"),
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::IoError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let (status, key) = self.status_and_key();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        } else if let AppError::GeocodingUnavailable(cause) = self {
            tracing::warn!("Geocodificação falhou: {}", cause);
        }

        // Validação devolve os detalhes por campo
        let details = match self {
            AppError::ValidationError(errors) => {
                let mut fields = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                                .into()
                        })
                        .collect();
                    fields.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(fields))
            }
            AppError::InvalidUpload(reason) => Some(json!({ "reason": reason })),
            _ => None,
        };

        ApiError {
            status,
            error: i18n.translate(&locale.0, key),
            details,
        }
    }
}

// O corpo de erro que o cliente recebe
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}
