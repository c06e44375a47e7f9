// src/models/profile.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::auth::{Profile, Role};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub full_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

// Criação de usuário pelo administrador (senha temporária + link de recuperação)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub full_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetRolePayload {
    pub role: Role,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UserListQuery {
    /// Trecho do nome ou do e-mail
    pub search: Option<String>,
    pub role: Option<Role>,
}

impl UserListQuery {
    pub fn matches(&self, profile: &Profile) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                profile.full_name.to_lowercase().contains(&term)
                    || profile.email.to_lowercase().contains(&term)
            }
            _ => true,
        };
        let matches_role = self.role.is_none_or(|role| role == profile.role);

        matches_search && matches_role
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct InteractionsQuery {
    /// Mês no formato AAAA-MM (padrão: mês corrente)
    pub month: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InteractionsResponse {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub avatar_url: String,
}

/// Mantém só os dígitos do telefone, no máximo 11 (DDD + celular).
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).take(11).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    pub(crate) fn profile(name: &str, email: &str, role: Role) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: String::new(),
            full_name: name.into(),
            phone: None,
            avatar_url: None,
            role,
            active: true,
            token_version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn phone_keeps_only_eleven_digits() {
        assert_eq!(normalize_phone("(31) 98765-4321"), "31987654321");
        assert_eq!(normalize_phone("+55 (31) 98765-4321"), "55319876543");
        assert_eq!(normalize_phone("sem telefone"), "");
    }

    #[test]
    fn user_filter_matches_name_or_email_and_role() {
        let ana = profile("Ana Silva", "ana@visitlog.com", Role::Manager);

        let by_name = UserListQuery { search: Some("silva".into()), role: None };
        let by_email = UserListQuery { search: Some("ANA@".into()), role: None };
        let wrong_role = UserListQuery { search: None, role: Some(Role::Admin) };
        let blank = UserListQuery { search: Some("  ".into()), role: Some(Role::Manager) };

        assert!(by_name.matches(&ana));
        assert!(by_email.matches(&ana));
        assert!(!wrong_role.matches(&ana));
        assert!(blank.matches(&ana));
    }
}
