// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "pt";

// (chave, português, inglês)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("validation_failed", "Um ou mais campos são inválidos.", "One or more fields are invalid."),
    ("email_already_exists", "Este e-mail já está em uso.", "This e-mail is already in use."),
    ("invalid_credentials", "E-mail ou senha incorretos.", "Invalid e-mail or password."),
    ("inactive_account", "Sua conta está desativada. Procure um administrador.", "Your account is disabled. Contact an administrator."),
    ("invalid_token", "Token de autenticação inválido ou ausente.", "Missing or invalid authentication token."),
    ("forbidden", "Você não tem permissão para realizar esta ação.", "You are not allowed to perform this action."),
    ("user_not_found", "Usuário não encontrado.", "User not found."),
    ("visit_not_found", "Visita não encontrada.", "Visit not found."),
    ("notification_not_found", "Notificação não encontrada.", "Notification not found."),
    ("invalid_reset_token", "Link de recuperação inválido ou expirado.", "Invalid or expired recovery link."),
    ("cannot_delete_self", "Você não pode excluir a sua própria conta.", "You cannot delete your own account."),
    ("details_not_object", "O campo details deve ser um objeto.", "The details field must be an object."),
    ("invalid_month", "Mês inválido, use o formato AAAA-MM.", "Invalid month, use the YYYY-MM format."),
    ("invalid_date", "Data inválida, use o formato AAAA-MM-DD.", "Invalid date, use the YYYY-MM-DD format."),
    ("invalid_upload", "Arquivo de imagem inválido.", "Invalid image file."),
    ("geocoding_unavailable", "Localização indisponível.", "Location unavailable."),
    ("internal_error", "Ocorreu um erro inesperado.", "An unexpected error occurred."),
];

/// Catálogo de mensagens por idioma. Carregado uma vez e compartilhado no AppState.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut pt = HashMap::new();
        let mut en = HashMap::new();
        for (key, pt_msg, en_msg) in MESSAGES {
            pt.insert(*key, *pt_msg);
            en.insert(*key, *en_msg);
        }

        let mut messages = HashMap::new();
        messages.insert("pt", pt);
        messages.insert("en", en);
        Self { messages }
    }

    // Idioma desconhecido cai no português; chave desconhecida volta como está
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.messages
            .get(lang)
            .and_then(|m| m.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|m| m.get(key)))
            .map(|s| s.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_has_both_languages() {
        let store = I18nStore::new();
        for (key, pt_msg, en_msg) in MESSAGES {
            assert_eq!(store.translate("pt", key), *pt_msg);
            assert_eq!(store.translate("en", key), *en_msg);
        }
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        assert_eq!(I18nStore::new().translate("en", "no_such_key"), "no_such_key");
    }
}
