// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::DEFAULT_LANG;

// Idioma preferido do cliente, só a parte primária ("pt-BR" -> "pt")
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    pub fn from_header(value: Option<&str>) -> Self {
        value
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first()
                    .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
            })
            .filter(|lang| !lang.is_empty())
            .map(Locale)
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());

        Ok(Locale::from_header(header_value))
    }
}
