// src/services/geocoding.rs

use std::time::Duration;

use crate::{
    common::error::AppError,
    models::geo::{GeoLocation, NominatimResponse},
};

const UNKNOWN_CITY: &str = "Desconhecida";
const USER_AGENT: &str = concat!("small-checklist/", env!("CARGO_PKG_VERSION"));

// Nome completo do estado -> sigla da UF
const STATE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("Acre", "AC"),
    ("Alagoas", "AL"),
    ("Amapá", "AP"),
    ("Amazonas", "AM"),
    ("Bahia", "BA"),
    ("Ceará", "CE"),
    ("Distrito Federal", "DF"),
    ("Espírito Santo", "ES"),
    ("Goiás", "GO"),
    ("Maranhão", "MA"),
    ("Mato Grosso", "MT"),
    ("Mato Grosso do Sul", "MS"),
    ("Minas Gerais", "MG"),
    ("Pará", "PA"),
    ("Paraíba", "PB"),
    ("Paraná", "PR"),
    ("Pernambuco", "PE"),
    ("Piauí", "PI"),
    ("Rio de Janeiro", "RJ"),
    ("Rio Grande do Norte", "RN"),
    ("Rio Grande do Sul", "RS"),
    ("Rondônia", "RO"),
    ("Roraima", "RR"),
    ("Santa Catarina", "SC"),
    ("São Paulo", "SP"),
    ("Sergipe", "SE"),
    ("Tocantins", "TO"),
];

/// Sigla da UF; nomes fora da tabela passam como vieram.
pub fn state_abbreviation(state: &str) -> &str {
    STATE_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == state)
        .map(|(_, abbr)| *abbr)
        .unwrap_or(state)
}

pub fn location_from_response(response: NominatimResponse, latitude: f64, longitude: f64) -> GeoLocation {
    let address = response.address;
    let city = address
        .city
        .or(address.town)
        .or(address.village)
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_CITY.to_string());

    let state = address.state.filter(|s| !s.trim().is_empty());
    let region = match state.as_deref() {
        Some(s) => format!("{}-{}", city, state_abbreviation(s)),
        None => city.clone(),
    };

    GeoLocation { region, city, state, latitude, longitude }
}

/// Cliente da geocodificação reversa (API compatível com o Nominatim).
#[derive(Clone)]
pub struct GeocodingService {
    client: reqwest::Client,
    base_url: String,
}

impl GeocodingService {
    pub fn new(base_url: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| anyhow::anyhow!("Falha ao criar cliente HTTP: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Result<GeoLocation, AppError> {
        let response = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "json".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::GeocodingUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::GeocodingUnavailable(format!(
                "status {}",
                response.status()
            )));
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| AppError::GeocodingUnavailable(e.to_string()))?;

        Ok(location_from_response(body, latitude, longitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn response(value: Value) -> NominatimResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn all_federative_units_are_mapped() {
        assert_eq!(STATE_ABBREVIATIONS.len(), 27);
        assert_eq!(state_abbreviation("Minas Gerais"), "MG");
        assert_eq!(state_abbreviation("São Paulo"), "SP");
        assert_eq!(state_abbreviation("Mato Grosso do Sul"), "MS");
        assert_eq!(state_abbreviation("Buenos Aires"), "Buenos Aires");
    }

    #[test]
    fn city_falls_back_to_town_then_village() {
        let town = response(json!({ "address": { "town": "Nova Lima", "state": "Minas Gerais" } }));
        let village = response(json!({ "address": { "village": "Piedade" } }));
        let nothing = response(json!({}));

        assert_eq!(location_from_response(town, 0.0, 0.0).region, "Nova Lima-MG");

        let village = location_from_response(village, 0.0, 0.0);
        assert_eq!(village.region, "Piedade");
        assert!(village.state.is_none());

        assert_eq!(location_from_response(nothing, 0.0, 0.0).city, "Desconhecida");
    }

    #[tokio::test]
    async fn reverse_calls_the_configured_endpoint() {
        let app = Router::new().route(
            "/reverse",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("format").map(String::as_str), Some("json"));
                Json(json!({ "address": { "city": "Belo Horizonte", "state": "Minas Gerais" } }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let service = GeocodingService::new(format!("http://{addr}/")).unwrap();
        let location = service.reverse(-19.92, -43.94).await.unwrap();

        assert_eq!(location.region, "Belo Horizonte-MG");
        assert_eq!(location.latitude, -19.92);
    }

    #[tokio::test]
    async fn upstream_error_status_is_reported() {
        let app = Router::new().route(
            "/reverse",
            get(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "fora do ar") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let service = GeocodingService::new(format!("http://{addr}")).unwrap();

        assert!(matches!(
            service.reverse(0.0, 0.0).await,
            Err(AppError::GeocodingUnavailable(_))
        ));
    }
}
