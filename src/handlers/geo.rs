// src/handlers/geo.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::geo::{GeoLocation, ReverseGeocodeQuery},
};

// GET /api/geo/reverse?lat=&lon=
#[utoipa::path(
    get,
    path = "/api/geo/reverse",
    tag = "Geo",
    params(ReverseGeocodeQuery),
    responses(
        (status = 200, description = "Cidade e UF da coordenada", body = GeoLocation),
        (status = 400, description = "Coordenada inválida"),
        (status = 502, description = "Serviço de geocodificação indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn reverse_geocode(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ReverseGeocodeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let location = app_state
        .geocoding_service
        .reverse(query.lat, query.lon)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(location))
}
