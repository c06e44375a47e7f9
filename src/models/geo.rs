// src/models/geo.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct ReverseGeocodeQuery {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude fora do intervalo."))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude fora do intervalo."))]
    pub lon: f64,
}

// Resultado já no formato do campo "região" do formulário ("Cidade-UF")
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct GeoLocation {
    pub region: String,
    pub city: String,
    pub state: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

// Resposta do /reverse do Nominatim (só os campos usados)
#[derive(Debug, Default, Deserialize)]
pub struct NominatimResponse {
    #[serde(default)]
    pub address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
pub struct NominatimAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
}
