// src/models/visit.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::Profile;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "visit_type")]
pub enum VisitType {
    #[sqlx(rename = "prospeccao")]
    #[serde(rename = "prospeccao", alias = "PROSPECCAO")]
    Prospecting,
    #[sqlx(rename = "negociacao")]
    #[serde(rename = "negociacao", alias = "NEGOCIACAO")]
    Negotiation,
    #[sqlx(rename = "relacionamento")]
    #[serde(rename = "relacionamento", alias = "RELACIONAMENTO")]
    Relationship,
    #[sqlx(rename = "pos_venda")]
    #[serde(rename = "pos_venda", alias = "POS_VENDA")]
    AfterSales,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "visit_result")]
pub enum VisitResult {
    #[sqlx(rename = "alcancado")]
    #[serde(rename = "alcancado", alias = "ALCANCADO")]
    Achieved,
    #[sqlx(rename = "parcial")]
    #[serde(rename = "parcial", alias = "PARCIAL")]
    Partial,
    #[sqlx(rename = "nao_alcancado")]
    #[serde(rename = "nao_alcancado", alias = "NAO_ALCANCADO")]
    NotAchieved,
}

// Categoria do cliente: define quais campos do bloco de detalhes se aplicam
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "client_category")]
pub enum ClientCategory {
    #[sqlx(rename = "posto")]
    #[serde(rename = "posto", alias = "POSTO")]
    FuelStation,
    #[sqlx(rename = "trr")]
    #[serde(rename = "trr", alias = "TRR", alias = "TRR_CONSUMIDOR")]
    ConsumerReseller,
    #[sqlx(rename = "transporte")]
    #[serde(rename = "transporte", alias = "TRANSPORTE", alias = "FROTA")]
    Fleet,
    #[sqlx(rename = "outro")]
    #[serde(rename = "outro", alias = "OUTRO")]
    Other,
}

/// Campos comerciais aceitos em qualquer categoria.
pub const COMMON_DETAIL_KEYS: &[&str] = &["volume", "competitor"];

impl ClientCategory {
    pub fn detail_keys(self) -> &'static [&'static str] {
        match self {
            ClientCategory::FuelStation => &[
                "flag", "status", "reason", "products", "opportunity",
                "est_volume", "deadline", "next_step",
            ],
            ClientCategory::ConsumerReseller => &[
                "has_tank", "tank_capacity", "stored_products", "origin", "supply_mode",
                "avg_consumption", "biz_opportunity", "est_volume", "deadline", "next_step",
            ],
            ClientCategory::Fleet => &[
                "vehicle_qty", "supply_type", "main_product", "avg_consumption", "next_step",
            ],
            ClientCategory::Other => &["description", "future_fit"],
        }
    }

    pub fn accepts_detail(self, key: &str) -> bool {
        self.detail_keys().contains(&key) || COMMON_DETAIL_KEYS.contains(&key)
    }
}

// --- VISITA (linha da tabela + dados do cliente) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub salesperson_name: String,

    pub client_id: Uuid,
    pub client_name: String,
    pub client_tax_id: Option<String>,
    pub client_category: ClientCategory,
    pub region: Option<String>,

    pub visit_date: NaiveDate,
    pub visit_type: VisitType,
    pub result: VisitResult,
    pub summary: Option<String>,

    // Bloco de detalhes da categoria. Ex: { "flag": "Ipiranga", "opportunity": "Sim" }
    pub details: Value,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVisitPayload {
    #[validate(length(min = 1, message = "O nome do cliente é obrigatório."))]
    pub client_name: String,
    pub client_tax_id: Option<String>,
    pub client_category: ClientCategory,
    pub region: Option<String>,

    pub visit_date: NaiveDate,
    pub visit_type: VisitType,
    pub result: VisitResult,
    pub summary: Option<String>,

    #[serde(default = "empty_details")]
    pub details: Value,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude fora do intervalo."))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude fora do intervalo."))]
    pub longitude: Option<f64>,
}

// Edição: o cliente e a localização de uma visita não mudam
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVisitPayload {
    pub visit_date: NaiveDate,
    pub visit_type: VisitType,
    pub result: VisitResult,
    pub summary: Option<String>,
    #[serde(default = "empty_details")]
    pub details: Value,
}

fn empty_details() -> Value {
    Value::Object(Default::default())
}

// Quais visitas o usuário enxerga
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitScope {
    All,
    OwnedBy(Uuid),
}

impl VisitScope {
    pub fn for_user(user: &Profile) -> Self {
        if user.role.is_privileged() {
            VisitScope::All
        } else {
            VisitScope::OwnedBy(user.id)
        }
    }

    pub fn owner(self) -> Option<Uuid> {
        match self {
            VisitScope::All => None,
            VisitScope::OwnedBy(id) => Some(id),
        }
    }

    pub fn allows(self, visit: &Visit) -> bool {
        match self {
            VisitScope::All => true,
            VisitScope::OwnedBy(id) => visit.user_id == Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct VisitListQuery {
    /// Busca por cliente, vendedor ou região
    pub search: Option<String>,
    /// Nome exato do vendedor
    pub salesperson: Option<String>,
    /// Região exata
    pub city: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    #[serde(default)]
    #[param(inline)]
    pub order: SortOrder,
}

impl VisitListQuery {
    pub fn matches(&self, visit: &Visit) -> bool {
        let region = visit.region.as_deref().unwrap_or_default();

        let matches_search = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                visit.client_name.to_lowercase().contains(&term)
                    || visit.salesperson_name.to_lowercase().contains(&term)
                    || region.to_lowercase().contains(&term)
            }
            _ => true,
        };
        let matches_salesperson = self
            .salesperson
            .as_deref()
            .is_none_or(|name| name == visit.salesperson_name);
        let matches_city = self.city.as_deref().is_none_or(|city| city == region);
        let matches_start = self.start.is_none_or(|start| visit.visit_date >= start);
        let matches_end = self.end.is_none_or(|end| visit.visit_date <= end);

        matches_search && matches_salesperson && matches_city && matches_start && matches_end
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitListResponse {
    pub visits: Vec<Visit>,
    /// Vendedores distintos do conjunto visível (para os filtros do front)
    pub salespeople: Vec<String>,
    pub cities: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HomeSummary {
    pub today: usize,
    pub month: usize,
    pub pending: usize,
    pub recent: Vec<Visit>,
}
