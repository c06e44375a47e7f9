// src/models/legacy.rs
//
// Formatos do shim REST antigo (/api/stats, /api/visits, /api/users).
// Os dados vêm das mesmas tabelas; só o desenho do JSON muda.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    auth::Profile,
    dashboard::PeriodBucket,
    visit::{ClientCategory, Visit, VisitResult, VisitType},
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStats {
    pub total_visits: usize,
    pub unique_clients: usize,
    pub opportunities: usize,
    pub visits_by_period: Vec<LegacyPeriod>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LegacyPeriod {
    pub label: String,
    pub value: f64,
}

impl From<&PeriodBucket> for LegacyPeriod {
    fn from(bucket: &PeriodBucket) -> Self {
        Self { label: bucket.label.clone(), value: bucket.value }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LegacyVisit {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub client_id: Uuid,
    pub date: String,
    #[serde(rename = "type")]
    pub visit_type: String,
    pub result: String,
    pub volume: Option<f64>,
    pub competitor: Option<String>,
    pub summary: Option<String>,
    pub user_name: String,
    pub client_name: String,
    pub region: Option<String>,
}

impl From<&Visit> for LegacyVisit {
    fn from(visit: &Visit) -> Self {
        Self {
            id: visit.id,
            user_id: visit.user_id,
            client_id: visit.client_id,
            date: visit.visit_date.format("%Y-%m-%d").to_string(),
            visit_type: legacy_visit_type(visit.visit_type).to_string(),
            result: legacy_result(visit.result).to_string(),
            volume: visit.details.get("volume").and_then(volume_from_value),
            competitor: visit
                .details
                .get("competitor")
                .and_then(Value::as_str)
                .map(str::to_string),
            summary: visit.summary.clone(),
            user_name: visit.salesperson_name.clone(),
            client_name: visit.client_name.clone(),
            region: visit.region.clone(),
        }
    }
}

// O formulário antigo mandava volume como número ou texto
fn volume_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

pub fn legacy_visit_type(kind: VisitType) -> &'static str {
    match kind {
        VisitType::Prospecting => "PROSPECCAO",
        VisitType::Negotiation => "NEGOCIACAO",
        VisitType::Relationship => "RELACIONAMENTO",
        VisitType::AfterSales => "POS_VENDA",
    }
}

pub fn legacy_result(result: VisitResult) -> &'static str {
    match result {
        VisitResult::Achieved => "ALCANCADO",
        VisitResult::Partial => "PARCIAL",
        VisitResult::NotAchieved => "NAO_ALCANCADO",
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LegacyCreateVisit {
    pub user_id: Option<Uuid>,
    pub client_name: String,
    pub cnpj: Option<String>,
    pub region: Option<String>,
    pub date: String,
    #[serde(rename = "type")]
    pub visit_type: VisitType,
    pub result: VisitResult,
    pub volume: Option<f64>,
    pub competitor: Option<String>,
    pub summary: Option<String>,
    // O shim antigo não conhecia categorias
    pub client_category: Option<ClientCategory>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LegacyCreated {
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LegacyUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub active: u8,
}

impl From<&Profile> for LegacyUser {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            name: profile.full_name.clone(),
            email: profile.email.clone(),
            role: profile.role.as_str().to_uppercase(),
            active: u8::from(profile.active),
        }
    }
}
