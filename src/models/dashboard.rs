// src/models/dashboard.rs

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::visit::Visit;

// Entrada do agregador: só o que os gráficos precisam de cada visita.
// A data fica como texto porque o shim legado guardava datas livres.
#[derive(Debug, Clone)]
pub struct VisitRecord {
    pub date: String,
    pub salesperson: Option<String>,
    pub client: String,
    pub region: Option<String>,
    pub details: Value,
}

impl From<&Visit> for VisitRecord {
    fn from(visit: &Visit) -> Self {
        Self {
            date: visit.visit_date.format("%Y-%m-%d").to_string(),
            salesperson: Some(visit.salesperson_name.clone()),
            client: visit.client_name.clone(),
            region: visit.region.clone(),
            details: visit.details.clone(),
        }
    }
}

// 1. Cards do topo + rankings + gráfico da semana
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_visits: usize,
    pub unique_clients: usize,
    pub opportunities: usize,
    pub visits_by_period: Vec<PeriodBucket>,
    pub top_salespeople: Vec<RankingEntry>,
    pub top_regions: Vec<RankingEntry>,
}

// 2. Uma barra do gráfico (um dia)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBucket {
    pub date: String,  // AAAA-MM-DD
    pub label: String, // dd/mm
    pub value: f64,    // 0..=100, relativo ao dia mais movimentado
    pub count: usize,
    pub is_today: bool,
}

// 3. Posição de um ranking (vendedor ou região)
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub name: String,
    pub visits: usize,
    pub percent: f64,
}
