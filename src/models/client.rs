// src/models/client.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::visit::ClientCategory;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>, // CNPJ
    pub region: Option<String>,
    pub category: ClientCategory,
    pub created_at: DateTime<Utc>,
}
