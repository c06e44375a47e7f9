// src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Visit,
}

// Vive só em memória: some ao dispensar ou ao reiniciar o servidor
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

// Evento publicado a cada visita inserida (o "change feed")
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewVisitEvent {
    pub visit_id: Uuid,
    pub salesperson_name: String,
    pub client_name: String,
    pub created_at: DateTime<Utc>,
}

impl NewVisitEvent {
    pub fn message(&self) -> String {
        format!("Nova visita: {} em {}", self.salesperson_name, self.client_name)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}
