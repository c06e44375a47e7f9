// src/services/visit_service.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{visit_repo::NewVisit, ClientRepository, UserRepository, VisitRepository},
    models::{
        auth::Profile,
        client::Client,
        legacy::LegacyCreateVisit,
        notification::NewVisitEvent,
        visit::{
            ClientCategory, CreateVisitPayload, HomeSummary, SortOrder, UpdateVisitPayload, Visit,
            VisitListQuery, VisitListResponse, VisitResult, VisitScope,
        },
    },
    services::notification_service::NotificationHub,
};

const RECENT_VISITS: usize = 3;

#[derive(Clone)]
pub struct VisitService {
    visit_repo: VisitRepository,
    client_repo: ClientRepository,
    user_repo: UserRepository,
    hub: Arc<NotificationHub>,
    pool: PgPool,
}

impl VisitService {
    pub fn new(
        visit_repo: VisitRepository,
        client_repo: ClientRepository,
        user_repo: UserRepository,
        hub: Arc<NotificationHub>,
        pool: PgPool,
    ) -> Self {
        Self { visit_repo, client_repo, user_repo, hub, pool }
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn create_visit(&self, user: &Profile, payload: CreateVisitPayload) -> Result<Visit, AppError> {
        let details = prune_details(payload.client_category, payload.details)?;
        let region = non_blank(payload.region.as_deref());

        let mut tx = self.pool.begin().await?;

        let client = self
            .client_repo
            .find_or_create(
                &mut *tx,
                payload.client_name.trim(),
                non_blank(payload.client_tax_id.as_deref()),
                region,
                Some(payload.client_category),
            )
            .await?;

        let new_visit = NewVisit {
            user_id: Some(user.id),
            salesperson_name: &user.full_name,
            client_id: client.id,
            client_category: payload.client_category,
            region,
            visit_date: payload.visit_date,
            visit_type: payload.visit_type,
            result: payload.result,
            summary: payload.summary.as_deref(),
            details: &details,
            latitude: payload.latitude,
            longitude: payload.longitude,
        };
        let id = self.visit_repo.insert(&mut *tx, &new_visit).await?;

        let visit = self
            .visit_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::VisitNotFound)?;
        let recipients = self.user_repo.list_privileged_active_ids(&mut *tx).await?;

        tx.commit().await?;

        tracing::info!(visit_id = %visit.id, user_id = %user.id, "📍 Visita registrada");
        self.notify_new_visit(&visit, &recipients).await;

        Ok(visit)
    }

    /// Inserção pelo formato do shim antigo. Sem usuário informado, a visita
    /// vai para o primeiro administrador.
    pub async fn create_legacy_visit(&self, payload: LegacyCreateVisit) -> Result<Uuid, AppError> {
        let visit_date = parse_legacy_date(&payload.date)?;

        let user_id = match payload.user_id {
            Some(id) => id,
            None => self.user_repo.first_admin_id().await?.ok_or(AppError::UserNotFound)?,
        };
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let mut details = Map::new();
        if let Some(volume) = payload.volume {
            details.insert("volume".into(), Value::from(volume));
        }
        if let Some(competitor) = non_blank(payload.competitor.as_deref()) {
            details.insert("competitor".into(), Value::from(competitor));
        }
        let details = Value::Object(details);
        let region = non_blank(payload.region.as_deref());

        let mut tx = self.pool.begin().await?;

        let client = self
            .client_repo
            .find_or_create(
                &mut *tx,
                payload.client_name.trim(),
                non_blank(payload.cnpj.as_deref()),
                region,
                payload.client_category,
            )
            .await?;

        let new_visit = NewVisit {
            user_id: Some(user.id),
            salesperson_name: &user.full_name,
            client_id: client.id,
            client_category: payload.client_category.unwrap_or(client.category),
            region,
            visit_date,
            visit_type: payload.visit_type,
            result: payload.result,
            summary: payload.summary.as_deref(),
            details: &details,
            latitude: None,
            longitude: None,
        };
        let id = self.visit_repo.insert(&mut *tx, &new_visit).await?;
        let visit = self
            .visit_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::VisitNotFound)?;
        let recipients = self.user_repo.list_privileged_active_ids(&mut *tx).await?;

        tx.commit().await?;

        tracing::info!(visit_id = %id, user_id = %user.id, "📍 Visita registrada pelo formato antigo");
        self.notify_new_visit(&visit, &recipients).await;

        Ok(id)
    }

    pub async fn update_visit(
        &self,
        user: &Profile,
        id: Uuid,
        payload: UpdateVisitPayload,
    ) -> Result<Visit, AppError> {
        let current = self.find_modifiable(user, id).await?;
        let details = prune_details(current.client_category, payload.details)?;

        let updated = self
            .visit_repo
            .update(
                id,
                payload.visit_date,
                payload.visit_type,
                payload.result,
                payload.summary.as_deref(),
                &details,
            )
            .await?;
        if !updated {
            return Err(AppError::VisitNotFound);
        }

        self.visit_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::VisitNotFound)
    }

    pub async fn delete_visit(&self, user: &Profile, id: Uuid) -> Result<(), AppError> {
        self.find_modifiable(user, id).await?;

        if !self.visit_repo.delete(id).await? {
            return Err(AppError::VisitNotFound);
        }
        tracing::info!(visit_id = %id, user_id = %user.id, "🗑️ Visita excluída");
        Ok(())
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn get_visit(&self, user: &Profile, id: Uuid) -> Result<Visit, AppError> {
        let visit = self
            .visit_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::VisitNotFound)?;

        // Fora do escopo responde como inexistente
        if !VisitScope::for_user(user).allows(&visit) {
            return Err(AppError::VisitNotFound);
        }
        Ok(visit)
    }

    pub async fn list_visits(&self, user: &Profile, query: &VisitListQuery) -> Result<VisitListResponse, AppError> {
        let visits = self
            .visit_repo
            .list(VisitScope::for_user(user), None, query.order)
            .await?;

        Ok(filter_visits(visits, query))
    }

    /// Clientes já cadastrados, para o autocompletar do formulário.
    pub async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        self.client_repo.list_all().await
    }

    pub async fn list_all(&self) -> Result<Vec<Visit>, AppError> {
        self.visit_repo.list(VisitScope::All, None, SortOrder::Desc).await
    }

    pub async fn home_summary(&self, user: &Profile, today: NaiveDate) -> Result<HomeSummary, AppError> {
        let visits = self
            .visit_repo
            .list(VisitScope::for_user(user), None, SortOrder::Desc)
            .await?;
        Ok(summarize_home(visits, today))
    }

    /// Quantas visitas o usuário fez no mês (AAAA-MM).
    pub async fn monthly_interactions(&self, user: &Profile, month: &str) -> Result<i64, AppError> {
        let (start, end) = month_bounds(month)?;
        self.visit_repo.count_for_user_between(user.id, start, end).await
    }

    async fn find_modifiable(&self, user: &Profile, id: Uuid) -> Result<Visit, AppError> {
        let visit = self.get_visit(user, id).await?;
        if !user.role.is_privileged() && visit.user_id != Some(user.id) {
            return Err(AppError::Forbidden);
        }
        Ok(visit)
    }

    async fn notify_new_visit(&self, visit: &Visit, recipients: &[Uuid]) {
        let event = NewVisitEvent {
            visit_id: visit.id,
            salesperson_name: visit.salesperson_name.clone(),
            client_name: visit.client_name.clone(),
            created_at: visit.created_at,
        };
        self.hub.publish(event, recipients).await;
    }
}

// =========================================================================
//  FUNÇÕES PURAS
// =========================================================================

/// Mantém só os campos que se aplicam à categoria do cliente.
pub fn prune_details(category: ClientCategory, details: Value) -> Result<Value, AppError> {
    match details {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(map) => Ok(Value::Object(
            map.into_iter()
                .filter(|(key, _)| category.accepts_detail(key))
                .collect(),
        )),
        _ => Err(AppError::DetailsNotObject),
    }
}

/// Aplica os filtros de tela e monta as opções de vendedor/cidade
/// a partir do conjunto completo (antes do filtro).
pub fn filter_visits(visits: Vec<Visit>, query: &VisitListQuery) -> VisitListResponse {
    let salespeople: BTreeSet<String> = visits.iter().map(|v| v.salesperson_name.clone()).collect();
    let cities: BTreeSet<String> = visits.iter().filter_map(|v| v.region.clone()).collect();

    VisitListResponse {
        visits: visits.into_iter().filter(|v| query.matches(v)).collect(),
        salespeople: salespeople.into_iter().collect(),
        cities: cities.into_iter().collect(),
    }
}

/// `visits` deve vir ordenado da mais recente para a mais antiga.
pub fn summarize_home(visits: Vec<Visit>, today: NaiveDate) -> HomeSummary {
    let month_start = today.with_day(1).unwrap_or(today);

    let today_count = visits.iter().filter(|v| v.visit_date == today).count();
    let month = visits.iter().filter(|v| v.visit_date >= month_start).count();
    let pending = visits
        .iter()
        .filter(|v| v.result == VisitResult::Partial)
        .count();

    HomeSummary {
        today: today_count,
        month,
        pending,
        recent: visits.into_iter().take(RECENT_VISITS).collect(),
    }
}

/// Primeiro e último dia de um mês "AAAA-MM".
pub fn month_bounds(month: &str) -> Result<(NaiveDate, NaiveDate), AppError> {
    let start = NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidMonth)?;
    let next = start
        .checked_add_months(chrono::Months::new(1))
        .ok_or(AppError::InvalidMonth)?;
    let end = next.pred_opt().ok_or(AppError::InvalidMonth)?;
    Ok((start, end))
}

fn parse_legacy_date(raw: &str) -> Result<NaiveDate, AppError> {
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .ok_or(AppError::InvalidDate)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::visit::tests::visit;
    use serde_json::json;

    #[test]
    fn details_are_pruned_to_the_category() {
        let details = json!({
            "flag": "Ipiranga",
            "opportunity": "Sim",
            "vehicle_qty": 12,
            "competitor": "Shell"
        });

        let pruned = prune_details(ClientCategory::FuelStation, details).unwrap();

        assert_eq!(pruned, json!({ "flag": "Ipiranga", "opportunity": "Sim", "competitor": "Shell" }));
    }

    #[test]
    fn null_details_become_empty_and_arrays_are_rejected() {
        assert_eq!(prune_details(ClientCategory::Other, Value::Null).unwrap(), json!({}));
        assert!(matches!(
            prune_details(ClientCategory::Other, json!(["x"])),
            Err(AppError::DetailsNotObject)
        ));
    }

    #[test]
    fn facets_come_from_the_unfiltered_set() {
        let visits = vec![
            visit("Posto A", "Ricardo", "Belo Horizonte-MG", "2025-03-10"),
            visit("Posto B", "Ana", "Nova Lima-MG", "2025-03-11"),
            visit("Posto C", "Ricardo", "Nova Lima-MG", "2025-03-12"),
        ];
        let query = VisitListQuery { salesperson: Some("Ana".into()), ..Default::default() };

        let response = filter_visits(visits, &query);

        assert_eq!(response.visits.len(), 1);
        assert_eq!(response.salespeople, vec!["Ana", "Ricardo"]);
        assert_eq!(response.cities, vec!["Belo Horizonte-MG", "Nova Lima-MG"]);
    }

    #[test]
    fn home_summary_counts_today_month_and_pending() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let mut partial = visit("A", "R", "X", "2025-03-15");
        partial.result = VisitResult::Partial;
        let visits = vec![
            partial,
            visit("B", "R", "X", "2025-03-15"),
            visit("C", "R", "X", "2025-03-02"),
            visit("D", "R", "X", "2025-02-27"),
        ];

        let summary = summarize_home(visits, today);

        assert_eq!(summary.today, 2);
        assert_eq!(summary.month, 3);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.recent.len(), 3);
        assert_eq!(summary.recent[0].client_name, "A");
    }

    #[test]
    fn month_bounds_handle_short_months_and_bad_input() {
        let (start, end) = month_bounds("2024-02").unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, december_end) = month_bounds("2025-12").unwrap();
        assert_eq!(december_end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());

        assert!(matches!(month_bounds("2025-13"), Err(AppError::InvalidMonth)));
        assert!(matches!(month_bounds("março"), Err(AppError::InvalidMonth)));
    }

    #[test]
    fn legacy_dates_accept_timestamps() {
        assert_eq!(
            parse_legacy_date("2025-03-10T09:00:00.000Z").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert!(matches!(parse_legacy_date("10/03/2025"), Err(AppError::InvalidDate)));
    }
}
