// src/services/dashboard_service.rs

use chrono::{Duration, NaiveDate};

use crate::{
    common::error::AppError,
    db::VisitRepository,
    models::{
        auth::Profile,
        dashboard::{DashboardStats, VisitRecord},
        legacy::{LegacyPeriod, LegacyStats},
        visit::{SortOrder, VisitScope},
    },
    services::aggregator,
};

/// Janela do dashboard, em dias.
pub const WINDOW_DAYS: i64 = 30;

#[derive(Clone)]
pub struct DashboardService {
    repo: VisitRepository,
}

impl DashboardService {
    pub fn new(repo: VisitRepository) -> Self {
        Self { repo }
    }

    pub async fn get_stats(&self, user: &Profile, today: NaiveDate) -> Result<DashboardStats, AppError> {
        self.stats_for_scope(VisitScope::for_user(user), today).await
    }

    // O shim antigo não tinha login: enxerga tudo. Os totais não têm janela;
    // só oportunidades e o histograma vêm dos últimos 30 dias.
    pub async fn get_legacy_stats(&self, today: NaiveDate) -> Result<LegacyStats, AppError> {
        let (total_visits, unique_clients) = self.repo.count_totals().await?;
        let windowed = self.stats_for_scope(VisitScope::All, today).await?;

        Ok(legacy_stats(total_visits, unique_clients, &windowed))
    }

    async fn stats_for_scope(&self, scope: VisitScope, today: NaiveDate) -> Result<DashboardStats, AppError> {
        let since = today - Duration::days(WINDOW_DAYS);
        let visits = self.repo.list(scope, Some(since), SortOrder::Desc).await?;

        let records: Vec<VisitRecord> = visits.iter().map(VisitRecord::from).collect();
        Ok(aggregator::aggregate(&records, today))
    }
}

pub fn legacy_stats(total_visits: i64, unique_clients: i64, windowed: &DashboardStats) -> LegacyStats {
    LegacyStats {
        total_visits: usize::try_from(total_visits).unwrap_or_default(),
        unique_clients: usize::try_from(unique_clients).unwrap_or_default(),
        opportunities: windowed.opportunities,
        visits_by_period: windowed.visits_by_period.iter().map(LegacyPeriod::from).collect(),
    }
}
