// src/db/visit_repo.rs

use chrono::NaiveDate;
use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::visit::{ClientCategory, SortOrder, Visit, VisitResult, VisitScope, VisitType},
};

// Visita + colunas do cliente. A região da visita (GPS) tem prioridade
// sobre a região cadastrada do cliente.
const VISIT_SELECT: &str = r#"
    SELECT
        v.id, v.user_id, v.salesperson_name,
        v.client_id, c.name AS client_name, c.tax_id AS client_tax_id,
        v.client_category,
        COALESCE(v.region, c.region) AS region,
        v.visit_date, v.visit_type, v.result, v.summary, v.details,
        v.latitude, v.longitude, v.created_at, v.updated_at
    FROM visits v
    JOIN clients c ON c.id = v.client_id
"#;

// Argumentos de inserção (já validados pelo serviço)
#[derive(Debug)]
pub struct NewVisit<'a> {
    pub user_id: Option<Uuid>,
    pub salesperson_name: &'a str,
    pub client_id: Uuid,
    pub client_category: ClientCategory,
    pub region: Option<&'a str>,
    pub visit_date: NaiveDate,
    pub visit_type: VisitType,
    pub result: VisitResult,
    pub summary: Option<&'a str>,
    pub details: &'a Value,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Clone)]
pub struct VisitRepository {
    pool: PgPool,
}

impl VisitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, visit: &NewVisit<'_>) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO visits (
                user_id, salesperson_name, client_id, client_category, region,
                visit_date, visit_type, result, summary, details, latitude, longitude
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(visit.user_id)
        .bind(visit.salesperson_name)
        .bind(visit.client_id)
        .bind(visit.client_category)
        .bind(visit.region)
        .bind(visit.visit_date)
        .bind(visit.visit_type)
        .bind(visit.result)
        .bind(visit.summary)
        .bind(visit.details)
        .bind(visit.latitude)
        .bind(visit.longitude)
        .fetch_one(executor)
        .await?;

        Ok(id)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Visit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{VISIT_SELECT} WHERE v.id = $1");
        let visit = sqlx::query_as::<_, Visit>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(visit)
    }

    /// Lista as visitas do escopo, opcionalmente a partir de uma data.
    pub async fn list(
        &self,
        scope: VisitScope,
        since: Option<NaiveDate>,
        order: SortOrder,
    ) -> Result<Vec<Visit>, AppError> {
        let direction = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let sql = format!(
            r#"
            {VISIT_SELECT}
            WHERE ($1::uuid IS NULL OR v.user_id = $1)
              AND ($2::date IS NULL OR v.visit_date >= $2)
            ORDER BY v.visit_date {direction}, v.created_at {direction}
            "#
        );

        let visits = sqlx::query_as::<_, Visit>(&sql)
            .bind(scope.owner())
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        Ok(visits)
    }

    /// Total de visitas e de clientes distintos, sem janela de datas.
    pub async fn count_totals(&self) -> Result<(i64, i64), AppError> {
        let totals = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(DISTINCT client_id) FROM visits",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    pub async fn count_for_user_between(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM visits
            WHERE user_id = $1 AND visit_date >= $2 AND visit_date <= $3
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn update(
        &self,
        id: Uuid,
        visit_date: NaiveDate,
        visit_type: VisitType,
        result: VisitResult,
        summary: Option<&str>,
        details: &Value,
    ) -> Result<bool, AppError> {
        let outcome = sqlx::query(
            r#"
            UPDATE visits
            SET visit_date = $2, visit_type = $3, result = $4, summary = $5,
                details = $6, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(visit_date)
        .bind(visit_type)
        .bind(result)
        .bind(summary)
        .bind(details)
        .execute(&self.pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let outcome = sqlx::query("DELETE FROM visits WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(outcome.rows_affected() > 0)
    }
}
