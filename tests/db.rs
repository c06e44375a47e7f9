//! Testes que precisam de um Postgres de verdade (DATABASE_URL).
//!
//! Cada teste recebe um banco novo com as migrações aplicadas.

mod common;

use chrono::{Duration, Utc};
use serde_json::json;
use small_checklist::{
    common::error::AppError,
    config::AppState,
    db::{seed, ClientRepository, UserRepository},
    models::{
        auth::{Profile, Role},
        legacy::LegacyCreateVisit,
        profile::CreateUserPayload,
        visit::{ClientCategory, CreateVisitPayload, UpdateVisitPayload},
    },
    services::auth::hash_password,
};
use sqlx::PgPool;

async fn seed_user(pool: &PgPool, email: &str, name: &str, role: Role) -> Profile {
    let hash = hash_password("Senha@123").await.expect("hash");
    UserRepository::new(pool.clone())
        .create_user(pool, email, &hash, name, role)
        .await
        .expect("profile")
}

fn state_for(pool: &PgPool) -> AppState {
    AppState::from_pool(pool.clone(), common::test_config()).expect("app state")
}

fn visit_payload(client: &str, category: &str, details: serde_json::Value) -> CreateVisitPayload {
    serde_json::from_value(json!({
        "clientName": client,
        "clientCategory": category,
        "region": "Campinas",
        "visitDate": Utc::now().date_naive(),
        "visitType": "prospeccao",
        "result": "alcancado",
        "details": details,
    }))
    .expect("payload")
}

fn legacy_payload(client: &str, date: chrono::NaiveDate) -> LegacyCreateVisit {
    serde_json::from_value(json!({
        "client_name": client,
        "date": date.to_string(),
        "type": "NEGOCIACAO",
        "result": "PARCIAL",
        "volume": 1200.0,
    }))
    .expect("legacy payload")
}

#[sqlx::test(migrations = "./migrations")]
async fn editing_an_old_visit_keeps_its_own_category(pool: PgPool) {
    let state = state_for(&pool);
    let seller = seed_user(&pool, "vendedor@teste.com", "Vendedor", Role::Salesperson).await;

    let first = state
        .visit_service
        .create_visit(
            &seller,
            visit_payload("Posto Central", "posto", json!({ "flag": "Ipiranga", "opportunity": "alta" })),
        )
        .await
        .expect("first visit");

    // O cliente muda de categoria depois da primeira visita
    state
        .visit_service
        .create_visit(&seller, visit_payload("Posto Central", "transporte", json!({ "vehicle_qty": 12 })))
        .await
        .expect("second visit");

    let update: UpdateVisitPayload = serde_json::from_value(json!({
        "visitDate": first.visit_date,
        "visitType": "negociacao",
        "result": "parcial",
        "details": { "flag": "Ipiranga", "opportunity": "alta", "vehicle_qty": 3 },
    }))
    .expect("update payload");

    let updated = state
        .visit_service
        .update_visit(&seller, first.id, update)
        .await
        .expect("update");

    assert_eq!(updated.client_category, ClientCategory::FuelStation);
    assert_eq!(updated.details, json!({ "flag": "Ipiranga", "opportunity": "alta" }));
}

#[sqlx::test(migrations = "./migrations")]
async fn failed_reset_token_rolls_back_the_new_user(pool: PgPool) {
    let state = state_for(&pool);
    sqlx::query("DROP TABLE password_resets")
        .execute(&pool)
        .await
        .expect("drop table");

    let payload = CreateUserPayload {
        full_name: "Nova Vendedora".into(),
        email: "nova@teste.com".into(),
        role: None,
    };
    let result = state.user_service.create_user(payload).await;
    assert!(matches!(result, Err(AppError::DatabaseError(_))));

    let (profiles,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE email = $1")
        .bind("nova@teste.com")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(profiles, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn created_user_gets_a_reset_token(pool: PgPool) {
    let state = state_for(&pool);
    let payload = CreateUserPayload {
        full_name: "Nova Vendedora".into(),
        email: "Nova@Teste.com".into(),
        role: None,
    };
    let profile = state.user_service.create_user(payload).await.expect("user");
    assert_eq!(profile.email, "nova@teste.com");

    let (tokens,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM password_resets WHERE user_id = $1")
        .bind(profile.id)
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(tokens, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn every_new_visit_reaches_privileged_inboxes(pool: PgPool) {
    let state = state_for(&pool);
    seed_user(&pool, "admin@teste.com", "Admin", Role::Admin).await;
    let manager = seed_user(&pool, "gestor@teste.com", "Gestora", Role::Manager).await;
    let seller = seed_user(&pool, "vendedor@teste.com", "Vendedor", Role::Salesperson).await;
    let hub = state.notification_hub.clone();

    state
        .visit_service
        .create_legacy_visit(legacy_payload("Posto Antigo", Utc::now().date_naive()))
        .await
        .expect("legacy visit");
    assert_eq!(hub.list(manager.id).await.len(), 1);

    state
        .visit_service
        .create_visit(&seller, visit_payload("Posto Novo", "posto", json!({})))
        .await
        .expect("visit");
    assert_eq!(hub.unread_count(manager.id).await, 2);
    assert!(hub.list(seller.id).await.is_empty());

    // Gestor desativado perde a caixa de entrada
    state.user_service.toggle_active(manager.id).await.expect("toggle");
    assert!(hub.list(manager.id).await.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn legacy_totals_include_visits_outside_the_chart(pool: PgPool) {
    let state = state_for(&pool);
    seed_user(&pool, "admin@teste.com", "Admin", Role::Admin).await;
    let today = Utc::now().date_naive();

    for (client, date) in [
        ("Posto Antigo", today - Duration::days(90)),
        ("Posto Antigo", today - Duration::days(45)),
        ("Transportadora", today),
    ] {
        state
            .visit_service
            .create_legacy_visit(legacy_payload(client, date))
            .await
            .expect("legacy visit");
    }

    let stats = state.dashboard_service.get_legacy_stats(today).await.expect("stats");
    assert_eq!(stats.total_visits, 3);
    assert_eq!(stats.unique_clients, 2);
    assert_eq!(stats.visits_by_period.len(), 7);
}

#[sqlx::test(migrations = "./migrations")]
async fn demo_seed_users_can_log_in_once(pool: PgPool) {
    let state = state_for(&pool);
    let users = UserRepository::new(pool.clone());
    let clients = ClientRepository::new(pool.clone());

    assert!(seed::seed_demo(&users, &clients, &pool).await.expect("seed"));
    assert!(!seed::seed_demo(&users, &clients, &pool).await.expect("second seed"));

    let token = state
        .auth_service
        .login_user("ana@visitlog.com", seed::DEMO_PASSWORD)
        .await
        .expect("login");
    assert!(!token.is_empty());
}
