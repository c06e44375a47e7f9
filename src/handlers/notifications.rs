// src/handlers/notifications.rs

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures::{Sink, SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Privileged, RequireRole},
    },
    models::{
        auth::Profile,
        notification::{NotificationList, NewVisitEvent},
    },
    services::{auth::AuthService, notification_service::NotificationHub},
};

// GET /api/notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    responses(
        (status = 200, description = "Notificações do usuário", body = NotificationList),
        (status = 403, description = "Apenas gestores e administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    _guard: RequireRole<Privileged>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> impl IntoResponse {
    let hub = &app_state.notification_hub;
    let notifications = hub.list(user.id).await;
    let unread_count = hub.unread_count(user.id).await;

    Json(NotificationList { notifications, unread_count })
}

// POST /api/notifications/read
#[utoipa::path(
    post,
    path = "/api/notifications/read",
    tag = "Notifications",
    responses((status = 204, description = "Todas marcadas como lidas")),
    security(("api_jwt" = []))
)]
pub async fn mark_all_read(
    State(app_state): State<AppState>,
    _guard: RequireRole<Privileged>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> impl IntoResponse {
    app_state.notification_hub.mark_all_read(user.id).await;
    StatusCode::NO_CONTENT
}

// DELETE /api/notifications/{id}
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "ID da notificação")),
    responses(
        (status = 204, description = "Notificação dispensada"),
        (status = 404, description = "Notificação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn dismiss_notification(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Privileged>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !app_state.notification_hub.dismiss(user.id, id).await {
        return Err(AppError::NotificationNotFound.to_api_error(&locale, &app_state.i18n_store));
    }
    Ok(StatusCode::NO_CONTENT)
}

// DELETE /api/notifications
#[utoipa::path(
    delete,
    path = "/api/notifications",
    tag = "Notifications",
    responses((status = 204, description = "Todas dispensadas")),
    security(("api_jwt" = []))
)]
pub async fn clear_notifications(
    State(app_state): State<AppState>,
    _guard: RequireRole<Privileged>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> impl IntoResponse {
    app_state.notification_hub.clear(user.id).await;
    StatusCode::NO_CONTENT
}

// =============================================================================
//  WEBSOCKET
// =============================================================================

// O navegador não manda cabeçalhos no handshake: o token vem na query
#[derive(Debug, Deserialize, IntoParams)]
pub struct WsAuthQuery {
    pub token: String,
}

// GET /api/notifications/ws?token=
#[utoipa::path(
    get,
    path = "/api/notifications/ws",
    tag = "Notifications",
    params(WsAuthQuery),
    responses(
        (status = 101, description = "Conexão WebSocket aberta"),
        (status = 401, description = "Token inválido"),
        (status = 403, description = "Apenas gestores e administradores")
    )
)]
pub async fn notifications_ws(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .auth_service
        .validate_token(&query.token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if !user.role.is_privileged() {
        return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
    }

    let hub = app_state.notification_hub.clone();
    let auth_service = app_state.auth_service.clone();
    let token = query.token;
    Ok(ws.on_upgrade(move |socket| stream_events(socket, hub, auth_service, token, user)))
}

async fn stream_events(
    socket: WebSocket,
    hub: Arc<NotificationHub>,
    auth_service: AuthService,
    token: String,
    user: Profile,
) {
    let (sender, mut receiver) = socket.split();
    let events = hub.subscribe();

    tracing::debug!(user_id = %user.id, "🔌 WebSocket de notificações aberto");

    // 1. Repassa os eventos do hub enquanto a sessão continuar válida
    let session_check = move || {
        let auth_service = auth_service.clone();
        let token = token.clone();
        async move { session_still_valid(auth_service.validate_token(&token).await) }
    };
    let mut send_task = tokio::spawn(forward_events(sender, events, SESSION_RECHECK, session_check));

    // 2. Consome o que o cliente manda até ele fechar
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    // 3. Quem terminar primeiro encerra o outro
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::debug!(user_id = %user.id, "🔌 WebSocket de notificações fechado");
}

/// Intervalo entre as revalidações do token de um socket aberto.
const SESSION_RECHECK: Duration = Duration::from_secs(60);

// Logout, troca de senha, desativação ou rebaixamento encerram o socket.
// Falha de banco não derruba ninguém: tenta de novo no próximo intervalo.
fn session_still_valid(result: Result<Profile, AppError>) -> bool {
    match result {
        Ok(user) => user.role.is_privileged(),
        Err(AppError::InvalidToken | AppError::InactiveAccount) => false,
        Err(e) => {
            tracing::warn!("Revalidação do WebSocket falhou: {:?}", e);
            true
        }
    }
}

async fn forward_events<S, F, Fut>(
    mut sink: S,
    mut events: broadcast::Receiver<NewVisitEvent>,
    period: Duration,
    mut still_valid: F,
) where
    S: Sink<Message> + Unpin,
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let mut recheck = tokio::time::interval(period);
    // O primeiro tick é imediato; a sessão acabou de ser validada
    recheck.tick().await;

    loop {
        tokio::select! {
            received = events.recv() => {
                let event = match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "WebSocket atrasado, eventos descartados");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let Ok(text) = serde_json::to_string(&event) else {
                    continue;
                };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            _ = recheck.tick() => {
                if !still_valid().await {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{auth::Role, profile::tests::profile};
    use chrono::Utc;
    use futures::channel::mpsc;

    fn event(client: &str) -> NewVisitEvent {
        NewVisitEvent {
            visit_id: Uuid::new_v4(),
            salesperson_name: "Ricardo Mendes".into(),
            client_name: client.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn revoked_sessions_end_but_database_hiccups_do_not() {
        let manager = profile("Ana Silva", "ana@visitlog.com", Role::Manager);
        let salesperson = profile("Ricardo Mendes", "ricardo@visitlog.com", Role::Salesperson);

        assert!(session_still_valid(Ok(manager)));
        assert!(!session_still_valid(Ok(salesperson)));
        assert!(!session_still_valid(Err(AppError::InvalidToken)));
        assert!(!session_still_valid(Err(AppError::InactiveAccount)));
        assert!(session_still_valid(Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))));
    }

    #[tokio::test]
    async fn events_are_forwarded_as_json_text() {
        let hub = NotificationHub::new();
        let events = hub.subscribe();
        let (sink, mut outbox) = mpsc::unbounded::<Message>();

        let task = tokio::spawn(forward_events(sink, events, Duration::from_secs(3600), || async { true }));
        hub.publish(event("Posto Central"), &[]).await;

        let Some(Message::Text(text)) = outbox.next().await else {
            panic!("esperava uma mensagem de texto");
        };
        let body: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(body["clientName"], "Posto Central");

        task.abort();
    }

    #[tokio::test]
    async fn socket_is_closed_once_the_session_is_revoked() {
        let hub = NotificationHub::new();
        let events = hub.subscribe();
        let (sink, mut outbox) = mpsc::unbounded::<Message>();

        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            forward_events(sink, events, Duration::from_millis(10), || async { false }),
        )
        .await;

        assert!(finished.is_ok(), "o repasse deveria terminar sozinho");
        assert!(matches!(outbox.next().await, Some(Message::Close(None))));
    }
}
