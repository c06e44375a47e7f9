// src/services/notification_service.rs

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::models::notification::{NewVisitEvent, Notification, NotificationKind};

const CHANNEL_CAPACITY: usize = 64;
/// Notificações guardadas por usuário; as mais antigas saem primeiro.
pub const MAX_INBOX: usize = 50;

/// Notificações de novas visitas.
///
/// Duas saídas para o mesmo evento: um canal `broadcast` para os WebSockets
/// abertos e uma caixa de entrada em memória por usuário, que o front consulta
/// ao carregar. Nada aqui é persistido.
pub struct NotificationHub {
    sender: broadcast::Sender<NewVisitEvent>,
    inboxes: RwLock<HashMap<Uuid, Vec<Notification>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            inboxes: RwLock::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NewVisitEvent> {
        self.sender.subscribe()
    }

    /// Entrega o evento para os sockets e para a caixa de cada destinatário.
    pub async fn publish(&self, event: NewVisitEvent, recipients: &[Uuid]) {
        let message = event.message();

        {
            let mut inboxes = self.inboxes.write().await;
            for user_id in recipients {
                let notification = Notification {
                    id: Uuid::new_v4(),
                    message: message.clone(),
                    timestamp: Utc::now(),
                    read: false,
                    kind: NotificationKind::Visit,
                };
                // Mais recente primeiro
                let inbox = inboxes.entry(*user_id).or_default();
                inbox.insert(0, notification);
                inbox.truncate(MAX_INBOX);
            }
        }

        // Sem sockets abertos o send falha; a caixa de entrada já guardou tudo
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::debug!(recipients = recipients.len(), sockets = delivered, "🔔 Nova visita publicada");
    }

    pub async fn list(&self, user_id: Uuid) -> Vec<Notification> {
        self.inboxes
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn unread_count(&self, user_id: Uuid) -> usize {
        self.inboxes
            .read()
            .await
            .get(&user_id)
            .map(|list| list.iter().filter(|n| !n.read).count())
            .unwrap_or(0)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) {
        if let Some(list) = self.inboxes.write().await.get_mut(&user_id) {
            list.iter_mut().for_each(|n| n.read = true);
        }
    }

    /// Retorna `false` se a notificação não existe para esse usuário.
    pub async fn dismiss(&self, user_id: Uuid, notification_id: Uuid) -> bool {
        let mut inboxes = self.inboxes.write().await;
        let Some(list) = inboxes.get_mut(&user_id) else {
            return false;
        };
        let before = list.len();
        list.retain(|n| n.id != notification_id);
        list.len() != before
    }

    pub async fn clear(&self, user_id: Uuid) {
        self.inboxes.write().await.remove(&user_id);
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(salesperson: &str, client: &str) -> NewVisitEvent {
        NewVisitEvent {
            visit_id: Uuid::new_v4(),
            salesperson_name: salesperson.into(),
            client_name: client.into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_fills_only_recipient_inboxes() {
        let hub = NotificationHub::new();
        let manager = Uuid::new_v4();
        let salesperson = Uuid::new_v4();

        hub.publish(event("Ricardo Mendes", "Posto Central"), &[manager]).await;

        let inbox = hub.list(manager).await;
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].message, "Nova visita: Ricardo Mendes em Posto Central");
        assert!(!inbox[0].read);
        assert!(hub.list(salesperson).await.is_empty());
    }

    #[tokio::test]
    async fn newest_notification_comes_first() {
        let hub = NotificationHub::new();
        let user = Uuid::new_v4();

        hub.publish(event("A", "primeiro"), &[user]).await;
        hub.publish(event("A", "segundo"), &[user]).await;

        let inbox = hub.list(user).await;
        assert!(inbox[0].message.ends_with("segundo"));
        assert_eq!(hub.unread_count(user).await, 2);
    }

    #[tokio::test]
    async fn mark_read_and_dismiss() {
        let hub = NotificationHub::new();
        let user = Uuid::new_v4();
        hub.publish(event("A", "x"), &[user]).await;
        hub.publish(event("A", "y"), &[user]).await;

        hub.mark_all_read(user).await;
        assert_eq!(hub.unread_count(user).await, 0);

        let first = hub.list(user).await[0].id;
        assert!(hub.dismiss(user, first).await);
        assert!(!hub.dismiss(user, first).await);
        assert_eq!(hub.list(user).await.len(), 1);

        hub.clear(user).await;
        assert!(hub.list(user).await.is_empty());
    }

    #[tokio::test]
    async fn inbox_keeps_only_the_newest_notifications() {
        let hub = NotificationHub::new();
        let user = Uuid::new_v4();

        for i in 0..MAX_INBOX + 10 {
            hub.publish(event("A", &format!("cliente {i}")), &[user]).await;
        }

        let inbox = hub.list(user).await;
        assert_eq!(inbox.len(), MAX_INBOX);
        assert_eq!(inbox[0].message, format!("Nova visita: A em cliente {}", MAX_INBOX + 9));
        assert_eq!(hub.unread_count(user).await, MAX_INBOX);
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let hub = NotificationHub::new();
        let mut rx = hub.subscribe();

        hub.publish(event("Ana", "Frota Sul"), &[]).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.client_name, "Frota Sul");
    }

    #[tokio::test]
    async fn publish_without_sockets_does_not_fail() {
        let hub = NotificationHub::new();
        let user = Uuid::new_v4();

        hub.publish(event("A", "x"), &[user]).await;

        assert_eq!(hub.unread_count(user).await, 1);
    }
}
