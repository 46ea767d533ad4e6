use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use super::types::Notification;

/// Live WebSocket connections per user. A user may have several tabs open.
#[derive(Clone, Default)]
pub struct NotificationHub {
    connections: Arc<RwLock<HashMap<i64, Vec<mpsc::UnboundedSender<String>>>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the receiving end for its socket task.
    pub fn subscribe(&self, user_id: i64) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut map = self.connections.write().unwrap_or_else(|e| e.into_inner());
        map.entry(user_id).or_default().push(tx);
        rx
    }

    /// Drop closed senders for `user_id`.
    pub fn prune(&self, user_id: i64) {
        let mut map = self.connections.write().unwrap_or_else(|e| e.into_inner());
        if let Some(senders) = map.get_mut(&user_id) {
            senders.retain(|s| !s.is_closed());
            if senders.is_empty() {
                map.remove(&user_id);
            }
        }
    }

    pub fn connection_count(&self, user_id: i64) -> usize {
        let map = self.connections.read().unwrap_or_else(|e| e.into_inner());
        map.get(&user_id).map_or(0, |s| s.iter().filter(|tx| !tx.is_closed()).count())
    }

    fn broadcast(&self, user_id: i64, message: String) {
        let map = self.connections.read().unwrap_or_else(|e| e.into_inner());
        if let Some(senders) = map.get(&user_id) {
            for sender in senders {
                let _ = sender.send(message.clone());
            }
        }
    }

    /// Push a new notification to every open connection of its user.
    pub fn notify(&self, notification: &Notification, unread_count: i64) {
        let msg = serde_json::json!({
            "type": "notification",
            "notification": notification,
            "unread_count": unread_count,
        });
        self.broadcast(notification.user_id, msg.to_string());
    }

    pub fn send_count_update(&self, user_id: i64, unread_count: i64) {
        let msg = serde_json::json!({
            "type": "count_update",
            "unread_count": unread_count,
        });
        self.broadcast(user_id, msg.to_string());
    }
}
