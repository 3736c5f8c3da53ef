//! Transient user notifications ("toasts"), carried across one redirect in the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

const NOTIFICATIONS_KEY: &str = "notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    /// CSS class used by the toast stack.
    pub fn css_class(&self) -> &'static str {
        match self.level {
            Level::Success => "toast toast-success",
            Level::Error => "toast toast-error",
            Level::Info => "toast toast-info",
        }
    }
}

/// Queues a notification for the next rendered page.
///
/// A session failure here is logged and swallowed: losing a toast must never fail
/// the operation that produced it.
pub async fn push(session: &Session, notification: Notification) {
    let mut pending: Vec<Notification> = session
        .get(NOTIFICATIONS_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.push(notification);
    if let Err(e) = session.insert(NOTIFICATIONS_KEY, pending).await {
        tracing::warn!("Failed to queue notification: {e}");
    }
}

/// Takes every queued notification, leaving the queue empty.
pub async fn drain(session: &Session) -> Vec<Notification> {
    match session.remove::<Vec<Notification>>(NOTIFICATIONS_KEY).await {
        Ok(pending) => pending.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read notifications: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    #[tokio::test]
    async fn test_drain_returns_in_order_then_empties() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        push(&session, Notification::success("Document deleted successfully")).await;
        push(&session, Notification::error("Failed to load documents")).await;

        let drained = drain(&session).await;
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, Level::Success);
        assert_eq!(drained[1].message, "Failed to load documents");
        assert!(drain(&session).await.is_empty());
    }
}
