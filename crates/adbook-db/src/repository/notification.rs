//! # Notification Outbox Repository
//!
//! Fire-and-forget events for the external notification dispatcher.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outbox Pattern Implementation                        │
//! │                                                                         │
//! │  ENGINE OPERATION (e.g., reject order)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Core state transition commits (order, holds, counters)             │
//! │  2. queue() inserts the notification row  ← best-effort, outside       │
//! │     the core transaction: a failed insert is logged, never rolls       │
//! │     the decision back                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  EXTERNAL DISPATCHER (email/SMS/push, out of scope)                    │
//! │  1. list_pending() → undelivered rows, oldest first                    │
//! │  2. deliver, then mark_delivered()                                     │
//! │  3. failures retry on the next drain - rows are never lost             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use adbook_core::{Notification, NotificationKind, DEFAULT_TENANT_ID};

/// Repository for the notification outbox.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Queues a notification for delivery.
    pub async fn queue(
        &self,
        recipient_id: &str,
        kind: NotificationKind,
        title: &str,
        message: &str,
        related_id: Option<&str>,
        related_type: Option<&str>,
    ) -> DbResult<Notification> {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            recipient_id: recipient_id.to_string(),
            kind,
            title: title.to_string(),
            message: message.to_string(),
            related_id: related_id.map(str::to_string),
            related_type: related_type.map(str::to_string),
            created_at: Utc::now(),
            delivered_at: None,
        };

        debug!(
            recipient_id = %recipient_id,
            kind = ?kind,
            "Queuing notification"
        );

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, tenant_id, recipient_id, kind, title, message,
                related_id, related_type, created_at, delivered_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.tenant_id)
        .bind(&notification.recipient_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.related_id.as_deref())
        .bind(notification.related_type.as_deref())
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(notification)
    }

    /// Undelivered notifications, oldest first. The external dispatcher
    /// drains this.
    pub async fn list_pending(&self, limit: u32) -> DbResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, tenant_id, recipient_id, kind, title, message,
                   related_id, related_type, created_at, delivered_at
            FROM notifications
            WHERE delivered_at IS NULL
            ORDER BY created_at ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// All notifications ever queued for a recipient, oldest first.
    pub async fn list_for_recipient(&self, recipient_id: &str) -> DbResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, tenant_id, recipient_id, kind, title, message,
                   related_id, related_type, created_at, delivered_at
            FROM notifications
            WHERE recipient_id = ?1
            ORDER BY created_at ASC
            "#,
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Marks a notification as delivered.
    pub async fn mark_delivered(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query("UPDATE notifications SET delivered_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Counts undelivered notifications.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE delivered_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_queue_and_drain() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.notifications();

        let queued = repo
            .queue(
                "approver-1",
                NotificationKind::ApprovalRequested,
                "Order pending approval",
                "Order IO-20260823-4F2A1C is waiting for your approval",
                Some("o-1"),
                Some("order"),
            )
            .await
            .unwrap();

        assert_eq!(repo.count_pending().await.unwrap(), 1);

        let pending = repo.list_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, NotificationKind::ApprovalRequested);

        repo.mark_delivered(&queued.id).await.unwrap();
        assert_eq!(repo.count_pending().await.unwrap(), 0);

        let history = repo.list_for_recipient("approver-1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].delivered_at.is_some());
    }
}
