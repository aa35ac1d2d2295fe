//! In-app notifications for household members.

use db::models::notification::{Notification, NotificationKind, NotificationSummary};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

const LIST_LIMIT: i64 = 100;

/// Outgoing message to one member
#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub household_id: Uuid,
    pub member_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: Option<String>,
    pub entity_id: Option<Uuid>,
}

pub struct NotificationService;

impl NotificationService {
    /// Stores the notification. Delivery is best-effort; failures are logged.
    pub async fn notify(pool: &SqlitePool, message: NotificationMessage) {
        match Notification::create(
            pool,
            message.household_id,
            message.member_id,
            message.kind,
            &message.title,
            message.body.as_deref(),
            message.entity_id,
        )
        .await
        {
            Ok(notification) => info!(
                member_id = %notification.member_id,
                kind = %notification.kind,
                "Notification queued: {}",
                notification.title
            ),
            Err(e) => warn!(
                member_id = %message.member_id,
                kind = %message.kind,
                error = %e,
                "Failed to store notification"
            ),
        }
    }

    pub async fn summary(
        pool: &SqlitePool,
        member_id: Uuid,
        unread_only: bool,
    ) -> Result<NotificationSummary, sqlx::Error> {
        let unread = Notification::count_unread(pool, member_id).await?;
        let notifications =
            Notification::find_for_member(pool, member_id, unread_only, LIST_LIMIT).await?;
        Ok(NotificationSummary {
            unread,
            notifications,
        })
    }

    pub async fn mark_read(
        pool: &SqlitePool,
        member_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, sqlx::Error> {
        Notification::mark_read(pool, notification_id, member_id).await
    }

    pub async fn mark_all_read(pool: &SqlitePool, member_id: Uuid) -> Result<u64, sqlx::Error> {
        Notification::mark_all_read(pool, member_id).await
    }
}
