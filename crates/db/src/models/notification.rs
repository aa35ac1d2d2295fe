use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    BorrowRequested,
    BorrowApproved,
    BorrowRejected,
    BorrowCancelled,
    BorrowReturned,
    BorrowOverdue,
    TaskAssigned,
    TaskOverdue,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Notification {
    pub id: Uuid,
    pub household_id: Uuid,
    pub member_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: Option<String>,
    pub entity_id: Option<Uuid>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct NotificationSummary {
    pub unread: i64,
    pub notifications: Vec<Notification>,
}

impl Notification {
    pub async fn create(
        pool: &SqlitePool,
        household_id: Uuid,
        member_id: Uuid,
        kind: NotificationKind,
        title: &str,
        body: Option<&str>,
        entity_id: Option<Uuid>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"INSERT INTO notifications (id, household_id, member_id, kind, title, body, entity_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(household_id)
        .bind(member_id)
        .bind(kind)
        .bind(title)
        .bind(body)
        .bind(entity_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_for_member(
        pool: &SqlitePool,
        member_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"SELECT * FROM notifications
               WHERE member_id = $1 AND (NOT $2 OR read_at IS NULL)
               ORDER BY created_at DESC, rowid DESC
               LIMIT $3"#,
        )
        .bind(member_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE household_id = $1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_unread(pool: &SqlitePool, member_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE member_id = $1 AND read_at IS NULL",
        )
        .bind(member_id)
        .fetch_one(pool)
        .await
    }

    /// Whether a notification of `kind` about `entity_id` was already sent on `day` (UTC).
    pub async fn exists_for_day(
        pool: &SqlitePool,
        member_id: Uuid,
        kind: NotificationKind,
        entity_id: Uuid,
        day: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM notifications
               WHERE member_id = $1 AND kind = $2 AND entity_id = $3
                 AND date(created_at) = $4"#,
        )
        .bind(member_id)
        .bind(kind)
        .bind(entity_id)
        .bind(day)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn mark_read(
        pool: &SqlitePool,
        id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"UPDATE notifications
               SET read_at = COALESCE(read_at, datetime('now', 'subsec'))
               WHERE id = $1 AND member_id = $2
               RETURNING *"#,
        )
        .bind(id)
        .bind(member_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn mark_all_read(pool: &SqlitePool, member_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE notifications
               SET read_at = datetime('now', 'subsec')
               WHERE member_id = $1 AND read_at IS NULL"#,
        )
        .bind(member_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert_full<'e, E>(executor: E, notification: &Notification) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO notifications (id, household_id, member_id, kind, title, body, entity_id, read_at, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
        )
        .bind(notification.id)
        .bind(notification.household_id)
        .bind(notification.member_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(notification.entity_id)
        .bind(notification.read_at.as_ref().map(crate::sql_timestamp))
        .bind(crate::sql_timestamp(&notification.created_at))
        .execute(executor)
        .await?;
        Ok(())
    }
}
