use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// What happened
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "activity_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
    Deleted,
    Joined,
    Left,
    Completed,
    Reopened,
    Checked,
    Unchecked,
    Requested,
    Approved,
    Rejected,
    Activated,
    Returned,
    Cancelled,
}

/// What it happened to
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "entity_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Household,
    Member,
    ShoppingList,
    ShoppingItem,
    Task,
    InventoryItem,
    BorrowRequest,
    CalendarEvent,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub household_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: ActivityAction,
    pub entity_kind: EntityKind,
    pub entity_id: Option<Uuid>,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
    /// Only entries strictly older than this timestamp.
    pub before: Option<DateTime<Utc>>,
    /// Only entries listed after this one (pagination cursor). Entries sharing
    /// its timestamp are ordered by insertion, so none are skipped.
    pub before_id: Option<Uuid>,
}

impl ActivityEntry {
    pub async fn create(
        pool: &SqlitePool,
        household_id: Uuid,
        actor_id: Option<Uuid>,
        action: ActivityAction,
        entity_kind: EntityKind,
        entity_id: Option<Uuid>,
        summary: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ActivityEntry>(
            r#"INSERT INTO activity_log (id, household_id, actor_id, action, entity_kind, entity_id, summary)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(household_id)
        .bind(actor_id)
        .bind(action)
        .bind(entity_kind)
        .bind(entity_id)
        .bind(summary)
        .fetch_one(pool)
        .await
    }

    /// Newest first, ties broken by insertion order.
    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
        limit: i64,
        query: &ActivityQuery,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityEntry>(
            r#"SELECT * FROM activity_log
               WHERE household_id = $1
                 AND ($2 IS NULL OR created_at < $2)
                 AND ($3 IS NULL OR (created_at, rowid) <
                      (SELECT created_at, rowid FROM activity_log
                       WHERE id = $3 AND household_id = $1))
               ORDER BY created_at DESC, rowid DESC
               LIMIT $4"#,
        )
        .bind(household_id)
        .bind(query.before.as_ref().map(crate::sql_timestamp))
        .bind(query.before_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn find_all_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityEntry>(
            "SELECT * FROM activity_log WHERE household_id = $1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    pub async fn insert_full<'e, E>(executor: E, entry: &ActivityEntry) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO activity_log (id, household_id, actor_id, action, entity_kind, entity_id, summary, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(entry.id)
        .bind(entry.household_id)
        .bind(entry.actor_id)
        .bind(entry.action)
        .bind(entry.entity_kind)
        .bind(entry.entity_id)
        .bind(&entry.summary)
        .bind(crate::sql_timestamp(&entry.created_at))
        .execute(executor)
        .await?;
        Ok(())
    }
}
