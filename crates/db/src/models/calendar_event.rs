use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub household_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCalendarEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateCalendarEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
}

impl CalendarEvent {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CalendarEvent>("SELECT * FROM calendar_events WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CalendarEvent>(
            "SELECT * FROM calendar_events WHERE household_id = $1 ORDER BY starts_at ASC",
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    /// Events that start before `to` and have not ended before `from`.
    pub async fn find_between(
        pool: &SqlitePool,
        household_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CalendarEvent>(
            r#"SELECT * FROM calendar_events
               WHERE household_id = $1
                 AND starts_at < $3
                 AND COALESCE(ends_at, starts_at) >= $2
               ORDER BY starts_at ASC"#,
        )
        .bind(household_id)
        .bind(crate::sql_timestamp(&from))
        .bind(crate::sql_timestamp(&to))
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        household_id: Uuid,
        data: &CreateCalendarEvent,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CalendarEvent>(
            r#"INSERT INTO calendar_events (id, household_id, title, description, location,
                                            starts_at, ends_at, all_day, created_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING *"#,
        )
        .bind(id)
        .bind(household_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.location)
        .bind(crate::sql_timestamp(&data.starts_at))
        .bind(data.ends_at.as_ref().map(crate::sql_timestamp))
        .bind(data.all_day)
        .bind(created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn save(pool: &SqlitePool, event: &CalendarEvent) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CalendarEvent>(
            r#"UPDATE calendar_events
               SET title = $2, description = $3, location = $4, starts_at = $5, ends_at = $6,
                   all_day = $7, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(crate::sql_timestamp(&event.starts_at))
        .bind(event.ends_at.as_ref().map(crate::sql_timestamp))
        .bind(event.all_day)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM calendar_events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert_full<'e, E>(executor: E, event: &CalendarEvent) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO calendar_events (id, household_id, title, description, location, starts_at,
                                            ends_at, all_day, created_by, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
        )
        .bind(event.id)
        .bind(event.household_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(crate::sql_timestamp(&event.starts_at))
        .bind(event.ends_at.as_ref().map(crate::sql_timestamp))
        .bind(event.all_day)
        .bind(event.created_by)
        .bind(crate::sql_timestamp(&event.created_at))
        .bind(crate::sql_timestamp(&event.updated_at))
        .execute(executor)
        .await?;
        Ok(())
    }
}
