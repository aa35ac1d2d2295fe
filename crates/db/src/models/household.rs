use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateHousehold {
    pub name: String,
    /// Display name of the member creating the household; they become its admin.
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateHousehold {
    pub name: String,
}

impl Household {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Household>("SELECT * FROM households WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_invite_code(
        pool: &SqlitePool,
        invite_code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Household>("SELECT * FROM households WHERE invite_code = $1")
            .bind(invite_code)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Household>("SELECT * FROM households ORDER BY created_at ASC")
            .fetch_all(pool)
            .await
    }

    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        name: &str,
        invite_code: &str,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Household>(
            r#"INSERT INTO households (id, name, invite_code)
               VALUES ($1, $2, $3)
               RETURNING *"#,
        )
        .bind(id)
        .bind(name)
        .bind(invite_code)
        .fetch_one(executor)
        .await
    }

    pub async fn update_name(pool: &SqlitePool, id: Uuid, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Household>(
            r#"UPDATE households
               SET name = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(name)
        .fetch_one(pool)
        .await
    }

    pub async fn update_invite_code(
        pool: &SqlitePool,
        id: Uuid,
        invite_code: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Household>(
            r#"UPDATE households
               SET invite_code = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(invite_code)
        .fetch_one(pool)
        .await
    }

    /// Used by backup import; keeps the exported timestamps.
    pub async fn insert_full<'e, E>(executor: E, household: &Household) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO households (id, name, invite_code, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(household.id)
        .bind(&household.name)
        .bind(&household.invite_code)
        .bind(crate::sql_timestamp(&household.created_at))
        .bind(crate::sql_timestamp(&household.updated_at))
        .execute(executor)
        .await?;
        Ok(())
    }
}
