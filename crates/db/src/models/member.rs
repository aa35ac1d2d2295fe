use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MemberRole {
    Admin,
    #[default]
    Member,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Member {
    pub id: Uuid,
    pub household_id: Uuid,
    pub display_name: String,
    pub role: MemberRole,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct JoinHousehold {
    pub invite_code: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateMember {
    pub display_name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SetMemberRole {
    pub role: MemberRole,
}

impl Member {
    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_in_household(
        pool: &SqlitePool,
        household_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1 AND household_id = $2")
            .bind(id)
            .bind(household_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            "SELECT * FROM members WHERE household_id = $1 ORDER BY created_at ASC",
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_admins(pool: &SqlitePool, household_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM members WHERE household_id = $1 AND role = 'admin'",
        )
        .bind(household_id)
        .fetch_one(pool)
        .await
    }

    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        household_id: Uuid,
        display_name: &str,
        role: MemberRole,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Member>(
            r#"INSERT INTO members (id, household_id, display_name, role)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(id)
        .bind(household_id)
        .bind(display_name)
        .bind(role)
        .fetch_one(executor)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        display_name: &str,
        color: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"UPDATE members
               SET display_name = $2, color = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(display_name)
        .bind(color)
        .fetch_one(pool)
        .await
    }

    pub async fn update_role(
        pool: &SqlitePool,
        id: Uuid,
        role: MemberRole,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"UPDATE members
               SET role = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(role)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert_full<'e, E>(executor: E, member: &Member) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO members (id, household_id, display_name, role, color, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(member.id)
        .bind(member.household_id)
        .bind(&member.display_name)
        .bind(member.role)
        .bind(&member.color)
        .bind(crate::sql_timestamp(&member.created_at))
        .bind(crate::sql_timestamp(&member.updated_at))
        .execute(executor)
        .await?;
        Ok(())
    }
}
