use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// `task_id` cannot be completed before `depends_on_id` is satisfied
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TaskDependency {
    pub task_id: Uuid,
    pub depends_on_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTaskDependency {
    pub depends_on_id: Uuid,
}

impl TaskDependency {
    pub async fn find_by_task_id(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskDependency>(
            "SELECT * FROM task_dependencies WHERE task_id = $1 ORDER BY created_at ASC",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Every link between tasks of the household.
    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskDependency>(
            r#"SELECT td.* FROM task_dependencies td
               JOIN tasks t ON t.id = td.task_id
               WHERE t.household_id = $1
               ORDER BY td.created_at ASC"#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    pub async fn exists(
        pool: &SqlitePool,
        task_id: Uuid,
        depends_on_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM task_dependencies WHERE task_id = $1 AND depends_on_id = $2",
        )
        .bind(task_id)
        .bind(depends_on_id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn create(
        pool: &SqlitePool,
        task_id: Uuid,
        depends_on_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskDependency>(
            r#"INSERT INTO task_dependencies (task_id, depends_on_id)
               VALUES ($1, $2)
               RETURNING *"#,
        )
        .bind(task_id)
        .bind(depends_on_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        task_id: Uuid,
        depends_on_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM task_dependencies WHERE task_id = $1 AND depends_on_id = $2")
                .bind(task_id)
                .bind(depends_on_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Drops links in both directions before the task row itself goes away.
    pub async fn delete_all_for_task<'e, E>(executor: E, task_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result =
            sqlx::query("DELETE FROM task_dependencies WHERE task_id = $1 OR depends_on_id = $1")
                .bind(task_id)
                .execute(executor)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert_full<'e, E>(executor: E, link: &TaskDependency) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            "INSERT INTO task_dependencies (task_id, depends_on_id, created_at) VALUES ($1, $2, $3)",
        )
        .bind(link.task_id)
        .bind(link.depends_on_id)
        .bind(crate::sql_timestamp(&link.created_at))
        .execute(executor)
        .await?;
        Ok(())
    }
}
