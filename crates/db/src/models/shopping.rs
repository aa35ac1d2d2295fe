use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ShoppingList {
    pub id: Uuid,
    pub household_id: Uuid,
    pub name: String,
    pub archived: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ShoppingItem {
    pub id: Uuid,
    pub list_id: Uuid,
    pub name: String,
    pub quantity: Option<String>,
    pub category: Option<String>,
    pub checked: bool,
    pub checked_by: Option<Uuid>,
    pub checked_at: Option<DateTime<Utc>>,
    pub added_by: Option<Uuid>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateShoppingList {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateShoppingList {
    pub name: Option<String>,
    pub archived: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateShoppingItem {
    pub name: String,
    pub quantity: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateShoppingItem {
    pub name: Option<String>,
    pub quantity: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SetItemChecked {
    pub checked: bool,
}

impl ShoppingList {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShoppingList>("SELECT * FROM shopping_lists WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
        include_archived: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShoppingList>(
            r#"SELECT * FROM shopping_lists
               WHERE household_id = $1 AND ($2 OR archived = 0)
               ORDER BY archived ASC, created_at DESC"#,
        )
        .bind(household_id)
        .bind(include_archived)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        household_id: Uuid,
        name: &str,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ShoppingList>(
            r#"INSERT INTO shopping_lists (id, household_id, name, created_by)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(id)
        .bind(household_id)
        .bind(name)
        .bind(created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        name: &str,
        archived: bool,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ShoppingList>(
            r#"UPDATE shopping_lists
               SET name = $2, archived = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(name)
        .bind(archived)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM shopping_lists WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert_full<'e, E>(executor: E, list: &ShoppingList) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO shopping_lists (id, household_id, name, archived, created_by, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(list.id)
        .bind(list.household_id)
        .bind(&list.name)
        .bind(list.archived)
        .bind(list.created_by)
        .bind(crate::sql_timestamp(&list.created_at))
        .bind(crate::sql_timestamp(&list.updated_at))
        .execute(executor)
        .await?;
        Ok(())
    }
}

impl ShoppingItem {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShoppingItem>("SELECT * FROM shopping_items WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Unchecked items first, then by position.
    pub async fn find_by_list_id(
        pool: &SqlitePool,
        list_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShoppingItem>(
            r#"SELECT * FROM shopping_items
               WHERE list_id = $1
               ORDER BY checked ASC, position ASC, created_at ASC"#,
        )
        .bind(list_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShoppingItem>(
            r#"SELECT si.* FROM shopping_items si
               JOIN shopping_lists sl ON sl.id = si.list_id
               WHERE sl.household_id = $1
               ORDER BY si.list_id, si.position"#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        list_id: Uuid,
        data: &CreateShoppingItem,
        added_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ShoppingItem>(
            r#"INSERT INTO shopping_items (id, list_id, name, quantity, category, added_by, position)
               VALUES ($1, $2, $3, $4, $5, $6,
                       (SELECT COALESCE(MAX(position), -1) + 1 FROM shopping_items WHERE list_id = $2))
               RETURNING *"#,
        )
        .bind(id)
        .bind(list_id)
        .bind(&data.name)
        .bind(&data.quantity)
        .bind(&data.category)
        .bind(added_by)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        name: &str,
        quantity: Option<&str>,
        category: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ShoppingItem>(
            r#"UPDATE shopping_items
               SET name = $2, quantity = $3, category = $4, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(name)
        .bind(quantity)
        .bind(category)
        .fetch_one(pool)
        .await
    }

    /// Checking records who and when; unchecking clears both.
    pub async fn set_checked(
        pool: &SqlitePool,
        id: Uuid,
        checked: bool,
        member_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ShoppingItem>(
            r#"UPDATE shopping_items
               SET checked = $2,
                   checked_by = CASE WHEN $2 THEN $3 ELSE NULL END,
                   checked_at = CASE WHEN $2 THEN datetime('now', 'subsec') ELSE NULL END,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(checked)
        .bind(member_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM shopping_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_checked(pool: &SqlitePool, list_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM shopping_items WHERE list_id = $1 AND checked = 1")
            .bind(list_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert_full<'e, E>(executor: E, item: &ShoppingItem) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO shopping_items
                   (id, list_id, name, quantity, category, checked, checked_by, checked_at,
                    added_by, position, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
        )
        .bind(item.id)
        .bind(item.list_id)
        .bind(&item.name)
        .bind(&item.quantity)
        .bind(&item.category)
        .bind(item.checked)
        .bind(item.checked_by)
        .bind(item.checked_at.as_ref().map(crate::sql_timestamp))
        .bind(item.added_by)
        .bind(item.position)
        .bind(crate::sql_timestamp(&item.created_at))
        .bind(crate::sql_timestamp(&item.updated_at))
        .execute(executor)
        .await?;
        Ok(())
    }
}
