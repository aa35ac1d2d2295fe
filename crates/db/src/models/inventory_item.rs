use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct InventoryItem {
    pub id: Uuid,
    pub household_id: Uuid,
    /// `None` means the item belongs to the household as a whole.
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub borrowable: bool,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateInventoryItem {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub borrowable: Option<bool>,
    pub photo: Option<String>,
    /// Register the item as shared by the household instead of owned by the caller.
    #[serde(default)]
    pub household_owned: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateInventoryItem {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub borrowable: Option<bool>,
    pub photo: Option<String>,
}

impl InventoryItem {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE household_id = $1 ORDER BY name COLLATE NOCASE ASC",
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        household_id: Uuid,
        owner_id: Option<Uuid>,
        data: &CreateInventoryItem,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, InventoryItem>(
            r#"INSERT INTO inventory_items (id, household_id, owner_id, name, description, location, borrowable, photo)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING *"#,
        )
        .bind(id)
        .bind(household_id)
        .bind(owner_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.location)
        .bind(data.borrowable.unwrap_or(true))
        .bind(&data.photo)
        .fetch_one(pool)
        .await
    }

    pub async fn save(pool: &SqlitePool, item: &InventoryItem) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, InventoryItem>(
            r#"UPDATE inventory_items
               SET name = $2, description = $3, location = $4, borrowable = $5, photo = $6,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.location)
        .bind(item.borrowable)
        .bind(&item.photo)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert_full<'e, E>(executor: E, item: &InventoryItem) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO inventory_items (id, household_id, owner_id, name, description, location,
                                            borrowable, photo, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(item.id)
        .bind(item.household_id)
        .bind(item.owner_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.location)
        .bind(item.borrowable)
        .bind(&item.photo)
        .bind(crate::sql_timestamp(&item.created_at))
        .bind(crate::sql_timestamp(&item.updated_at))
        .execute(executor)
        .await?;
        Ok(())
    }
}
