use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "guideline_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GuidelineKind {
    /// Something the borrower ticks off ("cleaned the blade")
    Checklist,
    /// A photo the borrower has to attach ("tank is full")
    Photo,
}

/// Return requirement attached to an inventory item
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ItemGuideline {
    pub id: Uuid,
    pub item_id: Uuid,
    pub kind: GuidelineKind,
    pub label: String,
    pub description: Option<String>,
    pub required: bool,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct GuidelineDraft {
    pub kind: GuidelineKind,
    pub label: String,
    pub description: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ReplaceGuidelines {
    pub guidelines: Vec<GuidelineDraft>,
}

impl ItemGuideline {
    pub async fn find_by_item_id(
        pool: &SqlitePool,
        item_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ItemGuideline>(
            "SELECT * FROM item_guidelines WHERE item_id = $1 ORDER BY position ASC",
        )
        .bind(item_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ItemGuideline>(
            r#"SELECT g.* FROM item_guidelines g
               JOIN inventory_items i ON i.id = g.item_id
               WHERE i.household_id = $1
               ORDER BY g.item_id, g.position ASC"#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    /// Swaps the item's whole guideline set in one transaction.
    pub async fn replace_for_item(
        pool: &SqlitePool,
        item_id: Uuid,
        drafts: &[GuidelineDraft],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM item_guidelines WHERE item_id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        let mut created = Vec::with_capacity(drafts.len());
        for (position, draft) in drafts.iter().enumerate() {
            let guideline = sqlx::query_as::<_, ItemGuideline>(
                r#"INSERT INTO item_guidelines (id, item_id, kind, label, description, required, position)
                   VALUES ($1, $2, $3, $4, $5, $6, $7)
                   RETURNING *"#,
            )
            .bind(Uuid::new_v4())
            .bind(item_id)
            .bind(draft.kind)
            .bind(&draft.label)
            .bind(&draft.description)
            .bind(draft.required)
            .bind(position as i64)
            .fetch_one(&mut *tx)
            .await?;
            created.push(guideline);
        }
        tx.commit().await?;
        Ok(created)
    }

    pub async fn insert_full<'e, E>(executor: E, guideline: &ItemGuideline) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO item_guidelines (id, item_id, kind, label, description, required, position, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(guideline.id)
        .bind(guideline.item_id)
        .bind(guideline.kind)
        .bind(&guideline.label)
        .bind(&guideline.description)
        .bind(guideline.required)
        .bind(guideline.position)
        .bind(crate::sql_timestamp(&guideline.created_at))
        .execute(executor)
        .await?;
        Ok(())
    }
}
