use db::models::{
    activity::{ActivityAction, EntityKind},
    borrow_request::BorrowRequest,
    guideline::{GuidelineDraft, ItemGuideline},
    inventory_item::{CreateInventoryItem, InventoryItem, UpdateInventoryItem},
    member::Member,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    activity::ActivityService,
    validation::{ValidationError, optional_text, required_text},
};

const MAX_NAME_CHARS: usize = 120;
const MAX_TEXT_CHARS: usize = 2000;
const MAX_GUIDELINES: usize = 50;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("item not found")]
    NotFound,
    #[error("only the owner can change this item")]
    NotOwner,
    #[error("only an admin can change household items")]
    AdminRequired,
    #[error("item is lent out or promised to a borrower")]
    InUse,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct InventoryItemDetails {
    #[serde(flatten)]
    #[ts(flatten)]
    pub item: InventoryItem,
    pub guidelines: Vec<ItemGuideline>,
}

/// Owners manage their own items; household-owned items are managed by admins.
pub fn can_manage(item: &InventoryItem, member: &Member) -> Result<(), InventoryError> {
    match item.owner_id {
        Some(owner) if owner == member.id => Ok(()),
        Some(_) => Err(InventoryError::NotOwner),
        None if member.is_admin() => Ok(()),
        None => Err(InventoryError::AdminRequired),
    }
}

pub struct InventoryService;

impl InventoryService {
    pub async fn list(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<Vec<InventoryItem>, InventoryError> {
        Ok(InventoryItem::find_by_household_id(pool, household_id).await?)
    }

    pub async fn get(
        pool: &SqlitePool,
        household_id: Uuid,
        item_id: Uuid,
    ) -> Result<InventoryItemDetails, InventoryError> {
        let item = Self::find(pool, household_id, item_id).await?;
        let guidelines = ItemGuideline::find_by_item_id(pool, item.id).await?;
        Ok(InventoryItemDetails { item, guidelines })
    }

    pub async fn create(
        pool: &SqlitePool,
        actor: &Member,
        data: &CreateInventoryItem,
    ) -> Result<InventoryItem, InventoryError> {
        if data.household_owned && !actor.is_admin() {
            return Err(InventoryError::AdminRequired);
        }
        let data = CreateInventoryItem {
            name: required_text("name", &data.name, MAX_NAME_CHARS)?,
            description: optional_text("description", data.description.as_deref(), MAX_TEXT_CHARS)?,
            location: optional_text("location", data.location.as_deref(), MAX_NAME_CHARS)?,
            photo: optional_text("photo", data.photo.as_deref(), MAX_NAME_CHARS)?,
            ..data.clone()
        };
        let owner_id = (!data.household_owned).then_some(actor.id);
        let item =
            InventoryItem::create(pool, Uuid::new_v4(), actor.household_id, owner_id, &data).await?;

        info!(item_id = %item.id, household_id = %item.household_id, "Inventory item added");
        ActivityService::record(
            pool,
            item.household_id,
            Some(actor.id),
            ActivityAction::Created,
            EntityKind::InventoryItem,
            Some(item.id),
            format!("{} added {} to the inventory", actor.display_name, item.name),
        )
        .await;
        Ok(item)
    }

    pub async fn update(
        pool: &SqlitePool,
        actor: &Member,
        item_id: Uuid,
        data: &UpdateInventoryItem,
    ) -> Result<InventoryItem, InventoryError> {
        let mut item = Self::find(pool, actor.household_id, item_id).await?;
        can_manage(&item, actor)?;

        if let Some(name) = data.name.as_deref() {
            item.name = required_text("name", name, MAX_NAME_CHARS)?;
        }
        if let Some(description) = data.description.as_deref() {
            item.description = optional_text("description", Some(description), MAX_TEXT_CHARS)?;
        }
        if let Some(location) = data.location.as_deref() {
            item.location = optional_text("location", Some(location), MAX_NAME_CHARS)?;
        }
        if let Some(photo) = data.photo.as_deref() {
            item.photo = optional_text("photo", Some(photo), MAX_NAME_CHARS)?;
        }
        if let Some(borrowable) = data.borrowable {
            item.borrowable = borrowable;
        }

        let item = InventoryItem::save(pool, &item).await?;
        ActivityService::record(
            pool,
            item.household_id,
            Some(actor.id),
            ActivityAction::Updated,
            EntityKind::InventoryItem,
            Some(item.id),
            format!("{} updated {}", actor.display_name, item.name),
        )
        .await;
        Ok(item)
    }

    pub async fn delete(
        pool: &SqlitePool,
        actor: &Member,
        item_id: Uuid,
    ) -> Result<(), InventoryError> {
        let item = Self::find(pool, actor.household_id, item_id).await?;
        can_manage(&item, actor)?;
        if BorrowRequest::count_holds_for_item(pool, item.id).await? > 0 {
            return Err(InventoryError::InUse);
        }

        InventoryItem::delete(pool, item.id).await?;
        ActivityService::record(
            pool,
            item.household_id,
            Some(actor.id),
            ActivityAction::Deleted,
            EntityKind::InventoryItem,
            Some(item.id),
            format!("{} removed {} from the inventory", actor.display_name, item.name),
        )
        .await;
        Ok(())
    }

    /// Swaps the item's return requirements for `drafts`, kept in the given order.
    pub async fn replace_guidelines(
        pool: &SqlitePool,
        actor: &Member,
        item_id: Uuid,
        drafts: &[GuidelineDraft],
    ) -> Result<Vec<ItemGuideline>, InventoryError> {
        let item = Self::find(pool, actor.household_id, item_id).await?;
        can_manage(&item, actor)?;
        if drafts.len() > MAX_GUIDELINES {
            return Err(ValidationError::new(
                "guidelines",
                format!("at most {MAX_GUIDELINES} guidelines per item"),
            )
            .into());
        }

        let drafts = drafts
            .iter()
            .map(|draft| {
                Ok(GuidelineDraft {
                    kind: draft.kind,
                    label: required_text("label", &draft.label, MAX_NAME_CHARS)?,
                    description: optional_text(
                        "description",
                        draft.description.as_deref(),
                        MAX_TEXT_CHARS,
                    )?,
                    required: draft.required,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let guidelines = ItemGuideline::replace_for_item(pool, item.id, &drafts).await?;
        ActivityService::record(
            pool,
            item.household_id,
            Some(actor.id),
            ActivityAction::Updated,
            EntityKind::InventoryItem,
            Some(item.id),
            format!(
                "{} set {} return guideline(s) for {}",
                actor.display_name,
                guidelines.len(),
                item.name
            ),
        )
        .await;
        Ok(guidelines)
    }

    pub(crate) async fn find(
        pool: &SqlitePool,
        household_id: Uuid,
        item_id: Uuid,
    ) -> Result<InventoryItem, InventoryError> {
        InventoryItem::find_by_id(pool, item_id)
            .await?
            .filter(|item| item.household_id == household_id)
            .ok_or(InventoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use db::models::guideline::GuidelineKind;

    use super::*;
    use crate::services::test_support;

    fn drill() -> CreateInventoryItem {
        CreateInventoryItem {
            name: "Drill".to_string(),
            description: Some("  ".to_string()),
            location: Some("Garage".to_string()),
            borrowable: None,
            photo: None,
            household_owned: false,
        }
    }

    #[tokio::test]
    async fn owner_manages_own_items_only() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;
        let owner = &fx.members[0];

        let item = InventoryService::create(pool, owner, &drill()).await.unwrap();
        assert_eq!(item.owner_id, Some(owner.id));
        assert!(item.borrowable);
        assert!(item.description.is_none());

        let change = UpdateInventoryItem {
            borrowable: Some(false),
            ..Default::default()
        };
        assert!(matches!(
            InventoryService::update(pool, &fx.admin, item.id, &change).await,
            Err(InventoryError::NotOwner)
        ));
        let updated = InventoryService::update(pool, owner, item.id, &change).await.unwrap();
        assert!(!updated.borrowable);
    }

    #[tokio::test]
    async fn household_items_need_an_admin() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;
        let shared = CreateInventoryItem {
            household_owned: true,
            ..drill()
        };

        assert!(matches!(
            InventoryService::create(pool, &fx.members[0], &shared).await,
            Err(InventoryError::AdminRequired)
        ));
        let item = InventoryService::create(pool, &fx.admin, &shared).await.unwrap();
        assert!(item.owner_id.is_none());

        assert!(matches!(
            InventoryService::delete(pool, &fx.members[0], item.id).await,
            Err(InventoryError::AdminRequired)
        ));
        InventoryService::delete(pool, &fx.admin, item.id).await.unwrap();
        assert!(InventoryService::list(pool, fx.household.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn guidelines_are_replaced_in_order() {
        let fx = test_support::household_with_members(0).await;
        let pool = &fx.db.pool;
        let item = InventoryService::create(pool, &fx.admin, &drill()).await.unwrap();

        let drafts = vec![
            GuidelineDraft {
                kind: GuidelineKind::Checklist,
                label: " Battery charged ".to_string(),
                description: None,
                required: true,
            },
            GuidelineDraft {
                kind: GuidelineKind::Photo,
                label: "Bits in the case".to_string(),
                description: None,
                required: false,
            },
        ];
        InventoryService::replace_guidelines(pool, &fx.admin, item.id, &drafts)
            .await
            .unwrap();
        let details = InventoryService::get(pool, fx.household.id, item.id).await.unwrap();
        assert_eq!(details.guidelines.len(), 2);
        assert_eq!(details.guidelines[0].label, "Battery charged");
        assert_eq!(details.guidelines[1].position, 1);

        InventoryService::replace_guidelines(pool, &fx.admin, item.id, &drafts[1..])
            .await
            .unwrap();
        let details = InventoryService::get(pool, fx.household.id, item.id).await.unwrap();
        assert_eq!(details.guidelines.len(), 1);
        assert_eq!(details.guidelines[0].kind, GuidelineKind::Photo);

        let blank = vec![GuidelineDraft {
            label: "  ".to_string(),
            ..drafts[0].clone()
        }];
        assert!(matches!(
            InventoryService::replace_guidelines(pool, &fx.admin, item.id, &blank).await,
            Err(InventoryError::Validation(_))
        ));
    }
}
