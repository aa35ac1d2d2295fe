//! Shared shopping lists.

use db::models::{
    activity::{ActivityAction, EntityKind},
    member::Member,
    shopping::{
        CreateShoppingItem, CreateShoppingList, ShoppingItem, ShoppingList, UpdateShoppingItem,
        UpdateShoppingList,
    },
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    activity::ActivityService,
    validation::{ValidationError, optional_text, required_text},
};

const MAX_LIST_NAME_CHARS: usize = 80;
const MAX_ITEM_NAME_CHARS: usize = 120;
const MAX_DETAIL_CHARS: usize = 40;

#[derive(Debug, Error)]
pub enum ShoppingError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("shopping list not found")]
    ListNotFound,
    #[error("shopping item not found")]
    ItemNotFound,
    #[error("shopping list is archived")]
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ShoppingListWithItems {
    pub list: ShoppingList,
    pub items: Vec<ShoppingItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ClearCheckedResponse {
    pub removed: u64,
}

pub struct ShoppingService;

impl ShoppingService {
    pub async fn lists(
        pool: &SqlitePool,
        household_id: Uuid,
        include_archived: bool,
    ) -> Result<Vec<ShoppingList>, ShoppingError> {
        Ok(ShoppingList::find_by_household_id(pool, household_id, include_archived).await?)
    }

    pub async fn create_list(
        pool: &SqlitePool,
        actor: &Member,
        data: &CreateShoppingList,
    ) -> Result<ShoppingList, ShoppingError> {
        let name = required_text("name", &data.name, MAX_LIST_NAME_CHARS)?;
        let list =
            ShoppingList::create(pool, Uuid::new_v4(), actor.household_id, &name, actor.id).await?;
        ActivityService::record(
            pool,
            actor.household_id,
            Some(actor.id),
            ActivityAction::Created,
            EntityKind::ShoppingList,
            Some(list.id),
            format!("{} created the list {}", actor.display_name, list.name),
        )
        .await;
        Ok(list)
    }

    pub async fn list_with_items(
        pool: &SqlitePool,
        household_id: Uuid,
        list_id: Uuid,
    ) -> Result<ShoppingListWithItems, ShoppingError> {
        let list = Self::find_list(pool, household_id, list_id).await?;
        let items = ShoppingItem::find_by_list_id(pool, list.id).await?;
        Ok(ShoppingListWithItems { list, items })
    }

    pub async fn update_list(
        pool: &SqlitePool,
        actor: &Member,
        list_id: Uuid,
        data: &UpdateShoppingList,
    ) -> Result<ShoppingList, ShoppingError> {
        let list = Self::find_list(pool, actor.household_id, list_id).await?;
        let name = match data.name.as_deref() {
            Some(name) => required_text("name", name, MAX_LIST_NAME_CHARS)?,
            None => list.name.clone(),
        };
        let archived = data.archived.unwrap_or(list.archived);
        let updated = ShoppingList::update(pool, list.id, &name, archived).await?;
        ActivityService::record(
            pool,
            actor.household_id,
            Some(actor.id),
            ActivityAction::Updated,
            EntityKind::ShoppingList,
            Some(updated.id),
            if archived && !list.archived {
                format!("{} archived the list {}", actor.display_name, updated.name)
            } else {
                format!("{} updated the list {}", actor.display_name, updated.name)
            },
        )
        .await;
        Ok(updated)
    }

    pub async fn delete_list(
        pool: &SqlitePool,
        actor: &Member,
        list_id: Uuid,
    ) -> Result<(), ShoppingError> {
        let list = Self::find_list(pool, actor.household_id, list_id).await?;
        ShoppingList::delete(pool, list.id).await?;
        ActivityService::record(
            pool,
            actor.household_id,
            Some(actor.id),
            ActivityAction::Deleted,
            EntityKind::ShoppingList,
            Some(list.id),
            format!("{} deleted the list {}", actor.display_name, list.name),
        )
        .await;
        Ok(())
    }

    pub async fn add_item(
        pool: &SqlitePool,
        actor: &Member,
        list_id: Uuid,
        data: &CreateShoppingItem,
    ) -> Result<ShoppingItem, ShoppingError> {
        let list = Self::find_list(pool, actor.household_id, list_id).await?;
        if list.archived {
            return Err(ShoppingError::Archived);
        }
        let data = CreateShoppingItem {
            name: required_text("name", &data.name, MAX_ITEM_NAME_CHARS)?,
            quantity: optional_text("quantity", data.quantity.as_deref(), MAX_DETAIL_CHARS)?,
            category: optional_text("category", data.category.as_deref(), MAX_DETAIL_CHARS)?,
        };
        let item = ShoppingItem::create(pool, Uuid::new_v4(), list.id, &data, actor.id).await?;
        ActivityService::record(
            pool,
            actor.household_id,
            Some(actor.id),
            ActivityAction::Created,
            EntityKind::ShoppingItem,
            Some(item.id),
            format!("{} added {} to {}", actor.display_name, item.name, list.name),
        )
        .await;
        Ok(item)
    }

    pub async fn update_item(
        pool: &SqlitePool,
        actor: &Member,
        list_id: Uuid,
        item_id: Uuid,
        data: &UpdateShoppingItem,
    ) -> Result<ShoppingItem, ShoppingError> {
        let item = Self::find_item(pool, actor.household_id, list_id, item_id).await?;
        let name = match data.name.as_deref() {
            Some(name) => required_text("name", name, MAX_ITEM_NAME_CHARS)?,
            None => item.name.clone(),
        };
        let quantity = match data.quantity.as_deref() {
            Some(q) => optional_text("quantity", Some(q), MAX_DETAIL_CHARS)?,
            None => item.quantity.clone(),
        };
        let category = match data.category.as_deref() {
            Some(c) => optional_text("category", Some(c), MAX_DETAIL_CHARS)?,
            None => item.category.clone(),
        };
        Ok(ShoppingItem::update(pool, item.id, &name, quantity.as_deref(), category.as_deref()).await?)
    }

    pub async fn set_checked(
        pool: &SqlitePool,
        actor: &Member,
        list_id: Uuid,
        item_id: Uuid,
        checked: bool,
    ) -> Result<ShoppingItem, ShoppingError> {
        let item = Self::find_item(pool, actor.household_id, list_id, item_id).await?;
        if item.checked == checked {
            return Ok(item);
        }
        let item = ShoppingItem::set_checked(pool, item.id, checked, actor.id).await?;
        ActivityService::record(
            pool,
            actor.household_id,
            Some(actor.id),
            if checked {
                ActivityAction::Checked
            } else {
                ActivityAction::Unchecked
            },
            EntityKind::ShoppingItem,
            Some(item.id),
            format!(
                "{} {} {}",
                actor.display_name,
                if checked { "picked up" } else { "put back" },
                item.name
            ),
        )
        .await;
        Ok(item)
    }

    pub async fn delete_item(
        pool: &SqlitePool,
        actor: &Member,
        list_id: Uuid,
        item_id: Uuid,
    ) -> Result<(), ShoppingError> {
        let item = Self::find_item(pool, actor.household_id, list_id, item_id).await?;
        ShoppingItem::delete(pool, item.id).await?;
        Ok(())
    }

    /// Removes every checked item from the list, returning how many went.
    pub async fn clear_checked(
        pool: &SqlitePool,
        actor: &Member,
        list_id: Uuid,
    ) -> Result<u64, ShoppingError> {
        let list = Self::find_list(pool, actor.household_id, list_id).await?;
        let removed = ShoppingItem::delete_checked(pool, list.id).await?;
        if removed > 0 {
            ActivityService::record(
                pool,
                actor.household_id,
                Some(actor.id),
                ActivityAction::Deleted,
                EntityKind::ShoppingList,
                Some(list.id),
                format!(
                    "{} cleared {} checked item(s) from {}",
                    actor.display_name, removed, list.name
                ),
            )
            .await;
        }
        Ok(removed)
    }

    async fn find_list(
        pool: &SqlitePool,
        household_id: Uuid,
        list_id: Uuid,
    ) -> Result<ShoppingList, ShoppingError> {
        ShoppingList::find_by_id(pool, list_id)
            .await?
            .filter(|list| list.household_id == household_id)
            .ok_or(ShoppingError::ListNotFound)
    }

    async fn find_item(
        pool: &SqlitePool,
        household_id: Uuid,
        list_id: Uuid,
        item_id: Uuid,
    ) -> Result<ShoppingItem, ShoppingError> {
        Self::find_list(pool, household_id, list_id).await?;
        ShoppingItem::find_by_id(pool, item_id)
            .await?
            .filter(|item| item.list_id == list_id)
            .ok_or(ShoppingError::ItemNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;

    fn item(name: &str) -> CreateShoppingItem {
        CreateShoppingItem {
            name: name.to_string(),
            quantity: None,
            category: None,
        }
    }

    #[tokio::test]
    async fn checked_items_sink_and_can_be_cleared() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;
        let member = &fx.members[0];

        let list = ShoppingService::create_list(
            pool,
            &fx.admin,
            &CreateShoppingList {
                name: "Groceries".to_string(),
            },
        )
        .await
        .unwrap();

        let milk = ShoppingService::add_item(pool, &fx.admin, list.id, &item("Milk"))
            .await
            .unwrap();
        let bread = ShoppingService::add_item(pool, member, list.id, &item(" Bread "))
            .await
            .unwrap();
        assert_eq!(milk.position, 0);
        assert_eq!(bread.position, 1);
        assert_eq!(bread.name, "Bread");

        let checked = ShoppingService::set_checked(pool, member, list.id, milk.id, true)
            .await
            .unwrap();
        assert!(checked.checked);
        assert_eq!(checked.checked_by, Some(member.id));
        assert!(checked.checked_at.is_some());

        let view = ShoppingService::list_with_items(pool, fx.household.id, list.id)
            .await
            .unwrap();
        let names: Vec<_> = view.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Bread", "Milk"]);

        let unchecked = ShoppingService::set_checked(pool, member, list.id, milk.id, false)
            .await
            .unwrap();
        assert!(unchecked.checked_by.is_none());

        ShoppingService::set_checked(pool, member, list.id, bread.id, true)
            .await
            .unwrap();
        let removed = ShoppingService::clear_checked(pool, member, list.id).await.unwrap();
        assert_eq!(removed, 1);
        let view = ShoppingService::list_with_items(pool, fx.household.id, list.id)
            .await
            .unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].id, milk.id);
    }

    #[tokio::test]
    async fn archived_lists_refuse_new_items_and_hide_by_default() {
        let fx = test_support::household_with_members(0).await;
        let pool = &fx.db.pool;
        let list = ShoppingService::create_list(
            pool,
            &fx.admin,
            &CreateShoppingList {
                name: "Party".to_string(),
            },
        )
        .await
        .unwrap();

        ShoppingService::update_list(
            pool,
            &fx.admin,
            list.id,
            &UpdateShoppingList {
                name: None,
                archived: Some(true),
            },
        )
        .await
        .unwrap();

        let add = ShoppingService::add_item(pool, &fx.admin, list.id, &item("Cake")).await;
        assert!(matches!(add, Err(ShoppingError::Archived)));
        assert!(ShoppingService::lists(pool, fx.household.id, false).await.unwrap().is_empty());
        assert_eq!(ShoppingService::lists(pool, fx.household.id, true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lists_of_other_households_are_invisible() {
        let first = test_support::household_with_members(0).await;
        let pool = &first.db.pool;
        let other = super::super::households::HouseholdService::create(pool, "Other", "Olga")
            .await
            .unwrap();
        let list = ShoppingService::create_list(
            pool,
            &first.admin,
            &CreateShoppingList {
                name: "Mine".to_string(),
            },
        )
        .await
        .unwrap();

        let peek = ShoppingService::list_with_items(pool, other.household.id, list.id).await;
        assert!(matches!(peek, Err(ShoppingError::ListNotFound)));
    }
}
