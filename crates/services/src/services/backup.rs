//! Whole-household export and import as a single JSON document.

use chrono::{DateTime, Utc};
use db::models::{
    activity::ActivityEntry,
    borrow_request::{BorrowFilter, BorrowRequest, BorrowReturnCheck},
    calendar_event::CalendarEvent,
    guideline::ItemGuideline,
    household::Household,
    inventory_item::InventoryItem,
    member::Member,
    notification::Notification,
    shopping::{ShoppingItem, ShoppingList},
    task::{Task, TaskCompletion, TaskFilter, TaskRotationEntry},
    task_dependency::TaskDependency,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::households::generate_invite_code;

pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("household not found")]
    NotFound,
    #[error("household {0} already exists")]
    AlreadyExists(Uuid),
    #[error("unsupported backup version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdBackup {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub household: Household,
    pub members: Vec<Member>,
    pub shopping_lists: Vec<ShoppingList>,
    pub shopping_items: Vec<ShoppingItem>,
    pub tasks: Vec<Task>,
    pub task_rotations: Vec<TaskRotationEntry>,
    pub task_completions: Vec<TaskCompletion>,
    pub task_dependencies: Vec<TaskDependency>,
    pub inventory_items: Vec<InventoryItem>,
    pub item_guidelines: Vec<ItemGuideline>,
    pub borrow_requests: Vec<BorrowRequest>,
    pub borrow_return_checks: Vec<BorrowReturnCheck>,
    pub calendar_events: Vec<CalendarEvent>,
    pub activity: Vec<ActivityEntry>,
    pub notifications: Vec<Notification>,
}

impl HouseholdBackup {
    pub fn row_count(&self) -> usize {
        1 + self.members.len()
            + self.shopping_lists.len()
            + self.shopping_items.len()
            + self.tasks.len()
            + self.task_rotations.len()
            + self.task_completions.len()
            + self.task_dependencies.len()
            + self.inventory_items.len()
            + self.item_guidelines.len()
            + self.borrow_requests.len()
            + self.borrow_return_checks.len()
            + self.calendar_events.len()
            + self.activity.len()
            + self.notifications.len()
    }
}

pub async fn export_household(
    pool: &SqlitePool,
    household_id: Uuid,
) -> Result<HouseholdBackup, BackupError> {
    let household = Household::find_by_id(pool, household_id)
        .await?
        .ok_or(BackupError::NotFound)?;

    let backup = HouseholdBackup {
        version: BACKUP_VERSION,
        exported_at: Utc::now(),
        members: Member::find_by_household_id(pool, household_id).await?,
        shopping_lists: ShoppingList::find_by_household_id(pool, household_id, true).await?,
        shopping_items: ShoppingItem::find_by_household_id(pool, household_id).await?,
        tasks: Task::find_by_household_id(pool, household_id, &TaskFilter::default()).await?,
        task_rotations: TaskRotationEntry::find_by_household_id(pool, household_id).await?,
        task_completions: TaskCompletion::find_by_household_id(pool, household_id).await?,
        task_dependencies: TaskDependency::find_by_household_id(pool, household_id).await?,
        inventory_items: InventoryItem::find_by_household_id(pool, household_id).await?,
        item_guidelines: ItemGuideline::find_by_household_id(pool, household_id).await?,
        borrow_requests: BorrowRequest::find_by_household_id(
            pool,
            household_id,
            &BorrowFilter::default(),
        )
        .await?,
        borrow_return_checks: BorrowReturnCheck::find_by_household_id(pool, household_id).await?,
        calendar_events: CalendarEvent::find_by_household_id(pool, household_id).await?,
        activity: ActivityEntry::find_all_by_household_id(pool, household_id).await?,
        notifications: Notification::find_by_household_id(pool, household_id).await?,
        household,
    };

    info!(
        household_id = %household_id,
        rows = backup.row_count(),
        "Household exported"
    );
    Ok(backup)
}

/// Restores a backup in one transaction. Nothing is written unless every row
/// goes in. If the invite code is taken by another household a fresh one is issued.
pub async fn import_household(
    pool: &SqlitePool,
    backup: &HouseholdBackup,
) -> Result<Household, BackupError> {
    if backup.version != BACKUP_VERSION {
        return Err(BackupError::UnsupportedVersion(backup.version));
    }
    if Household::find_by_id(pool, backup.household.id).await?.is_some() {
        return Err(BackupError::AlreadyExists(backup.household.id));
    }

    let mut household = backup.household.clone();
    while Household::find_by_invite_code(pool, &household.invite_code)
        .await?
        .is_some()
    {
        warn!(household_id = %household.id, "Invite code in use, issuing a new one");
        household.invite_code = generate_invite_code();
    }

    let mut tx = pool.begin().await?;
    Household::insert_full(&mut *tx, &household).await?;
    for member in &backup.members {
        Member::insert_full(&mut *tx, member).await?;
    }
    for list in &backup.shopping_lists {
        ShoppingList::insert_full(&mut *tx, list).await?;
    }
    for item in &backup.shopping_items {
        ShoppingItem::insert_full(&mut *tx, item).await?;
    }
    for task in &backup.tasks {
        Task::insert_full(&mut *tx, task).await?;
    }
    for entry in &backup.task_rotations {
        TaskRotationEntry::insert(&mut *tx, entry).await?;
    }
    for completion in &backup.task_completions {
        TaskCompletion::insert_full(&mut *tx, completion).await?;
    }
    for link in &backup.task_dependencies {
        TaskDependency::insert_full(&mut *tx, link).await?;
    }
    for item in &backup.inventory_items {
        InventoryItem::insert_full(&mut *tx, item).await?;
    }
    for guideline in &backup.item_guidelines {
        ItemGuideline::insert_full(&mut *tx, guideline).await?;
    }
    for request in &backup.borrow_requests {
        BorrowRequest::insert_full(&mut *tx, request).await?;
    }
    for check in &backup.borrow_return_checks {
        BorrowReturnCheck::insert(&mut *tx, check).await?;
    }
    for event in &backup.calendar_events {
        CalendarEvent::insert_full(&mut *tx, event).await?;
    }
    for entry in &backup.activity {
        ActivityEntry::insert_full(&mut *tx, entry).await?;
    }
    for notification in &backup.notifications {
        Notification::insert_full(&mut *tx, notification).await?;
    }
    tx.commit().await?;

    info!(
        household_id = %household.id,
        rows = backup.row_count(),
        "Household imported"
    );
    Ok(household)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use db::{
        DBService,
        models::{
            borrow_request::CreateBorrowRequest, inventory_item::CreateInventoryItem,
            shopping::{CreateShoppingItem, CreateShoppingList},
            task::{CreateTask, RecurrenceUnit},
        },
    };
    use tempfile::TempDir;

    use super::*;
    use crate::services::{
        borrow::BorrowService, chores::ChoreService, inventory::InventoryService,
        shopping::ShoppingService, test_support,
    };

    async fn populated() -> test_support::Fixture {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;

        let list = ShoppingService::create_list(
            pool,
            &fx.admin,
            &CreateShoppingList {
                name: "Weekly".to_string(),
            },
        )
        .await
        .unwrap();
        ShoppingService::add_item(
            pool,
            &fx.admin,
            list.id,
            &CreateShoppingItem {
                name: "Eggs".to_string(),
                quantity: Some("12".to_string()),
                category: None,
            },
        )
        .await
        .unwrap();

        let start = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let mut chore = CreateTask::recurring("Bins", start, 1, RecurrenceUnit::Week);
        chore.rotation = Some(vec![fx.admin.id, fx.members[0].id]);
        let bins = ChoreService::create(pool, &fx.admin, &chore).await.unwrap();
        ChoreService::complete(pool, &fx.admin, bins.id, start).await.unwrap();

        let item = InventoryService::create(
            pool,
            &fx.admin,
            &CreateInventoryItem {
                name: "Tent".to_string(),
                description: None,
                location: None,
                borrowable: None,
                photo: None,
                household_owned: false,
            },
        )
        .await
        .unwrap();
        BorrowService::create(
            pool,
            &fx.members[0],
            &CreateBorrowRequest {
                item_id: item.id,
                start_date: start,
                end_date: start,
                message: None,
            },
            start,
        )
        .await
        .unwrap();
        fx
    }

    #[tokio::test]
    async fn export_then_import_into_fresh_database() {
        let fx = populated().await;
        let backup = export_household(&fx.db.pool, fx.household.id).await.unwrap();
        assert_eq!(backup.members.len(), 2);
        assert_eq!(backup.task_rotations.len(), 2);
        assert_eq!(backup.task_completions.len(), 1);
        assert_eq!(backup.borrow_requests.len(), 1);
        assert!(!backup.activity.is_empty());

        // Survives a trip through a file on disk.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup.json");
        std::fs::write(&path, serde_json::to_vec_pretty(&backup).unwrap()).unwrap();
        let restored: HouseholdBackup =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();

        let target = DBService::new_in_memory().await.unwrap();
        let household = import_household(&target.pool, &restored).await.unwrap();
        assert_eq!(household.id, fx.household.id);

        let again = export_household(&target.pool, fx.household.id).await.unwrap();
        assert_eq!(again.row_count(), backup.row_count());
        assert_eq!(again.tasks[0].due_date, backup.tasks[0].due_date);
        assert_eq!(again.shopping_items[0].quantity.as_deref(), Some("12"));
    }

    #[tokio::test]
    async fn refuses_existing_household_and_unknown_version() {
        let fx = populated().await;
        let mut backup = export_household(&fx.db.pool, fx.household.id).await.unwrap();

        assert!(matches!(
            import_household(&fx.db.pool, &backup).await,
            Err(BackupError::AlreadyExists(id)) if id == fx.household.id
        ));

        backup.version = 99;
        let target = DBService::new_in_memory().await.unwrap();
        assert!(matches!(
            import_household(&target.pool, &backup).await,
            Err(BackupError::UnsupportedVersion(99))
        ));
    }
}
