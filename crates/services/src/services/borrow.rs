//! Borrow requests for inventory items: request, decide, hand over, return.

use chrono::NaiveDate;
use db::models::{
    activity::{ActivityAction, EntityKind},
    borrow_request::{
        BorrowAction, BorrowFilter, BorrowRequest, BorrowRequestDetails, BorrowReturnCheck,
        BorrowStatus, CreateBorrowRequest,
    },
    guideline::{GuidelineKind, ItemGuideline},
    inventory_item::InventoryItem,
    member::Member,
    notification::NotificationKind,
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    activity::ActivityService,
    guidelines::{GuidelineViolation, ReturnSubmission, validate_return},
    notification::{NotificationMessage, NotificationService},
    photos::PhotoStore,
    validation::{ValidationError, optional_text},
};

const MAX_MESSAGE_CHARS: usize = 1000;

#[derive(Debug, Error)]
pub enum BorrowError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("borrow request not found")]
    NotFound,
    #[error("item not found")]
    ItemNotFound,
    #[error("item is not available for borrowing")]
    NotBorrowable,
    #[error("you cannot borrow your own item")]
    OwnItem,
    #[error("item is already booked from {start} to {end}")]
    Conflict { start: NaiveDate, end: NaiveDate },
    #[error("cannot {action} a request that is {from}")]
    InvalidTransition {
        from: BorrowStatus,
        action: BorrowAction,
    },
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("return does not satisfy the item's guidelines")]
    InvalidReturn(Vec<GuidelineViolation>),
}

/// `end` on or after `start`, and `start` not in the past.
pub fn validate_range(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<(), BorrowError> {
    if end < start {
        return Err(ValidationError::new("end_date", "must not be before the start date").into());
    }
    if start < today {
        return Err(ValidationError::new("start_date", "must not be in the past").into());
    }
    Ok(())
}

/// Inclusive on both ends: a request ending on the day another starts overlaps it.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// The owner decides on personal items; any admin on household items.
pub fn can_decide(item: &InventoryItem, member: &Member) -> bool {
    match item.owner_id {
        Some(owner) => owner == member.id,
        None => member.is_admin(),
    }
}

fn next_status(request: &BorrowRequest, action: BorrowAction) -> Result<BorrowStatus, BorrowError> {
    request
        .status
        .apply(action)
        .ok_or(BorrowError::InvalidTransition {
            from: request.status,
            action,
        })
}

pub struct BorrowService;

impl BorrowService {
    pub async fn list(
        pool: &SqlitePool,
        household_id: Uuid,
        filter: &BorrowFilter,
    ) -> Result<Vec<BorrowRequest>, BorrowError> {
        Ok(BorrowRequest::find_by_household_id(pool, household_id, filter).await?)
    }

    pub async fn details(
        pool: &SqlitePool,
        household_id: Uuid,
        request_id: Uuid,
    ) -> Result<BorrowRequestDetails, BorrowError> {
        let request = Self::find(pool, household_id, request_id).await?;
        let return_checks = BorrowReturnCheck::find_by_request_id(pool, request.id).await?;
        Ok(BorrowRequestDetails {
            request,
            return_checks,
        })
    }

    pub async fn create(
        pool: &SqlitePool,
        actor: &Member,
        data: &CreateBorrowRequest,
        today: NaiveDate,
    ) -> Result<BorrowRequest, BorrowError> {
        validate_range(data.start_date, data.end_date, today)?;
        let item = Self::find_item(pool, actor.household_id, data.item_id).await?;
        if item.owner_id == Some(actor.id) {
            return Err(BorrowError::OwnItem);
        }
        if !item.borrowable {
            return Err(BorrowError::NotBorrowable);
        }
        Self::ensure_free(pool, item.id, data.start_date, data.end_date, None).await?;

        let data = CreateBorrowRequest {
            message: optional_text("message", data.message.as_deref(), MAX_MESSAGE_CHARS)?,
            ..data.clone()
        };
        let request =
            BorrowRequest::create(pool, Uuid::new_v4(), actor.household_id, actor.id, &data).await?;

        info!(
            request_id = %request.id,
            item_id = %item.id,
            borrower_id = %actor.id,
            "Borrow requested"
        );
        ActivityService::record(
            pool,
            request.household_id,
            Some(actor.id),
            ActivityAction::Requested,
            EntityKind::BorrowRequest,
            Some(request.id),
            format!(
                "{} asked to borrow {} from {} to {}",
                actor.display_name, item.name, request.start_date, request.end_date
            ),
        )
        .await;
        Self::notify_managers(
            pool,
            &item,
            actor.id,
            NotificationKind::BorrowRequested,
            format!("{} wants to borrow {}", actor.display_name, item.name),
            request.message.clone(),
            request.id,
        )
        .await;

        Ok(request)
    }

    pub async fn approve(
        pool: &SqlitePool,
        actor: &Member,
        request_id: Uuid,
        note: Option<&str>,
    ) -> Result<BorrowRequest, BorrowError> {
        Self::decide(pool, actor, request_id, BorrowAction::Approve, note).await
    }

    pub async fn reject(
        pool: &SqlitePool,
        actor: &Member,
        request_id: Uuid,
        note: Option<&str>,
    ) -> Result<BorrowRequest, BorrowError> {
        Self::decide(pool, actor, request_id, BorrowAction::Reject, note).await
    }

    async fn decide(
        pool: &SqlitePool,
        actor: &Member,
        request_id: Uuid,
        action: BorrowAction,
        note: Option<&str>,
    ) -> Result<BorrowRequest, BorrowError> {
        let request = Self::find(pool, actor.household_id, request_id).await?;
        let item = Self::find_item(pool, actor.household_id, request.item_id).await?;
        if !can_decide(&item, actor) {
            return Err(BorrowError::Forbidden(
                "only the item's owner (or an admin for household items) can decide",
            ));
        }
        let status = next_status(&request, action)?;
        if status == BorrowStatus::Approved {
            Self::ensure_free(
                pool,
                item.id,
                request.start_date,
                request.end_date,
                Some(request.id),
            )
            .await?;
        }

        let note = optional_text("note", note, MAX_MESSAGE_CHARS)?;
        let request = match BorrowRequest::record_decision(
            pool,
            request.id,
            status,
            actor.id,
            note.as_deref(),
        )
        .await?
        {
            Some(request) => request,
            None => return Err(Self::lost_race(pool, &request, action).await),
        };

        let (activity, kind, verb) = match status {
            BorrowStatus::Approved => (
                ActivityAction::Approved,
                NotificationKind::BorrowApproved,
                "approved",
            ),
            _ => (
                ActivityAction::Rejected,
                NotificationKind::BorrowRejected,
                "declined",
            ),
        };
        info!(request_id = %request.id, status = %request.status, "Borrow request decided");
        ActivityService::record(
            pool,
            request.household_id,
            Some(actor.id),
            activity,
            EntityKind::BorrowRequest,
            Some(request.id),
            format!("{} {} a request for {}", actor.display_name, verb, item.name),
        )
        .await;
        NotificationService::notify(
            pool,
            NotificationMessage {
                household_id: request.household_id,
                member_id: request.borrower_id,
                kind,
                title: format!("Your request for {} was {}", item.name, verb),
                body: request.decision_note.clone(),
                entity_id: Some(request.id),
            },
        )
        .await;

        Ok(request)
    }

    /// Hand-over: the item is now with the borrower.
    pub async fn activate(
        pool: &SqlitePool,
        actor: &Member,
        request_id: Uuid,
    ) -> Result<BorrowRequest, BorrowError> {
        let request = Self::find(pool, actor.household_id, request_id).await?;
        let item = Self::find_item(pool, actor.household_id, request.item_id).await?;
        if request.borrower_id != actor.id && !can_decide(&item, actor) {
            return Err(BorrowError::Forbidden(
                "only the borrower or the item's owner can mark a hand-over",
            ));
        }
        let status = next_status(&request, BorrowAction::Activate)?;
        let request = match BorrowRequest::update_status(pool, request.id, request.status, status)
            .await?
        {
            Some(request) => request,
            None => return Err(Self::lost_race(pool, &request, BorrowAction::Activate).await),
        };

        ActivityService::record(
            pool,
            request.household_id,
            Some(actor.id),
            ActivityAction::Activated,
            EntityKind::BorrowRequest,
            Some(request.id),
            format!("{} handed over {}", actor.display_name, item.name),
        )
        .await;
        Ok(request)
    }

    pub async fn cancel(
        pool: &SqlitePool,
        actor: &Member,
        request_id: Uuid,
    ) -> Result<BorrowRequest, BorrowError> {
        let request = Self::find(pool, actor.household_id, request_id).await?;
        if request.borrower_id != actor.id {
            return Err(BorrowError::Forbidden("only the borrower can cancel a request"));
        }
        let status = next_status(&request, BorrowAction::Cancel)?;
        let request = match BorrowRequest::update_status(pool, request.id, request.status, status)
            .await?
        {
            Some(request) => request,
            None => return Err(Self::lost_race(pool, &request, BorrowAction::Cancel).await),
        };

        ActivityService::record(
            pool,
            request.household_id,
            Some(actor.id),
            ActivityAction::Cancelled,
            EntityKind::BorrowRequest,
            Some(request.id),
            format!("{} withdrew a borrow request", actor.display_name),
        )
        .await;
        match InventoryItem::find_by_id(pool, request.item_id).await {
            Ok(Some(item)) => {
                Self::notify_managers(
                    pool,
                    &item,
                    actor.id,
                    NotificationKind::BorrowCancelled,
                    format!("{} no longer needs {}", actor.display_name, item.name),
                    None,
                    request.id,
                )
                .await
            }
            Ok(None) => {}
            Err(e) => warn!(request_id = %request.id, error = %e, "Could not load item for cancel notice"),
        }
        Ok(request)
    }

    /// Checks the submission against the item's guidelines and, when it passes,
    /// stores one check per guideline and completes the request.
    pub async fn submit_return(
        pool: &SqlitePool,
        photos: &PhotoStore,
        actor: &Member,
        request_id: Uuid,
        submission: &ReturnSubmission,
    ) -> Result<BorrowRequestDetails, BorrowError> {
        let request = Self::find(pool, actor.household_id, request_id).await?;
        if request.borrower_id != actor.id {
            return Err(BorrowError::Forbidden("only the borrower can return an item"));
        }
        next_status(&request, BorrowAction::Return)?;

        let item = Self::find_item(pool, actor.household_id, request.item_id).await?;
        let guidelines = ItemGuideline::find_by_item_id(pool, item.id).await?;
        let unstored = Self::unstored_photos(photos, &guidelines, submission).await;
        let outcomes = match validate_return(&guidelines, submission) {
            Ok(outcomes) if unstored.is_empty() => outcomes,
            Ok(_) => return Err(BorrowError::InvalidReturn(unstored)),
            Err(mut violations) => {
                violations.extend(unstored);
                return Err(BorrowError::InvalidReturn(violations));
            }
        };
        let notes = optional_text("notes", submission.notes.as_deref(), MAX_MESSAGE_CHARS)?;

        // Flip the status first so a concurrent second return finds nothing to update.
        let mut tx = pool.begin().await?;
        let Some(returned) =
            BorrowRequest::mark_returned(&mut *tx, request.id, notes.as_deref()).await?
        else {
            drop(tx);
            return Err(Self::lost_race(pool, &request, BorrowAction::Return).await);
        };
        let mut return_checks = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let check = BorrowReturnCheck {
                request_id: request.id,
                guideline_id: outcome.guideline_id,
                kind: outcome.kind,
                label: outcome.label,
                satisfied: outcome.satisfied,
                photo: outcome.photo,
            };
            BorrowReturnCheck::insert(&mut *tx, &check).await?;
            return_checks.push(check);
        }
        tx.commit().await?;
        let request = returned;

        info!(request_id = %request.id, checks = return_checks.len(), "Item returned");
        ActivityService::record(
            pool,
            request.household_id,
            Some(actor.id),
            ActivityAction::Returned,
            EntityKind::BorrowRequest,
            Some(request.id),
            format!("{} returned {}", actor.display_name, item.name),
        )
        .await;
        Self::notify_managers(
            pool,
            &item,
            actor.id,
            NotificationKind::BorrowReturned,
            format!("{} returned {}", actor.display_name, item.name),
            request.return_notes.clone(),
            request.id,
        )
        .await;

        Ok(BorrowRequestDetails {
            request,
            return_checks,
        })
    }

    /// Photo references for this item's photo guidelines that were never uploaded.
    /// Empty and misdirected entries are left to `validate_return`.
    async fn unstored_photos(
        photos: &PhotoStore,
        guidelines: &[ItemGuideline],
        submission: &ReturnSubmission,
    ) -> Vec<GuidelineViolation> {
        let mut unstored = Vec::new();
        for entry in &submission.photos {
            let name = entry.photo.trim();
            let is_photo_guideline = guidelines
                .iter()
                .any(|g| g.id == entry.guideline_id && g.kind == GuidelineKind::Photo);
            if name.is_empty() || !is_photo_guideline || photos.exists(name).await {
                continue;
            }
            unstored.push(GuidelineViolation::UnknownPhoto {
                guideline_id: entry.guideline_id,
                photo: name.to_string(),
            });
        }
        unstored
    }

    /// Explains why a guarded status update matched no row: the request moved
    /// on in the meantime, or an overlapping hold was approved first.
    async fn lost_race(
        pool: &SqlitePool,
        stale: &BorrowRequest,
        action: BorrowAction,
    ) -> BorrowError {
        let current = match BorrowRequest::find_by_id(pool, stale.id).await {
            Ok(Some(current)) => current,
            Ok(None) => return BorrowError::NotFound,
            Err(e) => return e.into(),
        };
        if current.status != stale.status || current.status.apply(action).is_none() {
            return BorrowError::InvalidTransition {
                from: current.status,
                action,
            };
        }
        match Self::ensure_free(
            pool,
            current.item_id,
            current.start_date,
            current.end_date,
            Some(current.id),
        )
        .await
        {
            Err(e) => e,
            Ok(()) => BorrowError::InvalidTransition {
                from: current.status,
                action,
            },
        }
    }

    async fn ensure_free(
        pool: &SqlitePool,
        item_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<Uuid>,
    ) -> Result<(), BorrowError> {
        let holds =
            BorrowRequest::find_overlapping_holds(pool, item_id, start, end, exclude_id).await?;
        match holds
            .iter()
            .find(|hold| ranges_overlap(start, end, hold.start_date, hold.end_date))
        {
            Some(hold) => Err(BorrowError::Conflict {
                start: hold.start_date,
                end: hold.end_date,
            }),
            None => Ok(()),
        }
    }

    /// Owner of a personal item, or every admin for a household item.
    pub(crate) async fn item_managers(
        pool: &SqlitePool,
        item: &InventoryItem,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        Ok(match item.owner_id {
            Some(owner) => vec![owner],
            None => Member::find_by_household_id(pool, item.household_id)
                .await?
                .into_iter()
                .filter(Member::is_admin)
                .map(|m| m.id)
                .collect(),
        })
    }

    async fn notify_managers(
        pool: &SqlitePool,
        item: &InventoryItem,
        except: Uuid,
        kind: NotificationKind,
        title: String,
        body: Option<String>,
        request_id: Uuid,
    ) {
        let recipients = match Self::item_managers(pool, item).await {
            Ok(recipients) => recipients,
            Err(e) => {
                warn!(item_id = %item.id, error = %e, "Could not resolve item managers");
                return;
            }
        };
        for member_id in recipients.into_iter().filter(|id| *id != except) {
            NotificationService::notify(
                pool,
                NotificationMessage {
                    household_id: item.household_id,
                    member_id,
                    kind,
                    title: title.clone(),
                    body: body.clone(),
                    entity_id: Some(request_id),
                },
            )
            .await;
        }
    }

    async fn find(
        pool: &SqlitePool,
        household_id: Uuid,
        request_id: Uuid,
    ) -> Result<BorrowRequest, BorrowError> {
        BorrowRequest::find_by_id(pool, request_id)
            .await?
            .filter(|request| request.household_id == household_id)
            .ok_or(BorrowError::NotFound)
    }

    async fn find_item(
        pool: &SqlitePool,
        household_id: Uuid,
        item_id: Uuid,
    ) -> Result<InventoryItem, BorrowError> {
        InventoryItem::find_by_id(pool, item_id)
            .await?
            .filter(|item| item.household_id == household_id)
            .ok_or(BorrowError::ItemNotFound)
    }
}

#[cfg(test)]
mod tests {
    use db::models::{
        guideline::{GuidelineDraft, GuidelineKind},
        inventory_item::CreateInventoryItem,
        notification::Notification,
    };

    use tempfile::TempDir;

    use super::*;
    use crate::services::{
        guidelines::ReturnPhoto, inventory::InventoryService, test_support,
    };

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2026, 7, 1)
    }

    fn ladder(household_owned: bool) -> CreateInventoryItem {
        CreateInventoryItem {
            name: "Ladder".to_string(),
            description: None,
            location: None,
            borrowable: Some(true),
            photo: None,
            household_owned,
        }
    }

    fn request(item_id: Uuid, start: NaiveDate, end: NaiveDate) -> CreateBorrowRequest {
        CreateBorrowRequest {
            item_id,
            start_date: start,
            end_date: end,
            message: Some("for the gutters".to_string()),
        }
    }

    #[test]
    fn ranges_are_inclusive() {
        let (a, b) = (date(2026, 7, 1), date(2026, 7, 5));
        assert!(ranges_overlap(a, b, date(2026, 7, 5), date(2026, 7, 9)));
        assert!(ranges_overlap(a, b, date(2026, 6, 1), date(2026, 7, 1)));
        assert!(!ranges_overlap(a, b, date(2026, 7, 6), date(2026, 7, 9)));
    }

    #[test]
    fn range_validation() {
        assert!(validate_range(today(), today(), today()).is_ok());
        assert!(validate_range(date(2026, 7, 3), date(2026, 7, 2), today()).is_err());
        assert!(validate_range(date(2026, 6, 30), date(2026, 7, 2), today()).is_err());
    }

    #[tokio::test]
    async fn full_workflow_with_guidelines() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;
        let owner = &fx.admin;
        let borrower = &fx.members[0];
        let dir = TempDir::new().unwrap();
        let store = PhotoStore::new(dir.path(), 1024);
        let shed_photo = store.save(PNG, Some("image/png")).await.unwrap();

        let item = InventoryService::create(pool, owner, &ladder(false)).await.unwrap();
        let guidelines = InventoryService::replace_guidelines(
            pool,
            owner,
            item.id,
            &[
                GuidelineDraft {
                    kind: GuidelineKind::Checklist,
                    label: "Wiped down".to_string(),
                    description: None,
                    required: true,
                },
                GuidelineDraft {
                    kind: GuidelineKind::Photo,
                    label: "Folded in the shed".to_string(),
                    description: None,
                    required: true,
                },
            ],
        )
        .await
        .unwrap();

        let req = BorrowService::create(
            pool,
            borrower,
            &request(item.id, date(2026, 7, 2), date(2026, 7, 4)),
            today(),
        )
        .await
        .unwrap();
        assert_eq!(req.status, BorrowStatus::Pending);
        let owner_inbox = Notification::find_for_member(pool, owner.id, true, 10).await.unwrap();
        assert!(owner_inbox.iter().any(|n| n.kind == NotificationKind::BorrowRequested));

        assert!(matches!(
            BorrowService::approve(pool, borrower, req.id, None).await,
            Err(BorrowError::Forbidden(_))
        ));
        let approved = BorrowService::approve(pool, owner, req.id, Some("sure")).await.unwrap();
        assert_eq!(approved.status, BorrowStatus::Approved);
        assert_eq!(approved.decided_by, Some(owner.id));
        assert_eq!(approved.decision_note.as_deref(), Some("sure"));

        assert!(matches!(
            BorrowService::submit_return(
                pool,
                &store,
                borrower,
                req.id,
                &ReturnSubmission::default(),
            )
            .await,
            Err(BorrowError::InvalidTransition {
                from: BorrowStatus::Approved,
                action: BorrowAction::Return
            })
        ));

        let active = BorrowService::activate(pool, borrower, req.id).await.unwrap();
        assert_eq!(active.status, BorrowStatus::Active);
        assert!(active.activated_at.is_some());

        let incomplete = ReturnSubmission {
            checked: vec![guidelines[0].id],
            photos: vec![],
            notes: None,
        };
        match BorrowService::submit_return(pool, &store, borrower, req.id, &incomplete).await {
            Err(BorrowError::InvalidReturn(violations)) => assert_eq!(violations.len(), 1),
            other => panic!("expected InvalidReturn, got {other:?}"),
        }

        let complete = ReturnSubmission {
            checked: vec![guidelines[0].id],
            photos: vec![ReturnPhoto {
                guideline_id: guidelines[1].id,
                photo: shed_photo.name.clone(),
            }],
            notes: Some("thanks!".to_string()),
        };
        let returned = BorrowService::submit_return(pool, &store, borrower, req.id, &complete)
            .await
            .unwrap();
        assert!(matches!(
            BorrowService::submit_return(pool, &store, borrower, req.id, &complete).await,
            Err(BorrowError::InvalidTransition {
                from: BorrowStatus::Completed,
                action: BorrowAction::Return
            })
        ));
        assert_eq!(returned.request.status, BorrowStatus::Completed);
        assert_eq!(returned.request.return_notes.as_deref(), Some("thanks!"));
        assert_eq!(returned.return_checks.len(), 2);
        assert!(returned.return_checks.iter().all(|c| c.satisfied));

        let stored = BorrowService::details(pool, fx.household.id, req.id).await.unwrap();
        assert_eq!(stored.return_checks.len(), 2);
    }

    #[tokio::test]
    async fn overlapping_holds_are_refused() {
        let fx = test_support::household_with_members(2).await;
        let pool = &fx.db.pool;
        let item = InventoryService::create(pool, &fx.admin, &ladder(true)).await.unwrap();

        let first = BorrowService::create(
            pool,
            &fx.members[0],
            &request(item.id, date(2026, 7, 10), date(2026, 7, 12)),
            today(),
        )
        .await
        .unwrap();
        // Pending requests do not hold the item yet.
        let second = BorrowService::create(
            pool,
            &fx.members[1],
            &request(item.id, date(2026, 7, 12), date(2026, 7, 14)),
            today(),
        )
        .await
        .unwrap();

        BorrowService::approve(pool, &fx.admin, first.id, None).await.unwrap();
        assert!(matches!(
            BorrowService::approve(pool, &fx.admin, second.id, None).await,
            Err(BorrowError::Conflict { .. })
        ));
        assert!(matches!(
            BorrowService::create(
                pool,
                &fx.members[1],
                &request(item.id, date(2026, 7, 11), date(2026, 7, 11)),
                today(),
            )
            .await,
            Err(BorrowError::Conflict { .. })
        ));

        let rejected = BorrowService::reject(pool, &fx.admin, second.id, Some("taken"))
            .await
            .unwrap();
        assert_eq!(rejected.status, BorrowStatus::Rejected);

        // Held items cannot be deleted.
        assert!(InventoryService::delete(pool, &fx.admin, item.id).await.is_err());
    }

    #[tokio::test]
    async fn borrower_rules() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;
        let item = InventoryService::create(pool, &fx.admin, &ladder(false)).await.unwrap();

        assert!(matches!(
            BorrowService::create(
                pool,
                &fx.admin,
                &request(item.id, date(2026, 7, 2), date(2026, 7, 3)),
                today()
            )
            .await,
            Err(BorrowError::OwnItem)
        ));

        let req = BorrowService::create(
            pool,
            &fx.members[0],
            &request(item.id, date(2026, 7, 2), date(2026, 7, 3)),
            today(),
        )
        .await
        .unwrap();
        assert!(matches!(
            BorrowService::cancel(pool, &fx.admin, req.id).await,
            Err(BorrowError::Forbidden(_))
        ));
        let cancelled = BorrowService::cancel(pool, &fx.members[0], req.id).await.unwrap();
        assert_eq!(cancelled.status, BorrowStatus::Cancelled);
        assert!(matches!(
            BorrowService::approve(pool, &fx.admin, req.id, None).await,
            Err(BorrowError::InvalidTransition { .. })
        ));

        let listed = BorrowService::list(
            pool,
            fx.household.id,
            &BorrowFilter {
                status: Some(BorrowStatus::Cancelled),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_overlapping_approvals_book_the_item_once() {
        let fx = test_support::household_with_members(2).await;
        let pool = &fx.db.pool;
        let item = InventoryService::create(pool, &fx.admin, &ladder(true)).await.unwrap();

        let a = BorrowService::create(
            pool,
            &fx.members[0],
            &request(item.id, date(2026, 7, 10), date(2026, 7, 12)),
            today(),
        )
        .await
        .unwrap();
        let b = BorrowService::create(
            pool,
            &fx.members[1],
            &request(item.id, date(2026, 7, 11), date(2026, 7, 13)),
            today(),
        )
        .await
        .unwrap();

        let (first, second) = tokio::join!(
            BorrowService::approve(pool, &fx.admin, a.id, None),
            BorrowService::approve(pool, &fx.admin, b.id, None),
        );
        assert_eq!(
            [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
            1,
            "exactly one approval may win: {first:?} / {second:?}"
        );
        let loser = if first.is_ok() { second } else { first };
        assert!(matches!(loser, Err(BorrowError::Conflict { .. })));

        let holds = BorrowRequest::find_overlapping_holds(
            pool,
            item.id,
            date(2026, 7, 10),
            date(2026, 7, 13),
            None,
        )
        .await
        .unwrap();
        assert_eq!(holds.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_transitions_apply_once() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;
        let borrower = &fx.members[0];
        let item = InventoryService::create(pool, &fx.admin, &ladder(false)).await.unwrap();
        let req = BorrowService::create(
            pool,
            borrower,
            &request(item.id, date(2026, 7, 2), date(2026, 7, 3)),
            today(),
        )
        .await
        .unwrap();

        let (approve, reject) = tokio::join!(
            BorrowService::approve(pool, &fx.admin, req.id, None),
            BorrowService::reject(pool, &fx.admin, req.id, None),
        );
        assert!(approve.is_ok() != reject.is_ok());
        let loser = if approve.is_ok() { reject } else { approve };
        assert!(matches!(loser, Err(BorrowError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn return_collects_photo_problems_with_the_rest() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;
        let borrower = &fx.members[0];
        let dir = TempDir::new().unwrap();
        let store = PhotoStore::new(dir.path(), 1024);

        let item = InventoryService::create(pool, &fx.admin, &ladder(false)).await.unwrap();
        let guidelines = InventoryService::replace_guidelines(
            pool,
            &fx.admin,
            item.id,
            &[
                GuidelineDraft {
                    kind: GuidelineKind::Photo,
                    label: "Front".to_string(),
                    description: None,
                    required: true,
                },
                GuidelineDraft {
                    kind: GuidelineKind::Photo,
                    label: "Back".to_string(),
                    description: None,
                    required: true,
                },
            ],
        )
        .await
        .unwrap();
        let req = BorrowService::create(
            pool,
            borrower,
            &request(item.id, date(2026, 7, 2), date(2026, 7, 3)),
            today(),
        )
        .await
        .unwrap();
        BorrowService::approve(pool, &fx.admin, req.id, None).await.unwrap();
        BorrowService::activate(pool, borrower, req.id).await.unwrap();

        let never_uploaded = format!("{}.png", "c".repeat(64));
        let submission = ReturnSubmission {
            checked: vec![],
            photos: vec![
                ReturnPhoto {
                    guideline_id: guidelines[0].id,
                    photo: String::new(),
                },
                ReturnPhoto {
                    guideline_id: guidelines[1].id,
                    photo: never_uploaded.clone(),
                },
            ],
            notes: None,
        };

        // Only the borrower may return, before any guideline is looked at.
        assert!(matches!(
            BorrowService::submit_return(pool, &store, &fx.admin, req.id, &submission).await,
            Err(BorrowError::Forbidden(_))
        ));

        match BorrowService::submit_return(pool, &store, borrower, req.id, &submission).await {
            Err(BorrowError::InvalidReturn(violations)) => {
                assert!(violations.contains(&GuidelineViolation::EmptyPhoto {
                    guideline_id: guidelines[0].id
                }));
                assert!(violations.contains(&GuidelineViolation::UnknownPhoto {
                    guideline_id: guidelines[1].id,
                    photo: never_uploaded,
                }));
            }
            other => panic!("expected InvalidReturn, got {other:?}"),
        }
        let still_active = BorrowService::details(pool, fx.household.id, req.id).await.unwrap();
        assert_eq!(still_active.request.status, BorrowStatus::Active);
        assert!(still_active.return_checks.is_empty());
    }
}
