use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::guideline::GuidelineKind;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "borrow_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BorrowStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Active,
    Completed,
    Cancelled,
}

impl BorrowStatus {
    /// Statuses that reserve the item for the request's date range.
    pub fn holds_item(self) -> bool {
        matches!(self, BorrowStatus::Approved | BorrowStatus::Active)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BorrowStatus::Rejected | BorrowStatus::Completed | BorrowStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct BorrowRequest {
    pub id: Uuid,
    pub household_id: Uuid,
    pub item_id: Uuid,
    pub borrower_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BorrowStatus,
    pub message: Option<String>,
    pub decision_note: Option<String>,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub activated_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub return_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of one guideline at return time
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct BorrowReturnCheck {
    pub request_id: Uuid,
    pub guideline_id: Uuid,
    pub kind: GuidelineKind,
    pub label: String,
    pub satisfied: bool,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateBorrowRequest {
    pub item_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct BorrowDecision {
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct BorrowFilter {
    pub status: Option<BorrowStatus>,
    pub item_id: Option<Uuid>,
    pub borrower_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BorrowRequestDetails {
    #[serde(flatten)]
    #[ts(flatten)]
    pub request: BorrowRequest,
    pub return_checks: Vec<BorrowReturnCheck>,
}

impl BorrowRequest {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BorrowRequest>("SELECT * FROM borrow_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
        filter: &BorrowFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BorrowRequest>(
            r#"SELECT * FROM borrow_requests
               WHERE household_id = $1
                 AND ($2 IS NULL OR status = $2)
                 AND ($3 IS NULL OR item_id = $3)
                 AND ($4 IS NULL OR borrower_id = $4)
               ORDER BY start_date DESC, created_at DESC"#,
        )
        .bind(household_id)
        .bind(filter.status)
        .bind(filter.item_id)
        .bind(filter.borrower_id)
        .fetch_all(pool)
        .await
    }

    /// Approved or active requests for the item whose inclusive range meets `[start, end]`.
    pub async fn find_overlapping_holds(
        pool: &SqlitePool,
        item_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BorrowRequest>(
            r#"SELECT * FROM borrow_requests
               WHERE item_id = $1
                 AND status IN ('approved', 'active')
                 AND start_date <= $3
                 AND end_date >= $2
                 AND ($4 IS NULL OR id != $4)
               ORDER BY start_date ASC"#,
        )
        .bind(item_id)
        .bind(start)
        .bind(end)
        .bind(exclude_id)
        .fetch_all(pool)
        .await
    }

    /// Approved or active requests the member is party to, as borrower or as
    /// owner of the lent item.
    pub async fn count_holds_for_member(
        pool: &SqlitePool,
        member_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM borrow_requests
               WHERE status IN ('approved', 'active')
                 AND (borrower_id = $1
                      OR item_id IN (SELECT id FROM inventory_items WHERE owner_id = $1))"#,
        )
        .bind(member_id)
        .fetch_one(pool)
        .await
    }

    pub async fn count_holds_for_item(pool: &SqlitePool, item_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_requests WHERE item_id = $1 AND status IN ('approved', 'active')",
        )
        .bind(item_id)
        .fetch_one(pool)
        .await
    }

    /// Approved/active requests whose range meets `[from, to]`, for the agenda.
    pub async fn find_holds_between(
        pool: &SqlitePool,
        household_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BorrowRequest>(
            r#"SELECT * FROM borrow_requests
               WHERE household_id = $1
                 AND status IN ('approved', 'active')
                 AND start_date <= $3
                 AND end_date >= $2
               ORDER BY start_date ASC"#,
        )
        .bind(household_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Active requests whose end date is before `today`.
    pub async fn find_overdue(pool: &SqlitePool, today: NaiveDate) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BorrowRequest>(
            r#"SELECT * FROM borrow_requests
               WHERE status = 'active' AND end_date < $1
               ORDER BY end_date ASC"#,
        )
        .bind(today)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        household_id: Uuid,
        borrower_id: Uuid,
        data: &CreateBorrowRequest,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, BorrowRequest>(
            r#"INSERT INTO borrow_requests (id, household_id, item_id, borrower_id, start_date, end_date, message)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(id)
        .bind(household_id)
        .bind(data.item_id)
        .bind(borrower_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(&data.message)
        .fetch_one(pool)
        .await
    }

    /// Approve or reject a request that is still `pending`.
    ///
    /// The status and overlap checks run inside the UPDATE itself, so of two
    /// overlapping approvals racing each other only one can land. `None` means
    /// the row was no longer pending or an overlapping hold exists.
    pub async fn record_decision(
        pool: &SqlitePool,
        id: Uuid,
        status: BorrowStatus,
        decided_by: Uuid,
        note: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BorrowRequest>(
            r#"UPDATE borrow_requests
               SET status = $2, decided_by = $3, decision_note = $4,
                   decided_at = datetime('now', 'subsec'),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
                 AND status = 'pending'
                 AND ($2 != 'approved' OR NOT EXISTS (
                     SELECT 1 FROM borrow_requests AS hold
                     WHERE hold.item_id = borrow_requests.item_id
                       AND hold.id != borrow_requests.id
                       AND hold.status IN ('approved', 'active')
                       AND hold.start_date <= borrow_requests.end_date
                       AND hold.end_date >= borrow_requests.start_date))
               RETURNING *"#,
        )
        .bind(id)
        .bind(status)
        .bind(decided_by)
        .bind(note)
        .fetch_optional(pool)
        .await
    }

    /// Moves the request from `from` to `status`; `None` if it was no longer in `from`.
    pub async fn update_status<'e, E>(
        executor: E,
        id: Uuid,
        from: BorrowStatus,
        status: BorrowStatus,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, BorrowRequest>(
            r#"UPDATE borrow_requests
               SET status = $2,
                   activated_at = CASE WHEN $2 = 'active' THEN datetime('now', 'subsec') ELSE activated_at END,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND status = $3
               RETURNING *"#,
        )
        .bind(id)
        .bind(status)
        .bind(from)
        .fetch_optional(executor)
        .await
    }

    /// Completes an `active` request; `None` if it was not active any more.
    pub async fn mark_returned<'e, E>(
        executor: E,
        id: Uuid,
        notes: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, BorrowRequest>(
            r#"UPDATE borrow_requests
               SET status = 'completed', return_notes = $2,
                   returned_at = datetime('now', 'subsec'),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND status = 'active'
               RETURNING *"#,
        )
        .bind(id)
        .bind(notes)
        .fetch_optional(executor)
        .await
    }

    pub async fn insert_full<'e, E>(executor: E, request: &BorrowRequest) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO borrow_requests
                   (id, household_id, item_id, borrower_id, start_date, end_date, status, message,
                    decision_note, decided_by, decided_at, activated_at, returned_at, return_notes,
                    created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"#,
        )
        .bind(request.id)
        .bind(request.household_id)
        .bind(request.item_id)
        .bind(request.borrower_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.status)
        .bind(&request.message)
        .bind(&request.decision_note)
        .bind(request.decided_by)
        .bind(request.decided_at.as_ref().map(crate::sql_timestamp))
        .bind(request.activated_at.as_ref().map(crate::sql_timestamp))
        .bind(request.returned_at.as_ref().map(crate::sql_timestamp))
        .bind(&request.return_notes)
        .bind(crate::sql_timestamp(&request.created_at))
        .bind(crate::sql_timestamp(&request.updated_at))
        .execute(executor)
        .await?;
        Ok(())
    }
}

impl BorrowReturnCheck {
    pub async fn find_by_request_id(
        pool: &SqlitePool,
        request_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BorrowReturnCheck>(
            "SELECT * FROM borrow_return_checks WHERE request_id = $1 ORDER BY kind, label",
        )
        .bind(request_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BorrowReturnCheck>(
            r#"SELECT c.* FROM borrow_return_checks c
               JOIN borrow_requests r ON r.id = c.request_id
               WHERE r.household_id = $1"#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    pub async fn insert<'e, E>(executor: E, check: &BorrowReturnCheck) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO borrow_return_checks (request_id, guideline_id, kind, label, satisfied, photo)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(check.request_id)
        .bind(check.guideline_id)
        .bind(check.kind)
        .bind(&check.label)
        .bind(check.satisfied)
        .bind(&check.photo)
        .execute(executor)
        .await?;
        Ok(())
    }
}

/// Explicit user action on a borrow request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BorrowAction {
    Approve,
    Reject,
    Activate,
    Return,
    Cancel,
}

impl BorrowStatus {
    /// Status reached by applying `action`, or `None` when the transition is not allowed.
    ///
    /// `pending → approved → active → completed`, `pending → rejected`, and
    /// cancellation from `pending` or `approved`.
    pub fn apply(self, action: BorrowAction) -> Option<BorrowStatus> {
        use BorrowAction as A;
        use BorrowStatus as S;
        match (self, action) {
            (S::Pending, A::Approve) => Some(S::Approved),
            (S::Pending, A::Reject) => Some(S::Rejected),
            (S::Approved, A::Activate) => Some(S::Active),
            (S::Active, A::Return) => Some(S::Completed),
            (S::Pending | S::Approved, A::Cancel) => Some(S::Cancelled),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_completed() {
        let status = BorrowStatus::Pending
            .apply(BorrowAction::Approve)
            .and_then(|s| s.apply(BorrowAction::Activate))
            .and_then(|s| s.apply(BorrowAction::Return));
        assert_eq!(status, Some(BorrowStatus::Completed));
    }

    #[test]
    fn rejection_is_only_possible_while_pending() {
        assert_eq!(
            BorrowStatus::Pending.apply(BorrowAction::Reject),
            Some(BorrowStatus::Rejected)
        );
        assert_eq!(BorrowStatus::Approved.apply(BorrowAction::Reject), None);
        assert_eq!(BorrowStatus::Active.apply(BorrowAction::Reject), None);
    }

    #[test]
    fn terminal_statuses_accept_no_action() {
        for status in [
            BorrowStatus::Rejected,
            BorrowStatus::Completed,
            BorrowStatus::Cancelled,
        ] {
            assert!(status.is_terminal());
            for action in [
                BorrowAction::Approve,
                BorrowAction::Reject,
                BorrowAction::Activate,
                BorrowAction::Return,
                BorrowAction::Cancel,
            ] {
                assert_eq!(status.apply(action), None, "{status} accepted {action}");
            }
        }
    }

    #[test]
    fn active_borrow_cannot_be_cancelled_or_skip_ahead() {
        assert_eq!(BorrowStatus::Active.apply(BorrowAction::Cancel), None);
        assert_eq!(BorrowStatus::Pending.apply(BorrowAction::Activate), None);
        assert_eq!(BorrowStatus::Pending.apply(BorrowAction::Return), None);
    }

    #[test]
    fn status_strings_match_storage_format() {
        assert_eq!(BorrowStatus::Approved.to_string(), "approved");
        assert_eq!("active".parse::<BorrowStatus>().unwrap(), BorrowStatus::Active);
        assert!(BorrowStatus::Active.holds_item());
        assert!(!BorrowStatus::Pending.holds_item());
    }
}
