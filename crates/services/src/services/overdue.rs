//! Background sweep that reminds members about overdue chores and loans.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use db::{
    DBService,
    models::{
        borrow_request::BorrowRequest, inventory_item::InventoryItem,
        notification::{Notification, NotificationKind}, task::Task,
    },
};
use thiserror::Error;
use tokio::time::interval;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::{
    borrow::BorrowService,
    notification::{NotificationMessage, NotificationService},
};

#[derive(Debug, Error)]
pub enum OverdueError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub task_reminders: usize,
    pub borrow_reminders: usize,
}

/// Periodically notifies assignees of overdue chores and both sides of loans
/// past their end date. Each member hears about an entity at most once a day.
pub struct OverdueSweeper {
    db: DBService,
    poll_interval: Duration,
}

impl OverdueSweeper {
    pub fn new(db: DBService, poll_interval: Duration) -> Self {
        Self { db, poll_interval }
    }

    pub fn spawn(db: DBService, poll_interval: Duration) -> tokio::task::JoinHandle<()> {
        let sweeper = Self::new(db, poll_interval);
        tokio::spawn(async move {
            sweeper.start().await;
        })
    }

    async fn start(&self) {
        info!(
            "Starting overdue sweeper with interval {:?}",
            self.poll_interval
        );
        let mut interval = interval(self.poll_interval);

        loop {
            interval.tick().await;
            match self.sweep(Utc::now().date_naive()).await {
                Ok(report) if report == SweepReport::default() => {
                    debug!("Overdue sweep: nothing new to report")
                }
                Ok(report) => info!(
                    task_reminders = report.task_reminders,
                    borrow_reminders = report.borrow_reminders,
                    "Overdue sweep sent reminders"
                ),
                Err(e) => error!("Error sweeping overdue items: {}", e),
            }
        }
    }

    pub async fn sweep(&self, today: NaiveDate) -> Result<SweepReport, OverdueError> {
        let pool = &self.db.pool;
        let mut report = SweepReport::default();

        for task in Task::find_overdue(pool, today).await? {
            let Some(assignee) = task.assignee_id else {
                continue;
            };
            let due = task.due_date.map(|d| d.to_string()).unwrap_or_default();
            if self
                .remind(
                    today,
                    NotificationMessage {
                        household_id: task.household_id,
                        member_id: assignee,
                        kind: NotificationKind::TaskOverdue,
                        title: format!("{} is overdue", task.title),
                        body: Some(format!("It was due {due}")),
                        entity_id: Some(task.id),
                    },
                )
                .await?
            {
                report.task_reminders += 1;
            }
        }

        for request in BorrowRequest::find_overdue(pool, today).await? {
            let Some(item) = InventoryItem::find_by_id(pool, request.item_id).await? else {
                continue;
            };
            let mut recipients: Vec<Uuid> = BorrowService::item_managers(pool, &item).await?;
            recipients.push(request.borrower_id);
            recipients.sort();
            recipients.dedup();

            for member_id in recipients {
                let title = if member_id == request.borrower_id {
                    format!("Please return {}", item.name)
                } else {
                    format!("{} has not come back yet", item.name)
                };
                if self
                    .remind(
                        today,
                        NotificationMessage {
                            household_id: request.household_id,
                            member_id,
                            kind: NotificationKind::BorrowOverdue,
                            title,
                            body: Some(format!("The loan ended on {}", request.end_date)),
                            entity_id: Some(request.id),
                        },
                    )
                    .await?
                {
                    report.borrow_reminders += 1;
                }
            }
        }

        Ok(report)
    }

    /// Sends unless the member already got this reminder today.
    async fn remind(
        &self,
        today: NaiveDate,
        message: NotificationMessage,
    ) -> Result<bool, OverdueError> {
        let Some(entity_id) = message.entity_id else {
            return Ok(false);
        };
        if Notification::exists_for_day(&self.db.pool, message.member_id, message.kind, entity_id, today)
            .await?
        {
            return Ok(false);
        }
        NotificationService::notify(&self.db.pool, message).await;
        Ok(true)
    }
}
