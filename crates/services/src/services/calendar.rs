//! Household calendar and the merged agenda view.

use std::collections::HashMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use db::models::{
    activity::{ActivityAction, EntityKind},
    borrow_request::BorrowRequest,
    calendar_event::{CalendarEvent, CreateCalendarEvent, UpdateCalendarEvent},
    inventory_item::InventoryItem,
    member::Member,
    task::Task,
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

pub const MAX_AGENDA_DAYS: i64 = 366;
const MAX_TITLE_CHARS: usize = 120;
const MAX_TEXT_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("event not found")]
    NotFound,
}

/// Ordering within a day follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum AgendaKind {
    Event,
    TaskDue,
    Borrow,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AgendaEntry {
    pub date: NaiveDate,
    pub kind: AgendaKind,
    pub entity_id: Uuid,
    pub title: String,
    pub starts_at: Option<DateTime<Utc>>,
    /// Last day covered, for multi-day entries.
    pub until: Option<NaiveDate>,
    pub member_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct AgendaQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// `[from, to]` as a half-open timestamp range covering both whole days.
fn day_bounds(from: NaiveDate, to: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = from.and_time(NaiveTime::MIN).and_utc();
    let end = to.checked_add_days(Days::new(1))?.and_time(NaiveTime::MIN).and_utc();
    Some((start, end))
}

pub fn check_agenda_range(from: NaiveDate, to: NaiveDate) -> Result<(), ValidationError> {
    if to < from {
        return Err(ValidationError::new("to", "must not be before from"));
    }
    if (to - from).num_days() >= MAX_AGENDA_DAYS {
        return Err(ValidationError::new(
            "to",
            format!("range is limited to {MAX_AGENDA_DAYS} days"),
        ));
    }
    Ok(())
}

/// Merges events, chore due dates and borrow periods into one list sorted by
/// date, then kind, then start time and title. Entries that began before
/// `from` are pinned to `from`.
pub fn merge_agenda(
    from: NaiveDate,
    events: &[CalendarEvent],
    tasks: &[Task],
    borrows: &[BorrowRequest],
    item_names: &HashMap<Uuid, String>,
) -> Vec<AgendaEntry> {
    let mut entries = Vec::with_capacity(events.len() + tasks.len() + borrows.len());

    for event in events {
        let start_day = event.starts_at.date_naive();
        entries.push(AgendaEntry {
            date: start_day.max(from),
            kind: AgendaKind::Event,
            entity_id: event.id,
            title: event.title.clone(),
            starts_at: (!event.all_day).then_some(event.starts_at),
            until: event
                .ends_at
                .map(|end| end.date_naive())
                .filter(|end| *end > start_day),
            member_id: event.created_by,
        });
    }

    for task in tasks {
        let Some(due) = task.due_date else { continue };
        entries.push(AgendaEntry {
            date: due,
            kind: AgendaKind::TaskDue,
            entity_id: task.id,
            title: task.title.clone(),
            starts_at: None,
            until: None,
            member_id: task.assignee_id,
        });
    }

    for borrow in borrows {
        let item = item_names
            .get(&borrow.item_id)
            .map(String::as_str)
            .unwrap_or("Item");
        entries.push(AgendaEntry {
            date: borrow.start_date.max(from),
            kind: AgendaKind::Borrow,
            entity_id: borrow.id,
            title: format!("{item} on loan"),
            starts_at: None,
            until: Some(borrow.end_date),
            member_id: Some(borrow.borrower_id),
        });
    }

    entries.sort_by(|a, b| {
        (a.date, a.kind, a.starts_at, &a.title).cmp(&(b.date, b.kind, b.starts_at, &b.title))
    });
    entries
}

fn check_event_times(
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match ends_at {
        Some(end) if end < starts_at => {
            Err(ValidationError::new("ends_at", "must not be before starts_at"))
        }
        _ => Ok(()),
    }
}

pub struct CalendarService;

impl CalendarService {
    pub async fn list(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        Ok(CalendarEvent::find_by_household_id(pool, household_id).await?)
    }

    pub async fn get(
        pool: &SqlitePool,
        household_id: Uuid,
        event_id: Uuid,
    ) -> Result<CalendarEvent, CalendarError> {
        CalendarEvent::find_by_id(pool, event_id)
            .await?
            .filter(|event| event.household_id == household_id)
            .ok_or(CalendarError::NotFound)
    }

    pub async fn create(
        pool: &SqlitePool,
        actor: &Member,
        data: &CreateCalendarEvent,
    ) -> Result<CalendarEvent, CalendarError> {
        check_event_times(data.starts_at, data.ends_at)?;
        let data = CreateCalendarEvent {
            title: required_text("title", &data.title, MAX_TITLE_CHARS)?,
            description: optional_text("description", data.description.as_deref(), MAX_TEXT_CHARS)?,
            location: optional_text("location", data.location.as_deref(), MAX_TITLE_CHARS)?,
            ..data.clone()
        };
        let event =
            CalendarEvent::create(pool, Uuid::new_v4(), actor.household_id, &data, actor.id).await?;
        ActivityService::record(
            pool,
            event.household_id,
            Some(actor.id),
            ActivityAction::Created,
            EntityKind::CalendarEvent,
            Some(event.id),
            format!("{} scheduled {}", actor.display_name, event.title),
        )
        .await;
        Ok(event)
    }

    pub async fn update(
        pool: &SqlitePool,
        actor: &Member,
        event_id: Uuid,
        data: &UpdateCalendarEvent,
    ) -> Result<CalendarEvent, CalendarError> {
        let mut event = Self::get(pool, actor.household_id, event_id).await?;
        if let Some(title) = data.title.as_deref() {
            event.title = required_text("title", title, MAX_TITLE_CHARS)?;
        }
        if let Some(description) = data.description.as_deref() {
            event.description = optional_text("description", Some(description), MAX_TEXT_CHARS)?;
        }
        if let Some(location) = data.location.as_deref() {
            event.location = optional_text("location", Some(location), MAX_TITLE_CHARS)?;
        }
        if let Some(starts_at) = data.starts_at {
            event.starts_at = starts_at;
        }
        if data.ends_at.is_some() {
            event.ends_at = data.ends_at;
        }
        if let Some(all_day) = data.all_day {
            event.all_day = all_day;
        }
        check_event_times(event.starts_at, event.ends_at)?;

        let event = CalendarEvent::save(pool, &event).await?;
        ActivityService::record(
            pool,
            event.household_id,
            Some(actor.id),
            ActivityAction::Updated,
            EntityKind::CalendarEvent,
            Some(event.id),
            format!("{} moved or edited {}", actor.display_name, event.title),
        )
        .await;
        Ok(event)
    }

    pub async fn delete(
        pool: &SqlitePool,
        actor: &Member,
        event_id: Uuid,
    ) -> Result<(), CalendarError> {
        let event = Self::get(pool, actor.household_id, event_id).await?;
        CalendarEvent::delete(pool, event.id).await?;
        ActivityService::record(
            pool,
            event.household_id,
            Some(actor.id),
            ActivityAction::Deleted,
            EntityKind::CalendarEvent,
            Some(event.id),
            format!("{} cancelled {}", actor.display_name, event.title),
        )
        .await;
        Ok(())
    }

    pub async fn agenda(
        pool: &SqlitePool,
        household_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AgendaEntry>, CalendarError> {
        check_agenda_range(from, to)?;
        let (start, end) = day_bounds(from, to)
            .ok_or_else(|| ValidationError::new("to", "date is out of range"))?;

        let events = CalendarEvent::find_between(pool, household_id, start, end).await?;
        let tasks = Task::find_due_between(pool, household_id, from, to).await?;
        let borrows = BorrowRequest::find_holds_between(pool, household_id, from, to).await?;
        let item_names: HashMap<Uuid, String> = InventoryItem::find_by_household_id(pool, household_id)
            .await?
            .into_iter()
            .map(|item| (item.id, item.name))
            .collect();

        Ok(merge_agenda(from, &events, &tasks, &borrows, &item_names))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use db::models::{
        borrow_request::CreateBorrowRequest, inventory_item::CreateInventoryItem, task::CreateTask,
    };

    use super::*;
    use crate::services::{
        borrow::BorrowService, chores::ChoreService, inventory::InventoryService, test_support,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn event(title: &str, starts_at: DateTime<Utc>) -> CreateCalendarEvent {
        CreateCalendarEvent {
            title: title.to_string(),
            description: None,
            location: None,
            starts_at,
            ends_at: None,
            all_day: false,
        }
    }

    #[test]
    fn agenda_range_is_bounded() {
        assert!(check_agenda_range(date(2026, 1, 1), date(2026, 1, 1)).is_ok());
        assert!(check_agenda_range(date(2026, 1, 1), date(2027, 1, 1)).is_ok());
        assert!(check_agenda_range(date(2026, 1, 1), date(2027, 1, 2)).is_err());
        assert!(check_agenda_range(date(2026, 1, 2), date(2026, 1, 1)).is_err());
    }

    #[tokio::test]
    async fn end_before_start_is_rejected() {
        let fx = test_support::household_with_members(0).await;
        let mut data = event("Dinner", at(2026, 8, 1, 19));
        data.ends_at = Some(at(2026, 8, 1, 18));
        assert!(matches!(
            CalendarService::create(&fx.db.pool, &fx.admin, &data).await,
            Err(CalendarError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn agenda_merges_events_and_chores() {
        let fx = test_support::household_with_members(0).await;
        let pool = &fx.db.pool;

        CalendarService::create(pool, &fx.admin, &event("Dentist", at(2026, 8, 3, 9)))
            .await
            .unwrap();
        CalendarService::create(pool, &fx.admin, &event("Out of range", at(2026, 9, 3, 9)))
            .await
            .unwrap();
        let mut chore = CreateTask::from_title("Mow lawn");
        chore.due_date = Some(date(2026, 8, 3));
        ChoreService::create(pool, &fx.admin, &chore).await.unwrap();
        let mut early = CreateTask::from_title("Pay rent");
        early.due_date = Some(date(2026, 8, 1));
        ChoreService::create(pool, &fx.admin, &early).await.unwrap();

        let agenda = CalendarService::agenda(pool, fx.household.id, date(2026, 8, 1), date(2026, 8, 7))
            .await
            .unwrap();
        let titles: Vec<_> = agenda.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Pay rent", "Dentist", "Mow lawn"]);
        assert_eq!(agenda[1].kind, AgendaKind::Event);
        assert_eq!(agenda[2].kind, AgendaKind::TaskDue);
    }

    #[tokio::test]
    async fn multi_day_events_are_pinned_to_range_start() {
        let fx = test_support::household_with_members(0).await;
        let pool = &fx.db.pool;
        let mut trip = event("Holiday", at(2026, 7, 28, 8));
        trip.ends_at = Some(at(2026, 8, 4, 20));
        CalendarService::create(pool, &fx.admin, &trip).await.unwrap();

        let agenda = CalendarService::agenda(pool, fx.household.id, date(2026, 8, 1), date(2026, 8, 2))
            .await
            .unwrap();
        assert_eq!(agenda.len(), 1);
        assert_eq!(agenda[0].date, date(2026, 8, 1));
        assert_eq!(agenda[0].until, Some(date(2026, 8, 4)));
    }

    #[tokio::test]
    async fn agenda_shows_held_loans_after_events_and_chores() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;
        let borrower = &fx.members[0];
        let today = date(2026, 7, 25);

        let mut loans = Vec::new();
        for (name, start, end) in [
            ("Tent", date(2026, 7, 28), date(2026, 8, 5)),
            ("Kayak", date(2026, 8, 3), date(2026, 8, 4)),
            ("Bike", date(2026, 8, 3), date(2026, 8, 3)),
        ] {
            let item = InventoryService::create(
                pool,
                &fx.admin,
                &CreateInventoryItem {
                    name: name.to_string(),
                    description: None,
                    location: None,
                    borrowable: Some(true),
                    photo: None,
                    household_owned: false,
                },
            )
            .await
            .unwrap();
            let request = BorrowService::create(
                pool,
                borrower,
                &CreateBorrowRequest {
                    item_id: item.id,
                    start_date: start,
                    end_date: end,
                    message: None,
                },
                today,
            )
            .await
            .unwrap();
            loans.push(request);
        }
        // The bike request stays pending.
        BorrowService::approve(pool, &fx.admin, loans[0].id, None).await.unwrap();
        BorrowService::approve(pool, &fx.admin, loans[1].id, None).await.unwrap();

        CalendarService::create(pool, &fx.admin, &event("Dentist", at(2026, 8, 3, 9)))
            .await
            .unwrap();
        let mut chore = CreateTask::from_title("Mow lawn");
        chore.due_date = Some(date(2026, 8, 3));
        ChoreService::create(pool, &fx.admin, &chore).await.unwrap();

        let agenda = CalendarService::agenda(pool, fx.household.id, date(2026, 8, 1), date(2026, 8, 7))
            .await
            .unwrap();
        let titles: Vec<_> = agenda.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Tent on loan", "Dentist", "Mow lawn", "Kayak on loan"]);

        let tent = &agenda[0];
        assert_eq!(tent.kind, AgendaKind::Borrow);
        assert_eq!(tent.date, date(2026, 8, 1));
        assert_eq!(tent.until, Some(date(2026, 8, 5)));
        assert_eq!(tent.member_id, Some(borrower.id));
        assert_eq!(tent.entity_id, loans[0].id);

        let kinds: Vec<_> = agenda[1..].iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![AgendaKind::Event, AgendaKind::TaskDue, AgendaKind::Borrow]);
        assert!(agenda[1..].iter().all(|e| e.date == date(2026, 8, 3)));
        assert_eq!(agenda[3].until, Some(date(2026, 8, 4)));
    }
}
