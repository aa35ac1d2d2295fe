//! Due-date arithmetic and rotation for recurring chores.

use chrono::{Days, Months, NaiveDate};
use db::models::task::{RecurrenceUnit, Task};
use thiserror::Error;
use uuid::Uuid;

/// Largest accepted interval, in units.
pub const MAX_INTERVAL: i64 = 1000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("recurrence interval must be between 1 and 1000")]
    InvalidInterval,
    #[error("recurrence needs both an interval and a unit")]
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recurrence {
    pub interval: u32,
    pub unit: RecurrenceUnit,
}

impl Recurrence {
    pub fn new(interval: i64, unit: RecurrenceUnit) -> Result<Self, RecurrenceError> {
        if !(1..=MAX_INTERVAL).contains(&interval) {
            return Err(RecurrenceError::InvalidInterval);
        }
        Ok(Self {
            interval: interval as u32,
            unit,
        })
    }

    /// Both columns set or both empty; anything else is rejected.
    pub fn from_parts(
        interval: Option<i64>,
        unit: Option<RecurrenceUnit>,
    ) -> Result<Option<Self>, RecurrenceError> {
        match (interval, unit) {
            (Some(interval), Some(unit)) => Self::new(interval, unit).map(Some),
            (None, None) => Ok(None),
            _ => Err(RecurrenceError::Incomplete),
        }
    }

    pub fn from_task(task: &Task) -> Option<Self> {
        Self::from_parts(task.recurrence_interval, task.recurrence_unit)
            .ok()
            .flatten()
    }

    /// `date` moved forward by `times` intervals. Month and year steps clamp to
    /// the end of the month; `None` on calendar overflow.
    pub fn advance(&self, date: NaiveDate, times: u32) -> Option<NaiveDate> {
        let steps = self.interval.checked_mul(times)?;
        match self.unit {
            RecurrenceUnit::Day => date.checked_add_days(Days::new(u64::from(steps))),
            RecurrenceUnit::Week => date.checked_add_days(Days::new(u64::from(steps) * 7)),
            RecurrenceUnit::Month => date.checked_add_months(Months::new(steps)),
            RecurrenceUnit::Year => date.checked_add_months(Months::new(steps.checked_mul(12)?)),
        }
    }
}

/// The stored date plus one interval.
pub fn next_due_date(stored: NaiveDate, recurrence: Recurrence) -> Option<NaiveDate> {
    recurrence.advance(stored, 1)
}

/// First occurrence strictly after `completed_on`, counting whole intervals
/// from the stored due date (or from `completed_on` when there is none).
///
/// Each candidate is computed from the base date rather than from the previous
/// candidate, so month-end clamping does not drift (Jan 31 → Feb 28 → Mar 31).
pub fn next_due_after(
    stored: Option<NaiveDate>,
    recurrence: Recurrence,
    completed_on: NaiveDate,
) -> Option<NaiveDate> {
    let base = stored.unwrap_or(completed_on);

    let mut times: u32 = 1;
    if base < completed_on {
        let gap_days = (completed_on - base).num_days();
        let approx_unit_days: i64 = match recurrence.unit {
            RecurrenceUnit::Day => 1,
            RecurrenceUnit::Week => 7,
            RecurrenceUnit::Month => 31,
            RecurrenceUnit::Year => 366,
        };
        // Lower bound on the intervals already elapsed; the loop finishes the job.
        let elapsed = gap_days / (approx_unit_days * i64::from(recurrence.interval));
        times = u32::try_from(elapsed.max(1)).ok()?;
    }

    loop {
        let candidate = recurrence.advance(base, times)?;
        if candidate > completed_on {
            return Some(candidate);
        }
        times = times.checked_add(1)?;
    }
}

/// Member after `current` in `rotation`, wrapping around. Falls back to the
/// first member when `current` is unset or no longer in the rotation; an empty
/// rotation keeps `current`.
pub fn next_assignee(rotation: &[Uuid], current: Option<Uuid>) -> Option<Uuid> {
    if rotation.is_empty() {
        return current;
    }
    let next = current
        .and_then(|id| rotation.iter().position(|m| *m == id))
        .map(|index| (index + 1) % rotation.len())
        .unwrap_or(0);
    Some(rotation[next])
}
