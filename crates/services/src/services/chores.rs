//! Chores: recurring and rotating tasks with prerequisite links.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use db::models::{
    activity::{ActivityAction, EntityKind},
    member::Member,
    notification::NotificationKind,
    task::{
        CreateTask, Task, TaskCompletion, TaskFilter, TaskRotationEntry, TaskStatus,
        TaskWithRotation, UpdateTask,
    },
    task_dependency::TaskDependency,
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    activity::ActivityService,
    dependencies,
    notification::{NotificationMessage, NotificationService},
    recurrence::{Recurrence, RecurrenceError, next_assignee, next_due_after},
    validation::{ValidationError, optional_text, required_text},
};

const MAX_TITLE_CHARS: usize = 120;
const MAX_DESCRIPTION_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum ChoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),
    #[error("task not found")]
    NotFound,
    #[error("member {0} does not belong to this household")]
    ForeignMember(Uuid),
    #[error("member {0} appears more than once in the rotation")]
    DuplicateRotationMember(Uuid),
    #[error("task is blocked by unfinished prerequisites: {}", .0.join(", "))]
    Blocked(Vec<String>),
    #[error("task is already done")]
    AlreadyDone,
    #[error("task is not done")]
    NotDone,
    #[error("a task cannot depend on itself")]
    SelfDependency,
    #[error("dependency already exists")]
    DuplicateDependency,
    #[error("dependency not found")]
    DependencyNotFound,
    #[error("dependency would create a cycle")]
    DependencyCycle,
    #[error("next due date is out of range")]
    DueDateOverflow,
}

pub struct ChoreService;

impl ChoreService {
    pub async fn create(
        pool: &SqlitePool,
        actor: &Member,
        data: &CreateTask,
    ) -> Result<TaskWithRotation, ChoreError> {
        let title = required_text("title", &data.title, MAX_TITLE_CHARS)?;
        let description =
            optional_text("description", data.description.as_deref(), MAX_DESCRIPTION_CHARS)?;
        Recurrence::from_parts(data.recurrence_interval, data.recurrence_unit)?;

        let household_members = Self::member_ids(pool, actor.household_id).await?;
        let rotation = data.rotation.clone().unwrap_or_default();
        check_rotation(&household_members, &rotation)?;
        if let Some(assignee) = data.assignee_id {
            check_member(&household_members, assignee)?;
        }

        let data = CreateTask {
            title,
            description,
            assignee_id: data.assignee_id.or_else(|| rotation.first().copied()),
            rotation: None,
            ..data.clone()
        };
        let task = Task::create(pool, Uuid::new_v4(), actor.household_id, &data, actor.id).await?;
        if !rotation.is_empty() {
            TaskRotationEntry::replace(pool, task.id, &rotation).await?;
        }

        info!(task_id = %task.id, household_id = %task.household_id, "Task created");
        ActivityService::record(
            pool,
            task.household_id,
            Some(actor.id),
            ActivityAction::Created,
            EntityKind::Task,
            Some(task.id),
            format!("{} added the chore {}", actor.display_name, task.title),
        )
        .await;
        Self::notify_assignee(pool, actor, &task).await;

        Self::get(pool, actor.household_id, task.id).await
    }

    pub async fn get(
        pool: &SqlitePool,
        household_id: Uuid,
        task_id: Uuid,
    ) -> Result<TaskWithRotation, ChoreError> {
        let task = Self::find(pool, household_id, task_id).await?;
        let rotation = TaskRotationEntry::member_ids(pool, task.id).await?;
        let depends_on: Vec<Uuid> = TaskDependency::find_by_task_id(pool, task.id)
            .await?
            .into_iter()
            .map(|link| link.depends_on_id)
            .collect();

        let mut prerequisites = Vec::with_capacity(depends_on.len());
        for id in &depends_on {
            if let Some(prerequisite) = Task::find_by_id(pool, *id).await? {
                prerequisites.push(prerequisite);
            }
        }
        let blocked = !dependencies::unsatisfied(&prerequisites).is_empty();

        Ok(TaskWithRotation {
            task,
            rotation,
            depends_on,
            blocked,
        })
    }

    pub async fn list(
        pool: &SqlitePool,
        household_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskWithRotation>, ChoreError> {
        let tasks = Task::find_by_household_id(pool, household_id, filter).await?;

        // Prerequisites may fall outside the filter, so resolve against every task.
        let everything: HashMap<Uuid, Task> =
            Task::find_by_household_id(pool, household_id, &TaskFilter::default())
                .await?
                .into_iter()
                .map(|t| (t.id, t))
                .collect();

        let mut rotations: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for entry in TaskRotationEntry::find_by_household_id(pool, household_id).await? {
            rotations.entry(entry.task_id).or_default().push(entry.member_id);
        }
        let mut links: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for link in TaskDependency::find_by_household_id(pool, household_id).await? {
            links.entry(link.task_id).or_default().push(link.depends_on_id);
        }

        Ok(tasks
            .into_iter()
            .map(|task| {
                let depends_on = links.remove(&task.id).unwrap_or_default();
                let blocked = depends_on
                    .iter()
                    .filter_map(|id| everything.get(id))
                    .any(|t| !dependencies::is_satisfied(t));
                TaskWithRotation {
                    rotation: rotations.remove(&task.id).unwrap_or_default(),
                    depends_on,
                    blocked,
                    task,
                }
            })
            .collect())
    }

    pub async fn update(
        pool: &SqlitePool,
        actor: &Member,
        task_id: Uuid,
        data: &UpdateTask,
    ) -> Result<TaskWithRotation, ChoreError> {
        let mut task = Self::find(pool, actor.household_id, task_id).await?;
        let previous_assignee = task.assignee_id;

        if let Some(title) = data.title.as_deref() {
            task.title = required_text("title", title, MAX_TITLE_CHARS)?;
        }
        if let Some(description) = data.description.as_deref() {
            task.description = optional_text("description", Some(description), MAX_DESCRIPTION_CHARS)?;
        }
        if let Some(status) = data.status {
            if status == TaskStatus::Done && task.status != TaskStatus::Done {
                return Err(ValidationError::new("status", "use complete to finish a task").into());
            }
            task.status = status;
        }

        if data.clear_assignee {
            task.assignee_id = None;
        } else if let Some(assignee) = data.assignee_id {
            check_member(&Self::member_ids(pool, actor.household_id).await?, assignee)?;
            task.assignee_id = Some(assignee);
        }

        if data.clear_due_date {
            task.due_date = None;
        } else if let Some(due) = data.due_date {
            task.due_date = Some(due);
        }

        if data.clear_recurrence {
            task.recurrence_interval = None;
            task.recurrence_unit = None;
        } else if data.recurrence_interval.is_some() || data.recurrence_unit.is_some() {
            let interval = data.recurrence_interval.or(task.recurrence_interval);
            let unit = data.recurrence_unit.or(task.recurrence_unit);
            Recurrence::from_parts(interval, unit)?;
            task.recurrence_interval = interval;
            task.recurrence_unit = unit;
        }

        let task = Task::save(pool, &task).await?;
        ActivityService::record(
            pool,
            task.household_id,
            Some(actor.id),
            ActivityAction::Updated,
            EntityKind::Task,
            Some(task.id),
            format!("{} updated the chore {}", actor.display_name, task.title),
        )
        .await;
        if task.assignee_id != previous_assignee {
            Self::notify_assignee(pool, actor, &task).await;
        }

        Self::get(pool, actor.household_id, task.id).await
    }

    pub async fn delete(pool: &SqlitePool, actor: &Member, task_id: Uuid) -> Result<(), ChoreError> {
        let task = Self::find(pool, actor.household_id, task_id).await?;

        let mut tx = pool.begin().await?;
        let links = TaskDependency::delete_all_for_task(&mut *tx, task.id).await?;
        Task::delete(&mut *tx, task.id).await?;
        tx.commit().await?;

        debug!(task_id = %task.id, links, "Task deleted");
        ActivityService::record(
            pool,
            task.household_id,
            Some(actor.id),
            ActivityAction::Deleted,
            EntityKind::Task,
            Some(task.id),
            format!("{} removed the chore {}", actor.display_name, task.title),
        )
        .await;
        Ok(())
    }

    pub async fn set_rotation(
        pool: &SqlitePool,
        actor: &Member,
        task_id: Uuid,
        rotation: &[Uuid],
    ) -> Result<TaskWithRotation, ChoreError> {
        let task = Self::find(pool, actor.household_id, task_id).await?;
        check_rotation(&Self::member_ids(pool, actor.household_id).await?, rotation)?;
        TaskRotationEntry::replace(pool, task.id, rotation).await?;

        ActivityService::record(
            pool,
            task.household_id,
            Some(actor.id),
            ActivityAction::Updated,
            EntityKind::Task,
            Some(task.id),
            format!(
                "{} set a rotation of {} for {}",
                actor.display_name,
                rotation.len(),
                task.title
            ),
        )
        .await;
        Self::get(pool, actor.household_id, task.id).await
    }

    /// Marks the chore done. Recurring chores go back to `todo` with the next
    /// due date and the next member of the rotation.
    pub async fn complete(
        pool: &SqlitePool,
        actor: &Member,
        task_id: Uuid,
        today: NaiveDate,
    ) -> Result<TaskWithRotation, ChoreError> {
        let task = Self::find(pool, actor.household_id, task_id).await?;

        let mut prerequisites = Vec::new();
        for link in TaskDependency::find_by_task_id(pool, task.id).await? {
            if let Some(prerequisite) = Task::find_by_id(pool, link.depends_on_id).await? {
                prerequisites.push(prerequisite);
            }
        }
        let blocking: Vec<String> = dependencies::unsatisfied(&prerequisites)
            .into_iter()
            .map(|t| t.title.clone())
            .collect();
        if !blocking.is_empty() {
            return Err(ChoreError::Blocked(blocking));
        }

        let (status, due_date, assignee_id) = match Recurrence::from_task(&task) {
            Some(recurrence) => {
                let rotation = TaskRotationEntry::member_ids(pool, task.id).await?;
                let due = next_due_after(task.due_date, recurrence, today)
                    .ok_or(ChoreError::DueDateOverflow)?;
                (TaskStatus::Todo, Some(due), next_assignee(&rotation, task.assignee_id))
            }
            None if task.status == TaskStatus::Done => return Err(ChoreError::AlreadyDone),
            None => (TaskStatus::Done, task.due_date, task.assignee_id),
        };

        let mut tx = pool.begin().await?;
        let Some(updated) =
            Task::mark_completed(&mut *tx, &task, status, due_date, assignee_id).await?
        else {
            return Err(ChoreError::AlreadyDone);
        };
        TaskCompletion::create(&mut *tx, task.id, actor.id, task.due_date).await?;
        tx.commit().await?;

        info!(
            task_id = %updated.id,
            next_due = ?updated.due_date,
            "Task completed"
        );
        ActivityService::record(
            pool,
            updated.household_id,
            Some(actor.id),
            ActivityAction::Completed,
            EntityKind::Task,
            Some(updated.id),
            format!("{} completed {}", actor.display_name, updated.title),
        )
        .await;
        if updated.assignee_id != task.assignee_id {
            Self::notify_assignee(pool, actor, &updated).await;
        }

        Self::get(pool, actor.household_id, updated.id).await
    }

    pub async fn reopen(
        pool: &SqlitePool,
        actor: &Member,
        task_id: Uuid,
    ) -> Result<TaskWithRotation, ChoreError> {
        let task = Self::find(pool, actor.household_id, task_id).await?;
        if task.status != TaskStatus::Done {
            return Err(ChoreError::NotDone);
        }
        let task = Task::update_status(pool, task.id, TaskStatus::Done, TaskStatus::Todo)
            .await?
            .ok_or(ChoreError::NotDone)?;
        ActivityService::record(
            pool,
            task.household_id,
            Some(actor.id),
            ActivityAction::Reopened,
            EntityKind::Task,
            Some(task.id),
            format!("{} reopened {}", actor.display_name, task.title),
        )
        .await;
        Self::get(pool, actor.household_id, task.id).await
    }

    pub async fn add_dependency(
        pool: &SqlitePool,
        actor: &Member,
        task_id: Uuid,
        depends_on_id: Uuid,
    ) -> Result<TaskDependency, ChoreError> {
        if task_id == depends_on_id {
            return Err(ChoreError::SelfDependency);
        }
        let task = Self::find(pool, actor.household_id, task_id).await?;
        let prerequisite = Self::find(pool, actor.household_id, depends_on_id).await?;
        if TaskDependency::exists(pool, task.id, prerequisite.id).await? {
            return Err(ChoreError::DuplicateDependency);
        }

        let edges: Vec<(Uuid, Uuid)> = TaskDependency::find_by_household_id(pool, actor.household_id)
            .await?
            .into_iter()
            .map(|link| (link.task_id, link.depends_on_id))
            .collect();
        if dependencies::would_create_cycle(&edges, task.id, prerequisite.id) {
            return Err(ChoreError::DependencyCycle);
        }

        let link = TaskDependency::create(pool, task.id, prerequisite.id).await?;
        ActivityService::record(
            pool,
            task.household_id,
            Some(actor.id),
            ActivityAction::Updated,
            EntityKind::Task,
            Some(task.id),
            format!(
                "{} made {} wait for {}",
                actor.display_name, task.title, prerequisite.title
            ),
        )
        .await;
        Ok(link)
    }

    pub async fn remove_dependency(
        pool: &SqlitePool,
        actor: &Member,
        task_id: Uuid,
        depends_on_id: Uuid,
    ) -> Result<(), ChoreError> {
        let task = Self::find(pool, actor.household_id, task_id).await?;
        if TaskDependency::delete(pool, task.id, depends_on_id).await? == 0 {
            return Err(ChoreError::DependencyNotFound);
        }
        ActivityService::record(
            pool,
            task.household_id,
            Some(actor.id),
            ActivityAction::Updated,
            EntityKind::Task,
            Some(task.id),
            format!("{} removed a prerequisite from {}", actor.display_name, task.title),
        )
        .await;
        Ok(())
    }

    pub async fn history(
        pool: &SqlitePool,
        household_id: Uuid,
        task_id: Uuid,
    ) -> Result<Vec<TaskCompletion>, ChoreError> {
        let task = Self::find(pool, household_id, task_id).await?;
        Ok(TaskCompletion::find_by_task_id(pool, task.id).await?)
    }

    async fn find(pool: &SqlitePool, household_id: Uuid, task_id: Uuid) -> Result<Task, ChoreError> {
        Task::find_by_id(pool, task_id)
            .await?
            .filter(|task| task.household_id == household_id)
            .ok_or(ChoreError::NotFound)
    }

    async fn member_ids(pool: &SqlitePool, household_id: Uuid) -> Result<HashSet<Uuid>, ChoreError> {
        Ok(Member::find_by_household_id(pool, household_id)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect())
    }

    async fn notify_assignee(pool: &SqlitePool, actor: &Member, task: &Task) {
        let Some(assignee) = task.assignee_id else {
            return;
        };
        if assignee == actor.id {
            return;
        }
        NotificationService::notify(
            pool,
            NotificationMessage {
                household_id: task.household_id,
                member_id: assignee,
                kind: NotificationKind::TaskAssigned,
                title: format!("You're up for {}", task.title),
                body: task.due_date.map(|due| format!("Due {due}")),
                entity_id: Some(task.id),
            },
        )
        .await;
    }
}

fn check_member(household_members: &HashSet<Uuid>, member_id: Uuid) -> Result<(), ChoreError> {
    if household_members.contains(&member_id) {
        Ok(())
    } else {
        Err(ChoreError::ForeignMember(member_id))
    }
}

fn check_rotation(household_members: &HashSet<Uuid>, rotation: &[Uuid]) -> Result<(), ChoreError> {
    let mut seen = HashSet::with_capacity(rotation.len());
    for member_id in rotation {
        check_member(household_members, *member_id)?;
        if !seen.insert(*member_id) {
            return Err(ChoreError::DuplicateRotationMember(*member_id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use db::models::{notification::Notification, task::RecurrenceUnit};

    use super::*;
    use crate::services::test_support;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn recurring_chore_rotates_and_advances() {
        let fx = test_support::household_with_members(2).await;
        let pool = &fx.db.pool;
        let rotation = vec![fx.members[0].id, fx.members[1].id, fx.admin.id];

        let mut data = CreateTask::recurring("Take out bins", date(2026, 3, 2), 1, RecurrenceUnit::Week);
        data.rotation = Some(rotation.clone());
        let created = ChoreService::create(pool, &fx.admin, &data).await.unwrap();
        assert_eq!(created.assignee_id, Some(fx.members[0].id));
        assert_eq!(created.rotation, rotation);

        let done = ChoreService::complete(pool, &fx.members[0], created.id, date(2026, 3, 2))
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Todo);
        assert_eq!(done.due_date, Some(date(2026, 3, 9)));
        assert_eq!(done.assignee_id, Some(fx.members[1].id));
        assert!(done.last_completed_at.is_some());

        // Three weeks late: lands on the first slot after the completion day.
        let late = ChoreService::complete(pool, &fx.members[1], created.id, date(2026, 3, 30))
            .await
            .unwrap();
        assert_eq!(late.due_date, Some(date(2026, 4, 6)));
        assert_eq!(late.assignee_id, Some(fx.admin.id));

        let history = ChoreService::history(pool, fx.household.id, created.id).await.unwrap();
        assert_eq!(history.len(), 2);

        let inbox = Notification::find_for_member(pool, fx.members[1].id, true, 10)
            .await
            .unwrap();
        assert!(inbox.iter().any(|n| n.kind == NotificationKind::TaskAssigned));
    }

    #[tokio::test]
    async fn one_off_chore_finishes_and_reopens() {
        let fx = test_support::household_with_members(0).await;
        let pool = &fx.db.pool;
        let task = ChoreService::create(pool, &fx.admin, &CreateTask::from_title("Fix tap"))
            .await
            .unwrap();

        let done = ChoreService::complete(pool, &fx.admin, task.id, date(2026, 1, 1))
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Done);
        assert!(matches!(
            ChoreService::complete(pool, &fx.admin, task.id, date(2026, 1, 1)).await,
            Err(ChoreError::AlreadyDone)
        ));

        let reopened = ChoreService::reopen(pool, &fx.admin, task.id).await.unwrap();
        assert_eq!(reopened.status, TaskStatus::Todo);
        assert!(matches!(
            ChoreService::reopen(pool, &fx.admin, task.id).await,
            Err(ChoreError::NotDone)
        ));
    }

    #[tokio::test]
    async fn simultaneous_completions_count_once() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;
        let data = CreateTask::recurring("Mop floors", date(2026, 3, 2), 1, RecurrenceUnit::Week);
        let task = ChoreService::create(pool, &fx.admin, &data).await.unwrap();

        let (first, second) = tokio::join!(
            ChoreService::complete(pool, &fx.admin, task.id, date(2026, 3, 2)),
            ChoreService::complete(pool, &fx.members[0], task.id, date(2026, 3, 2)),
        );
        assert!(first.is_ok() != second.is_ok(), "{first:?} / {second:?}");
        let loser = if first.is_ok() { second } else { first };
        assert!(matches!(loser, Err(ChoreError::AlreadyDone)));

        let after = ChoreService::get(pool, fx.household.id, task.id).await.unwrap();
        assert_eq!(after.due_date, Some(date(2026, 3, 9)));
        let history = ChoreService::history(pool, fx.household.id, task.id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn prerequisites_block_completion_until_done() {
        let fx = test_support::household_with_members(0).await;
        let pool = &fx.db.pool;
        let buy = ChoreService::create(pool, &fx.admin, &CreateTask::from_title("Buy paint"))
            .await
            .unwrap();
        let paint = ChoreService::create(pool, &fx.admin, &CreateTask::from_title("Paint fence"))
            .await
            .unwrap();

        ChoreService::add_dependency(pool, &fx.admin, paint.id, buy.id)
            .await
            .unwrap();
        assert!(matches!(
            ChoreService::add_dependency(pool, &fx.admin, paint.id, buy.id).await,
            Err(ChoreError::DuplicateDependency)
        ));
        assert!(matches!(
            ChoreService::add_dependency(pool, &fx.admin, buy.id, paint.id).await,
            Err(ChoreError::DependencyCycle)
        ));
        assert!(matches!(
            ChoreService::add_dependency(pool, &fx.admin, buy.id, buy.id).await,
            Err(ChoreError::SelfDependency)
        ));

        let listed = ChoreService::list(pool, fx.household.id, &TaskFilter::default())
            .await
            .unwrap();
        let listed_paint = listed.iter().find(|t| t.id == paint.id).unwrap();
        assert!(listed_paint.blocked);
        assert_eq!(listed_paint.depends_on, vec![buy.id]);

        let blocked = ChoreService::complete(pool, &fx.admin, paint.id, date(2026, 5, 1)).await;
        match blocked {
            Err(ChoreError::Blocked(titles)) => assert_eq!(titles, vec!["Buy paint".to_string()]),
            other => panic!("expected Blocked, got {other:?}"),
        }

        ChoreService::complete(pool, &fx.admin, buy.id, date(2026, 5, 1))
            .await
            .unwrap();
        let painted = ChoreService::complete(pool, &fx.admin, paint.id, date(2026, 5, 1))
            .await
            .unwrap();
        assert_eq!(painted.status, TaskStatus::Done);
        assert!(!painted.blocked);

        ChoreService::delete(pool, &fx.admin, buy.id).await.unwrap();
        let paint = ChoreService::get(pool, fx.household.id, paint.id).await.unwrap();
        assert!(paint.depends_on.is_empty());
    }

    #[tokio::test]
    async fn rotation_rejects_foreign_and_duplicate_members() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;
        let task = ChoreService::create(pool, &fx.admin, &CreateTask::from_title("Hoover"))
            .await
            .unwrap();

        let stranger = Uuid::new_v4();
        assert!(matches!(
            ChoreService::set_rotation(pool, &fx.admin, task.id, &[fx.admin.id, stranger]).await,
            Err(ChoreError::ForeignMember(id)) if id == stranger
        ));
        assert!(matches!(
            ChoreService::set_rotation(pool, &fx.admin, task.id, &[fx.admin.id, fx.admin.id]).await,
            Err(ChoreError::DuplicateRotationMember(_))
        ));

        let updated = ChoreService::set_rotation(pool, &fx.admin, task.id, &[fx.members[0].id, fx.admin.id])
            .await
            .unwrap();
        assert_eq!(updated.rotation, vec![fx.members[0].id, fx.admin.id]);
    }

    #[tokio::test]
    async fn update_honours_clear_flags_and_validates_recurrence() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;
        let mut data = CreateTask::recurring("Water plants", date(2026, 6, 1), 3, RecurrenceUnit::Day);
        data.assignee_id = Some(fx.members[0].id);
        let task = ChoreService::create(pool, &fx.admin, &data).await.unwrap();

        let bad = ChoreService::update(
            pool,
            &fx.admin,
            task.id,
            &UpdateTask {
                recurrence_interval: Some(0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(bad, Err(ChoreError::Recurrence(RecurrenceError::InvalidInterval))));

        let cleared = ChoreService::update(
            pool,
            &fx.admin,
            task.id,
            &UpdateTask {
                clear_assignee: true,
                clear_due_date: true,
                clear_recurrence: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(cleared.assignee_id.is_none());
        assert!(cleared.due_date.is_none());
        assert!(!cleared.is_recurring());
        assert_eq!(cleared.title, "Water plants");
    }
}
