use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

/// Unit a recurring chore repeats in
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "recurrence_unit", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecurrenceUnit {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub household_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub recurrence_interval: Option<i64>,
    pub recurrence_unit: Option<RecurrenceUnit>,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A member's slot in a chore's rotation
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TaskRotationEntry {
    pub task_id: Uuid,
    pub member_id: Uuid,
    pub position: i64,
}

/// One completion of a chore; recurring chores accumulate many
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TaskCompletion {
    pub id: Uuid,
    pub task_id: Uuid,
    pub completed_by: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskWithRotation {
    #[serde(flatten)]
    #[ts(flatten)]
    pub task: Task,
    pub rotation: Vec<Uuid>,
    pub depends_on: Vec<Uuid>,
    pub blocked: bool,
}

impl std::ops::Deref for TaskWithRotation {
    type Target = Task;
    fn deref(&self) -> &Self::Target {
        &self.task
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub recurrence_interval: Option<i64>,
    pub recurrence_unit: Option<RecurrenceUnit>,
    /// Members the chore rotates through, in order.
    pub rotation: Option<Vec<Uuid>>,
}

impl CreateTask {
    pub fn from_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            assignee_id: None,
            due_date: None,
            recurrence_interval: None,
            recurrence_unit: None,
            rotation: None,
        }
    }

    pub fn recurring(
        title: impl Into<String>,
        due_date: NaiveDate,
        interval: i64,
        unit: RecurrenceUnit,
    ) -> Self {
        Self {
            due_date: Some(due_date),
            recurrence_interval: Some(interval),
            recurrence_unit: Some(unit),
            ..Self::from_title(title)
        }
    }
}

/// Absent fields keep their value. `clear_*` flags null out optional columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub recurrence_interval: Option<i64>,
    pub recurrence_unit: Option<RecurrenceUnit>,
    #[serde(default)]
    pub clear_assignee: bool,
    #[serde(default)]
    pub clear_due_date: bool,
    #[serde(default)]
    pub clear_recurrence: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
    pub due_before: Option<NaiveDate>,
}

impl Task {
    pub fn is_recurring(&self) -> bool {
        self.recurrence_interval.is_some() && self.recurrence_unit.is_some()
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"SELECT * FROM tasks
               WHERE household_id = $1
                 AND ($2 IS NULL OR status = $2)
                 AND ($3 IS NULL OR assignee_id = $3)
                 AND ($4 IS NULL OR (due_date IS NOT NULL AND due_date <= $4))
               ORDER BY due_date IS NULL, due_date ASC, created_at ASC"#,
        )
        .bind(household_id)
        .bind(filter.status)
        .bind(filter.assignee_id)
        .bind(filter.due_before)
        .fetch_all(pool)
        .await
    }

    /// Chores with a due date inside `[from, to]`, for the agenda.
    pub async fn find_due_between(
        pool: &SqlitePool,
        household_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"SELECT * FROM tasks
               WHERE household_id = $1
                 AND status != 'done'
                 AND due_date IS NOT NULL
                 AND due_date BETWEEN $2 AND $3
               ORDER BY due_date ASC"#,
        )
        .bind(household_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Open chores due strictly before `today`.
    pub async fn find_overdue(pool: &SqlitePool, today: NaiveDate) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"SELECT * FROM tasks
               WHERE status != 'done'
                 AND due_date IS NOT NULL
                 AND due_date < $1
               ORDER BY due_date ASC"#,
        )
        .bind(today)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        household_id: Uuid,
        data: &CreateTask,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"INSERT INTO tasks (id, household_id, title, description, assignee_id, due_date,
                                  recurrence_interval, recurrence_unit, created_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING *"#,
        )
        .bind(id)
        .bind(household_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.assignee_id)
        .bind(data.due_date)
        .bind(data.recurrence_interval)
        .bind(data.recurrence_unit)
        .bind(created_by)
        .fetch_one(pool)
        .await
    }

    /// Writes every mutable column from `task`.
    pub async fn save<'e, E>(executor: E, task: &Task) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Task>(
            r#"UPDATE tasks
               SET title = $2, description = $3, status = $4, assignee_id = $5, due_date = $6,
                   recurrence_interval = $7, recurrence_unit = $8,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.assignee_id)
        .bind(task.due_date)
        .bind(task.recurrence_interval)
        .bind(task.recurrence_unit)
        .fetch_one(executor)
        .await
    }

    /// Records a completion: status, next due date and assignee as computed by the caller.
    /// Completes the occurrence `current` was read at. Returns `None` when the
    /// task has since been completed or rescheduled by someone else.
    pub async fn mark_completed<'e, E>(
        executor: E,
        current: &Task,
        status: TaskStatus,
        due_date: Option<NaiveDate>,
        assignee_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Task>(
            r#"UPDATE tasks
               SET status = $2, due_date = $3, assignee_id = $4,
                   last_completed_at = datetime('now', 'subsec'),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND status = $5 AND due_date IS $6
               RETURNING *"#,
        )
        .bind(current.id)
        .bind(status)
        .bind(due_date)
        .bind(assignee_id)
        .bind(current.status)
        .bind(current.due_date)
        .fetch_optional(executor)
        .await
    }

    /// Moves the task from `from` to `status`; `None` if it was no longer in `from`.
    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        from: TaskStatus,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"UPDATE tasks
               SET status = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND status = $3
               RETURNING *"#,
        )
        .bind(id)
        .bind(status)
        .bind(from)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert_full<'e, E>(executor: E, task: &Task) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO tasks (id, household_id, title, description, status, assignee_id, due_date,
                                  recurrence_interval, recurrence_unit, last_completed_at, created_by,
                                  created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(task.id)
        .bind(task.household_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.assignee_id)
        .bind(task.due_date)
        .bind(task.recurrence_interval)
        .bind(task.recurrence_unit)
        .bind(task.last_completed_at.as_ref().map(crate::sql_timestamp))
        .bind(task.created_by)
        .bind(crate::sql_timestamp(&task.created_at))
        .bind(crate::sql_timestamp(&task.updated_at))
        .execute(executor)
        .await?;
        Ok(())
    }
}

impl TaskRotationEntry {
    pub async fn find_by_task_id(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskRotationEntry>(
            "SELECT * FROM task_rotations WHERE task_id = $1 ORDER BY position ASC",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskRotationEntry>(
            r#"SELECT tr.* FROM task_rotations tr
               JOIN tasks t ON t.id = tr.task_id
               WHERE t.household_id = $1
               ORDER BY tr.task_id, tr.position ASC"#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    /// Member ids in rotation order.
    pub async fn member_ids(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        Ok(Self::find_by_task_id(pool, task_id)
            .await?
            .into_iter()
            .map(|entry| entry.member_id)
            .collect())
    }

    pub async fn replace(
        pool: &SqlitePool,
        task_id: Uuid,
        member_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM task_rotations WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;
        for (position, member_id) in member_ids.iter().enumerate() {
            Self::insert(
                &mut *tx,
                &TaskRotationEntry {
                    task_id,
                    member_id: *member_id,
                    position: position as i64,
                },
            )
            .await?;
        }
        tx.commit().await
    }

    pub async fn insert<'e, E>(executor: E, entry: &TaskRotationEntry) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("INSERT INTO task_rotations (task_id, member_id, position) VALUES ($1, $2, $3)")
            .bind(entry.task_id)
            .bind(entry.member_id)
            .bind(entry.position)
            .execute(executor)
            .await?;
        Ok(())
    }
}

impl TaskCompletion {
    pub async fn create<'e, E>(
        executor: E,
        task_id: Uuid,
        completed_by: Uuid,
        due_date: Option<NaiveDate>,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, TaskCompletion>(
            r#"INSERT INTO task_completions (id, task_id, completed_by, due_date)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(task_id)
        .bind(completed_by)
        .bind(due_date)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_task_id(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskCompletion>(
            "SELECT * FROM task_completions WHERE task_id = $1 ORDER BY completed_at DESC",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_household_id(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskCompletion>(
            r#"SELECT tc.* FROM task_completions tc
               JOIN tasks t ON t.id = tc.task_id
               WHERE t.household_id = $1
               ORDER BY tc.completed_at ASC"#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    pub async fn insert_full<'e, E>(executor: E, completion: &TaskCompletion) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO task_completions (id, task_id, completed_by, due_date, completed_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(completion.id)
        .bind(completion.task_id)
        .bind(completion.completed_by)
        .bind(completion.due_date)
        .bind(crate::sql_timestamp(&completion.completed_at))
        .execute(executor)
        .await?;
        Ok(())
    }
}
