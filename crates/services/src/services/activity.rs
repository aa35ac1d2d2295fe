//! Household activity history.

use db::models::activity::{ActivityAction, ActivityEntry, ActivityQuery, EntityKind};
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

pub struct ActivityService;

impl ActivityService {
    /// Appends an entry. History is auxiliary: a failed write is logged and
    /// never fails the operation that triggered it.
    pub async fn record(
        pool: &SqlitePool,
        household_id: Uuid,
        actor_id: Option<Uuid>,
        action: ActivityAction,
        entity_kind: EntityKind,
        entity_id: Option<Uuid>,
        summary: impl AsRef<str>,
    ) {
        let summary = summary.as_ref();
        match ActivityEntry::create(
            pool,
            household_id,
            actor_id,
            action,
            entity_kind,
            entity_id,
            summary,
        )
        .await
        {
            Ok(entry) => debug!(
                household_id = %household_id,
                action = %action,
                entity_kind = %entity_kind,
                entry_id = %entry.id,
                "Recorded activity"
            ),
            Err(e) => warn!(
                household_id = %household_id,
                action = %action,
                error = %e,
                "Failed to record activity"
            ),
        }
    }

    pub async fn list(
        pool: &SqlitePool,
        household_id: Uuid,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityEntry>, sqlx::Error> {
        ActivityEntry::find_by_household_id(pool, household_id, clamp_limit(query.limit), query)
            .await
    }
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10_000)), MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;
        for summary in ["first", "second", "third"] {
            ActivityService::record(
                pool,
                fx.household.id,
                Some(fx.admin.id),
                ActivityAction::Updated,
                EntityKind::Household,
                Some(fx.household.id),
                summary,
            )
            .await;
        }

        let query = ActivityQuery {
            limit: Some(2),
            ..Default::default()
        };
        let entries = ActivityService::list(pool, fx.household.id, &query).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].summary, "third");
        assert_eq!(entries[1].summary, "second");
    }

    #[tokio::test]
    async fn cursor_pages_through_entries_sharing_a_timestamp() {
        let fx = test_support::household_with_members(0).await;
        let pool = &fx.db.pool;
        let at = chrono::Utc::now();
        for summary in ["a", "b", "c", "d", "e"] {
            let entry = ActivityEntry {
                id: Uuid::new_v4(),
                household_id: fx.household.id,
                actor_id: None,
                action: ActivityAction::Updated,
                entity_kind: EntityKind::Household,
                entity_id: None,
                summary: summary.to_string(),
                created_at: at,
            };
            ActivityEntry::insert_full(pool, &entry).await.unwrap();
        }

        let mut seen = Vec::new();
        let mut query = ActivityQuery {
            limit: Some(2),
            ..Default::default()
        };
        loop {
            let page = ActivityService::list(pool, fx.household.id, &query).await.unwrap();
            let Some(last) = page.last() else { break };
            query.before_id = Some(last.id);
            seen.extend(page.iter().map(|e| e.summary.clone()));
        }
        // The household's own creation entry is older than the batch.
        assert_eq!(&seen[..5], ["e", "d", "c", "b", "a"]);
        assert_eq!(seen.len(), 6);
    }
}
