//! Households, membership, and invite codes.

use db::models::{
    activity::{ActivityAction, EntityKind},
    borrow_request::BorrowRequest,
    household::Household,
    member::{Member, MemberRole, UpdateMember},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    activity::ActivityService,
    validation::{ValidationError, optional_text, required_text},
};

/// Letters and digits that cannot be confused with each other when read aloud.
const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const INVITE_CODE_LEN: usize = 8;
const INVITE_ATTEMPTS: usize = 5;

pub const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum HouseholdError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("household not found")]
    NotFound,
    #[error("member not found")]
    MemberNotFound,
    #[error("invite code not recognised")]
    InvalidInviteCode,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("could not generate a unique invite code")]
    InviteCodeExhausted,
    #[error("member still has {0} approved or active loan(s)")]
    HasOpenLoans(i64),
}

/// Household together with the member who created it
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct HouseholdWithMember {
    pub household: Household,
    pub member: Member,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct HouseholdOverview {
    pub household: Household,
    pub members: Vec<Member>,
}

pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_ALPHABET[rng.gen_range(0..INVITE_ALPHABET.len())] as char)
        .collect()
}

/// Upper-cases and strips whitespace and dashes so "abcd-efgh" matches "ABCDEFGH".
pub fn normalize_invite_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}

pub struct HouseholdService;

impl HouseholdService {
    pub async fn create(
        pool: &SqlitePool,
        name: &str,
        display_name: &str,
    ) -> Result<HouseholdWithMember, HouseholdError> {
        let name = required_text("name", name, MAX_NAME_CHARS)?;
        let display_name = required_text("display_name", display_name, MAX_NAME_CHARS)?;
        let invite_code = Self::unused_invite_code(pool).await?;

        let mut tx = pool.begin().await?;
        let household = Household::create(&mut *tx, Uuid::new_v4(), &name, &invite_code).await?;
        let member = Member::create(
            &mut *tx,
            Uuid::new_v4(),
            household.id,
            &display_name,
            MemberRole::Admin,
        )
        .await?;
        tx.commit().await?;

        info!(household_id = %household.id, "Household created");
        ActivityService::record(
            pool,
            household.id,
            Some(member.id),
            ActivityAction::Created,
            EntityKind::Household,
            Some(household.id),
            format!("{} created the household {}", member.display_name, household.name),
        )
        .await;

        Ok(HouseholdWithMember { household, member })
    }

    pub async fn join(
        pool: &SqlitePool,
        invite_code: &str,
        display_name: &str,
    ) -> Result<HouseholdWithMember, HouseholdError> {
        let display_name = required_text("display_name", display_name, MAX_NAME_CHARS)?;
        let household = Household::find_by_invite_code(pool, &normalize_invite_code(invite_code))
            .await?
            .ok_or(HouseholdError::InvalidInviteCode)?;

        let member = Member::create(
            pool,
            Uuid::new_v4(),
            household.id,
            &display_name,
            MemberRole::Member,
        )
        .await?;

        info!(household_id = %household.id, member_id = %member.id, "Member joined household");
        ActivityService::record(
            pool,
            household.id,
            Some(member.id),
            ActivityAction::Joined,
            EntityKind::Member,
            Some(member.id),
            format!("{} joined the household", member.display_name),
        )
        .await;

        Ok(HouseholdWithMember { household, member })
    }

    pub async fn overview(
        pool: &SqlitePool,
        household_id: Uuid,
    ) -> Result<HouseholdOverview, HouseholdError> {
        let household = Household::find_by_id(pool, household_id)
            .await?
            .ok_or(HouseholdError::NotFound)?;
        let members = Member::find_by_household_id(pool, household_id).await?;
        Ok(HouseholdOverview { household, members })
    }

    pub async fn rename(
        pool: &SqlitePool,
        actor: &Member,
        name: &str,
    ) -> Result<Household, HouseholdError> {
        require_admin(actor)?;
        let name = required_text("name", name, MAX_NAME_CHARS)?;
        let household = Household::update_name(pool, actor.household_id, &name).await?;
        ActivityService::record(
            pool,
            household.id,
            Some(actor.id),
            ActivityAction::Updated,
            EntityKind::Household,
            Some(household.id),
            format!("{} renamed the household to {}", actor.display_name, household.name),
        )
        .await;
        Ok(household)
    }

    pub async fn regenerate_invite_code(
        pool: &SqlitePool,
        actor: &Member,
    ) -> Result<Household, HouseholdError> {
        require_admin(actor)?;
        let code = Self::unused_invite_code(pool).await?;
        let household = Household::update_invite_code(pool, actor.household_id, &code).await?;
        info!(household_id = %household.id, "Invite code regenerated");
        ActivityService::record(
            pool,
            household.id,
            Some(actor.id),
            ActivityAction::Updated,
            EntityKind::Household,
            Some(household.id),
            format!("{} issued a new invite code", actor.display_name),
        )
        .await;
        Ok(household)
    }

    pub async fn update_member(
        pool: &SqlitePool,
        actor: &Member,
        member_id: Uuid,
        data: &UpdateMember,
    ) -> Result<Member, HouseholdError> {
        let target = Self::member(pool, actor.household_id, member_id).await?;
        if actor.id != target.id && !actor.is_admin() {
            return Err(HouseholdError::Forbidden(
                "only admins can edit other members",
            ));
        }

        let display_name = match data.display_name.as_deref() {
            Some(name) => required_text("display_name", name, MAX_NAME_CHARS)?,
            None => target.display_name.clone(),
        };
        let color = match data.color.as_deref() {
            Some(color) => optional_text("color", Some(color), 32)?,
            None => target.color.clone(),
        };

        let updated = Member::update(pool, target.id, &display_name, color.as_deref()).await?;
        let summary = if actor.id == updated.id {
            format!("{} updated their profile", updated.display_name)
        } else {
            format!("{} updated {}'s profile", actor.display_name, updated.display_name)
        };
        ActivityService::record(
            pool,
            updated.household_id,
            Some(actor.id),
            ActivityAction::Updated,
            EntityKind::Member,
            Some(updated.id),
            summary,
        )
        .await;
        Ok(updated)
    }

    pub async fn set_role(
        pool: &SqlitePool,
        actor: &Member,
        member_id: Uuid,
        role: MemberRole,
    ) -> Result<Member, HouseholdError> {
        require_admin(actor)?;
        let target = Self::member(pool, actor.household_id, member_id).await?;
        if target.role == role {
            return Ok(target);
        }
        if target.is_admin() && Member::count_admins(pool, target.household_id).await? <= 1 {
            return Err(HouseholdError::Forbidden(
                "the last admin cannot be demoted",
            ));
        }

        let updated = Member::update_role(pool, target.id, role).await?;
        ActivityService::record(
            pool,
            actor.household_id,
            Some(actor.id),
            ActivityAction::Updated,
            EntityKind::Member,
            Some(updated.id),
            format!("{} made {} {}", actor.display_name, updated.display_name, role),
        )
        .await;
        Ok(updated)
    }

    /// Removes a member; members may remove themselves, admins anyone. The last
    /// admin can only leave once everyone else has, and nobody leaves while a
    /// loan they borrowed or lent out is still open.
    pub async fn remove_member(
        pool: &SqlitePool,
        actor: &Member,
        member_id: Uuid,
    ) -> Result<(), HouseholdError> {
        let target = Self::member(pool, actor.household_id, member_id).await?;
        if actor.id != target.id && !actor.is_admin() {
            return Err(HouseholdError::Forbidden(
                "only admins can remove other members",
            ));
        }

        if target.is_admin() {
            let admins = Member::count_admins(pool, target.household_id).await?;
            let members = Member::find_by_household_id(pool, target.household_id).await?;
            if admins <= 1 && members.len() > 1 {
                return Err(HouseholdError::Forbidden(
                    "promote another admin before the last admin leaves",
                ));
            }
        }

        let open_loans = BorrowRequest::count_holds_for_member(pool, target.id).await?;
        if open_loans > 0 {
            return Err(HouseholdError::HasOpenLoans(open_loans));
        }

        Member::delete(pool, target.id).await?;
        let (actor_id, action, summary) = if actor.id == target.id {
            (
                None,
                ActivityAction::Left,
                format!("{} left the household", target.display_name),
            )
        } else {
            (
                Some(actor.id),
                ActivityAction::Deleted,
                format!("{} removed {}", actor.display_name, target.display_name),
            )
        };
        ActivityService::record(
            pool,
            target.household_id,
            actor_id,
            action,
            EntityKind::Member,
            Some(target.id),
            summary,
        )
        .await;
        Ok(())
    }

    async fn member(
        pool: &SqlitePool,
        household_id: Uuid,
        member_id: Uuid,
    ) -> Result<Member, HouseholdError> {
        Member::find_in_household(pool, household_id, member_id)
            .await?
            .ok_or(HouseholdError::MemberNotFound)
    }

    async fn unused_invite_code(pool: &SqlitePool) -> Result<String, HouseholdError> {
        for _ in 0..INVITE_ATTEMPTS {
            let code = generate_invite_code();
            if Household::find_by_invite_code(pool, &code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(HouseholdError::InviteCodeExhausted)
    }
}

pub fn require_admin(member: &Member) -> Result<(), HouseholdError> {
    if member.is_admin() {
        Ok(())
    } else {
        Err(HouseholdError::Forbidden("admin role required"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use db::models::{
        activity::ActivityEntry,
        borrow_request::CreateBorrowRequest,
        inventory_item::CreateInventoryItem,
    };

    use super::*;
    use crate::services::{borrow::BorrowService, inventory::InventoryService, test_support};

    #[test]
    fn invite_codes_use_the_unambiguous_alphabet() {
        let code = generate_invite_code();
        assert_eq!(code.len(), INVITE_CODE_LEN);
        assert!(code.bytes().all(|b| INVITE_ALPHABET.contains(&b)));
        assert!(!code.contains('O') && !code.contains('0') && !code.contains('1'));
    }

    #[test]
    fn invite_code_input_is_normalized() {
        assert_eq!(normalize_invite_code(" abcd-efgh "), "ABCDEFGH");
    }

    #[tokio::test]
    async fn creator_becomes_admin_and_others_join_by_code() {
        let db = db::DBService::new_in_memory().await.unwrap();
        let pool = &db.pool;

        let created = HouseholdService::create(pool, " Elm Street ", "Ada").await.unwrap();
        assert_eq!(created.household.name, "Elm Street");
        assert_eq!(created.member.role, MemberRole::Admin);

        let code = created.household.invite_code.to_lowercase();
        let joined = HouseholdService::join(pool, &code, "Brian").await.unwrap();
        assert_eq!(joined.household.id, created.household.id);
        assert_eq!(joined.member.role, MemberRole::Member);

        assert!(matches!(
            HouseholdService::join(pool, "NOPE2345", "Eve").await,
            Err(HouseholdError::InvalidInviteCode)
        ));
    }

    #[tokio::test]
    async fn last_admin_is_protected() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;

        let demote = HouseholdService::set_role(pool, &fx.admin, fx.admin.id, MemberRole::Member).await;
        assert!(matches!(demote, Err(HouseholdError::Forbidden(_))));

        let leave = HouseholdService::remove_member(pool, &fx.admin, fx.admin.id).await;
        assert!(matches!(leave, Err(HouseholdError::Forbidden(_))));

        let member = &fx.members[0];
        let promote = HouseholdService::set_role(pool, member, member.id, MemberRole::Admin).await;
        assert!(matches!(promote, Err(HouseholdError::Forbidden(_))));

        HouseholdService::set_role(pool, &fx.admin, member.id, MemberRole::Admin)
            .await
            .unwrap();
        HouseholdService::remove_member(pool, &fx.admin, fx.admin.id)
            .await
            .unwrap();
        let overview = HouseholdService::overview(pool, fx.household.id).await.unwrap();
        assert_eq!(overview.members.len(), 1);
    }

    #[tokio::test]
    async fn members_edit_only_themselves() {
        let fx = test_support::household_with_members(2).await;
        let pool = &fx.db.pool;
        let (first, second) = (&fx.members[0], &fx.members[1]);

        let update = UpdateMember {
            display_name: Some("Renamed".to_string()),
            color: Some("#ff8800".to_string()),
        };
        let updated = HouseholdService::update_member(pool, first, first.id, &update)
            .await
            .unwrap();
        assert_eq!(updated.display_name, "Renamed");
        assert_eq!(updated.color.as_deref(), Some("#ff8800"));

        let denied = HouseholdService::update_member(pool, first, second.id, &update).await;
        assert!(matches!(denied, Err(HouseholdError::Forbidden(_))));
    }

    #[tokio::test]
    async fn members_with_open_loans_cannot_leave() {
        let fx = test_support::household_with_members(2).await;
        let pool = &fx.db.pool;
        let (lender, borrower) = (&fx.members[0], &fx.members[1]);
        let day = NaiveDate::from_ymd_opt(2026, 7, 2).unwrap();

        let item = InventoryService::create(
            pool,
            lender,
            &CreateInventoryItem {
                name: "Drill".to_string(),
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
                start_date: day,
                end_date: day,
                message: None,
            },
            day,
        )
        .await
        .unwrap();

        // A pending request does not hold anyone back.
        assert_eq!(BorrowRequest::count_holds_for_member(pool, borrower.id).await.unwrap(), 0);

        BorrowService::approve(pool, lender, request.id, None).await.unwrap();
        assert!(matches!(
            HouseholdService::remove_member(pool, borrower, borrower.id).await,
            Err(HouseholdError::HasOpenLoans(1))
        ));
        assert!(matches!(
            HouseholdService::remove_member(pool, &fx.admin, lender.id).await,
            Err(HouseholdError::HasOpenLoans(1))
        ));

        BorrowService::cancel(pool, borrower, request.id).await.unwrap();
        HouseholdService::remove_member(pool, borrower, borrower.id)
            .await
            .unwrap();
        let overview = HouseholdService::overview(pool, fx.household.id).await.unwrap();
        assert_eq!(overview.members.len(), 2);
    }

    #[tokio::test]
    async fn invite_and_profile_changes_are_logged() {
        let fx = test_support::household_with_members(1).await;
        let pool = &fx.db.pool;
        let before = ActivityEntry::find_all_by_household_id(pool, fx.household.id)
            .await
            .unwrap()
            .len();

        let household = HouseholdService::regenerate_invite_code(pool, &fx.admin)
            .await
            .unwrap();
        assert_ne!(household.invite_code, fx.household.invite_code);
        let update = UpdateMember {
            display_name: Some("Bea".to_string()),
            color: None,
        };
        HouseholdService::update_member(pool, &fx.admin, fx.members[0].id, &update)
            .await
            .unwrap();

        let entries = ActivityEntry::find_all_by_household_id(pool, fx.household.id)
            .await
            .unwrap();
        assert_eq!(entries.len(), before + 2);
        let invite = &entries[before];
        assert_eq!(invite.action, ActivityAction::Updated);
        assert_eq!(invite.entity_kind, EntityKind::Household);
        let profile = &entries[before + 1];
        assert_eq!(profile.entity_kind, EntityKind::Member);
        assert_eq!(profile.entity_id, Some(fx.members[0].id));
        assert_eq!(profile.summary, "Admin updated Bea's profile");
    }
}
