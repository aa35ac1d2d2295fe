use db::{
    DBService,
    models::{household::Household, member::Member},
};

use super::households::HouseholdService;

pub struct Fixture {
    pub db: DBService,
    pub household: Household,
    pub admin: Member,
    /// Regular (non-admin) members, in join order.
    pub members: Vec<Member>,
}

/// Fresh in-memory database with one household, its admin and `extra` members.
pub async fn household_with_members(extra: usize) -> Fixture {
    let db = DBService::new_in_memory().await.unwrap();
    let created = HouseholdService::create(&db.pool, "Test House", "Admin")
        .await
        .unwrap();

    let mut members = Vec::with_capacity(extra);
    for n in 0..extra {
        let joined = HouseholdService::join(
            &db.pool,
            &created.household.invite_code,
            &format!("Member {n}"),
        )
        .await
        .unwrap();
        members.push(joined.member);
    }

    Fixture {
        db,
        household: created.household,
        admin: created.member,
        members,
    }
}
