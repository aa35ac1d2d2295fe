pub mod activity;
pub mod backup;
pub mod borrow;
pub mod calendar;
pub mod chores;
pub mod config;
pub mod database_validator;
pub mod dependencies;
pub mod guidelines;
pub mod households;
pub mod inventory;
pub mod notification;
pub mod overdue;
pub mod photos;
pub mod recurrence;
pub mod shopping;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;
