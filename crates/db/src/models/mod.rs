pub mod activity;
pub mod borrow_request;
pub mod calendar_event;
pub mod guideline;
pub mod household;
pub mod inventory_item;
pub mod member;
pub mod notification;
pub mod shopping;
pub mod task;
pub mod task_dependency;
