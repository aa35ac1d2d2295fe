use std::{env, fs, path::PathBuf};

use ts_rs::TS;

fn declarations() -> Vec<String> {
    vec![
        utils::response::ApiResponse::<(), ()>::decl(),
        db::models::household::Household::decl(),
        db::models::household::CreateHousehold::decl(),
        db::models::household::UpdateHousehold::decl(),
        db::models::member::MemberRole::decl(),
        db::models::member::Member::decl(),
        db::models::member::JoinHousehold::decl(),
        db::models::member::UpdateMember::decl(),
        db::models::member::SetMemberRole::decl(),
        db::models::shopping::ShoppingList::decl(),
        db::models::shopping::ShoppingItem::decl(),
        db::models::shopping::CreateShoppingList::decl(),
        db::models::shopping::UpdateShoppingList::decl(),
        db::models::shopping::CreateShoppingItem::decl(),
        db::models::shopping::UpdateShoppingItem::decl(),
        db::models::shopping::SetItemChecked::decl(),
        db::models::task::TaskStatus::decl(),
        db::models::task::RecurrenceUnit::decl(),
        db::models::task::Task::decl(),
        db::models::task::TaskRotationEntry::decl(),
        db::models::task::TaskCompletion::decl(),
        db::models::task::TaskWithRotation::decl(),
        db::models::task::CreateTask::decl(),
        db::models::task::UpdateTask::decl(),
        db::models::task::TaskFilter::decl(),
        db::models::task_dependency::TaskDependency::decl(),
        db::models::task_dependency::CreateTaskDependency::decl(),
        db::models::inventory_item::InventoryItem::decl(),
        db::models::inventory_item::CreateInventoryItem::decl(),
        db::models::inventory_item::UpdateInventoryItem::decl(),
        db::models::guideline::GuidelineKind::decl(),
        db::models::guideline::ItemGuideline::decl(),
        db::models::guideline::GuidelineDraft::decl(),
        db::models::guideline::ReplaceGuidelines::decl(),
        db::models::borrow_request::BorrowStatus::decl(),
        db::models::borrow_request::BorrowAction::decl(),
        db::models::borrow_request::BorrowRequest::decl(),
        db::models::borrow_request::BorrowReturnCheck::decl(),
        db::models::borrow_request::CreateBorrowRequest::decl(),
        db::models::borrow_request::BorrowDecision::decl(),
        db::models::borrow_request::BorrowFilter::decl(),
        db::models::borrow_request::BorrowRequestDetails::decl(),
        db::models::calendar_event::CalendarEvent::decl(),
        db::models::calendar_event::CreateCalendarEvent::decl(),
        db::models::calendar_event::UpdateCalendarEvent::decl(),
        db::models::activity::ActivityAction::decl(),
        db::models::activity::EntityKind::decl(),
        db::models::activity::ActivityEntry::decl(),
        db::models::activity::ActivityQuery::decl(),
        db::models::notification::NotificationKind::decl(),
        db::models::notification::Notification::decl(),
        db::models::notification::NotificationSummary::decl(),
        services::services::households::HouseholdWithMember::decl(),
        services::services::households::HouseholdOverview::decl(),
        services::services::shopping::ShoppingListWithItems::decl(),
        services::services::shopping::ClearCheckedResponse::decl(),
        services::services::inventory::InventoryItemDetails::decl(),
        services::services::guidelines::ReturnPhoto::decl(),
        services::services::guidelines::ReturnSubmission::decl(),
        services::services::guidelines::GuidelineViolation::decl(),
        services::services::calendar::AgendaKind::decl(),
        services::services::calendar::AgendaEntry::decl(),
        services::services::calendar::AgendaQuery::decl(),
        services::services::photos::StoredPhoto::decl(),
        server::routes::tasks::SetRotation::decl(),
        server::routes::notifications::MarkAllReadResponse::decl(),
    ]
}

fn main() -> anyhow::Result<()> {
    let out = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("shared/types.ts"));

    let mut contents = String::from(
        "// This file was generated by `generate-types`. Do not edit it by hand.\n\n",
    );
    for decl in declarations() {
        contents.push_str("export ");
        contents.push_str(&decl);
        contents.push_str("\n\n");
    }

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out, contents)?;
    println!("Wrote {}", out.display());
    Ok(())
}
