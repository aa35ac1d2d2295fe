use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use deployment::DeploymentError;
use services::services::{
    backup::BackupError,
    borrow::BorrowError,
    calendar::CalendarError,
    chores::ChoreError,
    guidelines::GuidelineViolation,
    households::HouseholdError,
    inventory::InventoryError,
    photos::PhotoError,
    shopping::ShoppingError,
    validation::ValidationError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Household(#[from] HouseholdError),
    #[error(transparent)]
    Shopping(#[from] ShoppingError),
    #[error(transparent)]
    Chore(#[from] ChoreError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Borrow(#[from] BorrowError),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Photo(#[from] PhotoError),
    #[error(transparent)]
    Backup(#[from] BackupError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error("missing or malformed X-Member-Id header")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(&'static str),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Household(e) => match e {
                HouseholdError::Validation(_) => StatusCode::BAD_REQUEST,
                HouseholdError::NotFound | HouseholdError::MemberNotFound => StatusCode::NOT_FOUND,
                HouseholdError::InvalidInviteCode => StatusCode::NOT_FOUND,
                HouseholdError::Forbidden(_) => StatusCode::FORBIDDEN,
                HouseholdError::HasOpenLoans(_) => StatusCode::CONFLICT,
                HouseholdError::Database(_) | HouseholdError::InviteCodeExhausted => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Shopping(e) => match e {
                ShoppingError::Validation(_) => StatusCode::BAD_REQUEST,
                ShoppingError::ListNotFound | ShoppingError::ItemNotFound => StatusCode::NOT_FOUND,
                ShoppingError::Archived => StatusCode::CONFLICT,
                ShoppingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Chore(e) => match e {
                ChoreError::Validation(_)
                | ChoreError::Recurrence(_)
                | ChoreError::ForeignMember(_)
                | ChoreError::DuplicateRotationMember(_)
                | ChoreError::SelfDependency
                | ChoreError::DueDateOverflow => StatusCode::BAD_REQUEST,
                ChoreError::NotFound | ChoreError::DependencyNotFound => StatusCode::NOT_FOUND,
                ChoreError::Blocked(_)
                | ChoreError::AlreadyDone
                | ChoreError::NotDone
                | ChoreError::DuplicateDependency
                | ChoreError::DependencyCycle => StatusCode::CONFLICT,
                ChoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Inventory(e) => match e {
                InventoryError::Validation(_) => StatusCode::BAD_REQUEST,
                InventoryError::NotFound => StatusCode::NOT_FOUND,
                InventoryError::NotOwner | InventoryError::AdminRequired => StatusCode::FORBIDDEN,
                InventoryError::InUse => StatusCode::CONFLICT,
                InventoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Borrow(e) => match e {
                BorrowError::Validation(_) | BorrowError::OwnItem | BorrowError::NotBorrowable => {
                    StatusCode::BAD_REQUEST
                }
                BorrowError::NotFound | BorrowError::ItemNotFound => StatusCode::NOT_FOUND,
                BorrowError::Conflict { .. } | BorrowError::InvalidTransition { .. } => {
                    StatusCode::CONFLICT
                }
                BorrowError::Forbidden(_) => StatusCode::FORBIDDEN,
                BorrowError::InvalidReturn(_) => StatusCode::UNPROCESSABLE_ENTITY,
                BorrowError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Calendar(e) => match e {
                CalendarError::Validation(_) => StatusCode::BAD_REQUEST,
                CalendarError::NotFound => StatusCode::NOT_FOUND,
                CalendarError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Photo(e) => match e {
                PhotoError::Empty | PhotoError::InvalidName => StatusCode::BAD_REQUEST,
                PhotoError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                PhotoError::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                PhotoError::NotFound => StatusCode::NOT_FOUND,
                PhotoError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Backup(e) => match e {
                BackupError::NotFound => StatusCode::NOT_FOUND,
                BackupError::AlreadyExists(_) => StatusCode::CONFLICT,
                BackupError::UnsupportedVersion(_) => StatusCode::BAD_REQUEST,
                BackupError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Deployment(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
            let body = ApiResponse::<()>::error("Internal server error");
            return (status, Json(body)).into_response();
        }

        let message = self.to_string();
        match self {
            ApiError::Borrow(BorrowError::InvalidReturn(violations)) => {
                let body =
                    ApiResponse::<(), Vec<GuidelineViolation>>::error_with_data(&message, violations);
                (status, Json(body)).into_response()
            }
            _ => (status, Json(ApiResponse::<()>::error(&message))).into_response(),
        }
    }
}
