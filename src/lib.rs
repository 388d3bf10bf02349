//! Expense Tracker is a web service for tracking personal income and spending.
//!
//! This library provides a JSON REST API for registering users, recording
//! expenses and income, summarising them on a dashboard, and warning users
//! when they approach or exceed the spending limits they have configured.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod calendar;
mod currency;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod excel;
mod expense;
mod extract;
mod image_store;
mod income;
mod logging;
mod routing;
mod spending_limit;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, JwtKeys};
pub use auth::{PasswordHash, User, UserID, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use endpoints::UPLOADS as UPLOADS_PATH;
pub use image_store::ImageStore;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more required fields were missing from the request body.
    ///
    /// The string is the message shown to the client, e.g. "All fields are required".
    #[error("{0}")]
    MissingFields(&'static str),

    /// The request body could not be parsed as JSON of the expected shape.
    #[error("could not parse the request body: {0}")]
    InvalidRequestBody(String),

    /// The email address given during registration is not a valid address.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// A user with the same email address has already registered.
    #[error("Email already in use.")]
    DuplicateEmail,

    /// The email and password combination does not match a registered user.
    #[error("Invalid email or password.")]
    InvalidCredentials,

    /// The request to a protected route did not carry a bearer token.
    #[error("Not authorized, no token")]
    MissingToken,

    /// The bearer token was malformed, expired, signed with a different key,
    /// or refers to a user that no longer exists.
    #[error("Not authorized, token failed")]
    InvalidToken,

    /// A transaction amount was not a positive, finite number.
    #[error("Amount must be a positive number")]
    InvalidAmount,

    /// A spending limit was negative or not a finite number.
    #[error("Limit must be zero or a positive number")]
    InvalidLimit,

    /// A warning threshold was outside of the range [0, 100].
    #[error("Warning threshold must be between 0 and 100")]
    InvalidThreshold,

    /// The date could not be parsed as a calendar date.
    #[error("{0} is not a valid date")]
    InvalidDate(String),

    /// A category limit with the same name (ignoring case) already exists.
    #[error("Category already exists")]
    DuplicateCategoryLimit,

    /// The profile image upload did not contain an image.
    #[error("No image file provided")]
    MissingImage,

    /// The uploaded file is not one of the accepted image types.
    #[error("Only image files are allowed (.jpeg, .jpg, .png, .gif, .webp)")]
    UnsupportedImageType,

    /// The uploaded image is larger than the upload limit.
    #[error("Image files must be no larger than 5 MB")]
    ImageTooLarge,

    /// The multipart form could not be parsed.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The authenticated user could not be found.
    #[error("User not found.")]
    UserNotFound,

    /// Tried to access an expense that does not exist or belongs to another user.
    #[error("Expense not found")]
    ExpenseNotFound,

    /// Tried to access an income that does not exist or belongs to another user.
    #[error("Income not found")]
    IncomeNotFound,

    /// Tried to modify spending limits before they were created.
    #[error("Spending limits not found")]
    SpendingLimitNotFound,

    /// Tried to modify a category limit that does not exist.
    #[error("Category limit not found")]
    CategoryLimitNotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An auth token could not be created.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The Excel workbook could not be written.
    #[error("could not write Excel workbook: {0}")]
    ExcelError(String),

    /// An uploaded image could not be written to or removed from the image store.
    #[error("image storage failed: {0}")]
    ImageStorageError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequestBody(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected path parameters: {}", rejection.body_text());
        Error::NotFound
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingFields(_)
            | Error::InvalidRequestBody(_)
            | Error::InvalidEmail(_)
            | Error::TooWeak(_)
            | Error::DuplicateEmail
            | Error::InvalidAmount
            | Error::InvalidLimit
            | Error::InvalidThreshold
            | Error::InvalidDate(_)
            | Error::DuplicateCategoryLimit
            | Error::MissingImage
            | Error::UnsupportedImageType
            | Error::ImageTooLarge
            | Error::MultipartError(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::MissingToken | Error::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Error::NotFound
            | Error::UserNotFound
            | Error::ExpenseNotFound
            | Error::IncomeNotFound
            | Error::SpendingLimitNotFound
            | Error::CategoryLimitNotFound => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_)
            | Error::ExcelError(_)
            | Error::ImageStorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "Server Error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
