#![allow(missing_docs)]

//! Shared fixtures for the unit and HTTP tests.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::StatusCode;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, ImageStore, PasswordHash,
    auth::{NewUser, UserID, create_user},
    build_router, endpoints,
    db::initialize,
};

pub(crate) const TEST_EMAIL: &str = "test@example.com";
pub(crate) const TEST_PASSWORD: &str = "roostersgocockledoodledoo";

/// The lowest cost bcrypt accepts, which keeps the tests fast.
const TEST_PASSWORD_COST: u32 = 4;

/// An in-memory database with all tables created.
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    initialize(&connection).expect("Could not initialize database.");
    connection
}

/// Insert a user with a fake password hash directly into the database.
pub(crate) fn insert_test_user(connection: &Connection, email: &str) -> UserID {
    create_user(
        NewUser {
            full_name: "Test User".to_owned(),
            email: email.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            profile_image_url: None,
        },
        connection,
    )
    .expect("Could not create test user.")
    .id
}

/// A directory for uploaded images that no other test uses.
fn test_upload_directory() -> std::path::PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    std::env::temp_dir().join(format!(
        "expense_tracker_test_uploads_{}_{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ))
}

fn get_test_state() -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(
        connection,
        "42",
        "Etc/UTC",
        ImageStore::new(test_upload_directory(), endpoints::UPLOADS),
    )
    .expect("Could not create app state.")
    .with_password_cost(TEST_PASSWORD_COST)
}

/// A server running the full application router on a fresh database.
pub(crate) fn get_test_server() -> TestServer {
    TestServer::try_new(build_router(get_test_state())).expect("Could not create test server.")
}

/// Register a user through the API, returning their ID and auth token.
pub(crate) async fn register_test_user(server: &TestServer, email: &str) -> (UserID, String) {
    let response = server
        .post(endpoints::REGISTER)
        .json(&json!({
            "fullName": "Test User",
            "email": email,
            "password": TEST_PASSWORD,
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body = response.json::<Value>();
    let user_id = UserID::new(body["id"].as_i64().expect("Response should contain the user ID."));
    let token = body["token"]
        .as_str()
        .expect("Response should contain a token.")
        .to_owned();

    (user_id, token)
}
