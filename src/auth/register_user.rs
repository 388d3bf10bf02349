//! Registration of new users.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use jsonwebtoken::EncodingKey;
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        PasswordHash, ValidatedPassword,
        token::{AuthResponse, encode_jwt},
        user::{NewUser, create_user, get_user_by_email, validate_email},
    },
    extract::{ApiJson, non_blank},
};

/// The state needed for creating a new user.
#[derive(Clone)]
pub struct RegistrationState {
    /// The key for signing auth tokens.
    pub encoding_key: EncodingKey,
    /// The duration for which auth tokens are valid.
    pub token_duration: Duration,
    /// The bcrypt cost for hashing the new password.
    pub password_cost: u32,
    /// The database connection for storing the new user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            encoding_key: state.jwt_keys.encoding_key.clone(),
            token_duration: state.token_duration,
            password_cost: state.password_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for registering a user.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    /// The user's full name.
    pub full_name: Option<String>,
    /// The user's email address.
    pub email: Option<String>,
    /// The plain-text password.
    pub password: Option<String>,
    /// An optional URL of an image uploaded before registering.
    pub profile_image_url: Option<String>,
}

const MISSING_FIELDS_MESSAGE: &str = "All fields are required.";

/// Handler for registering a new user.
///
/// Responds with `201 Created` and `{id, user, token}` so the client is logged in straight away.
///
/// # Errors
///
/// Returns an error response if:
/// - the full name, email or password is missing,
/// - the email address is not valid or already in use,
/// - the password is too weak,
/// - the password could not be hashed or the user could not be stored.
pub async fn register_user(
    State(state): State<RegistrationState>,
    ApiJson(form): ApiJson<RegisterForm>,
) -> Result<Response, Error> {
    let (Some(full_name), Some(raw_email), Some(password)) = (
        non_blank(form.full_name),
        non_blank(form.email),
        form.password.filter(|password| !password.is_empty()),
    ) else {
        return Err(Error::MissingFields(MISSING_FIELDS_MESSAGE));
    };

    let email = validate_email(&raw_email)?;
    let validated_password = ValidatedPassword::new(&password, &[&full_name, &email])?;

    {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        if get_user_by_email(&email, &connection)?.is_some() {
            return Err(Error::DuplicateEmail);
        }
    }

    let password_cost = state.password_cost;
    let password_hash =
        tokio::task::spawn_blocking(move || PasswordHash::new(validated_password, password_cost))
            .await
            .map_err(|error| Error::HashingError(error.to_string()))??;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        create_user(
            NewUser {
                full_name,
                email,
                password_hash,
                profile_image_url: non_blank(form.profile_image_url),
            },
            &connection,
        )?
    };

    tracing::info!("Registered user {}", user.id);

    let token = encode_jwt(user.id, state.token_duration, &state.encoding_key)?;

    Ok((StatusCode::CREATED, Json(AuthResponse::new(user, token))).into_response())
}

#[cfg(test)]
mod register_user_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{TEST_PASSWORD, get_test_server},
    };

    #[tokio::test]
    async fn register_user_succeeds() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "fullName": "Ada Lovelace",
                "email": "ada@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["user"]["fullName"], json!("Ada Lovelace"));
        assert_eq!(body["user"]["email"], json!("ada@example.com"));
        assert_eq!(body["id"], body["user"]["id"]);
        assert!(body["token"].as_str().is_some_and(|token| !token.is_empty()));
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn register_user_fails_with_missing_fields() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "fullName": "Ada Lovelace",
                "email": "ada@example.com",
            }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "message": "All fields are required." }));
    }

    #[tokio::test]
    async fn register_user_fails_with_blank_name() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "fullName": "   ",
                "email": "ada@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn register_user_fails_with_invalid_email() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "fullName": "Ada Lovelace",
                "email": "ada-at-example",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn register_user_fails_with_weak_password() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "fullName": "Ada Lovelace",
                "email": "ada@example.com",
                "password": "password1234",
            }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn register_user_fails_with_duplicate_email() {
        let server = get_test_server();
        let body = json!({
            "fullName": "Ada Lovelace",
            "email": "ada@example.com",
            "password": TEST_PASSWORD,
        });
        server
            .post(endpoints::REGISTER)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "fullName": "Someone Else",
                "email": "ADA@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "message": "Email already in use." }));
    }

    #[tokio::test]
    async fn register_user_fails_with_malformed_json() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .content_type("application/json")
            .text("{\"fullName\": ")
            .await;

        response.assert_status_bad_request();
    }
}
