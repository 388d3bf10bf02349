//! Handles log-in requests by checking credentials and issuing a bearer token.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use jsonwebtoken::EncodingKey;
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        token::{AuthResponse, encode_jwt},
        user::get_user_by_email,
    },
    extract::{ApiJson, non_blank},
};

/// The state needed to perform a login.
#[derive(Clone)]
pub struct LoginState {
    /// The key for signing auth tokens.
    pub encoding_key: EncodingKey,
    /// The duration for which auth tokens are valid.
    pub token_duration: Duration,
    /// The database connection for looking up the user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            encoding_key: state.jwt_keys.encoding_key.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for a log-in request.
#[derive(Debug, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: Option<String>,
    /// Password entered during log-in.
    pub password: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// Unknown emails and wrong passwords get the same response so that clients
/// cannot probe which emails are registered.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email or password is missing.
/// - The email does not belong to a registered user or the password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    ApiJson(user_data): ApiJson<LogInData>,
) -> Result<Json<AuthResponse>, Error> {
    let (Some(email), Some(password)) = (
        non_blank(user_data.email),
        user_data.password.filter(|password| !password.is_empty()),
    ) else {
        return Err(Error::MissingFields("Email and password are required."));
    };

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        get_user_by_email(&email, &connection)?.ok_or(Error::InvalidCredentials)?
    };

    let password_hash = user.password_hash.clone();
    let is_password_valid = tokio::task::spawn_blocking(move || password_hash.verify(&password))
        .await
        .map_err(|error| Error::HashingError(error.to_string()))?
        .map_err(|error| {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            Error::HashingError(error.to_string())
        })?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_jwt(user.id, state.token_duration, &state.encoding_key)?;

    Ok(Json(AuthResponse::new(user, token)))
}

#[cfg(test)]
mod log_in_tests {
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{TEST_EMAIL, TEST_PASSWORD, get_test_server, register_test_user},
    };

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server();
        let (user_id, _) = register_test_user(&server, TEST_EMAIL).await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["id"], json!(user_id.as_i64()));
        assert!(body["token"].as_str().is_some_and(|token| !token.is_empty()));
    }

    #[tokio::test]
    async fn log_in_token_grants_access_to_protected_routes() {
        let server = get_test_server();
        register_test_user(&server, TEST_EMAIL).await;

        let token = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD }))
            .await
            .json::<Value>()["token"]
            .as_str()
            .unwrap()
            .to_owned();

        server
            .get(endpoints::GET_USER)
            .authorization_bearer(token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let server = get_test_server();
        register_test_user(&server, TEST_EMAIL).await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": TEST_EMAIL, "password": "wrongpassword" }))
            .await;

        response.assert_status_unauthorized();
        response.assert_json(&json!({ "message": "Invalid email or password." }));
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_password() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": TEST_EMAIL }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "message": "Email and password are required." }));
    }
}
