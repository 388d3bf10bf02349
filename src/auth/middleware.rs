//! Authentication middleware that validates bearer tokens on protected routes.

use std::sync::{Arc, Mutex};

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::DecodingKey;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{UserID, token::decode_jwt, user::user_exists},
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key for verifying the signature of auth tokens.
    pub decoding_key: DecodingKey,
    /// The database connection for checking that the token's user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.jwt_keys.decoding_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token in the `Authorization` header.
///
/// The user ID is placed into the request and the request executed normally if the token is
/// valid and belongs to a registered user, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let user_id = match authenticate(&state, &mut parts).await {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(user_id);
    next.run(Request::from_parts(parts, body)).await
}

async fn authenticate(
    state: &AuthState,
    parts: &mut axum::http::request::Parts,
) -> Result<UserID, Error> {
    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| Error::MissingToken)?;

    let claims = decode_jwt(bearer.token(), &state.decoding_key)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    if user_exists(claims.id, &connection)? {
        Ok(claims.id)
    } else {
        tracing::debug!("Rejected token for user {} who no longer exists", claims.id);
        Err(Error::InvalidToken)
    }
}
