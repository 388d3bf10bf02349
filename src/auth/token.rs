//! Signed JSON Web Tokens that identify the logged in user.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    auth::{User, UserID},
};

/// How long a newly issued token is valid for if not configured otherwise.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::hours(1);

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub id: UserID,
    /// The time the token was issued as a unix timestamp.
    pub iat: usize,
    /// The expiry time of the token as a unix timestamp.
    pub exp: usize,
}

/// The response body for a successful registration or log-in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The ID of the authenticated user.
    pub id: UserID,
    /// The authenticated user.
    pub user: User,
    /// A bearer token for the user.
    pub token: String,
}

impl AuthResponse {
    /// Bundle `user` with a freshly issued `token`.
    pub fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            user,
            token,
        }
    }
}

/// Create a token for `user_id` that expires after `duration`.
///
/// # Errors
///
/// Returns an [Error::TokenCreation] if the token could not be signed.
pub fn encode_jwt(
    user_id: UserID,
    duration: Duration,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        id: user_id,
        iat: now.unix_timestamp() as usize,
        exp: (now + duration).unix_timestamp() as usize,
    };

    encode(&Header::default(), &claims, encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `jwt_token` and return its claims.
///
/// # Errors
///
/// Returns an [Error::InvalidToken] if the token is malformed, expired or was
/// signed with a different key.
pub fn decode_jwt(jwt_token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    decode::<Claims>(jwt_token, decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected token: {error}");
            Error::InvalidToken
        })
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use crate::{
        Error,
        app_state::JwtKeys,
        auth::{
            UserID,
            token::{DEFAULT_TOKEN_DURATION, decode_jwt, encode_jwt},
        },
    };

    #[test]
    fn decode_jwt_gives_correct_user_id() {
        let keys = JwtKeys::from_secret("foobar");
        let jwt = encode_jwt(UserID::new(3), DEFAULT_TOKEN_DURATION, &keys.encoding_key).unwrap();

        let claims = decode_jwt(&jwt, &keys.decoding_key).unwrap();

        assert_eq!(claims.id, UserID::new(3));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn decode_jwt_fails_with_different_secret() {
        let keys = JwtKeys::from_secret("foobar");
        let other_keys = JwtKeys::from_secret("barfoo");
        let jwt = encode_jwt(UserID::new(3), DEFAULT_TOKEN_DURATION, &keys.encoding_key).unwrap();

        let result = decode_jwt(&jwt, &other_keys.decoding_key);

        assert_eq!(result, Err(Error::InvalidToken));
    }

    #[test]
    fn decode_jwt_fails_when_expired() {
        let keys = JwtKeys::from_secret("foobar");
        // Well past the default leeway of 60 seconds.
        let jwt = encode_jwt(UserID::new(3), Duration::minutes(-5), &keys.encoding_key).unwrap();

        let result = decode_jwt(&jwt, &keys.decoding_key);

        assert_eq!(result, Err(Error::InvalidToken));
    }

    #[test]
    fn decode_jwt_fails_on_garbage() {
        let keys = JwtKeys::from_secret("foobar");

        let result = decode_jwt("definitely.not.ajwt", &keys.decoding_key);

        assert_eq!(result, Err(Error::InvalidToken));
    }
}
