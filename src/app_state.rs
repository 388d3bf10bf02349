//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error, PasswordHash, auth::DEFAULT_TOKEN_DURATION, db::initialize, image_store::ImageStore,
};

/// The keys used for signing and verifying auth tokens.
#[derive(Clone)]
pub struct JwtKeys {
    /// The key for signing new tokens.
    pub encoding_key: EncodingKey,
    /// The key for verifying the signature of tokens sent by clients.
    pub decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Create the signing keys for auth tokens from a `secret` string.
    pub fn from_secret(secret: &str) -> Self {
        let hash = Sha512::digest(secret);

        Self {
            encoding_key: EncodingKey::from_secret(&hash),
            decoding_key: DecodingKey::from_secret(&hash),
        }
    }
}

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The keys used for signing and verifying auth tokens.
    pub jwt_keys: JwtKeys,

    /// The duration for which auth tokens are valid.
    pub token_duration: Duration,

    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// Where uploaded profile images are kept.
    pub image_store: ImageStore,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        secret: &str,
        local_timezone: &str,
        image_store: ImageStore,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            jwt_keys: JwtKeys::from_secret(secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            password_cost: PasswordHash::DEFAULT_COST,
            local_timezone: local_timezone.to_owned(),
            image_store,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Set how long newly issued auth tokens stay valid.
    pub fn with_token_duration(mut self, token_duration: Duration) -> Self {
        self.token_duration = token_duration;
        self
    }

    /// Set the bcrypt cost for hashing new passwords.
    pub fn with_password_cost(mut self, password_cost: u32) -> Self {
        self.password_cost = password_cost;
        self
    }
}
