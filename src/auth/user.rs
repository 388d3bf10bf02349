//! Code for creating the user table and fetching users from the database.

use std::{fmt::Display, str::FromStr};

use email_address::EmailAddress;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
///
/// The password hash is never serialized, so a `User` can be sent to clients as is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user registered with.
    pub full_name: String,
    /// The user's email address, unique ignoring case.
    pub email: String,
    /// The user's password hash.
    #[serde(skip)]
    pub password_hash: PasswordHash,
    /// The URL of the user's profile image, if they have one.
    pub profile_image_url: Option<String>,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The details needed to register a new user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The user's full name.
    pub full_name: String,
    /// A validated email address.
    pub email: String,
    /// The salted and hashed password.
    pub password_hash: PasswordHash,
    /// An optional profile image URL supplied at registration.
    pub profile_image_url: Option<String>,
}

/// Check that `raw_email` is a well-formed email address and return it trimmed.
///
/// # Errors
///
/// Returns an [Error::InvalidEmail] if `raw_email` is not a valid email address.
pub fn validate_email(raw_email: &str) -> Result<String, Error> {
    let raw_email = raw_email.trim();

    EmailAddress::from_str(raw_email)
        .map(|email| email.as_str().to_owned())
        .map_err(|_| Error::InvalidEmail(raw_email.to_owned()))
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL,
                profile_image_url TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if a user already registered with the same email, ignoring case,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO user (full_name, email, password, profile_image_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &new_user.full_name,
            &new_user.email,
            new_user.password_hash.as_ref(),
            &new_user.profile_image_url,
            created_at,
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        full_name: new_user.full_name,
        email: new_user.email,
        password_hash: new_user.password_hash,
        profile_image_url: new_user.profile_image_url,
        created_at,
    })
}

const SELECT_USER: &str =
    "SELECT id, full_name, email, password, profile_image_url, created_at FROM user";

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        full_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        profile_image_url: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user ([Error::UserNotFound]),
/// - there was an error trying to access the database.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("{SELECT_USER} WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .optional()?
        .ok_or(Error::UserNotFound)
}

/// Get the user registered with `email`, ignoring case.
///
/// Returns `Ok(None)` if nobody registered with that email.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<Option<User>, Error> {
    connection
        .prepare(&format!("{SELECT_USER} WHERE email = ?1"))?
        .query_row((email.trim(),), map_user_row)
        .optional()
        .map_err(Error::from)
}

/// Check whether a user with `user_id` exists.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn user_exists(user_id: UserID, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM user WHERE id = ?1)",
            (user_id.as_i64(),),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Set the profile image URL for the user with `user_id`.
///
/// # Errors
///
/// Returns an [Error::UserNotFound] if there is no such user, or an
/// [Error::SqlError] if an SQL related error occurred.
pub fn update_profile_image_url(
    user_id: UserID,
    profile_image_url: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET profile_image_url = ?1 WHERE id = ?2",
        (profile_image_url, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::UserNotFound),
        _ => Ok(()),
    }
}
