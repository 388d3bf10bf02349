//! Defines the income model and its database queries.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::{Connection, Row};
use serde::Serialize;
use time::Date;

use crate::{
    AppState, Error, auth::UserID, calendar::DateRange, database_id::IncomeId,
    extract::TransactionFields,
};

/// Money the user earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    /// The ID of the income.
    pub id: IncomeId,
    /// The user who earned the money.
    pub user_id: UserID,
    /// Where the money came from, e.g. "Salary".
    pub source: String,
    /// The amount of money earned, always positive.
    pub amount: f64,
    /// When the money was earned.
    pub date: Date,
    /// An optional icon for displaying the income.
    pub icon: Option<String>,
}

/// The state needed by the income endpoints.
#[derive(Debug, Clone)]
pub struct IncomeState {
    /// The database connection for managing income.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for IncomeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create the income table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_income_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS income (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                source TEXT NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                icon TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_income_user_date ON income(user_id, date);",
        (),
    )?;

    Ok(())
}

const INCOME_COLUMNS: &str = "id, user_id, source, amount, date, icon";

fn map_income_row(row: &Row) -> Result<Income, rusqlite::Error> {
    Ok(Income {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        source: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        icon: row.get(5)?,
    })
}

/// Record new income for `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_income(
    user_id: UserID,
    fields: TransactionFields,
    connection: &Connection,
) -> Result<Income, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO income (user_id, source, amount, date, icon)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {INCOME_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                fields.label,
                fields.amount,
                fields.date,
                fields.icon,
            ),
            map_income_row,
        )
        .map_err(Error::from)
}

/// Get all of the income of `user_id`, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_income(user_id: UserID, connection: &Connection) -> Result<Vec<Income>, Error> {
    connection
        .prepare(&format!(
            "SELECT {INCOME_COLUMNS} FROM income WHERE user_id = :user_id
             ORDER BY date DESC, id DESC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_income_row)?
        .map(|maybe_income| maybe_income.map_err(Error::from))
        .collect()
}

/// Get the income of `user_id` dated within `range`, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_income_in_range(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<Income>, Error> {
    connection
        .prepare(&format!(
            "SELECT {INCOME_COLUMNS} FROM income
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date DESC, id DESC"
        ))?
        .query_map((user_id.as_i64(), range.start, range.end), map_income_row)?
        .map(|maybe_income| maybe_income.map_err(Error::from))
        .collect()
}

/// Get the `limit` most recent income of `user_id`, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_recent_income(
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Income>, Error> {
    connection
        .prepare(&format!(
            "SELECT {INCOME_COLUMNS} FROM income WHERE user_id = ?1
             ORDER BY date DESC, id DESC LIMIT ?2"
        ))?
        .query_map((user_id.as_i64(), limit), map_income_row)?
        .map(|maybe_income| maybe_income.map_err(Error::from))
        .collect()
}

/// Replace the fields of the income `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::IncomeNotFound] if `id` does not refer to income owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_income(
    user_id: UserID,
    id: IncomeId,
    fields: TransactionFields,
    connection: &Connection,
) -> Result<Income, Error> {
    connection
        .prepare(&format!(
            "UPDATE income SET source = ?1, amount = ?2, date = ?3, icon = ?4
             WHERE id = ?5 AND user_id = ?6
             RETURNING {INCOME_COLUMNS}"
        ))?
        .query_row(
            (
                fields.label,
                fields.amount,
                fields.date,
                fields.icon,
                id,
                user_id.as_i64(),
            ),
            map_income_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::IncomeNotFound,
            error => error.into(),
        })
}

/// Delete the income `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::IncomeNotFound] if `id` does not refer to income owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_income(user_id: UserID, id: IncomeId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM income WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::IncomeNotFound),
        _ => Ok(()),
    }
}

/// Get the total amount `user_id` has ever earned.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn total_income(user_id: UserID, connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM income WHERE user_id = ?1",
            (user_id.as_i64(),),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Get the amount `user_id` earned within `range`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn sum_income_in_range(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM income
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
            (user_id.as_i64(), range.start, range.end),
            |row| row.get(0),
        )
        .map_err(Error::from)
}
