//! Defines the expense model and its database queries.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::{Connection, Row};
use serde::Serialize;
use time::Date;

use crate::{
    AppState, Error, auth::UserID, calendar::DateRange, database_id::ExpenseId,
    extract::TransactionFields,
};

// ============================================================================
// MODELS
// ============================================================================

/// Money the user spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The user who spent the money.
    pub user_id: UserID,
    /// What the money was spent on, e.g. "Groceries".
    pub category: String,
    /// The amount of money spent, always positive.
    pub amount: f64,
    /// When the money was spent.
    pub date: Date,
    /// An optional icon for displaying the expense.
    pub icon: Option<String>,
}

/// The state needed by the expense endpoints.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                category TEXT NOT NULL COLLATE NOCASE,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                icon TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Used by the per-month and per-category totals.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    Ok(())
}

const EXPENSE_COLUMNS: &str = "id, user_id, category, amount, date, icon";

/// Map a database row to an [Expense].
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        icon: row.get(5)?,
    })
}

/// Record a new expense for `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_expense(
    user_id: UserID,
    fields: TransactionFields,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO expense (user_id, category, amount, date, icon)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                fields.label,
                fields.amount,
                fields.date,
                fields.icon,
            ),
            map_expense_row,
        )
        .map_err(Error::from)
}

/// Get all of the expenses of `user_id`, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_expenses(user_id: UserID, connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE user_id = :user_id
             ORDER BY date DESC, id DESC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Get the expenses of `user_id` dated within `range`, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_expenses_in_range(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date DESC, id DESC"
        ))?
        .query_map((user_id.as_i64(), range.start, range.end), map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Get the `limit` most recent expenses of `user_id`, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_recent_expenses(
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE user_id = ?1
             ORDER BY date DESC, id DESC LIMIT ?2"
        ))?
        .query_map((user_id.as_i64(), limit), map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Replace the fields of the expense `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::ExpenseNotFound] if `id` does not refer to an expense owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense(
    user_id: UserID,
    id: ExpenseId,
    fields: TransactionFields,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "UPDATE expense SET category = ?1, amount = ?2, date = ?3, icon = ?4
             WHERE id = ?5 AND user_id = ?6
             RETURNING {EXPENSE_COLUMNS}"
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
            map_expense_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::ExpenseNotFound,
            error => error.into(),
        })
}

/// Delete the expense `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::ExpenseNotFound] if `id` does not refer to an expense owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_expense(
    user_id: UserID,
    id: ExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::ExpenseNotFound),
        _ => Ok(()),
    }
}

/// Get the total amount `user_id` has ever spent.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn total_expenses(user_id: UserID, connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM expense WHERE user_id = ?1",
            (user_id.as_i64(),),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Get the amount `user_id` spent within `range`, optionally only in `category`.
///
/// Categories are compared ignoring case.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn sum_expenses_in_range(
    user_id: UserID,
    range: DateRange,
    category: Option<&str>,
    connection: &Connection,
) -> Result<f64, Error> {
    let total = match category {
        Some(category) => connection.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM expense
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3 AND category = ?4",
            (user_id.as_i64(), range.start, range.end, category),
            |row| row.get(0),
        ),
        None => connection.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM expense
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
            (user_id.as_i64(), range.start, range.end),
            |row| row.get(0),
        ),
    }?;

    Ok(total)
}

// ============================================================================
// TESTS
// ============================================================================
