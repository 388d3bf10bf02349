//! Storage for spending limits and their category limits.

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    auth::UserID,
    database_id::CategoryLimitId,
    spending_limit::domain::{AlertSettings, CategoryLimit, NewCategoryLimit, SpendingLimit},
};

/// Create the spending limit and category limit tables.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_spending_limit_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS spending_limit (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL UNIQUE,
                monthly_limit REAL NOT NULL DEFAULT 0,
                monthly_limit_enabled INTEGER NOT NULL DEFAULT 1,
                category_limit_enabled INTEGER NOT NULL DEFAULT 1,
                income_vs_expense_enabled INTEGER NOT NULL DEFAULT 1,
                monthly_warning_threshold REAL NOT NULL DEFAULT 80,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS category_limit (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                warning_threshold REAL NOT NULL DEFAULT 80,
                FOREIGN KEY(user_id) REFERENCES spending_limit(user_id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_alert_settings(row: &Row) -> Result<(f64, AlertSettings), rusqlite::Error> {
    Ok((
        row.get(0)?,
        AlertSettings {
            monthly_limit_enabled: row.get(1)?,
            category_limit_enabled: row.get(2)?,
            income_vs_expense_enabled: row.get(3)?,
            monthly_warning_threshold: row.get(4)?,
        },
    ))
}

fn map_category_limit_row(row: &Row) -> Result<CategoryLimit, rusqlite::Error> {
    Ok(CategoryLimit {
        id: row.get(0)?,
        category: row.get(1)?,
        limit: row.get(2)?,
        warning_threshold: row.get(3)?,
    })
}

fn get_category_limits(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<CategoryLimit>, Error> {
    connection
        .prepare(
            "SELECT id, category, amount, warning_threshold FROM category_limit
             WHERE user_id = :user_id ORDER BY id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_category_limit_row)?
        .map(|maybe_limit| maybe_limit.map_err(Error::from))
        .collect()
}

/// Get the spending limit of `user_id`, or `None` if they have never set one up.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_spending_limit(
    user_id: UserID,
    connection: &Connection,
) -> Result<Option<SpendingLimit>, Error> {
    let Some((monthly_limit, alert_settings)) = connection
        .query_row(
            "SELECT monthly_limit, monthly_limit_enabled, category_limit_enabled,
                    income_vs_expense_enabled, monthly_warning_threshold
             FROM spending_limit WHERE user_id = ?1",
            (user_id.as_i64(),),
            map_alert_settings,
        )
        .optional()?
    else {
        return Ok(None);
    };

    Ok(Some(SpendingLimit {
        monthly_limit,
        category_limits: get_category_limits(user_id, connection)?,
        alert_settings,
    }))
}

/// Get the spending limit of `user_id`, creating one with the default settings if needed.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_or_create_spending_limit(
    user_id: UserID,
    connection: &Connection,
) -> Result<SpendingLimit, Error> {
    ensure_spending_limit(user_id, connection)?;

    get_spending_limit(user_id, connection)?.ok_or(Error::SpendingLimitNotFound)
}

fn ensure_spending_limit(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let defaults = AlertSettings::default();

    connection.execute(
        "INSERT OR IGNORE INTO spending_limit (
                user_id, monthly_limit, monthly_limit_enabled, category_limit_enabled,
                income_vs_expense_enabled, monthly_warning_threshold)
         VALUES (?1, 0, ?2, ?3, ?4, ?5)",
        (
            user_id.as_i64(),
            defaults.monthly_limit_enabled,
            defaults.category_limit_enabled,
            defaults.income_vs_expense_enabled,
            defaults.monthly_warning_threshold,
        ),
    )?;

    Ok(())
}

/// Set the monthly limit of `user_id`, and the monthly warning threshold if given.
///
/// Creates the spending limit if needed.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn set_monthly_limit(
    user_id: UserID,
    monthly_limit: f64,
    warning_threshold: Option<f64>,
    connection: &Connection,
) -> Result<(), Error> {
    ensure_spending_limit(user_id, connection)?;

    connection.execute(
        "UPDATE spending_limit
         SET monthly_limit = ?1,
             monthly_warning_threshold = COALESCE(?2, monthly_warning_threshold)
         WHERE user_id = ?3",
        (monthly_limit, warning_threshold, user_id.as_i64()),
    )?;

    Ok(())
}

/// Overwrite the alert settings of `user_id`.
///
/// Creates the spending limit if needed.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn set_alert_settings(
    user_id: UserID,
    alert_settings: AlertSettings,
    connection: &Connection,
) -> Result<(), Error> {
    ensure_spending_limit(user_id, connection)?;

    connection.execute(
        "UPDATE spending_limit
         SET monthly_limit_enabled = ?1,
             category_limit_enabled = ?2,
             income_vs_expense_enabled = ?3,
             monthly_warning_threshold = ?4
         WHERE user_id = ?5",
        (
            alert_settings.monthly_limit_enabled,
            alert_settings.category_limit_enabled,
            alert_settings.income_vs_expense_enabled,
            alert_settings.monthly_warning_threshold,
            user_id.as_i64(),
        ),
    )?;

    Ok(())
}

/// Append a category limit to the list of `user_id`.
///
/// Creates the spending limit if needed. The caller is responsible for
/// checking that the category is not already in the list.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn insert_category_limit(
    user_id: UserID,
    new_limit: &NewCategoryLimit,
    connection: &Connection,
) -> Result<CategoryLimit, Error> {
    ensure_spending_limit(user_id, connection)?;

    connection
        .prepare(
            "INSERT INTO category_limit (user_id, category, amount, warning_threshold)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, category, amount, warning_threshold",
        )?
        .query_row(
            (
                user_id.as_i64(),
                &new_limit.category,
                new_limit.limit,
                new_limit.warning_threshold,
            ),
            map_category_limit_row,
        )
        .map_err(Error::from)
}

/// Replace the whole list of category limits of `user_id` with `new_limits`, keeping their order.
///
/// Creates the spending limit if needed. The caller should run this inside a transaction.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn replace_category_limits(
    user_id: UserID,
    new_limits: &[NewCategoryLimit],
    connection: &Connection,
) -> Result<(), Error> {
    ensure_spending_limit(user_id, connection)?;

    connection.execute(
        "DELETE FROM category_limit WHERE user_id = ?1",
        (user_id.as_i64(),),
    )?;

    for new_limit in new_limits {
        insert_category_limit(user_id, new_limit, connection)?;
    }

    Ok(())
}

/// Change the category limit `id` of `user_id`.
///
/// The warning threshold is only changed if `warning_threshold` is given.
///
/// # Errors
/// This function will return a:
/// - [Error::CategoryLimitNotFound] if `id` does not refer to a category limit of `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_category_limit(
    user_id: UserID,
    id: CategoryLimitId,
    category: &str,
    limit: f64,
    warning_threshold: Option<f64>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category_limit
         SET category = ?1,
             amount = ?2,
             warning_threshold = COALESCE(?3, warning_threshold)
         WHERE id = ?4 AND user_id = ?5",
        (category, limit, warning_threshold, id, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::CategoryLimitNotFound),
        _ => Ok(()),
    }
}

/// Remove the category limit `id` of `user_id`, leaving the other entries untouched.
///
/// # Errors
/// This function will return a:
/// - [Error::CategoryLimitNotFound] if `id` does not refer to a category limit of `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_category_limit(
    user_id: UserID,
    id: CategoryLimitId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category_limit WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::CategoryLimitNotFound),
        _ => Ok(()),
    }
}
