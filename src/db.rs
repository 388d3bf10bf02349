//! Sets up the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, auth::create_user_table, expense::create_expense_table, income::create_income_table,
    spending_limit::create_spending_limit_tables,
};

/// Create the tables for the domain models if they do not exist yet.
///
/// Foreign keys are switched on for `connection` so that deleting a user
/// removes everything they own.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_expense_table(&transaction)?;
    create_income_table(&transaction)?;
    create_spending_limit_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
