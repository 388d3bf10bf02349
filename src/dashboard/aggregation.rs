//! Builds the dashboard summary from a user's transactions.

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    calendar::DateRange,
    expense::{Expense, get_expenses_in_range, get_recent_expenses, total_expenses},
    income::{Income, get_income_in_range, get_recent_income, total_income},
};

/// The number of days of expenses shown on the dashboard, ending today.
pub const EXPENSE_WINDOW_DAYS: i64 = 30;
/// The number of days of income shown on the dashboard, ending today.
pub const INCOME_WINDOW_DAYS: i64 = 60;
/// How many of the newest expenses and of the newest income make up the recent transactions.
pub const RECENT_TRANSACTION_COUNT: u32 = 5;

/// The transactions in a window of time and their total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary<T> {
    /// The sum of the amounts of `transactions`.
    pub total: f64,
    /// The transactions, newest first.
    pub transactions: Vec<T>,
}

/// A transaction in the list of recent transactions, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecentTransaction {
    /// Money spent.
    Expense(Expense),
    /// Money earned.
    Income(Income),
}

impl RecentTransaction {
    fn date(&self) -> Date {
        match self {
            RecentTransaction::Expense(expense) => expense.date,
            RecentTransaction::Income(income) => income.date,
        }
    }
}

/// An overview of a user's finances.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// All income minus all expenses.
    pub total_balance: f64,
    /// Everything the user has earned.
    pub total_income: f64,
    /// Everything the user has spent.
    pub total_expenses: f64,
    /// Expenses in the last 30 days.
    #[serde(rename = "last30DaysExpenses")]
    pub last_30_days_expenses: WindowSummary<Expense>,
    /// Income in the last 60 days.
    #[serde(rename = "last60DaysIncome")]
    pub last_60_days_income: WindowSummary<Income>,
    /// The newest expenses and income, newest first.
    pub recent_transactions: Vec<RecentTransaction>,
}

fn summarize<T>(transactions: Vec<T>, amount: impl Fn(&T) -> f64) -> WindowSummary<T> {
    WindowSummary {
        total: transactions.iter().map(amount).sum(),
        transactions,
    }
}

/// Merge the newest expenses and income into one list, newest first.
///
/// On the same date, expenses come before income.
pub fn merge_recent(expenses: Vec<Expense>, income: Vec<Income>) -> Vec<RecentTransaction> {
    let mut transactions: Vec<_> = expenses
        .into_iter()
        .map(RecentTransaction::Expense)
        .chain(income.into_iter().map(RecentTransaction::Income))
        .collect();

    transactions.sort_by_key(|transaction| std::cmp::Reverse(transaction.date()));

    transactions
}

/// Build the dashboard of `user_id` as seen on `today`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn build_dashboard(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<Dashboard, Error> {
    let total_income = total_income(user_id, connection)?;
    let total_expenses = total_expenses(user_id, connection)?;

    let last_30_days_expenses = summarize(
        get_expenses_in_range(
            user_id,
            DateRange::days_ending_on(today, EXPENSE_WINDOW_DAYS),
            connection,
        )?,
        |expense| expense.amount,
    );
    let last_60_days_income = summarize(
        get_income_in_range(
            user_id,
            DateRange::days_ending_on(today, INCOME_WINDOW_DAYS),
            connection,
        )?,
        |income| income.amount,
    );

    let recent_transactions = merge_recent(
        get_recent_expenses(user_id, RECENT_TRANSACTION_COUNT, connection)?,
        get_recent_income(user_id, RECENT_TRANSACTION_COUNT, connection)?,
    );

    Ok(Dashboard {
        total_balance: total_income - total_expenses,
        total_income,
        total_expenses,
        last_30_days_expenses,
        last_60_days_income,
        recent_transactions,
    })
}
