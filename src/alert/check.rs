//! Checks a user's spending in a month against their spending limits.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    alert::model::{
        MonthTotals, Severity, SpendingAlert, category_alert, evaluate_alerts, monthly_alert,
    },
    auth::UserID,
    calendar::DateRange,
    expense::sum_expenses_in_range,
    income::sum_income_in_range,
    spending_limit::{SpendingLimit, get_spending_limit},
};

/// Get every alert for the month containing `date`.
///
/// Users without spending limits get no alerts. Errors are logged and result
/// in no alerts so that they never break the request that asked for them.
pub fn check_spending_alerts(
    user_id: UserID,
    date: Date,
    connection: &Connection,
) -> Vec<SpendingAlert> {
    try_check_spending_alerts(user_id, date, connection).unwrap_or_else(|error| {
        tracing::error!("Could not check the spending alerts of user {user_id}: {error}");
        Vec::new()
    })
}

fn try_check_spending_alerts(
    user_id: UserID,
    date: Date,
    connection: &Connection,
) -> Result<Vec<SpendingAlert>, Error> {
    let Some(spending_limit) = get_spending_limit(user_id, connection)? else {
        return Ok(Vec::new());
    };

    let totals = month_totals(user_id, &spending_limit, date, connection)?;

    Ok(evaluate_alerts(&spending_limit, &totals))
}

fn month_totals(
    user_id: UserID,
    spending_limit: &SpendingLimit,
    date: Date,
    connection: &Connection,
) -> Result<MonthTotals, Error> {
    let month = DateRange::month_containing(date);
    let settings = spending_limit.alert_settings;

    let expenses = sum_expenses_in_range(user_id, month, None, connection)?;

    let income = if settings.income_vs_expense_enabled {
        sum_income_in_range(user_id, month, connection)?
    } else {
        0.0
    };

    let category_expenses = if settings.category_limit_enabled {
        spending_limit
            .category_limits
            .iter()
            .map(|category_limit| {
                sum_expenses_in_range(user_id, month, Some(&category_limit.category), connection)
            })
            .collect::<Result<_, _>>()?
    } else {
        Vec::new()
    };

    Ok(MonthTotals {
        expenses,
        income,
        category_expenses,
    })
}

/// Get the limits that a new expense in `category` on `date` pushed the user past.
///
/// Only the monthly limit and the limit of `category` are checked, and
/// warnings are left out. Errors are logged and result in no alerts.
pub fn check_alerts_after_expense(
    user_id: UserID,
    category: &str,
    date: Date,
    connection: &Connection,
) -> Vec<SpendingAlert> {
    try_check_alerts_after_expense(user_id, category, date, connection).unwrap_or_else(|error| {
        tracing::error!("Could not check the spending alerts of user {user_id}: {error}");
        Vec::new()
    })
}

fn try_check_alerts_after_expense(
    user_id: UserID,
    category: &str,
    date: Date,
    connection: &Connection,
) -> Result<Vec<SpendingAlert>, Error> {
    let Some(spending_limit) = get_spending_limit(user_id, connection)? else {
        return Ok(Vec::new());
    };

    let month = DateRange::month_containing(date);
    let settings = spending_limit.alert_settings;
    let mut alerts = Vec::new();

    if settings.monthly_limit_enabled && spending_limit.monthly_limit > 0.0 {
        let spent = sum_expenses_in_range(user_id, month, None, connection)?;
        alerts.extend(
            monthly_alert(
                spent,
                spending_limit.monthly_limit,
                settings.monthly_warning_threshold,
            )
            .filter(is_breach),
        );
    }

    if settings.category_limit_enabled {
        if let Some(category_limit) = spending_limit.category_limit(category) {
            let spent =
                sum_expenses_in_range(user_id, month, Some(&category_limit.category), connection)?;
            alerts.extend(category_alert(category_limit, spent).filter(is_breach));
        }
    }

    Ok(alerts)
}

fn is_breach(alert: &SpendingAlert) -> bool {
    alert.severity == Severity::Error
}
