//! The alerts shown to users about their spending.

use serde::Serialize;

use crate::{
    currency::format_currency,
    spending_limit::{CategoryLimit, DEFAULT_WARNING_THRESHOLD, SpendingLimit},
};

/// What an alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// The month's spending reached the monthly limit.
    MonthlyLimitExceeded,
    /// The month's spending reached the monthly warning threshold.
    MonthlyLimitWarning,
    /// The month's spending in a category reached its limit.
    CategoryLimitExceeded,
    /// The month's spending in a category reached its warning threshold.
    CategoryLimitWarning,
    /// The month's spending went over the month's income.
    ExpenseExceedIncome,
    /// The month's spending went over 80% of the month's income.
    ExpenseHighVsIncome,
}

/// How serious an alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// A limit has been reached.
    Error,
    /// A limit is close to being reached.
    Warning,
}

/// The numbers behind an alert. Only the fields relevant to the alert's kind are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expenses: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deficit: Option<f64>,
}

/// A warning or error about the user's spending in a month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingAlert {
    /// What the alert is about.
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// How serious the alert is.
    pub severity: Severity,
    /// A message for the user.
    pub message: String,
    /// The numbers behind the alert.
    pub data: AlertData,
}

/// The share of expenses relative to income at which a warning is raised.
pub const HIGH_EXPENSE_RATIO: f64 = 0.8;

fn percentage(amount: f64, total: f64) -> i64 {
    (amount / total * 100.0).round() as i64
}

/// The alert for spending `spent` against a monthly limit of `limit`, if any.
///
/// Reaching the limit is an error, reaching `warning_threshold` percent of it
/// is a warning.
pub fn monthly_alert(spent: f64, limit: f64, warning_threshold: f64) -> Option<SpendingAlert> {
    if limit <= 0.0 {
        return None;
    }

    if spent >= limit {
        Some(SpendingAlert {
            kind: AlertKind::MonthlyLimitExceeded,
            severity: Severity::Error,
            message: format!(
                "You have exceeded your monthly spending limit! Spent: {} / Limit: {}",
                format_currency(spent),
                format_currency(limit)
            ),
            data: AlertData {
                spent: Some(spent),
                limit: Some(limit),
                ..Default::default()
            },
        })
    } else if spent >= limit * warning_threshold / 100.0 {
        let percentage = percentage(spent, limit);

        Some(SpendingAlert {
            kind: AlertKind::MonthlyLimitWarning,
            severity: Severity::Warning,
            message: format!("Warning: You have spent {percentage}% of this month's limit!"),
            data: AlertData {
                spent: Some(spent),
                limit: Some(limit),
                percentage: Some(percentage),
                ..Default::default()
            },
        })
    } else {
        None
    }
}

/// The alert for spending `spent` in the category of `category_limit`, if any.
///
/// A warning threshold of 0 means the category uses the default threshold.
pub fn category_alert(category_limit: &CategoryLimit, spent: f64) -> Option<SpendingAlert> {
    let CategoryLimit {
        category,
        limit,
        warning_threshold,
        ..
    } = category_limit;
    let limit = *limit;
    let warning_threshold = if *warning_threshold > 0.0 {
        *warning_threshold
    } else {
        DEFAULT_WARNING_THRESHOLD
    };

    if limit <= 0.0 {
        return None;
    }

    if spent >= limit {
        Some(SpendingAlert {
            kind: AlertKind::CategoryLimitExceeded,
            severity: Severity::Error,
            message: format!(
                "Category \"{category}\" has exceeded the limit! Spent: {} / Limit: {}",
                format_currency(spent),
                format_currency(limit)
            ),
            data: AlertData {
                category: Some(category.clone()),
                spent: Some(spent),
                limit: Some(limit),
                ..Default::default()
            },
        })
    } else if spent >= limit * warning_threshold / 100.0 {
        let percentage = percentage(spent, limit);

        Some(SpendingAlert {
            kind: AlertKind::CategoryLimitWarning,
            severity: Severity::Warning,
            message: format!(
                "Warning: Category \"{category}\" has spent {percentage}% of the limit!"
            ),
            data: AlertData {
                category: Some(category.clone()),
                spent: Some(spent),
                limit: Some(limit),
                percentage: Some(percentage),
                ..Default::default()
            },
        })
    } else {
        None
    }
}

/// The alert for spending `expenses` in a month that brought in `income`, if any.
///
/// Months without income never raise an alert. Spending exactly as much as
/// was earned is a warning, not an error.
pub fn income_alert(income: f64, expenses: f64) -> Option<SpendingAlert> {
    if income <= 0.0 {
        return None;
    }

    if expenses > income {
        Some(SpendingAlert {
            kind: AlertKind::ExpenseExceedIncome,
            severity: Severity::Error,
            message: format!(
                "Warning: Expenses have exceeded income this month! Income: {}, Expenses: {}",
                format_currency(income),
                format_currency(expenses)
            ),
            data: AlertData {
                income: Some(income),
                expenses: Some(expenses),
                deficit: Some(expenses - income),
                ..Default::default()
            },
        })
    } else if expenses > income * HIGH_EXPENSE_RATIO {
        let percentage = percentage(expenses, income);

        Some(SpendingAlert {
            kind: AlertKind::ExpenseHighVsIncome,
            severity: Severity::Warning,
            message: format!("Note: Expenses have reached {percentage}% of income this month!"),
            data: AlertData {
                income: Some(income),
                expenses: Some(expenses),
                percentage: Some(percentage),
                ..Default::default()
            },
        })
    } else {
        None
    }
}

/// The amounts a user spent and earned in one month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthTotals {
    /// Everything spent in the month.
    pub expenses: f64,
    /// Everything earned in the month.
    pub income: f64,
    /// The amount spent in each category of the spending limit, in the same order.
    pub category_expenses: Vec<f64>,
}

/// Every alert for a month with `totals` under `spending_limit`.
///
/// Alerts are ordered monthly first, then categories in their configured
/// order, then income. Checks that are turned off in the alert settings are skipped.
pub fn evaluate_alerts(spending_limit: &SpendingLimit, totals: &MonthTotals) -> Vec<SpendingAlert> {
    let settings = spending_limit.alert_settings;
    let mut alerts = Vec::new();

    if settings.monthly_limit_enabled {
        alerts.extend(monthly_alert(
            totals.expenses,
            spending_limit.monthly_limit,
            settings.monthly_warning_threshold,
        ));
    }

    if settings.category_limit_enabled {
        alerts.extend(
            spending_limit
                .category_limits
                .iter()
                .zip(&totals.category_expenses)
                .filter_map(|(category_limit, spent)| category_alert(category_limit, *spent)),
        );
    }

    if settings.income_vs_expense_enabled {
        alerts.extend(income_alert(totals.income, totals.expenses));
    }

    alerts
}
