//! Monthly and per-category spending limits, and the settings for spending alerts.

mod db;
mod domain;
mod form;
mod handlers;

pub use db::{create_spending_limit_tables, get_spending_limit};
pub use domain::{AlertSettings, CategoryLimit, DEFAULT_WARNING_THRESHOLD, SpendingLimit};
pub use handlers::{
    add_category_limit, edit_category_limit, get_spending_limits, remove_category_limit,
    update_monthly_limit, update_spending_limits,
};

#[cfg(test)]
pub(crate) use db::{insert_category_limit, set_alert_settings, set_monthly_limit};
#[cfg(test)]
pub(crate) use domain::NewCategoryLimit;
