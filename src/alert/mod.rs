//! Spending alerts: warnings and errors raised when a user's spending in a
//! month approaches or passes their limits or their income.

mod check;
mod handlers;
mod model;

pub use check::check_alerts_after_expense;
pub use handlers::get_spending_alerts;
pub use model::SpendingAlert;
