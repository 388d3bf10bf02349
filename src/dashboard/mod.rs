//! Dashboard module
//!
//! Summarizes a user's balance, recent spending and recent income.

mod aggregation;
mod handlers;

pub use handlers::get_dashboard;
