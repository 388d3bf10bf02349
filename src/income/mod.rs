//! Money the user earned: storage, HTTP handlers and the Excel export.

mod core;
mod handlers;

pub use core::{
    Income, create_income_table, get_income_in_range, get_recent_income, sum_income_in_range,
    total_income,
};
pub use handlers::{add_income, download_income, edit_income, list_income, remove_income};

#[cfg(test)]
pub(crate) use core::create_income;
