//! Money the user spent: storage, HTTP handlers and the Excel export.

mod core;
mod handlers;

pub use core::{
    Expense, create_expense_table, get_expenses_in_range, get_recent_expenses,
    sum_expenses_in_range, total_expenses,
};
pub use handlers::{add_expense, download_expenses, edit_expense, list_expenses, remove_expense};

#[cfg(test)]
pub(crate) use core::create_expense;
