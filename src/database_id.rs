//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// Database identifier for an expense.
pub type ExpenseId = DatabaseId;
/// Database identifier for an income.
pub type IncomeId = DatabaseId;
/// Database identifier for a single category limit within a user's spending limits.
pub type CategoryLimitId = DatabaseId;
