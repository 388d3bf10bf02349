//! HTTP handlers for recording, listing, editing and exporting expenses.

use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Error,
    alert::{SpendingAlert, check_alerts_after_expense},
    auth::UserID,
    database_id::ExpenseId,
    excel::{TransactionRow, excel_attachment, transactions_workbook},
    expense::core::{
        Expense, ExpenseState, create_expense, delete_expense, get_expenses, update_expense,
    },
    extract::{ApiJson, ApiPath, LooseNumber, TransactionFields, parse_transaction_fields},
};

/// The request body for creating or editing an expense.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseForm {
    /// What the money was spent on.
    pub category: Option<String>,
    /// How much was spent.
    pub amount: Option<LooseNumber>,
    /// When the money was spent.
    pub date: Option<String>,
    /// An optional icon for the expense.
    pub icon: Option<String>,
}

impl ExpenseForm {
    fn validate(self) -> Result<TransactionFields, Error> {
        parse_transaction_fields(self.category, self.amount, self.date, self.icon)
    }
}

/// The response body for a new expense.
#[derive(Debug, Serialize)]
pub struct CreateExpenseResponse {
    /// The stored expense.
    pub expense: Expense,
    /// The limits this expense pushed the user past.
    pub alerts: Vec<SpendingAlert>,
}

/// Handler for recording an expense.
///
/// The response lists any monthly or category limit that the new expense
/// pushed the user past in the month of the expense.
pub async fn add_expense(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(form): ApiJson<ExpenseForm>,
) -> Result<Json<CreateExpenseResponse>, Error> {
    let fields = form.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = create_expense(user_id, fields, &connection)?;
    let alerts = check_alerts_after_expense(user_id, &expense.category, expense.date, &connection);

    tracing::debug!("User {user_id} added expense {}", expense.id);

    Ok(Json(CreateExpenseResponse { expense, alerts }))
}

/// Handler for listing the current user's expenses, newest first.
pub async fn list_expenses(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Expense>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_expenses(user_id, &connection).map(Json)
}

/// Handler for editing the expense with the ID in the path.
pub async fn edit_expense(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(expense_id): ApiPath<ExpenseId>,
    ApiJson(form): ApiJson<ExpenseForm>,
) -> Result<Json<Expense>, Error> {
    let fields = form.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    update_expense(user_id, expense_id, fields, &connection).map(Json)
}

/// Handler for deleting the expense with the ID in the path.
pub async fn remove_expense(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(expense_id): ApiPath<ExpenseId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_expense(user_id, expense_id, &connection)?;

    Ok(Json(json!({ "message": "Expense deleted successfully" })).into_response())
}

/// Handler for downloading the current user's expenses as an Excel workbook.
pub async fn download_expenses(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let expenses = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_expenses(user_id, &connection)?
    };

    let workbook = transactions_workbook(
        "Expense",
        "Category",
        expenses.iter().map(|expense| TransactionRow {
            label: &expense.category,
            amount: expense.amount,
            date: expense.date,
        }),
    )?;

    Ok(excel_attachment("expense_details.xlsx", workbook))
}
