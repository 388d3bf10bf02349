//! HTTP handlers for recording, listing, editing and exporting income.

use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    Error,
    auth::UserID,
    database_id::IncomeId,
    excel::{TransactionRow, excel_attachment, transactions_workbook},
    extract::{ApiJson, ApiPath, LooseNumber, TransactionFields, parse_transaction_fields},
    income::core::{
        Income, IncomeState, create_income, delete_income, get_income, update_income,
    },
};

/// The request body for creating or editing income.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeForm {
    /// Where the money came from.
    pub source: Option<String>,
    /// How much was earned.
    pub amount: Option<LooseNumber>,
    /// When the money was earned.
    pub date: Option<String>,
    /// An optional icon for the income.
    pub icon: Option<String>,
}

impl IncomeForm {
    fn validate(self) -> Result<TransactionFields, Error> {
        parse_transaction_fields(self.source, self.amount, self.date, self.icon)
    }
}

/// Handler for recording income.
pub async fn add_income(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(form): ApiJson<IncomeForm>,
) -> Result<Json<Income>, Error> {
    let fields = form.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let income = create_income(user_id, fields, &connection)?;
    tracing::debug!("User {user_id} added income {}", income.id);

    Ok(Json(income))
}

/// Handler for listing the current user's income, newest first.
pub async fn list_income(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Income>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_income(user_id, &connection).map(Json)
}

/// Handler for editing the income with the ID in the path.
pub async fn edit_income(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(income_id): ApiPath<IncomeId>,
    ApiJson(form): ApiJson<IncomeForm>,
) -> Result<Json<Income>, Error> {
    let fields = form.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    update_income(user_id, income_id, fields, &connection).map(Json)
}

/// Handler for deleting the income with the ID in the path.
pub async fn remove_income(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(income_id): ApiPath<IncomeId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_income(user_id, income_id, &connection)?;

    Ok(Json(json!({ "message": "Income deleted successfully" })).into_response())
}

/// Handler for downloading the current user's income as an Excel workbook.
pub async fn download_income(
    State(state): State<IncomeState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let income = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_income(user_id, &connection)?
    };

    let workbook = transactions_workbook(
        "Income",
        "Source",
        income.iter().map(|income| TransactionRow {
            label: &income.source,
            amount: income.amount,
            date: income.date,
        }),
    )?;

    Ok(excel_attachment("income_details.xlsx", workbook))
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header::CONTENT_DISPOSITION};
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{get_test_server, register_test_user},
    };

    #[tokio::test]
    async fn add_income_succeeds() {
        let server = get_test_server();
        let (_, token) = register_test_user(&server, "earner@example.com").await;

        let response = server
            .post(endpoints::ADD_INCOME)
            .authorization_bearer(&token)
            .json(&json!({ "source": "Salary", "amount": 3000, "date": "2025-03-01T00:00:00Z" }))
            .await;

        response.assert_status_ok();
        let income = response.json::<Value>();
        assert_eq!(income["source"], json!("Salary"));
        assert_eq!(income["amount"], json!(3000.0));
        assert_eq!(income["date"], json!("2025-03-01"));
    }

    #[tokio::test]
    async fn add_income_requires_source() {
        let server = get_test_server();
        let (_, token) = register_test_user(&server, "earner@example.com").await;

        let response = server
            .post(endpoints::ADD_INCOME)
            .authorization_bearer(&token)
            .json(&json!({ "amount": 3000, "date": "2025-03-01" }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "message": "All fields are required" }));
    }

    #[tokio::test]
    async fn income_requires_auth() {
        let server = get_test_server();

        server
            .get(endpoints::GET_INCOME)
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn edit_and_delete_income() {
        let server = get_test_server();
        let (_, token) = register_test_user(&server, "earner@example.com").await;
        let income = server
            .post(endpoints::ADD_INCOME)
            .authorization_bearer(&token)
            .json(&json!({ "source": "Salary", "amount": 3000, "date": "2025-03-01" }))
            .await
            .json::<Value>();
        let path = format_endpoint(endpoints::INCOME, income["id"].as_i64().unwrap());

        let edited = server
            .put(&path)
            .authorization_bearer(&token)
            .json(&json!({ "source": "Bonus", "amount": "250.5", "date": "2025-03-02" }))
            .await;
        edited.assert_status_ok();
        assert_eq!(edited.json::<Value>()["amount"], json!(250.5));

        let deleted = server.delete(&path).authorization_bearer(&token).await;
        deleted.assert_status_ok();
        deleted.assert_json(&json!({ "message": "Income deleted successfully" }));

        let listed = server
            .get(endpoints::GET_INCOME)
            .authorization_bearer(&token)
            .await;
        listed.assert_json(&json!([]));
    }

    #[tokio::test]
    async fn other_users_cannot_edit_income() {
        let server = get_test_server();
        let (_, owner_token) = register_test_user(&server, "owner@example.com").await;
        let (_, intruder_token) = register_test_user(&server, "intruder@example.com").await;
        let income = server
            .post(endpoints::ADD_INCOME)
            .authorization_bearer(&owner_token)
            .json(&json!({ "source": "Salary", "amount": 3000, "date": "2025-03-01" }))
            .await
            .json::<Value>();
        let path = format_endpoint(endpoints::INCOME, income["id"].as_i64().unwrap());

        let response = server
            .put(&path)
            .authorization_bearer(&intruder_token)
            .json(&json!({ "source": "Stolen", "amount": 1, "date": "2025-03-01" }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({ "message": "Income not found" }));
    }

    #[tokio::test]
    async fn download_income_returns_workbook() {
        let server = get_test_server();
        let (_, token) = register_test_user(&server, "earner@example.com").await;

        let response = server
            .get(endpoints::DOWNLOAD_INCOME)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header(CONTENT_DISPOSITION),
            "attachment; filename=\"income_details.xlsx\""
        );
        assert!(response.as_bytes().starts_with(b"PK"));
    }
}
