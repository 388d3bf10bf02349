use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    alert::{check::check_spending_alerts, model::SpendingAlert},
    auth::UserID,
    timezone::local_today,
};

/// The state needed for checking spending alerts.
#[derive(Debug, Clone)]
pub struct AlertState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for reading limits and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AlertState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response body listing a user's alerts.
#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    /// The alerts, monthly first, then categories, then income.
    pub alerts: Vec<SpendingAlert>,
}

/// Handler for getting the spending alerts of the current month.
///
/// Failures while checking the alerts are logged and produce an empty list.
pub async fn get_spending_alerts(
    State(state): State<AlertState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<AlertsResponse>, Error> {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => {
            tracing::error!("Could not check the spending alerts of user {user_id}: {error}");
            return Ok(Json(AlertsResponse { alerts: Vec::new() }));
        }
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    Ok(Json(AlertsResponse {
        alerts: check_spending_alerts(user_id, today, &connection),
    }))
}
