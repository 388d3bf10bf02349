//! Dashboard HTTP handler.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::aggregation::{Dashboard, build_dashboard},
    timezone::local_today,
};

/// The state needed for building the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Handler for the overview of the current user's finances.
///
/// The 30 and 60 day windows end on today's date in the server's timezone.
pub async fn get_dashboard(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Dashboard>, Error> {
    let today = local_today(&state.local_timezone)
        .inspect_err(|error| tracing::error!("could not get today's date: {error}"))?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    build_dashboard(user_id, today, &connection).map(Json)
}
