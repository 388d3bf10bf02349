//! HTTP handlers for viewing and editing spending limits.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::CategoryLimitId,
    extract::{ApiJson, ApiPath},
    spending_limit::{
        db::{
            delete_category_limit, get_or_create_spending_limit, get_spending_limit,
            insert_category_limit, replace_category_limits, set_alert_settings, set_monthly_limit,
            update_category_limit,
        },
        domain::SpendingLimit,
        form::{CategoryLimitForm, MonthlyLimitForm, SpendingLimitUpdate},
    },
};

/// The state needed by the spending limit endpoints.
#[derive(Debug, Clone)]
pub struct SpendingLimitState {
    /// The database connection for managing spending limits.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SpendingLimitState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handler for getting the spending limits of the current user.
///
/// Users that have never configured their limits get the default settings,
/// which are stored so that later edits have something to change.
pub async fn get_spending_limits(
    State(state): State<SpendingLimitState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<SpendingLimit>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_or_create_spending_limit(user_id, &connection).map(Json)
}

/// Handler for changing any combination of the monthly limit, the category
/// limits and the alert settings in one request.
///
/// A `categoryLimits` list replaces the whole list. Nothing is written unless
/// every part of the request is valid.
pub async fn update_spending_limits(
    State(state): State<SpendingLimitState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(update): ApiJson<SpendingLimitUpdate>,
) -> Result<Json<SpendingLimit>, Error> {
    let update = update.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let transaction = connection.unchecked_transaction()?;

    let current = get_or_create_spending_limit(user_id, &transaction)?;

    if let Some(monthly_limit) = update.monthly_limit {
        set_monthly_limit(user_id, monthly_limit, None, &transaction)?;
    }

    if let Some(category_limits) = &update.category_limits {
        replace_category_limits(user_id, category_limits, &transaction)?;
    }

    if let Some(patch) = update.alert_settings {
        let alert_settings = current.alert_settings.merge(patch)?;
        set_alert_settings(user_id, alert_settings, &transaction)?;
    }

    let spending_limit = get_or_create_spending_limit(user_id, &transaction)?;
    transaction.commit()?;

    tracing::debug!("Updated spending limits of user {user_id}");

    Ok(Json(spending_limit))
}

/// Handler for setting the monthly limit and, optionally, the monthly warning threshold.
///
/// A missing or non-numeric limit clears the monthly limit.
pub async fn update_monthly_limit(
    State(state): State<SpendingLimitState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(form): ApiJson<MonthlyLimitForm>,
) -> Result<Json<SpendingLimit>, Error> {
    let (monthly_limit, warning_threshold) = form.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    set_monthly_limit(user_id, monthly_limit, warning_threshold, &connection)?;

    get_or_create_spending_limit(user_id, &connection).map(Json)
}

/// Handler for adding a limit for a category that has no limit yet.
pub async fn add_category_limit(
    State(state): State<SpendingLimitState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(form): ApiJson<CategoryLimitForm>,
) -> Result<Json<SpendingLimit>, Error> {
    let new_limit = form.validate()?.into_new_limit();

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let transaction = connection.unchecked_transaction()?;

    if get_or_create_spending_limit(user_id, &transaction)?
        .category_limit(&new_limit.category)
        .is_some()
    {
        return Err(Error::DuplicateCategoryLimit);
    }

    insert_category_limit(user_id, &new_limit, &transaction)?;
    let spending_limit = get_or_create_spending_limit(user_id, &transaction)?;
    transaction.commit()?;

    Ok(Json(spending_limit))
}

/// Handler for editing the category limit with the ID in the path.
///
/// The warning threshold is kept as is when the request does not include one.
pub async fn edit_category_limit(
    State(state): State<SpendingLimitState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(category_id): ApiPath<CategoryLimitId>,
    ApiJson(form): ApiJson<CategoryLimitForm>,
) -> Result<Json<SpendingLimit>, Error> {
    let edit = form.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let transaction = connection.unchecked_transaction()?;

    let current = get_spending_limit(user_id, &transaction)?.ok_or(Error::SpendingLimitNotFound)?;

    if !current
        .category_limits
        .iter()
        .any(|category_limit| category_limit.id == category_id)
    {
        return Err(Error::CategoryLimitNotFound);
    }

    if current
        .category_limit(&edit.category)
        .is_some_and(|other| other.id != category_id)
    {
        return Err(Error::DuplicateCategoryLimit);
    }

    update_category_limit(
        user_id,
        category_id,
        &edit.category,
        edit.limit,
        edit.warning_threshold,
        &transaction,
    )?;
    let spending_limit = get_or_create_spending_limit(user_id, &transaction)?;
    transaction.commit()?;

    Ok(Json(spending_limit))
}

/// Handler for removing the category limit with the ID in the path.
pub async fn remove_category_limit(
    State(state): State<SpendingLimitState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(category_id): ApiPath<CategoryLimitId>,
) -> Result<Json<SpendingLimit>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    if get_spending_limit(user_id, &connection)?.is_none() {
        return Err(Error::SpendingLimitNotFound);
    }

    delete_category_limit(user_id, category_id, &connection)?;

    get_or_create_spending_limit(user_id, &connection).map(Json)
}
