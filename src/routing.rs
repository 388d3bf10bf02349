//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::json;
use tower_http::services::ServeDir;

use crate::{
    AppState,
    alert::get_spending_alerts,
    auth::{auth_guard, get_user, post_log_in, register_user, upload_profile_image},
    dashboard::get_dashboard,
    endpoints,
    expense::{add_expense, download_expenses, edit_expense, list_expenses, remove_expense},
    image_store::MAX_IMAGE_SIZE,
    income::{add_income, download_income, edit_income, list_income, remove_income},
    spending_limit::{
        add_category_limit, edit_category_limit, get_spending_limits, remove_category_limit,
        update_monthly_limit, update_spending_limits,
    },
};

/// Room for the multipart boundaries and headers around an uploaded image.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in));

    let protected_routes = Router::new()
        .route(endpoints::GET_USER, get(get_user))
        .route(
            endpoints::UPLOAD_IMAGE,
            post(upload_profile_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + MULTIPART_OVERHEAD)),
        )
        .route(endpoints::ADD_EXPENSE, post(add_expense))
        .route(endpoints::GET_EXPENSES, get(list_expenses))
        .route(endpoints::DOWNLOAD_EXPENSES, get(download_expenses))
        .route(endpoints::EXPENSE, put(edit_expense).delete(remove_expense))
        .route(endpoints::ADD_INCOME, post(add_income))
        .route(endpoints::GET_INCOME, get(list_income))
        .route(endpoints::DOWNLOAD_INCOME, get(download_income))
        .route(endpoints::INCOME, put(edit_income).delete(remove_income))
        .route(
            endpoints::SPENDING_LIMITS,
            get(get_spending_limits).put(update_spending_limits),
        )
        .route(endpoints::SPENDING_ALERTS, get(get_spending_alerts))
        .route(endpoints::MONTHLY_LIMIT, put(update_monthly_limit))
        .route(endpoints::CATEGORY_LIMITS, post(add_category_limit))
        .route(
            endpoints::CATEGORY_LIMIT,
            put(edit_category_limit).delete(remove_category_limit),
        )
        .route(endpoints::DASHBOARD, get(get_dashboard))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .nest_service(
            endpoints::UPLOADS,
            ServeDir::new(state.image_store.directory()),
        )
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Respond to requests for unknown routes with a JSON 404.
async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Route not found" })),
    )
        .into_response()
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_utils::get_test_server;

    #[tokio::test]
    async fn unknown_route_returns_json_404() {
        let server = get_test_server();

        let response = server.get("/api/v1/nope").await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({ "message": "Route not found" }));
    }

    #[tokio::test]
    async fn protected_route_without_token_is_unauthorized() {
        let server = get_test_server();

        let response = server.get("/api/v1/expense/get").await;

        response.assert_status_unauthorized();
        response.assert_json(&json!({ "message": "Not authorized, no token" }));
    }
}
