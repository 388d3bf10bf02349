//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/expense/{expense_id}', use [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/api/v1/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/v1/auth/login";
/// The route for getting the logged in user's profile.
pub const GET_USER: &str = "/api/v1/auth/getUser";
/// The route for uploading a new profile image.
pub const UPLOAD_IMAGE: &str = "/api/v1/auth/upload-image";

/// The route for recording an expense.
pub const ADD_EXPENSE: &str = "/api/v1/expense/add";
/// The route for listing the user's expenses.
pub const GET_EXPENSES: &str = "/api/v1/expense/get";
/// The route for downloading the user's expenses as an Excel workbook.
pub const DOWNLOAD_EXPENSES: &str = "/api/v1/expense/downloadexcel";
/// The route for updating or deleting a single expense.
pub const EXPENSE: &str = "/api/v1/expense/{expense_id}";

/// The route for recording income.
pub const ADD_INCOME: &str = "/api/v1/income/add";
/// The route for listing the user's income.
pub const GET_INCOME: &str = "/api/v1/income/get";
/// The route for downloading the user's income as an Excel workbook.
pub const DOWNLOAD_INCOME: &str = "/api/v1/income/downloadexcel";
/// The route for updating or deleting a single income.
pub const INCOME: &str = "/api/v1/income/{income_id}";

/// The route for reading and updating all of the user's spending limits.
pub const SPENDING_LIMITS: &str = "/api/v1/spending-limits";
/// The route for checking the user's spending alerts for the current month.
pub const SPENDING_ALERTS: &str = "/api/v1/spending-limits/alerts";
/// The route for setting the monthly spending limit.
pub const MONTHLY_LIMIT: &str = "/api/v1/spending-limits/monthly";
/// The route for adding a category limit.
pub const CATEGORY_LIMITS: &str = "/api/v1/spending-limits/category";
/// The route for updating or deleting a single category limit.
pub const CATEGORY_LIMIT: &str = "/api/v1/spending-limits/category/{category_id}";

/// The route for the dashboard summary.
pub const DASHBOARD: &str = "/api/v1/dashboard";

/// The route uploaded images are served from.
pub const UPLOADS: &str = "/uploads";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is the text from a left brace up to and including the next
/// right brace, e.g. '{expense_id}' in '/expense/{expense_id}'. Only the first
/// parameter is replaced. A parameter with no closing brace extends to the
/// end of the path.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{id}{}",
        &endpoint_path[..param_start],
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::REGISTER,
            endpoints::LOG_IN,
            endpoints::GET_USER,
            endpoints::UPLOAD_IMAGE,
            endpoints::ADD_EXPENSE,
            endpoints::GET_EXPENSES,
            endpoints::DOWNLOAD_EXPENSES,
            endpoints::ADD_INCOME,
            endpoints::GET_INCOME,
            endpoints::DOWNLOAD_INCOME,
            endpoints::SPENDING_LIMITS,
            endpoints::SPENDING_ALERTS,
            endpoints::MONTHLY_LIMIT,
            endpoints::CATEGORY_LIMITS,
            endpoints::DASHBOARD,
            endpoints::UPLOADS,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }

        for endpoint in [
            endpoints::EXPENSE,
            endpoints::INCOME,
            endpoints::CATEGORY_LIMIT,
        ] {
            assert_endpoint_is_valid_uri(&format_endpoint(endpoint, 1));
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 42);

        assert_eq!(formatted_path, "/hello/42/bye");
    }

    #[test]
    fn unclosed_parameter_runs_to_end() {
        let formatted_path = format_endpoint("/hello/{world", 7);

        assert_eq!(formatted_path, "/hello/7");
    }
}
