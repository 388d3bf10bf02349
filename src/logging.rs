//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// The number of characters of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest request body the middleware will buffer, matching axum's default body limit.
const MAX_REQUEST_BODY_SIZE: usize = 2 * 1024 * 1024;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
/// Only JSON and text bodies are logged, and the `password` field of JSON
/// request bodies is redacted. Request bodies larger than 2 MiB are rejected
/// with a 400 response.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request = match log_request(request).await {
        Ok(request) => request,
        Err(error) => return error.into_response(),
    };

    let response = next.run(request).await;

    log_response(response).await
}

async fn log_request(request: Request) -> Result<Request, Error> {
    let (parts, body) = request.into_parts();

    if !has_text_body(&parts.headers) {
        tracing::info!("Received request: {parts:#?}\nbody: <not logged>");
        return Ok(Request::from_parts(parts, body));
    }

    let bytes = axum::body::to_bytes(body, MAX_REQUEST_BODY_SIZE)
        .await
        .map_err(|error| Error::InvalidRequestBody(error.to_string()))?;

    let body_text = redact_password(&String::from_utf8_lossy(&bytes));
    log_body("Received request", &parts, &body_text);

    Ok(Request::from_parts(parts, Body::from(bytes)))
}

async fn log_response(response: Response) -> Response {
    let (parts, body) = response.into_parts();

    if !has_text_body(&parts.headers) {
        tracing::info!("Sending response: {parts:#?}\nbody: <not logged>");
        return Response::from_parts(parts, body);
    }

    let bytes: Bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read the response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_body("Sending response", &parts, &String::from_utf8_lossy(&bytes));

    Response::from_parts(parts, Body::from(bytes))
}

fn has_text_body(headers: &HeaderMap) -> bool {
    match headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
    {
        Some(content_type) => {
            content_type.starts_with("application/json") || content_type.starts_with("text/")
        }
        // Requests without a body, e.g. GET requests, do not set a content type.
        None => true,
    }
}

fn log_body(prefix: &str, parts: &impl std::fmt::Debug, body: &str) {
    match truncate(body, LOG_BODY_LENGTH_LIMIT) {
        Some(truncated) => {
            tracing::info!("{prefix}: {parts:#?}\nbody: {truncated}...");
            tracing::debug!("Full body: {body:?}");
        }
        None => tracing::info!("{prefix}: {parts:#?}\nbody: {body:?}"),
    }
}

/// The first `limit` characters of `text`, or `None` if `text` is no longer than `limit`.
fn truncate(text: &str, limit: usize) -> Option<&str> {
    text.char_indices()
        .nth(limit)
        .map(|(byte_index, _)| &text[..byte_index])
}

/// Replace the top level `password` field of a JSON object with asterisks.
///
/// Text that is not a JSON object is returned unchanged.
fn redact_password(body_text: &str) -> String {
    match serde_json::from_str::<Value>(body_text) {
        Ok(Value::Object(mut object)) if object.contains_key("password") => {
            object.insert("password".to_owned(), Value::String(REDACTED.to_owned()));
            Value::Object(object).to_string()
        }
        _ => body_text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, middleware, routing::post};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use super::{MAX_REQUEST_BODY_SIZE, logging_middleware, redact_password, truncate};

    #[test]
    fn redacts_password_field() {
        let redacted = redact_password(r#"{"email":"a@example.com","password":"hunter2"}"#);

        let value: Value = serde_json::from_str(&redacted).unwrap();
        assert_eq!(value["password"], json!("********"));
        assert_eq!(value["email"], json!("a@example.com"));
    }

    #[test]
    fn leaves_other_bodies_alone() {
        assert_eq!(redact_password("not json"), "not json");
        assert_eq!(redact_password(r#"{"amount":5}"#), r#"{"amount":5}"#);
    }

    #[test]
    fn truncates_on_character_boundary() {
        assert_eq!(truncate("héllo", 2), Some("hé"));
        assert_eq!(truncate("hello", 5), None);
    }

    #[tokio::test]
    async fn passes_bodies_through_unchanged() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let body = json!({ "email": "a@example.com", "password": "hunter2" });

        let response = server.post("/echo").json(&body).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), body);
    }

    #[tokio::test]
    async fn rejects_oversized_request_bodies() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server
            .post("/echo")
            .text("a".repeat(MAX_REQUEST_BODY_SIZE + 1))
            .await;

        response.assert_status_bad_request();
    }
}
