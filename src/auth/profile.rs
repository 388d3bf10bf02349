//! Endpoints for reading the logged in user's profile and changing their profile image.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::{
        UserID,
        user::{get_user_by_id, update_profile_image_url},
    },
    image_store::{ImageStore, MAX_IMAGE_SIZE, image_extension},
};

/// The state needed for the profile endpoints.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// Where profile images are written.
    pub image_store: ImageStore,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            image_store: state.image_store.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Get the logged in user, without their password hash.
pub async fn get_user(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let user = get_user_by_id(user_id, &connection)?;

    Ok(Json(json!({ "user": user })))
}

/// The multipart field that holds the uploaded image.
const IMAGE_FIELD: &str = "image";

/// The response body for a successful profile image upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageResponse {
    message: &'static str,
    profile_image_url: String,
}

struct UploadedImage {
    file_name: String,
    extension: &'static str,
    bytes: Vec<u8>,
}

/// Replace the logged in user's profile image with the image in the multipart field `image`.
///
/// The previous image is removed from the image store on a best effort basis.
pub async fn upload_profile_image(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ProfileImageResponse>), Error> {
    let multipart = multipart.map_err(|rejection| Error::MultipartError(rejection.body_text()))?;
    let image = read_image_field(multipart).await?.ok_or(Error::MissingImage)?;

    let previous_image_url = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        get_user_by_id(user_id, &connection)?.profile_image_url
    };

    let profile_image_url = state
        .image_store
        .save(&image.file_name, image.extension, &image.bytes)
        .await?;

    if let Some(previous_image_url) = previous_image_url {
        if let Err(error) = state.image_store.delete(&previous_image_url).await {
            tracing::error!("Could not delete old profile image {previous_image_url}: {error}");
        }
    }

    {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        update_profile_image_url(user_id, &profile_image_url, &connection)?;
    }

    Ok((
        StatusCode::OK,
        Json(ProfileImageResponse {
            message: "Profile image updated successfully",
            profile_image_url,
        }),
    ))
}

async fn read_image_field(mut multipart: Multipart) -> Result<Option<UploadedImage>, Error> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_owned();
        let extension = field
            .content_type()
            .and_then(image_extension)
            .ok_or(Error::UnsupportedImageType)?;
        let bytes = field.bytes().await.map_err(multipart_error)?;

        if bytes.is_empty() {
            return Ok(None);
        }

        if bytes.len() > MAX_IMAGE_SIZE {
            return Err(Error::ImageTooLarge);
        }

        return Ok(Some(UploadedImage {
            file_name,
            extension,
            bytes: bytes.to_vec(),
        }));
    }

    Ok(None)
}

fn multipart_error(error: axum::extract::multipart::MultipartError) -> Error {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::ImageTooLarge
    } else {
        Error::MultipartError(error.body_text())
    }
}

#[cfg(test)]
mod profile_tests {
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{TEST_EMAIL, get_test_server, register_test_user},
    };

    #[tokio::test]
    async fn get_user_returns_profile_without_password() {
        let server = get_test_server();
        let (user_id, token) = register_test_user(&server, TEST_EMAIL).await;

        let response = server
            .get(endpoints::GET_USER)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["user"]["id"], json!(user_id.as_i64()));
        assert_eq!(body["user"]["email"], json!(TEST_EMAIL));
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn get_user_without_token_is_unauthorized() {
        let server = get_test_server();

        server
            .get(endpoints::GET_USER)
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn upload_image_stores_url_on_user() {
        let server = get_test_server();
        let (_, token) = register_test_user(&server, TEST_EMAIL).await;
        let form = MultipartForm::new().add_part(
            "image",
            Part::bytes(b"fake png bytes".as_slice())
                .file_name("avatar.png")
                .mime_type("image/png"),
        );

        let response = server
            .post(endpoints::UPLOAD_IMAGE)
            .authorization_bearer(&token)
            .multipart(form)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["message"], json!("Profile image updated successfully"));
        let url = body["profileImageUrl"].as_str().unwrap().to_owned();
        assert!(url.starts_with("/uploads/avatar-"), "got URL {url}");

        let user = server
            .get(endpoints::GET_USER)
            .authorization_bearer(&token)
            .await
            .json::<Value>();
        assert_eq!(user["user"]["profileImageUrl"], json!(url));
    }

    #[tokio::test]
    async fn upload_image_fails_without_file() {
        let server = get_test_server();
        let (_, token) = register_test_user(&server, TEST_EMAIL).await;
        let form = MultipartForm::new().add_text("caption", "no image here");

        let response = server
            .post(endpoints::UPLOAD_IMAGE)
            .authorization_bearer(token)
            .multipart(form)
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "message": "No image file provided" }));
    }

    #[tokio::test]
    async fn upload_image_fails_with_unsupported_type() {
        let server = get_test_server();
        let (_, token) = register_test_user(&server, TEST_EMAIL).await;
        let form = MultipartForm::new().add_part(
            "image",
            Part::bytes(b"%PDF-1.7".as_slice())
                .file_name("resume.pdf")
                .mime_type("application/pdf"),
        );

        let response = server
            .post(endpoints::UPLOAD_IMAGE)
            .authorization_bearer(token)
            .multipart(form)
            .await;

        response.assert_status_bad_request();
    }
}
