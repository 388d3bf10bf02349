//! A directory of uploaded profile images that is served statically.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use time::OffsetDateTime;

use crate::Error;

/// The largest accepted image upload, 5 MiB.
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// The accepted image MIME types and the file extension each is stored with.
const ALLOWED_IMAGE_TYPES: [(&str, &str); 5] = [
    ("image/jpeg", "jpeg"),
    ("image/png", "png"),
    ("image/jpg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// Get the file extension for an image with `content_type`, or `None` if the type is not accepted.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(mime_type, _)| mime_type.eq_ignore_ascii_case(content_type.trim()))
        .map(|(_, extension)| *extension)
}

/// Stores uploaded images on disk and hands out the URLs they are served from.
#[derive(Debug, Clone)]
pub struct ImageStore {
    directory: PathBuf,
    url_prefix: String,
}

impl ImageStore {
    /// Create an image store that writes to `directory` and whose files are
    /// served under `url_prefix`, e.g. "/uploads".
    pub fn new(directory: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            directory: directory.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_owned(),
        }
    }

    /// The directory the images are written to.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Write `bytes` to a new file and return the URL it will be served from.
    ///
    /// The file is named `<stem>-<unix millis>.<extension>` where the stem is
    /// the name the client gave the file, minus its extension and any
    /// characters that are unsafe in a path.
    ///
    /// # Errors
    ///
    /// Returns an [Error::ImageStorageError] if the file could not be written.
    pub async fn save(
        &self,
        original_file_name: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, Error> {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let file_name = format!("{}-{millis}.{extension}", file_stem(original_file_name));

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|error| Error::ImageStorageError(error.to_string()))?;
        tokio::fs::write(self.directory.join(&file_name), bytes)
            .await
            .map_err(|error| Error::ImageStorageError(error.to_string()))?;

        Ok(format!("{}/{file_name}", self.url_prefix))
    }

    /// Remove the image served at `url`.
    ///
    /// URLs that do not point into this store, e.g. images hosted elsewhere,
    /// and files that are already gone are ignored.
    ///
    /// # Errors
    ///
    /// Returns an [Error::ImageStorageError] if the file exists but could not be removed.
    pub async fn delete(&self, url: &str) -> Result<(), Error> {
        let Some(file_name) = self.file_name_for(url) else {
            return Ok(());
        };

        match tokio::fs::remove_file(self.directory.join(file_name)).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(Error::ImageStorageError(error.to_string())),
        }
    }

    fn file_name_for<'a>(&self, url: &'a str) -> Option<&'a str> {
        let file_name = url
            .strip_prefix(self.url_prefix.as_str())?
            .strip_prefix('/')?;

        let is_plain_file_name = !file_name.is_empty()
            && !file_name.contains(['/', '\\'])
            && !file_name.starts_with('.');

        is_plain_file_name.then_some(file_name)
    }
}

fn file_stem(original_file_name: &str) -> String {
    let stem = original_file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .split('.')
        .next()
        .unwrap_or_default();

    let stem: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if stem.is_empty() {
        "image".to_owned()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use time::OffsetDateTime;

    use super::{ImageStore, file_stem, image_extension};

    fn temp_directory(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "expense_tracker_{name}_{}",
            OffsetDateTime::now_utc().unix_timestamp_nanos()
        ))
    }

    #[test]
    fn accepts_only_image_types() {
        assert_eq!(image_extension("image/png"), Some("png"));
        assert_eq!(image_extension("IMAGE/JPEG"), Some("jpeg"));
        assert_eq!(image_extension("image/svg+xml"), None);
        assert_eq!(image_extension("application/pdf"), None);
    }

    #[test]
    fn file_stem_strips_extension_and_unsafe_characters() {
        assert_eq!(file_stem("holiday photo.final.png"), "holidayphoto");
        assert_eq!(file_stem("../../etc/passwd"), "passwd");
        assert_eq!(file_stem(".png"), "image");
    }

    #[tokio::test]
    async fn save_then_delete_removes_file() {
        let directory = temp_directory("save_delete");
        let store = ImageStore::new(&directory, "/uploads");

        let url = store.save("me.png", "png", b"not really a png").await.unwrap();

        assert!(url.starts_with("/uploads/me-"));
        assert!(url.ends_with(".png"));
        let file_name = url.trim_start_matches("/uploads/");
        assert!(directory.join(file_name).exists());

        store.delete(&url).await.unwrap();

        assert!(!directory.join(file_name).exists());
        let _ = std::fs::remove_dir_all(directory);
    }

    #[tokio::test]
    async fn delete_ignores_foreign_and_missing_urls() {
        let store = ImageStore::new(temp_directory("foreign"), "/uploads");

        assert!(store.delete("https://example.com/me.png").await.is_ok());
        assert!(store.delete("/uploads/../secrets.txt").await.is_ok());
        assert!(store.delete("/uploads/never-saved.png").await.is_ok());
    }
}
