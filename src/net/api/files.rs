//! Attachment upload under `/files`.

use reqwest::multipart::{Form, Part};

use crate::net::error::ApiError;
use crate::net::http::ApiClient;
use crate::net::types::{FileAttachment, FileUpload};

/// Multipart field name the backend collects attachments from.
const FILES_FIELD: &str = "files";

/// `POST /files/upload/{postId}` as `multipart/form-data`, one `files` part
/// per upload.
///
/// # Errors
///
/// Returns an error if a content type is not a valid MIME string, or any
/// [`ApiError`] from the wrapper.
pub async fn upload(client: &ApiClient, post_id: i64, files: Vec<FileUpload>) -> Result<Vec<FileAttachment>, ApiError> {
    let mut form = Form::new();
    for file in files {
        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = file.content_type {
            part = part.mime_str(&content_type)?;
        }
        form = form.part(FILES_FIELD, part);
    }
    client.post_multipart(&format!("/files/upload/{post_id}"), form).await
}
