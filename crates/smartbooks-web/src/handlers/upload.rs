//! Multipart upload parsing.

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;

use smartbooks_core::Upload;

use crate::error::ApiError;

/// Form field carrying the file.
pub const FILE_FIELD: &str = "file";

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::new(err.status(), err.body_text())
}

/// Keep only the last path component of a client-supplied file name.
fn clean_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() {
        "upload".to_string()
    } else {
        base.to_string()
    }
}

/// Read the `file` field of a multipart form.
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = clean_filename(field.file_name().unwrap_or("upload"));
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Upload::new(filename, bytes.to_vec()));
    }

    Err(ApiError::bad_request(format!("missing multipart field `{}`", FILE_FIELD)))
}
