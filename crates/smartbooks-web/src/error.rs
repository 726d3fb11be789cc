//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use askama::Template;
use serde_json::json;
use tracing::{error, warn};

use smartbooks_core::{IngestError, OcrError, PdfError, SmartbooksError, StoreError};

use crate::templates::ErrorTemplate;

/// Status code for a pipeline error.
pub fn status_for(err: &SmartbooksError) -> StatusCode {
    if err.is_missing_tool() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    match err {
        SmartbooksError::Ingest(IngestError::Unsupported(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        SmartbooksError::Ingest(IngestError::Empty | IngestError::Decode(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        SmartbooksError::Pdf(
            PdfError::Parse(_) | PdfError::Encrypted | PdfError::NoPages | PdfError::TooManyPages { .. },
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        SmartbooksError::Ocr(OcrError::InvalidImage(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// An error rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn log(&self) {
        if self.status.is_server_error() {
            error!("{} {}", self.status, self.message);
        } else {
            warn!("{} {}", self.status, self.message);
        }
    }
}

impl From<SmartbooksError> for ApiError {
    fn from(err: SmartbooksError) -> Self {
        Self::new(status_for(&err), err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        SmartbooksError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// An error rendered as an HTML page.
#[derive(Debug)]
pub struct PageError(pub ApiError);

impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<SmartbooksError> for PageError {
    fn from(err: SmartbooksError) -> Self {
        Self(err.into())
    }
}

impl From<StoreError> for PageError {
    fn from(err: StoreError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let err = self.0;
        err.log();

        let template = ErrorTemplate {
            title: err.status.canonical_reason().unwrap_or("Error").to_string(),
            message: err.message.clone(),
        };
        let body = template.render().unwrap_or_else(|_| err.message.clone());
        (err.status, Html(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SmartbooksError::Ingest(IngestError::Unsupported("txt".into())), 415),
            (SmartbooksError::Ingest(IngestError::Empty), 422),
            (SmartbooksError::Ingest(IngestError::Decode("bad".into())), 422),
            (SmartbooksError::Pdf(PdfError::TooManyPages { pages: 30, limit: 20 }), 422),
            (SmartbooksError::Pdf(PdfError::ToolNotFound("pdftoppm".into())), 503),
            (SmartbooksError::Ocr(OcrError::ToolNotFound("tesseract".into())), 503),
            (SmartbooksError::Ocr(OcrError::Recognition("crash".into())), 500),
            (SmartbooksError::Config("bad".into()), 500),
        ];

        for (err, expected) in cases {
            assert_eq!(status_for(&err).as_u16(), expected, "{}", err);
        }
    }
}
