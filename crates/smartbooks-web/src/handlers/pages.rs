//! HTML pages.

use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::response::Html;

use crate::error::{ApiError, PageError};
use smartbooks_core::DocumentKind;

use crate::templates::{preview_url, IndexTemplate, InvoiceRow, InvoiceTemplate, InvoicesTemplate, ResultTemplate};
use crate::AppState;

use super::read_upload;

type PageResult = Result<Html<String>, PageError>;

fn render(template: impl Template) -> PageResult {
    template
        .render()
        .map(Html)
        .map_err(|e| PageError(ApiError::new(axum::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string())))
}

/// Upload form.
pub async fn index(State(state): State<AppState>) -> PageResult {
    let counts = state.pipeline.store().counts().await?;

    render(IndexTemplate {
        ocr_backend: state.pipeline.ocr_name().to_string(),
        max_upload_mb: format!("{:.1}", state.max_upload_bytes as f64 / (1024.0 * 1024.0)),
        raw_count: counts.raw,
        structured_count: counts.structured,
    })
}

/// Digitize an uploaded file and show what was extracted.
pub async fn upload(State(state): State<AppState>, multipart: Multipart) -> PageResult {
    let upload = read_upload(multipart).await?;
    let preview = DocumentKind::detect(&upload.filename, &upload.bytes)
        .ok()
        .and_then(|kind| preview_url(kind, &upload.bytes));
    let digitized = state.pipeline.digitize(upload).await?;

    render(ResultTemplate::new(&digitized, preview))
}

/// Most recent structured invoices.
pub async fn invoices(State(state): State<AppState>) -> PageResult {
    let store = state.pipeline.store();
    let rows = store.recent_structured(state.dashboard_limit).await?;
    let counts = store.counts().await?;

    render(InvoicesTemplate {
        rows: rows.iter().map(InvoiceRow::from).collect(),
        limit: state.dashboard_limit,
        raw_count: counts.raw,
        structured_count: counts.structured,
    })
}

/// One raw invoice and its fields.
pub async fn invoice_detail(State(state): State<AppState>, Path(id): Path<i64>) -> PageResult {
    let stored = state
        .pipeline
        .store()
        .stored_invoice(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("invoice {} not found", id)))?;

    render(InvoiceTemplate::new(&stored.raw, stored.structured.as_ref()))
}

pub async fn health() -> &'static str {
    "OK"
}
