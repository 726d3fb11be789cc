//! JSON API.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use smartbooks_core::{Digitized, Extraction, StoredInvoice, StructuredInvoice};

use crate::error::ApiError;
use crate::AppState;

use super::read_upload;

const MAX_LIST_LIMIT: u32 = 500;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
}

/// A structured invoice with its total as a decimal.
#[derive(Debug, Serialize)]
pub struct InvoiceSummary {
    pub id: i64,
    pub raw_invoice_id: i64,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub total_amount: Option<Decimal>,
    pub inserted_at: NaiveDateTime,
}

impl From<StructuredInvoice> for InvoiceSummary {
    fn from(row: StructuredInvoice) -> Self {
        Self {
            total_amount: row.total_amount(),
            id: row.id,
            raw_invoice_id: row.raw_invoice_id,
            invoice_number: row.invoice_number,
            invoice_date: row.invoice_date,
            inserted_at: row.inserted_at,
        }
    }
}

/// Run OCR and extraction without storing anything.
pub async fn extract(State(state): State<AppState>, multipart: Multipart) -> Result<Json<Extraction>, ApiError> {
    let upload = read_upload(multipart).await?;
    let extraction = state.pipeline.extract_blocking(upload).await?;
    Ok(Json(extraction))
}

/// Digitize and store an upload.
pub async fn create_invoice(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Digitized>), ApiError> {
    let upload = read_upload(multipart).await?;
    let digitized = state.pipeline.digitize(upload).await?;
    Ok((StatusCode::CREATED, Json(digitized)))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<InvoiceSummary>>, ApiError> {
    let limit = params.limit.unwrap_or(state.dashboard_limit).clamp(1, MAX_LIST_LIMIT);
    let rows = state.pipeline.store().recent_structured(limit).await?;
    Ok(Json(rows.into_iter().map(InvoiceSummary::from).collect()))
}

/// A raw invoice by id, with its structured row.
pub async fn get_invoice(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<StoredInvoice>, ApiError> {
    state
        .pipeline
        .store()
        .stored_invoice(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("invoice {} not found", id)))
}
