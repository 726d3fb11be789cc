//! Router configuration for the web server.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{api, pages};
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        // Pages
        .route("/", get(pages::index))
        .route("/upload", post(pages::upload))
        .route("/invoices", get(pages::invoices))
        .route("/invoices/:id", get(pages::invoice_detail))
        .route("/health", get(pages::health))
        // JSON API
        .route("/api/extract", post(api::extract))
        .route("/api/invoices", get(api::list_invoices).post(api::create_invoice))
        .route("/api/invoices/:id", get(api::get_invoice))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
