//! Web server for uploading and browsing digitized invoices.
//!
//! HTML pages for the upload form, extraction results and the invoice
//! dashboard, plus a small JSON API over the same pipeline.

mod error;
mod handlers;
mod routes;
mod templates;

pub use error::{status_for, ApiError};
pub use routes::create_router;

use std::net::SocketAddr;

use smartbooks_core::models::config::AppConfig;
use smartbooks_core::{InvoiceStore, Pipeline};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    /// Rows on the invoice dashboard and default API page size.
    pub dashboard_limit: u32,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: Pipeline, config: &AppConfig) -> Self {
        Self {
            pipeline,
            dashboard_limit: config.server.dashboard_limit,
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }
}

/// Open the database, build the pipeline and serve until shutdown.
pub async fn serve(config: &AppConfig, host: &str, port: u16) -> anyhow::Result<()> {
    let store = InvoiceStore::connect(&config.database).await?;
    store.init_schema().await?;

    let pipeline = Pipeline::from_config(config, store)?;
    let app = create_router(AppState::new(pipeline, config));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
