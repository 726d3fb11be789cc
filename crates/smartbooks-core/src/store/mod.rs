//! SQLite persistence for raw and structured invoices.

use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::config::DatabaseConfig;
use crate::models::invoice::{amount_to_minor_units, InvoiceFields, RawInvoice, StoredInvoice, StructuredInvoice};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

const SCHEMA: &str = include_str!("schema.sql");

const RAW_COLUMNS: &str = "id, filename, raw_text, inserted_at";
const STRUCTURED_COLUMNS: &str =
    "id, raw_invoice_id, invoice_number, invoice_date, total_amount_minor, inserted_at";

/// Row counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub raw: i64,
    pub structured: i64,
}

/// Handle to the invoice database. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct InvoiceStore {
    pool: SqlitePool,
}

impl InvoiceStore {
    /// Open (creating if missing) the configured database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        info!("Connected to {}", config.url);
        Ok(Self { pool })
    }

    /// A private in-memory database on a single connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // The database lives as long as its only connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the tables if they do not exist.
    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Schema ready");
        Ok(())
    }

    pub async fn insert_raw(&self, filename: &str, raw_text: &str) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        insert_raw(&mut conn, filename, raw_text).await
    }

    /// Insert the parsed fields of an existing raw invoice.
    pub async fn insert_structured(&self, raw_invoice_id: i64, fields: &InvoiceFields) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        insert_structured(&mut conn, raw_invoice_id, fields).await
    }

    /// Store the OCR text and, when anything was extracted, its fields.
    ///
    /// Both rows are written in one transaction.
    pub async fn record(
        &self,
        filename: &str,
        raw_text: &str,
        fields: Option<&InvoiceFields>,
    ) -> Result<StoredInvoice> {
        let mut tx = self.pool.begin().await?;

        let raw_id = insert_raw(&mut tx, filename, raw_text).await?;
        let structured_id = match fields.filter(|f| !f.is_empty()) {
            Some(fields) => Some(insert_structured(&mut tx, raw_id, fields).await?),
            None => None,
        };

        let raw = sqlx::query_as::<_, RawInvoice>(&format!("SELECT {RAW_COLUMNS} FROM raw_invoices WHERE id = ?"))
            .bind(raw_id)
            .fetch_one(&mut *tx)
            .await?;
        let structured = match structured_id {
            Some(id) => Some(
                sqlx::query_as::<_, StructuredInvoice>(&format!(
                    "SELECT {STRUCTURED_COLUMNS} FROM structured_invoices WHERE id = ?"
                ))
                .bind(id)
                .fetch_one(&mut *tx)
                .await?,
            ),
            None => None,
        };

        tx.commit().await?;

        info!(
            "Stored {} as raw invoice {} (structured: {:?})",
            filename, raw_id, structured_id
        );
        Ok(StoredInvoice { raw, structured })
    }

    pub async fn raw_invoice(&self, id: i64) -> Result<Option<RawInvoice>> {
        let row = sqlx::query_as::<_, RawInvoice>(&format!("SELECT {RAW_COLUMNS} FROM raw_invoices WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn structured_invoice(&self, id: i64) -> Result<Option<StructuredInvoice>> {
        let row = sqlx::query_as::<_, StructuredInvoice>(&format!(
            "SELECT {STRUCTURED_COLUMNS} FROM structured_invoices WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn structured_for_raw(&self, raw_invoice_id: i64) -> Result<Option<StructuredInvoice>> {
        let row = sqlx::query_as::<_, StructuredInvoice>(&format!(
            "SELECT {STRUCTURED_COLUMNS} FROM structured_invoices WHERE raw_invoice_id = ?"
        ))
        .bind(raw_invoice_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// A raw invoice together with its structured row, if any.
    pub async fn stored_invoice(&self, raw_invoice_id: i64) -> Result<Option<StoredInvoice>> {
        let Some(raw) = self.raw_invoice(raw_invoice_id).await? else {
            return Ok(None);
        };
        let structured = self.structured_for_raw(raw_invoice_id).await?;
        Ok(Some(StoredInvoice { raw, structured }))
    }

    /// Most recent structured invoices by invoice date, undated rows last.
    pub async fn recent_structured(&self, limit: u32) -> Result<Vec<StructuredInvoice>> {
        let rows = sqlx::query_as::<_, StructuredInvoice>(&format!(
            "SELECT {STRUCTURED_COLUMNS} FROM structured_invoices \
             ORDER BY invoice_date IS NULL, invoice_date DESC, id DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Most recently inserted raw invoices.
    pub async fn recent_raw(&self, limit: u32) -> Result<Vec<RawInvoice>> {
        let rows = sqlx::query_as::<_, RawInvoice>(&format!(
            "SELECT {RAW_COLUMNS} FROM raw_invoices ORDER BY id DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn counts(&self) -> Result<StoreCounts> {
        let (raw, structured): (i64, i64) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM raw_invoices), (SELECT COUNT(*) FROM structured_invoices)",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(StoreCounts { raw, structured })
    }
}

async fn insert_raw(conn: &mut SqliteConnection, filename: &str, raw_text: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO raw_invoices (filename, raw_text) VALUES (?, ?)")
        .bind(filename)
        .bind(raw_text)
        .execute(&mut *conn)
        .await?;
    Ok(result.last_insert_rowid())
}

async fn insert_structured(conn: &mut SqliteConnection, raw_invoice_id: i64, fields: &InvoiceFields) -> Result<i64> {
    let total_minor = fields
        .total_amount
        .map(|amount| amount_to_minor_units(amount).ok_or_else(|| StoreError::Amount(amount.to_string())))
        .transpose()?;

    let result = sqlx::query(
        "INSERT INTO structured_invoices (raw_invoice_id, invoice_number, invoice_date, total_amount_minor) \
         VALUES (?, ?, ?, ?)",
    )
    .bind(raw_invoice_id)
    .bind(fields.invoice_number.as_deref())
    .bind(fields.invoice_date)
    .bind(total_minor)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    async fn store() -> InvoiceStore {
        let store = InvoiceStore::in_memory().await.unwrap();
        store.init_schema().await.unwrap();
        store
    }

    fn fields(number: &str, date: Option<(i32, u32, u32)>, total: Option<&str>) -> InvoiceFields {
        InvoiceFields {
            invoice_number: Some(number.to_string()),
            invoice_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            total_amount: total.map(|t| Decimal::from_str(t).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let store = store().await;
        store.init_schema().await.unwrap();
        assert_eq!(store.counts().await.unwrap(), StoreCounts { raw: 0, structured: 0 });
    }

    #[tokio::test]
    async fn test_raw_insert() {
        let store = store().await;
        let id = store.insert_raw("scan.png", "Invoice #A-1").await.unwrap();

        let raw = store.raw_invoice(id).await.unwrap().unwrap();
        assert_eq!(raw.filename, "scan.png");
        assert_eq!(raw.raw_text, "Invoice #A-1");
        assert!(store.raw_invoice(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_structured_round_trip() {
        let store = store().await;
        let raw_id = store.insert_raw("scan.png", "text").await.unwrap();
        let original = fields("A-1009", Some((2024, 3, 1)), Some("452.30"));

        let id = store.insert_structured(raw_id, &original).await.unwrap();
        let row = store.structured_invoice(id).await.unwrap().unwrap();

        assert_eq!(row.raw_invoice_id, raw_id);
        assert_eq!(row.total_amount_minor, Some(45230));
        assert_eq!(row.fields(), original);
        assert_eq!(store.structured_for_raw(raw_id).await.unwrap(), Some(row));
    }

    #[tokio::test]
    async fn test_partial_fields_round_trip() {
        let store = store().await;
        let raw_id = store.insert_raw("scan.png", "text").await.unwrap();
        let original = fields("X-9", None, None);

        let id = store.insert_structured(raw_id, &original).await.unwrap();
        let row = store.structured_invoice(id).await.unwrap().unwrap();
        assert_eq!(row.fields(), original);
    }

    #[tokio::test]
    async fn test_unknown_raw_invoice_rejected() {
        let store = store().await;
        let result = store.insert_structured(42, &fields("A-1", None, None)).await;
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[tokio::test]
    async fn test_one_structured_row_per_raw() {
        let store = store().await;
        let raw_id = store.insert_raw("scan.png", "text").await.unwrap();
        store.insert_structured(raw_id, &fields("A-1", None, None)).await.unwrap();

        let result = store.insert_structured(raw_id, &fields("A-2", None, None)).await;
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[tokio::test]
    async fn test_amount_out_of_range() {
        let store = store().await;
        let raw_id = store.insert_raw("scan.png", "text").await.unwrap();
        let mut huge = fields("A-1", None, None);
        huge.total_amount = Some(Decimal::MAX);

        let result = store.insert_structured(raw_id, &huge).await;
        assert!(matches!(result, Err(StoreError::Amount(_))));
    }

    #[tokio::test]
    async fn test_record_with_fields() {
        let store = store().await;
        let extracted = fields("A-1009", Some((2024, 3, 1)), Some("452.30"));

        let stored = store.record("scan.png", "raw", Some(&extracted)).await.unwrap();
        let structured = stored.structured.unwrap();

        assert_eq!(structured.raw_invoice_id, stored.raw.id);
        assert_eq!(structured.fields(), extracted);
        assert_eq!(store.counts().await.unwrap(), StoreCounts { raw: 1, structured: 1 });
    }

    #[tokio::test]
    async fn test_record_without_fields() {
        let store = store().await;

        let stored = store.record("blank.png", "", Some(&InvoiceFields::default())).await.unwrap();
        assert!(stored.structured.is_none());
        let stored = store.record("blank.png", "", None).await.unwrap();
        assert!(stored.structured.is_none());

        assert_eq!(store.counts().await.unwrap(), StoreCounts { raw: 2, structured: 0 });
    }

    #[tokio::test]
    async fn test_record_failure_rolls_back() {
        let store = store().await;
        let mut huge = fields("A-1", None, None);
        huge.total_amount = Some(Decimal::MAX);

        assert!(store.record("scan.png", "raw", Some(&huge)).await.is_err());
        assert_eq!(store.counts().await.unwrap(), StoreCounts { raw: 0, structured: 0 });
    }

    #[tokio::test]
    async fn test_recent_structured_order() {
        let store = store().await;
        let inputs = [
            fields("undated", None, Some("1.00")),
            fields("march", Some((2024, 3, 1)), None),
            fields("may", Some((2024, 5, 1)), None),
            fields("march-again", Some((2024, 3, 1)), None),
        ];
        for (i, f) in inputs.iter().enumerate() {
            store.record(&format!("{}.png", i), "text", Some(f)).await.unwrap();
        }

        let numbers: Vec<String> = store
            .recent_structured(20)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|row| row.invoice_number)
            .collect();
        assert_eq!(numbers, vec!["may", "march-again", "march", "undated"]);

        assert_eq!(store.recent_structured(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_recent_raw_and_stored_invoice() {
        let store = store().await;
        store.record("first.png", "one", None).await.unwrap();
        let second = store
            .record("second.png", "two", Some(&fields("B-2", None, None)))
            .await
            .unwrap();

        let recent = store.recent_raw(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].filename, "second.png");

        let loaded = store.stored_invoice(second.raw.id).await.unwrap().unwrap();
        assert_eq!(loaded.raw, second.raw);
        assert_eq!(loaded.structured, second.structured);
        assert!(store.stored_invoice(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connect_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("books.db").display()),
            max_connections: 2,
        };

        let store = InvoiceStore::connect(&config).await.unwrap();
        store.init_schema().await.unwrap();
        store.insert_raw("scan.png", "text").await.unwrap();

        assert!(dir.path().join("books.db").exists());
    }
}
