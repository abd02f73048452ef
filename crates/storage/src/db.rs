use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use thiserror::Error;

use slipscan_core::{ExtractedReceipt, ReceiptItem};

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("stored item list is not valid JSON: {0}")]
    Items(#[from] serde_json::Error),
}

/// A processed receipt as persisted: the extracted fields plus provenance
/// (source digest, stored file path) and the processing timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRecord {
    pub id: i64,
    pub source_hash: String,
    pub source_ext: String,
    pub stored_path: String,
    pub receipt_date: String,
    pub total: String,
    pub items: Vec<ReceiptItem>,
    pub created_at: String,
}

impl ReceiptRecord {
    /// The extracted fields alone, in the shape downstream renderers take.
    pub fn extracted(&self) -> ExtractedReceipt {
        ExtractedReceipt {
            receipt_date: self.receipt_date.clone(),
            items: self.items.clone(),
            total: self.total.clone(),
        }
    }
}

pub async fn create_db(path: &Path) -> Result<DbPool, StorageError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS processed_receipts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_hash TEXT NOT NULL,
            source_ext TEXT NOT NULL,
            stored_path TEXT NOT NULL,
            ocr_text TEXT,
            receipt_date TEXT NOT NULL DEFAULT '',
            total TEXT NOT NULL DEFAULT '',
            items TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_processed_receipts_hash ON processed_receipts(source_hash)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Append one processed receipt, stamped with the current UTC time.
/// Item text is stored verbatim as JSON — no numeric interpretation.
pub async fn insert_receipt(
    pool: &DbPool,
    source_hash: &str,
    source_ext: &str,
    stored_path: &str,
    ocr_text: Option<&str>,
    receipt: &ExtractedReceipt,
) -> Result<i64, StorageError> {
    let items_json = serde_json::to_string(&receipt.items)?;
    let created_at = Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO processed_receipts
            (source_hash, source_ext, stored_path, ocr_text, receipt_date, total, items, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(source_hash)
    .bind(source_ext)
    .bind(stored_path)
    .bind(ocr_text)
    .bind(&receipt.receipt_date)
    .bind(&receipt.total)
    .bind(items_json)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

const RECORD_COLUMNS: &str =
    "id, source_hash, source_ext, stored_path, receipt_date, total, items, created_at";

type RecordRow = (i64, String, String, String, String, String, String, String);

fn record_from_row(row: RecordRow) -> Result<ReceiptRecord, StorageError> {
    let items: Vec<ReceiptItem> = serde_json::from_str(&row.6)?;
    Ok(ReceiptRecord {
        id: row.0,
        source_hash: row.1,
        source_ext: row.2,
        stored_path: row.3,
        receipt_date: row.4,
        total: row.5,
        items,
        created_at: row.7,
    })
}

/// All processed receipts in insertion order.
pub async fn get_all_receipts(pool: &DbPool) -> Result<Vec<ReceiptRecord>, StorageError> {
    let rows = sqlx::query_as::<_, RecordRow>(&format!(
        "SELECT {RECORD_COLUMNS} FROM processed_receipts ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(record_from_row).collect()
}

pub async fn get_receipt_by_id(
    pool: &DbPool,
    id: i64,
) -> Result<Option<ReceiptRecord>, StorageError> {
    let row = sqlx::query_as::<_, RecordRow>(&format!(
        "SELECT {RECORD_COLUMNS} FROM processed_receipts WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(record_from_row).transpose()
}

/// Earliest record matching the given source digest, if any — the duplicate
/// check for re-uploaded files.
pub async fn find_receipt_by_hash(
    pool: &DbPool,
    source_hash: &str,
) -> Result<Option<ReceiptRecord>, StorageError> {
    let row = sqlx::query_as::<_, RecordRow>(&format!(
        "SELECT {RECORD_COLUMNS} FROM processed_receipts WHERE source_hash = ? ORDER BY id LIMIT 1"
    ))
    .bind(source_hash)
    .fetch_optional(pool)
    .await?;

    row.map(record_from_row).transpose()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
