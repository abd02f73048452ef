use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use slipscan_core::ExtractedReceipt;
use slipscan_ocr::pipeline::extension_of;
use slipscan_ocr::{ExtractionOutcome, NamedUpload, OcrEngine, ReceiptPipeline};
use slipscan_storage::{DbPool, ReceiptRecord, StorageError};

use crate::error::ApiError;

pub struct AppState {
    pub db: DbPool,
    pub pipeline: Arc<ReceiptPipeline<Box<dyn OcrEngine>>>,
}

// ── Health ────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct Health {
    pub healthy: bool,
    pub version: String,
}

/// `GET /api/health`
pub async fn health() -> Json<Health> {
    Json(Health { healthy: true, version: env!("CARGO_PKG_VERSION").to_string() })
}

// ── Single upload ─────────────────────────────────────────────────────────────

/// `POST /api/receipts`
///
/// Multipart upload of one receipt image under the `file` field. Returns the
/// extracted fields as JSON; a request without a file is the caller error
/// the extraction core itself refuses to own.
pub async fn upload_receipt(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ExtractedReceipt>, ApiError> {
    let mut upload: Option<NamedUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or("upload").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?
                .to_vec();
            upload = Some(NamedUpload { name, data });
            break;
        }
    }

    let upload = upload.ok_or_else(|| ApiError::BadRequest("no file uploaded".to_string()))?;

    let outcome = state
        .pipeline
        .process_bytes(&upload.data, &extension_of(&upload.name))
        .await?;
    persist_if_new(&state, &upload.name, &outcome).await?;

    Ok(Json(outcome.receipt))
}

// ── Batch upload ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Completed,
    Error,
}

/// Per-file outcome of a batch upload, mirroring the client's per-receipt
/// status rows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResponse {
    pub id: String,
    pub name: String,
    pub status: BatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ExtractedReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /api/receipts/batch`
///
/// Multipart upload of several receipts; every field carrying a filename is
/// taken as one receipt. Receipts are processed in parallel and reported
/// per file, in upload order — one bad scan does not fail the batch.
pub async fn upload_batch(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Vec<BatchItemResponse>>, ApiError> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
            .to_vec();
        uploads.push(NamedUpload { name, data });
    }

    if uploads.is_empty() {
        return Err(ApiError::BadRequest("no files uploaded".to_string()));
    }

    let outcomes = Arc::clone(&state.pipeline).process_batch(uploads).await;

    let mut responses = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let response = match outcome.result {
            Ok(ok) => match persist_if_new(&state, &outcome.name, &ok).await {
                Ok(()) => BatchItemResponse {
                    id: Uuid::new_v4().to_string(),
                    name: outcome.name,
                    status: BatchStatus::Completed,
                    data: Some(ok.receipt),
                    error: None,
                },
                Err(e) => error_item(outcome.name, e.to_string()),
            },
            Err(e) => error_item(outcome.name, e.to_string()),
        };
        responses.push(response);
    }

    Ok(Json(responses))
}

fn error_item(name: String, error: String) -> BatchItemResponse {
    BatchItemResponse {
        id: Uuid::new_v4().to_string(),
        name,
        status: BatchStatus::Error,
        data: None,
        error: Some(error),
    }
}

/// Append the outcome to the store unless the same source bytes were already
/// processed — re-uploads return fresh extraction but are not duplicated.
async fn persist_if_new(
    state: &AppState,
    name: &str,
    outcome: &ExtractionOutcome,
) -> Result<(), StorageError> {
    if slipscan_storage::find_receipt_by_hash(&state.db, &outcome.source_hash)
        .await?
        .is_some()
    {
        tracing::info!(file = %name, hash = %outcome.source_hash, "duplicate upload, not re-inserting");
        return Ok(());
    }

    slipscan_storage::insert_receipt(
        &state.db,
        &outcome.source_hash,
        &extension_of(name),
        &outcome.stored_path.to_string_lossy(),
        Some(&outcome.ocr_text),
        &outcome.receipt,
    )
    .await?;

    tracing::info!(file = %name, hash = %outcome.source_hash, "receipt stored");
    Ok(())
}

// ── Listing and export ────────────────────────────────────────────────────────

/// `GET /api/receipts`
pub async fn list_receipts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ReceiptRecord>>, ApiError> {
    Ok(Json(slipscan_storage::get_all_receipts(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// `detail` (default, one row per item) or `summary` (one row per receipt).
    pub view: Option<String>,
}

/// `GET /api/receipts/export.csv`
///
/// All processed receipts rendered as a CSV download.
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, ApiError> {
    let records = slipscan_storage::get_all_receipts(&state.db).await?;
    let receipts: Vec<ExtractedReceipt> =
        records.iter().map(ReceiptRecord::extracted).collect();
    let body = match params.view.as_deref() {
        Some("summary") => slipscan_export::summary_csv(&receipts)?,
        _ => slipscan_export::item_rows_csv(&receipts)?,
    };

    let filename = format!("receipts-{}.csv", chrono::Utc::now().format("%Y-%m-%d"));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_item_serializes_like_the_client_expects() {
        let item = BatchItemResponse {
            id: "abc".to_string(),
            name: "receipt.png".to_string(),
            status: BatchStatus::Completed,
            data: Some(ExtractedReceipt::default()),
            error: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["name"], "receipt.png");
        assert!(json.get("error").is_none());
        assert_eq!(json["data"]["receiptDate"], "");
    }

    #[test]
    fn batch_error_item_carries_message_and_no_data() {
        let item = error_item("x.png".to_string(), "empty upload".to_string());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "empty upload");
        assert!(json.get("data").is_none());
    }
}
