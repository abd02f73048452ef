use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use slipscan_core::ExtractedReceipt;

use crate::extract::Extractor;
use crate::recognizer::{OcrEngine, OcrError};
use crate::store::UploadStore;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("empty upload — nothing to recognize")]
    EmptyUpload,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("worker task failed: {0}")]
    Worker(String),
}

/// Result of processing one uploaded receipt end to end.
#[derive(Debug)]
pub struct ExtractionOutcome {
    /// SHA-256 hex digest of the uploaded bytes — the duplicate-detection key.
    pub source_hash: String,
    /// Where the original file landed in the upload store.
    pub stored_path: PathBuf,
    /// Raw text the OCR engine produced.
    pub ocr_text: String,
    /// Structured fields recovered from that text.
    pub receipt: ExtractedReceipt,
}

/// One file of a multi-receipt upload, by client-supplied name.
#[derive(Debug)]
pub struct NamedUpload {
    pub name: String,
    pub data: Vec<u8>,
}

/// Per-file result of a batch run, in input order.
#[derive(Debug)]
pub struct BatchOutcome {
    pub name: String,
    pub result: Result<ExtractionOutcome, PipelineError>,
}

/// Orchestrates: hash/store the original → run OCR → extract fields.
///
/// The extraction step itself never fails; errors out of here are the
/// boundary kind — bad upload, disk trouble, or a missing OCR engine.
pub struct ReceiptPipeline<E: OcrEngine> {
    engine: E,
    uploads: UploadStore,
}

impl<E: OcrEngine> ReceiptPipeline<E> {
    pub fn new(engine: E, uploads_dir: impl Into<PathBuf>) -> Self {
        Self { engine, uploads: UploadStore::new(uploads_dir) }
    }

    /// Process raw uploaded bytes. Empty uploads are rejected here, before
    /// the extraction core ever sees them.
    pub async fn process_bytes(
        &self,
        data: &[u8],
        ext: &str,
    ) -> Result<ExtractionOutcome, PipelineError> {
        if data.is_empty() {
            return Err(PipelineError::EmptyUpload);
        }

        let (source_hash, stored_path) = self.uploads.save(data, ext).await?;
        let ocr_text = self.engine.recognize(data)?;
        let receipt = Extractor::extract(&ocr_text);

        tracing::debug!(
            hash = %source_hash,
            items = receipt.items.len(),
            "receipt processed"
        );

        Ok(ExtractionOutcome { source_hash, stored_path, ocr_text, receipt })
    }

    /// Process a file already on disk.
    pub async fn process_file(&self, path: &Path) -> Result<ExtractionOutcome, PipelineError> {
        let data = tokio::fs::read(path).await?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
            .to_lowercase();
        self.process_bytes(&data, &ext).await
    }

    /// Process a batch of uploads, one task per receipt.
    ///
    /// Each parse is independent and stateless across receipts, so the only
    /// coordination is collecting results — returned in input order, one
    /// outcome per upload, failures included rather than aborting the batch.
    pub async fn process_batch(self: Arc<Self>, uploads: Vec<NamedUpload>) -> Vec<BatchOutcome>
    where
        E: 'static,
    {
        let mut tasks = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let pipeline = Arc::clone(&self);
            let name = upload.name.clone();
            let handle = tokio::spawn(async move {
                let ext = extension_of(&upload.name);
                pipeline.process_bytes(&upload.data, &ext).await
            });
            tasks.push((name, handle));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (name, handle) in tasks {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(PipelineError::Worker(e.to_string())),
            };
            if let Err(e) = &result {
                tracing::warn!(file = %name, "batch item failed: {e}");
            }
            outcomes.push(BatchOutcome { name, result });
        }
        outcomes
    }
}

/// Lowercased file extension of an upload name, `bin` when absent.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin")
        .to_lowercase()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
