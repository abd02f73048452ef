pub mod extract;
pub mod pipeline;
pub mod recognizer;
pub mod store;

pub use extract::Extractor;
pub use pipeline::{BatchOutcome, ExtractionOutcome, NamedUpload, PipelineError, ReceiptPipeline};
pub use recognizer::{CannedEngine, NullEngine, OcrEngine, OcrError};
pub use store::UploadStore;
