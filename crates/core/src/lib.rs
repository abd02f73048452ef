pub mod receipt;

pub use receipt::{ExtractedReceipt, ReceiptItem};
