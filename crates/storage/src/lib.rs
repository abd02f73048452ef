pub mod db;

pub use db::{
    create_db, find_receipt_by_hash, get_all_receipts, get_receipt_by_id, insert_receipt,
    DbPool, ReceiptRecord, StorageError,
};
