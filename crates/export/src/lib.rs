pub mod csv;

pub use csv::{item_rows_csv, summary_csv, ExportError};
