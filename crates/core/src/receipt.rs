use serde::{Deserialize, Serialize};

/// One row of a receipt's item table.
///
/// Every field keeps the numeric text exactly as it appeared on the receipt —
/// no parsing to numeric types, so a smudged `3.5O` survives verbatim instead
/// of being silently rounded or rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub quantity: String,
    pub description: String,
    pub unit_price: String,
    pub amount: String,
}

/// Structured fields recovered from one receipt's OCR text.
///
/// Fields that were never matched stay at their defaults (empty string /
/// empty list). Callers detect degraded extraction by checking emptiness,
/// not by catching errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedReceipt {
    pub receipt_date: String,
    pub items: Vec<ReceiptItem>,
    pub total: String,
}

impl ExtractedReceipt {
    /// True when nothing at all was recovered — the degenerate (but legal)
    /// output for unreadable input.
    pub fn is_empty(&self) -> bool {
        self.receipt_date.is_empty() && self.items.is_empty() && self.total.is_empty()
    }
}
