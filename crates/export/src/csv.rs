use serde::Serialize;
use thiserror::Error;

use slipscan_core::ExtractedReceipt;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to finish CSV buffer: {0}")]
    Finish(String),
}

/// One spreadsheet row per line item. Receipt-level fields repeat on every
/// row of that receipt so each row stands alone after sorting/filtering.
#[derive(Debug, Serialize)]
struct ItemRow<'a> {
    receipt_date: &'a str,
    quantity: &'a str,
    description: &'a str,
    unit_price: &'a str,
    amount: &'a str,
    receipt_total: &'a str,
}

/// One spreadsheet row per receipt.
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    receipt_date: &'a str,
    item_count: usize,
    total: &'a str,
}

/// Render receipts as a detail CSV, one row per item.
///
/// A receipt with no recovered items still contributes a single row with
/// blank item columns — its date and total are not silently dropped from
/// the sheet. All field text is written verbatim.
pub fn item_rows_csv(receipts: &[ExtractedReceipt]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for receipt in receipts {
        if receipt.items.is_empty() {
            writer.serialize(ItemRow {
                receipt_date: &receipt.receipt_date,
                quantity: "",
                description: "",
                unit_price: "",
                amount: "",
                receipt_total: &receipt.total,
            })?;
            continue;
        }
        for item in &receipt.items {
            writer.serialize(ItemRow {
                receipt_date: &receipt.receipt_date,
                quantity: &item.quantity,
                description: &item.description,
                unit_price: &item.unit_price,
                amount: &item.amount,
                receipt_total: &receipt.total,
            })?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Finish(e.to_string()))
}

/// Render receipts as a summary CSV, one row per receipt.
pub fn summary_csv(receipts: &[ExtractedReceipt]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for receipt in receipts {
        writer.serialize(SummaryRow {
            receipt_date: &receipt.receipt_date,
            item_count: receipt.items.len(),
            total: &receipt.total,
        })?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Finish(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use slipscan_core::ReceiptItem;

    fn receipt(date: &str, total: &str, items: Vec<ReceiptItem>) -> ExtractedReceipt {
        ExtractedReceipt { receipt_date: date.into(), items, total: total.into() }
    }

    fn item(q: &str, d: &str, u: &str, a: &str) -> ReceiptItem {
        ReceiptItem {
            quantity: q.into(),
            description: d.into(),
            unit_price: u.into(),
            amount: a.into(),
        }
    }

    #[test]
    fn item_rows_header_and_content() {
        let receipts = vec![receipt(
            "03/14/2024",
            "10.00",
            vec![item("2", "Coffee Beans", "5.00", "10.00")],
        )];
        let csv = String::from_utf8(item_rows_csv(&receipts).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "receipt_date,quantity,description,unit_price,amount,receipt_total"
        );
        assert_eq!(lines.next().unwrap(), "03/14/2024,2,Coffee Beans,5.00,10.00,10.00");
        assert!(lines.next().is_none());
    }

    #[test]
    fn item_rows_repeat_receipt_fields_per_item() {
        let receipts = vec![receipt(
            "01/02/2024",
            "9.50",
            vec![
                item("1", "Bagel", "3.50", "3.50"),
                item("2", "Tea", "3.00", "6.00"),
            ],
        )];
        let csv = String::from_utf8(item_rows_csv(&receipts).unwrap()).unwrap();
        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.starts_with("01/02/2024,")));
        assert!(rows.iter().all(|r| r.ends_with(",9.50")));
    }

    #[test]
    fn receipt_without_items_still_gets_a_row() {
        let receipts = vec![receipt("05/06/2024", "4.00", vec![])];
        let csv = String::from_utf8(item_rows_csv(&receipts).unwrap()).unwrap();
        assert_eq!(csv.lines().nth(1).unwrap(), "05/06/2024,,,,,4.00");
    }

    #[test]
    fn misread_numeric_text_is_written_verbatim() {
        // OCR noise like "3.5O" must survive the export untouched.
        let receipts = vec![receipt("", "", vec![item("1", "Bage1", "3.5O", "3.5O")])];
        let csv = String::from_utf8(item_rows_csv(&receipts).unwrap()).unwrap();
        assert!(csv.contains("Bage1,3.5O,3.5O"));
    }

    #[test]
    fn descriptions_with_commas_are_quoted() {
        let receipts =
            vec![receipt("", "5.00", vec![item("1", "Beans, Dark Roast", "5.00", "5.00")])];
        let csv = String::from_utf8(item_rows_csv(&receipts).unwrap()).unwrap();
        assert!(csv.contains("\"Beans, Dark Roast\""));
    }

    #[test]
    fn summary_counts_items_per_receipt() {
        let receipts = vec![
            receipt("03/14/2024", "10.00", vec![item("2", "Coffee", "5.00", "10.00")]),
            receipt("", "", vec![]),
        ];
        let csv = String::from_utf8(summary_csv(&receipts).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "receipt_date,item_count,total");
        assert_eq!(lines.next().unwrap(), "03/14/2024,1,10.00");
        assert_eq!(lines.next().unwrap(), ",0,");
        assert!(lines.next().is_none());
    }
}
