use std::sync::OnceLock;

use regex::Regex;

use slipscan_core::{ExtractedReceipt, ReceiptItem};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_receipt_date,
    r"(?i)receipt\s+date\s*:?\s*(\d{1,2}/\d{2}/\d{4})");
re!(re_items_header,
    r"(?i)description.*unit\s+price.*amount");
re!(re_total,
    r"(?i)\btotal\b\s*\$?\s*(\d+\.\d{2})");
// Leading quantity, optional column-separator artifact, non-greedy
// description, then unit price and amount. Deliberately unanchored: OCR
// output often carries trailing junk after the amount column.
re!(re_item_strict,
    r"(\d+)\s*\|?\s*(.+?)\s+(\d+\.?\d*)\s+(\d+\.?\d*)");

// ── Section state ────────────────────────────────────────────────────────────

/// Whether the current line falls inside the receipt's item table.
/// Fresh per parse; never shared across receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    OutsideItems,
    InsideItems,
}

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Extract date, line items, and total from raw OCR text.
    ///
    /// Best-effort and total: any field that cannot be recovered stays at
    /// its default, and no input — including the empty string — makes this
    /// return an error or panic.
    pub fn extract(ocr_text: &str) -> ExtractedReceipt {
        let mut draft = ExtractedReceipt::default();
        let mut section = Section::OutsideItems;

        for line in ocr_text.lines() {
            section = dispatch_line(section, line, &mut draft);
        }

        finalize(&mut draft);
        draft
    }
}

/// Route one line to the matchers appropriate for the current section and
/// return the section the next line starts in.
///
/// Dispatch order: date (any section, first match wins), item-table header
/// (opens the item section), total (closes it and is never itself parsed as
/// an item), then item extraction for whatever is left inside the section.
fn dispatch_line(section: Section, line: &str, draft: &mut ExtractedReceipt) -> Section {
    if draft.receipt_date.is_empty() {
        if let Some(date) = match_receipt_date(line) {
            draft.receipt_date = date;
        }
    }

    // A matched total closes the item table for good; a header seen after
    // it must not reopen the section.
    if section == Section::OutsideItems && draft.total.is_empty() && is_items_header(line) {
        return Section::InsideItems;
    }

    if let Some(total) = match_total(line) {
        if draft.total.is_empty() {
            draft.total = total;
        }
        return Section::OutsideItems;
    }

    if section == Section::InsideItems {
        if let Some(item) = parse_item(line) {
            draft.items.push(item);
        }
    }

    section
}

// ── Line matchers ─────────────────────────────────────────────────────────────

/// `Receipt Date: D/MM/YYYY` (or DD), captured verbatim — no calendar
/// validation, the raw text is what gets stored.
fn match_receipt_date(line: &str) -> Option<String> {
    let c = re_receipt_date().captures(line)?;
    Some(c.get(1)?.as_str().to_string())
}

/// Column header of the item table: DESCRIPTION … UNIT PRICE … AMOUNT in
/// that order, any separators in between.
fn is_items_header(line: &str) -> bool {
    re_items_header().is_match(line)
}

/// `TOTAL $N.NN` — word-bounded so a SUBTOTAL line cannot claim it.
fn match_total(line: &str) -> Option<String> {
    let c = re_total().captures(line)?;
    Some(c.get(1)?.as_str().to_string())
}

// ── Item line parsing ─────────────────────────────────────────────────────────

/// Strict pattern first, whitespace-token fallback second.
fn parse_item(line: &str) -> Option<ReceiptItem> {
    parse_item_strict(line).or_else(|| parse_item_fallback(line))
}

fn parse_item_strict(line: &str) -> Option<ReceiptItem> {
    let c = re_item_strict().captures(line)?;
    Some(ReceiptItem {
        quantity: c.get(1)?.as_str().to_string(),
        description: strip_artifacts(c.get(2)?.as_str()),
        unit_price: c.get(3)?.as_str().to_string(),
        amount: c.get(4)?.as_str().to_string(),
    })
}

/// Recovery parse for rows the strict pattern rejects (dropped separators,
/// letters misread inside numbers). First token is the quantity, last two
/// are unit price and amount, everything between is the description — if a
/// stray numeric token lands mid-description it stays there.
fn parse_item_fallback(line: &str) -> Option<ReceiptItem> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return None;
    }
    Some(ReceiptItem {
        quantity: tokens[0].to_string(),
        description: strip_artifacts(&tokens[1..tokens.len() - 2].join(" ")),
        unit_price: tokens[tokens.len() - 2].to_string(),
        amount: tokens[tokens.len() - 1].to_string(),
    })
}

// ── Assembly ──────────────────────────────────────────────────────────────────

/// Final normalization over the accumulated items: every description loses
/// remaining pipe artifacts and surrounding whitespace, whichever pass
/// produced it.
fn finalize(draft: &mut ExtractedReceipt) {
    for item in &mut draft.items {
        item.description = strip_artifacts(&item.description);
    }
}

fn strip_artifacts(s: &str) -> String {
    s.replace('|', "").trim().to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
