// ── Spreadsheet reader ──
//
// Turns the operator's coupons.xlsx into validated Coupon values. The
// xlsx decode is a thin calamine shim that flattens cells to strings;
// everything after that is pure over the text grid so the rules can be
// unit-tested without fixture files.
//
// Numeric cells are parsed leniently on purpose: strip every character
// that is not a digit or a dot, then truncate. A cell that strips to
// nothing counts as 0, which the generic "must be greater than 0" checks
// then reject. Downstream operator docs quote these exact messages, so a
// stricter "not a number" error would be a contract change.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use thiserror::Error;

use crate::model::{
    Coupon, CouponKind, DiscountMode, DEFAULT_ISSUE_COUNT, DEFAULT_MIN_PURCHASE_PRICE,
};

// ── Column labels (the external file contract, Korean) ───────────────

const COL_NAME: &str = "쿠폰이름";
const COL_KIND: &str = "쿠폰타입";
const COL_VALIDITY: &str = "쿠폰유효기간";
const COL_DISCOUNT_MODE: &str = "할인방식";
const COL_DISCOUNT_VALUE: &str = "할인금액/비율";
const COL_MIN_PURCHASE: &str = "최소구매금액";
const COL_MAX_DISCOUNT: &str = "최대할인금액";
const COL_ISSUE_COUNT: &str = "발급개수";
const COL_ITEM_IDS: &str = "옵션ID";
/// Older template files carry an embedded space in the item-id header.
const COL_ITEM_IDS_LEGACY: &str = "옵션 ID";

const REQUIRED_COLUMNS: [&str; 9] = [
    COL_NAME,
    COL_KIND,
    COL_VALIDITY,
    COL_DISCOUNT_MODE,
    COL_DISCOUNT_VALUE,
    COL_MIN_PURCHASE,
    COL_MAX_DISCOUNT,
    COL_ISSUE_COUNT,
    COL_ITEM_IDS,
];

// ── Errors ───────────────────────────────────────────────────────────

/// Validation failure while reading the spreadsheet. Fatal: parsing stops
/// at the first error and no coupon is issued.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("failed to open spreadsheet {path}: {source}")]
    Workbook {
        path: String,
        #[source]
        source: calamine::Error,
    },

    #[error("spreadsheet has no worksheets")]
    NoWorksheet,

    #[error("spreadsheet is missing the header row")]
    NoHeader,

    #[error("missing required column: {label}")]
    MissingColumn { label: &'static str },

    /// Any per-row violation; `row` is the 1-based spreadsheet row.
    #[error("row {row}: {reason}")]
    Row { row: usize, reason: String },
}

fn row_error(row: usize, reason: impl Into<String>) -> SheetError {
    SheetError::Row {
        row,
        reason: reason.into(),
    }
}

// ── Entry points ─────────────────────────────────────────────────────

/// Read and validate `coupons.xlsx`. One [`Coupon`] per non-empty data
/// row, in row order.
pub fn read_coupons(path: &Path) -> Result<Vec<Coupon>, SheetError> {
    parse_rows(&load_grid(path)?)
}

/// Decode the first worksheet into a string grid. The only IO in this
/// module.
fn load_grid(path: &Path) -> Result<Vec<Vec<String>>, SheetError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| SheetError::Workbook {
        path: path.display().to_string(),
        source,
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetError::NoWorksheet)?
        .map_err(|source| SheetError::Workbook {
            path: path.display().to_string(),
            source: source.into(),
        })?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Validate the text grid: header row first, then one coupon per
/// non-empty data row. Pure; all errors carry the 1-based row number.
pub fn parse_rows(grid: &[Vec<String>]) -> Result<Vec<Coupon>, SheetError> {
    let (header, data) = grid.split_first().ok_or(SheetError::NoHeader)?;
    let columns = Columns::locate(header)?;

    let mut coupons = Vec::new();
    for (offset, row) in data.iter().enumerate() {
        // header is spreadsheet row 1
        let row_num = offset + 2;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        coupons.push(parse_row(&columns, row, row_num)?);
    }
    Ok(coupons)
}

// ── Header detection ─────────────────────────────────────────────────

struct Columns {
    name: usize,
    kind: usize,
    validity: usize,
    discount_mode: usize,
    discount_value: usize,
    min_purchase: usize,
    max_discount: usize,
    issue_count: usize,
    item_ids: usize,
}

impl Columns {
    fn locate(header: &[String]) -> Result<Self, SheetError> {
        let find = |label: &'static str| -> Result<usize, SheetError> {
            header
                .iter()
                .position(|cell| cell.trim() == label)
                .ok_or(SheetError::MissingColumn { label })
        };

        for label in REQUIRED_COLUMNS {
            if label == COL_ITEM_IDS {
                continue; // checked below with its legacy alias
            }
            find(label)?;
        }

        let item_ids = find(COL_ITEM_IDS).or_else(|_| {
            header
                .iter()
                .position(|cell| cell.trim() == COL_ITEM_IDS_LEGACY)
                .ok_or(SheetError::MissingColumn {
                    label: COL_ITEM_IDS,
                })
        })?;

        Ok(Self {
            name: find(COL_NAME)?,
            kind: find(COL_KIND)?,
            validity: find(COL_VALIDITY)?,
            discount_mode: find(COL_DISCOUNT_MODE)?,
            discount_value: find(COL_DISCOUNT_VALUE)?,
            min_purchase: find(COL_MIN_PURCHASE)?,
            max_discount: find(COL_MAX_DISCOUNT)?,
            issue_count: find(COL_ISSUE_COUNT)?,
            item_ids,
        })
    }
}

fn cell<'a>(row: &'a [String], index: usize) -> &'a str {
    row.get(index).map_or("", String::as_str)
}

// ── Lenient numeric normalization ────────────────────────────────────

/// Strip every non-digit/non-dot character, parse, truncate. Empty or
/// unparseable (e.g. `1.2.3`) collapses to 0 so the caller's positivity
/// check produces the one generic message.
#[allow(clippy::cast_possible_truncation)]
fn lenient_int(raw: &str) -> i64 {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if kept.is_empty() {
        return 0;
    }
    kept.parse::<f64>().map_or(0, |value| value.trunc() as i64)
}

// ── Per-row validation, in contract order ────────────────────────────

fn parse_row(columns: &Columns, row: &[String], row_num: usize) -> Result<Coupon, SheetError> {
    // 1. Name: trim only.
    let name = cell(row, columns.name).trim().to_owned();
    if name.is_empty() {
        return Err(row_error(row_num, "coupon name must not be empty"));
    }

    // 2. Kind: strip all whitespace, classify by substring so historical
    //    short labels still match.
    let kind_raw = cell(row, columns.kind).trim();
    let kind_squashed: String = kind_raw.split_whitespace().collect();
    let kind = if kind_squashed.contains("즉시할인") {
        CouponKind::Instant
    } else if kind_squashed.contains("다운로드쿠폰") {
        CouponKind::Download
    } else {
        return Err(row_error(
            row_num,
            format!("unknown coupon kind '{kind_raw}' (expected 즉시할인쿠폰 or 다운로드쿠폰)"),
        ));
    };

    // 3. Validity period.
    let validity_days = lenient_int(cell(row, columns.validity));
    if validity_days < 1 {
        return Err(row_error(row_num, "validity period must be at least 1 day"));
    }

    // 4. Discount mode: exact Korean labels only.
    let mode_raw = cell(row, columns.discount_mode).trim();
    let discount_mode = match mode_raw {
        "정률할인" => DiscountMode::Rate,
        "정액할인" => DiscountMode::FixedPrice,
        "수량별 정액할인" => DiscountMode::FixedPerUnit,
        other => {
            return Err(row_error(
                row_num,
                format!(
                    "unknown discount mode '{other}' \
                     (expected 정률할인, 정액할인, or 수량별 정액할인)"
                ),
            ));
        }
    };

    // 5. Discount value: the generic positivity check fires before any
    //    kind-specific rule, so "abc" (-> 0) gets this message too.
    let discount_value = lenient_int(cell(row, columns.discount_value));
    if discount_value <= 0 {
        return Err(row_error(row_num, "discount value must be greater than 0"));
    }

    // 6. Minimum purchase price: download kind only.
    let min_purchase_price = match kind {
        CouponKind::Instant => None,
        CouponKind::Download => {
            let raw = cell(row, columns.min_purchase).trim();
            if raw.is_empty() {
                Some(DEFAULT_MIN_PURCHASE_PRICE)
            } else {
                let value = match lenient_int(raw) {
                    // a present cell that strips to no digits falls back
                    // to the vendor floor of 1 won
                    0 if !raw.chars().any(|c| c.is_ascii_digit()) => 1,
                    value => value,
                };
                if value < 1 {
                    return Err(row_error(
                        row_num,
                        format!("minimum purchase price must be at least 1 won (got {value})"),
                    ));
                }
                Some(value)
            }
        }
    };

    // 7. Maximum discount price: required for every kind.
    let max_discount_price = lenient_int(cell(row, columns.max_discount));
    if max_discount_price <= 0 {
        return Err(row_error(
            row_num,
            "maximum discount price must be greater than 0",
        ));
    }

    // 8. Issue count: download kind only.
    let issue_count = match kind {
        CouponKind::Instant => None,
        CouponKind::Download => {
            let raw = cell(row, columns.issue_count).trim();
            if raw.is_empty() {
                Some(DEFAULT_ISSUE_COUNT)
            } else {
                let value = match lenient_int(raw) {
                    0 if !raw.chars().any(|c| c.is_ascii_digit()) => DEFAULT_ISSUE_COUNT,
                    value => value,
                };
                if value < 1 {
                    return Err(row_error(
                        row_num,
                        format!("issue count must be at least 1 (got {value})"),
                    ));
                }
                Some(value)
            }
        }
    };

    // 9. Kind x mode discount rules.
    validate_discount(kind, discount_mode, discount_value, row_num)?;

    // 10. Item ids.
    let vendor_item_ids = parse_item_ids(cell(row, columns.item_ids), kind, row_num)?;

    Ok(Coupon {
        name,
        kind,
        validity_days: u32::try_from(validity_days).unwrap_or(u32::MAX),
        discount_mode,
        discount_value,
        min_purchase_price,
        max_discount_price,
        issue_count,
        vendor_item_ids,
    })
}

fn validate_discount(
    kind: CouponKind,
    mode: DiscountMode,
    value: i64,
    row_num: usize,
) -> Result<(), SheetError> {
    match (kind, mode) {
        (CouponKind::Download, DiscountMode::Rate) => {
            // 100% download coupons are not permitted by the vendor
            if !(1..=99).contains(&value) {
                return Err(row_error(
                    row_num,
                    format!("download rate discount must be between 1 and 99 (got {value})"),
                ));
            }
        }
        (CouponKind::Download, DiscountMode::FixedPrice) => {
            if value < 10 {
                return Err(row_error(
                    row_num,
                    format!("download fixed discount must be at least 10 won (got {value})"),
                ));
            }
            if value % 10 != 0 {
                return Err(row_error(
                    row_num,
                    format!("download fixed discount must be a multiple of 10 won (got {value})"),
                ));
            }
        }
        // Per-unit discounts on download coupons are a product-policy
        // question the reader stays out of; the vendor rejects them at
        // creation time if it cares.
        (CouponKind::Download, DiscountMode::FixedPerUnit) => {}
        (CouponKind::Instant, DiscountMode::Rate) => {
            if !(1..=100).contains(&value) {
                return Err(row_error(
                    row_num,
                    format!("instant rate discount must be between 1 and 100 (got {value})"),
                ));
            }
        }
        (CouponKind::Instant, DiscountMode::FixedPrice | DiscountMode::FixedPerUnit) => {
            if value < 1 {
                return Err(row_error(
                    row_num,
                    format!("instant discount must be at least 1 (got {value})"),
                ));
            }
        }
    }
    Ok(())
}

fn parse_item_ids(raw: &str, kind: CouponKind, row_num: usize) -> Result<Vec<i64>, SheetError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(row_error(row_num, "item id list is required"));
    }

    let mut ids = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let id: i64 = token.parse().map_err(|_| {
            row_error(row_num, format!("item ids must be numeric (got '{raw}')"))
        })?;
        ids.push(id);
    }

    if ids.is_empty() {
        return Err(row_error(row_num, "item id list is empty"));
    }

    let cap = kind.max_item_ids();
    if ids.len() > cap {
        return Err(row_error(
            row_num,
            format!(
                "{} coupons support at most {cap} item ids (got {})",
                kind.label(),
                ids.len()
            ),
        ));
    }

    if let Some(bad) = ids.iter().find(|id| **id <= 0) {
        return Err(row_error(
            row_num,
            format!("item ids must be positive (got {bad})"),
        ));
    }

    Ok(ids)
}
