//! Normalization and validation of raw catalog feed lines.
//!
//! Each feed line carries at least four `;`-separated fields:
//! `code;description;price;unit`. Normalization is a pure function over one
//! line; uniqueness checks and storage concerns live in the reconciler.

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

/// Fixed width of a normalized product code.
pub const CODE_WIDTH: usize = 10;

/// Minimum number of fields a feed line must carry.
pub const MIN_FIELDS: usize = 4;

/// A validated, normalized feed row ready for staging.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRow {
    /// Zero-padded 10-digit product code.
    pub code: String,
    pub description: String,
    /// Price rounded to 2 fractional digits.
    pub price: f64,
    pub unit: String,
}

/// Why a feed line was rejected. Row rejections are recorded and skipped,
/// never fatal to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum RejectReason {
    /// Fewer than four fields, or a code that is not a short digit string.
    MalformedRow,
    /// Price field failed to parse as a non-negative number.
    InvalidPrice,
}

/// Left-pad a numeric code to [`CODE_WIDTH`] digits.
///
/// Codes longer than the fixed width or containing non-digits are rejected:
/// the product id is derived from the numeric code value, so anything that
/// does not fit the fixed-width numeric form cannot be reconciled.
pub fn normalize_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.len() > CODE_WIDTH
        || !trimmed.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    Some(format!("{:0>width$}", trimmed, width = CODE_WIDTH))
}

/// Normalize a raw price field to its canonical form: `.` as the decimal
/// separator and exactly 2 fractional digits (`"12,5"` becomes `"12.50"`).
///
/// Idempotent on already-canonical input. Returns `None` for anything that
/// does not parse as a finite, non-negative number.
pub fn normalize_price(raw: &str) -> Option<String> {
    let cleaned = raw.trim().replace(',', ".");
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(format!("{value:.2}"))
}

/// Parse one raw feed line into a [`CandidateRow`] or a [`RejectReason`].
///
/// Fields beyond the fourth are ignored. Description and unit are used
/// verbatim; the delimiter split is the only processing they receive.
pub fn normalize_row(raw: &str) -> Result<CandidateRow, RejectReason> {
    let fields: Vec<&str> = raw.split(';').collect();
    if fields.len() < MIN_FIELDS {
        return Err(RejectReason::MalformedRow);
    }

    let code = normalize_code(fields[0]).ok_or(RejectReason::MalformedRow)?;
    let canonical_price = normalize_price(fields[2]).ok_or(RejectReason::InvalidPrice)?;
    let price: f64 = canonical_price.parse().map_err(|_| RejectReason::InvalidPrice)?;

    Ok(CandidateRow {
        code,
        description: fields[1].to_string(),
        price,
        unit: fields[3].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_codes_to_fixed_width() {
        assert_eq!(normalize_code("7").as_deref(), Some("0000000007"));
        assert_eq!(normalize_code("0000000007").as_deref(), Some("0000000007"));
        assert_eq!(normalize_code("1234567890").as_deref(), Some("1234567890"));
    }

    #[test]
    fn rejects_unusable_codes() {
        assert_eq!(normalize_code(""), None);
        assert_eq!(normalize_code("12345678901"), None);
        assert_eq!(normalize_code("ABC123"), None);
        assert_eq!(normalize_code("-7"), None);
    }

    #[test]
    fn canonicalizes_comma_decimal_prices() {
        assert_eq!(normalize_price("12,5").as_deref(), Some("12.50"));
        assert_eq!(normalize_price("10,00").as_deref(), Some("10.00"));
        assert_eq!(normalize_price("0").as_deref(), Some("0.00"));
    }

    #[test]
    fn price_normalization_is_idempotent() {
        for raw in ["12,5", "3", "0,01", "1999.999"] {
            let once = normalize_price(raw).expect("first pass parses");
            let twice = normalize_price(&once).expect("canonical form parses");
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn rejects_invalid_prices() {
        assert_eq!(normalize_price("abc"), None);
        assert_eq!(normalize_price(""), None);
        assert_eq!(normalize_price("-1,50"), None);
        assert_eq!(normalize_price("NaN"), None);
        assert_eq!(normalize_price("inf"), None);
    }

    #[test]
    fn normalizes_a_complete_row() {
        let row = normalize_row("7;Widget;10,00;EA").expect("valid row");
        assert_eq!(row.code, "0000000007");
        assert_eq!(row.description, "Widget");
        assert_eq!(row.price, 10.0);
        assert_eq!(row.unit, "EA");
    }

    #[test]
    fn rejects_short_rows_as_malformed() {
        assert_eq!(
            normalize_row("7;Widget;10,00"),
            Err(RejectReason::MalformedRow)
        );
        assert_eq!(normalize_row(""), Err(RejectReason::MalformedRow));
    }

    #[test]
    fn rejects_bad_price_as_invalid_price() {
        assert_eq!(
            normalize_row("2;Gadget;abc;PK"),
            Err(RejectReason::InvalidPrice)
        );
    }

    #[test]
    fn ignores_extra_fields() {
        let row = normalize_row("7;Widget;1;EA;surplus;fields").expect("valid row");
        assert_eq!(row.unit, "EA");
    }

    #[test]
    fn keeps_description_verbatim() {
        let row = normalize_row("7;  Widget Deluxe  ;1;EA").expect("valid row");
        assert_eq!(row.description, "  Widget Deluxe  ");
    }
}
