//! Delimited-line parser for daily stock data.
//!
//! Splits on commas with a double-quote toggle: a `"` flips in-quote state
//! and commas inside quotes are not separators. Escaped quotes (`""`) are
//! NOT recognised — an embedded quote flips the state again. This matches
//! the dialect of the files this tool ingests; see the tests for the
//! resulting behavior on embedded quotes.

use crate::domain::error::ParseError;
use crate::domain::record::StockRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Minimum field count for a complete row.
pub const REQUIRED_FIELDS: usize = 12;

/// Split one line into fields. Quote characters are consumed, never emitted.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parse one data line into a [`StockRecord`].
///
/// Field order: id, name, close, open, high, low, volume, market_cap,
/// pe_ratio, dividend_yield, sector, trade_date. The two ratio fields map
/// empty or unparsable text to `None`; every other field rejects the row.
pub fn parse_line(line: &str) -> Result<StockRecord, ParseError> {
    let fields = split_fields(line);
    if fields.len() < REQUIRED_FIELDS {
        return Err(ParseError::IncompleteRow {
            found: fields.len(),
        });
    }

    Ok(StockRecord {
        id: parse_int(&fields[0], "id")?,
        name: fields[1].trim().to_string(),
        close: parse_decimal(&fields[2], "close")?,
        open: parse_decimal(&fields[3], "open")?,
        high: parse_decimal(&fields[4], "high")?,
        low: parse_decimal(&fields[5], "low")?,
        volume: parse_int(&fields[6], "volume")?,
        market_cap: parse_decimal(&fields[7], "market_cap")?,
        pe_ratio: parse_optional_decimal(&fields[8]),
        dividend_yield: parse_optional_decimal(&fields[9]),
        sector: fields[10].trim().to_string(),
        trade_date: parse_date(&fields[11])?,
        dsa_indicator: None,
        ma_5_days: None,
    })
}

fn malformed(field: &'static str, raw: &str) -> ParseError {
    ParseError::MalformedField {
        field,
        value: raw.trim().to_string(),
    }
}

fn parse_int<T: std::str::FromStr>(raw: &str, field: &'static str) -> Result<T, ParseError> {
    raw.trim().parse().map_err(|_| malformed(field, raw))
}

fn parse_decimal(raw: &str, field: &'static str) -> Result<Decimal, ParseError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|_| malformed(field, raw))
}

/// Empty-after-trim and unparsable numeric text both mean "absent".
fn parse_optional_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<Decimal>().ok()
}

fn parse_date(raw: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| malformed("trade_date", raw))
}
