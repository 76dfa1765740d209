//! Validated stock-day observation.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// One stock-day row as parsed from the input file.
///
/// Identity is the composite `(id, trade_date)`. The mandatory fields are
/// guaranteed present by the parser; `pe_ratio` and `dividend_yield` may be
/// absent in the source data, and the two derived fields stay `None` until
/// the derivation pass fills them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRecord {
    pub id: i32,
    pub name: String,
    pub close: Decimal,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: i64,
    pub market_cap: Decimal,
    pub pe_ratio: Option<Decimal>,
    pub dividend_yield: Option<Decimal>,
    pub sector: String,
    pub trade_date: NaiveDate,
    pub dsa_indicator: Option<Decimal>,
    pub ma_5_days: Option<Decimal>,
}
