#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use stockpile::domain::record::StockRecord;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// One well-formed CSV data line. Candle shape is fixed at open = close,
/// high = close + 2, low = close - 1, so every row has DSA
/// (2 + 1) / (4 + 1) = 0.600000.
pub fn csv_line(id: i32, name: &str, close: &str, date: &str) -> String {
    let close = dec(close);
    let open = close;
    let high = close + Decimal::TWO;
    let low = close - Decimal::ONE;
    format!("{id},{name},{close},{open},{high},{low},10000,500000.00,15.00,1.20,Test,{date}")
}

pub fn make_record(id: i32, date_str: &str, close: &str) -> StockRecord {
    let close = dec(close);
    StockRecord {
        id,
        name: format!("Stock {id}"),
        close,
        open: close,
        high: close + Decimal::TWO,
        low: close - Decimal::ONE,
        volume: 10_000,
        market_cap: dec("500000.00"),
        pe_ratio: Some(dec("15.00")),
        dividend_yield: Some(dec("1.20")),
        sector: "Test".into(),
        trade_date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        dsa_indicator: None,
        ma_5_days: None,
    }
}

pub const HEADER: &str =
    "id,name,close,open,high,low,volume,market_cap,pe_ratio,dividend_yield,sector,trade_date";

/// Two interleaved stocks over six trading days. Stock 1101 walks the
/// series 10, 12, 11, 13, 14, 16; stock 2330 the same shape shifted up by
/// 90. Both share dates, so per-id partitioning is load-bearing.
pub fn interleaved_csv() -> String {
    let days = [
        "2024-01-15",
        "2024-01-16",
        "2024-01-17",
        "2024-01-18",
        "2024-01-19",
        "2024-01-22",
    ];
    let small = ["10.00", "12.00", "11.00", "13.00", "14.00", "16.00"];
    let big = ["100.00", "102.00", "101.00", "103.00", "104.00", "106.00"];

    let mut out = String::from(HEADER);
    out.push('\n');
    for (i, day) in days.iter().enumerate() {
        out.push_str(&csv_line(1101, "Cement", small[i], day));
        out.push('\n');
        out.push_str(&csv_line(2330, "TSMC", big[i], day));
        out.push('\n');
    }
    out
}
