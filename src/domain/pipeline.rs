//! Import and derivation orchestration over a [`StorePort`].

use crate::domain::error::{ParseError, StockpileError};
use crate::domain::indicator::compute_dsa;
use crate::domain::moving_average::{compute_trailing_averages, MA_WINDOW};
use crate::domain::parser;
use crate::domain::record::StockRecord;
use crate::ports::store_port::{DerivedUpdate, SeriesRow, StorePort};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Rows per transaction when nothing is configured.
pub const DEFAULT_BATCH_SIZE: usize = 250;

/// Cooperative cancellation flag, checked at batch boundaries and between
/// stock ids. A cancelled run never abandons a half-applied batch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn checkpoint(&self) -> Result<(), StockpileError> {
        if self.is_cancelled() {
            Err(StockpileError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A data line the parser refused, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub line_number: usize,
    pub raw: String,
    pub error: ParseError,
}

/// Outcome of parsing one input stream.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub records: Vec<StockRecord>,
    pub rejected: Vec<RejectedLine>,
    pub data_lines: usize,
}

/// Read an input stream, skip the header line, and parse every data line.
///
/// Row-level failures never abort the stream; they are collected with their
/// 1-based line number and raw content for the caller to log.
pub fn collect_records<R: BufRead>(reader: R) -> Result<ParseReport, StockpileError> {
    let mut report = ParseReport::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if index == 0 {
            continue;
        }
        report.data_lines += 1;
        match parser::parse_line(&line) {
            Ok(record) => report.records.push(record),
            Err(error) => report.rejected.push(RejectedLine {
                line_number: index + 1,
                raw: line,
                error,
            }),
        }
    }

    Ok(report)
}

/// Upsert records in transactional batches; returns rows written.
pub fn import_records(
    store: &dyn StorePort,
    records: &[StockRecord],
    batch_size: usize,
    cancel: &CancelToken,
) -> Result<usize, StockpileError> {
    let batch_size = batch_size.max(1);
    let mut written = 0;

    for batch in records.chunks(batch_size) {
        cancel.checkpoint()?;
        store.upsert_batch(batch)?;
        written += batch.len();
    }

    Ok(written)
}

/// Derived-field updates for one stock's ascending series: a row-local DSA
/// per observation plus the trailing 5-day close average.
pub fn derive_for_series(id: i32, rows: &[SeriesRow]) -> Vec<DerivedUpdate> {
    let closes: Vec<(NaiveDate, Decimal)> =
        rows.iter().map(|r| (r.trade_date, r.close)).collect();
    let averages = compute_trailing_averages(&closes, MA_WINDOW);

    rows.iter()
        .zip(averages)
        .map(|(row, (_, ma_5_days))| DerivedUpdate {
            id,
            trade_date: row.trade_date,
            dsa_indicator: compute_dsa(row.open, row.high, row.low),
            ma_5_days,
        })
        .collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeriveStats {
    pub stocks: usize,
    pub rows: usize,
}

/// Recompute both derived fields for every stored stock, id by id.
///
/// Averages never cross stock-id boundaries: each partition is fetched and
/// processed independently, in ascending-date order supplied by the store.
pub fn derive_indicators(
    store: &dyn StorePort,
    batch_size: usize,
    cancel: &CancelToken,
) -> Result<DeriveStats, StockpileError> {
    let batch_size = batch_size.max(1);
    let mut stats = DeriveStats::default();

    for id in store.distinct_ids()? {
        cancel.checkpoint()?;
        let rows = store.series_for(id)?;
        let updates = derive_for_series(id, &rows);
        for batch in updates.chunks(batch_size) {
            cancel.checkpoint()?;
            store.update_derived_batch(batch)?;
        }
        stats.stocks += 1;
        stats.rows += updates.len();
    }

    Ok(stats)
}
