//! Durable record store port trait.

use crate::domain::error::StockpileError;
use crate::domain::record::StockRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// One observation of a stock's series, as needed by the derivation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRow {
    pub trade_date: NaiveDate,
    pub close: Decimal,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
}

/// Derived fields destined for one `(id, trade_date)` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedUpdate {
    pub id: i32,
    pub trade_date: NaiveDate,
    pub dsa_indicator: Decimal,
    pub ma_5_days: Decimal,
}

/// Distribution of the stored DSA indicator, for the summary report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DsaStats {
    pub total: u64,
    pub positive: u64,
    pub negative: u64,
    pub zero: u64,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

/// Contract of the durable table keyed by `(id, trade_date)`.
///
/// Batch operations run in a single transaction each: a failed batch rolls
/// back only itself, previously committed batches are retained.
pub trait StorePort {
    /// Idempotent table and index creation.
    fn ensure_schema(&self) -> Result<(), StockpileError>;

    /// Remove every row; returns how many were removed.
    fn clear_all(&self) -> Result<u64, StockpileError>;

    /// Insert-or-update on `(id, trade_date)`; all non-key fields are
    /// overwritten on conflict.
    fn upsert(&self, record: &StockRecord) -> Result<(), StockpileError>;

    fn upsert_batch(&self, records: &[StockRecord]) -> Result<(), StockpileError>;

    /// Distinct stock ids, ascending.
    fn distinct_ids(&self) -> Result<Vec<i32>, StockpileError>;

    /// One stock's observations, ascending by date.
    fn series_for(&self, id: i32) -> Result<Vec<SeriesRow>, StockpileError>;

    fn update_derived(&self, update: &DerivedUpdate) -> Result<(), StockpileError>;

    fn update_derived_batch(&self, updates: &[DerivedUpdate]) -> Result<(), StockpileError>;

    fn count(&self) -> Result<u64, StockpileError>;

    fn dsa_stats(&self) -> Result<DsaStats, StockpileError>;

    /// Most recent rows for one stock, descending by date.
    fn latest_for(&self, id: i32, limit: usize) -> Result<Vec<StockRecord>, StockpileError>;
}
