//! SQLite store adapter.
//!
//! Prices are persisted as decimal TEXT so values round-trip exactly at
//! their declared scale; dates as ISO `YYYY-MM-DD` TEXT, which also sorts
//! chronologically. Numeric aggregation for the display-only stats casts
//! to REAL inside the query.

use crate::domain::error::StockpileError;
use crate::domain::record::StockRecord;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::{DerivedUpdate, DsaStats, SeriesRow, StorePort};
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::params;
use rust_decimal::Decimal;

const ALL_COLUMNS: &str = "id, stock_name, close_price, open_price, high_price, low_price, \
     volume, market_cap, pe_ratio, dividend_yield, sector, trade_date, \
     dsa_indicator, ma_5_days";

const UPSERT_SQL: &str = "INSERT OR REPLACE INTO stock_data \
     (id, stock_name, close_price, open_price, high_price, low_price, \
      volume, market_cap, pe_ratio, dividend_yield, sector, trade_date, \
      dsa_indicator, ma_5_days) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)";

const UPDATE_DERIVED_SQL: &str = "UPDATE stock_data \
     SET dsa_indicator = ?1, ma_5_days = ?2 WHERE id = ?3 AND trade_date = ?4";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_err(e: r2d2::Error) -> StockpileError {
    StockpileError::ConnectionFailed {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> StockpileError {
    match &e {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StockpileError::ConstraintViolation {
                reason: e.to_string(),
            }
        }
        _ => StockpileError::QueryFailed {
            reason: e.to_string(),
        },
    }
}

fn decimal_from_sql(text: String, idx: usize) -> rusqlite::Result<Decimal> {
    text.parse::<Decimal>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

fn opt_decimal_from_sql(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| decimal_from_sql(t, idx)).transpose()
}

fn date_from_sql(text: String, idx: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<StockRecord> {
    Ok(StockRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        close: decimal_from_sql(row.get(2)?, 2)?,
        open: decimal_from_sql(row.get(3)?, 3)?,
        high: decimal_from_sql(row.get(4)?, 4)?,
        low: decimal_from_sql(row.get(5)?, 5)?,
        volume: row.get(6)?,
        market_cap: decimal_from_sql(row.get(7)?, 7)?,
        pe_ratio: opt_decimal_from_sql(row, 8)?,
        dividend_yield: opt_decimal_from_sql(row, 9)?,
        sector: row.get(10)?,
        trade_date: date_from_sql(row.get(11)?, 11)?,
        dsa_indicator: opt_decimal_from_sql(row, 12)?,
        ma_5_days: opt_decimal_from_sql(row, 13)?,
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockpileError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| StockpileError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, StockpileError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StockpileError> {
        self.pool.get().map_err(pool_err)
    }

    fn execute_upsert(conn: &rusqlite::Connection, record: &StockRecord) -> rusqlite::Result<usize> {
        conn.execute(
            UPSERT_SQL,
            params![
                record.id,
                record.name,
                record.close.to_string(),
                record.open.to_string(),
                record.high.to_string(),
                record.low.to_string(),
                record.volume,
                record.market_cap.to_string(),
                record.pe_ratio.map(|d| d.to_string()),
                record.dividend_yield.map(|d| d.to_string()),
                record.sector,
                record.trade_date.format("%Y-%m-%d").to_string(),
                record.dsa_indicator.map(|d| d.to_string()),
                record.ma_5_days.map(|d| d.to_string()),
            ],
        )
    }

    fn execute_update_derived(
        conn: &rusqlite::Connection,
        update: &DerivedUpdate,
    ) -> rusqlite::Result<usize> {
        conn.execute(
            UPDATE_DERIVED_SQL,
            params![
                update.dsa_indicator.to_string(),
                update.ma_5_days.to_string(),
                update.id,
                update.trade_date.format("%Y-%m-%d").to_string(),
            ],
        )
    }
}

impl StorePort for SqliteAdapter {
    fn ensure_schema(&self) -> Result<(), StockpileError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS stock_data (
                    id INTEGER NOT NULL,
                    stock_name TEXT NOT NULL,
                    close_price TEXT NOT NULL,
                    open_price TEXT NOT NULL,
                    high_price TEXT NOT NULL,
                    low_price TEXT NOT NULL,
                    volume INTEGER NOT NULL,
                    market_cap TEXT NOT NULL,
                    pe_ratio TEXT,
                    dividend_yield TEXT,
                    sector TEXT NOT NULL,
                    trade_date TEXT NOT NULL,
                    dsa_indicator TEXT,
                    ma_5_days TEXT,
                    PRIMARY KEY (id, trade_date)
                );
                CREATE INDEX IF NOT EXISTS idx_stock_data_trade_date ON stock_data(trade_date);
                CREATE INDEX IF NOT EXISTS idx_stock_data_sector ON stock_data(sector);",
            )
            .map_err(query_err)
    }

    fn clear_all(&self) -> Result<u64, StockpileError> {
        let removed = self
            .conn()?
            .execute("DELETE FROM stock_data", [])
            .map_err(query_err)?;
        Ok(removed as u64)
    }

    fn upsert(&self, record: &StockRecord) -> Result<(), StockpileError> {
        Self::execute_upsert(&*self.conn()?, record).map_err(query_err)?;
        Ok(())
    }

    fn upsert_batch(&self, records: &[StockRecord]) -> Result<(), StockpileError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        for record in records {
            Self::execute_upsert(&tx, record).map_err(query_err)?;
        }
        tx.commit().map_err(query_err)
    }

    fn distinct_ids(&self) -> Result<Vec<i32>, StockpileError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT id FROM stock_data ORDER BY id")
            .map_err(query_err)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_err)?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.map_err(query_err)?);
        }
        Ok(ids)
    }

    fn series_for(&self, id: i32) -> Result<Vec<SeriesRow>, StockpileError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT trade_date, close_price, open_price, high_price, low_price \
                 FROM stock_data WHERE id = ?1 ORDER BY trade_date ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![id], |row| {
                Ok(SeriesRow {
                    trade_date: date_from_sql(row.get(0)?, 0)?,
                    close: decimal_from_sql(row.get(1)?, 1)?,
                    open: decimal_from_sql(row.get(2)?, 2)?,
                    high: decimal_from_sql(row.get(3)?, 3)?,
                    low: decimal_from_sql(row.get(4)?, 4)?,
                })
            })
            .map_err(query_err)?;

        let mut series = Vec::new();
        for row in rows {
            series.push(row.map_err(query_err)?);
        }
        Ok(series)
    }

    fn update_derived(&self, update: &DerivedUpdate) -> Result<(), StockpileError> {
        Self::execute_update_derived(&*self.conn()?, update).map_err(query_err)?;
        Ok(())
    }

    fn update_derived_batch(&self, updates: &[DerivedUpdate]) -> Result<(), StockpileError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        for update in updates {
            Self::execute_update_derived(&tx, update).map_err(query_err)?;
        }
        tx.commit().map_err(query_err)
    }

    fn count(&self) -> Result<u64, StockpileError> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM stock_data", [], |row| row.get(0))
            .map_err(query_err)?;
        Ok(count as u64)
    }

    fn dsa_stats(&self) -> Result<DsaStats, StockpileError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COUNT(*), \
                    COUNT(CASE WHEN CAST(dsa_indicator AS REAL) > 0 THEN 1 END), \
                    COUNT(CASE WHEN CAST(dsa_indicator AS REAL) < 0 THEN 1 END), \
                    COUNT(CASE WHEN CAST(dsa_indicator AS REAL) = 0 THEN 1 END), \
                    (SELECT dsa_indicator FROM stock_data WHERE dsa_indicator IS NOT NULL \
                       ORDER BY CAST(dsa_indicator AS REAL) ASC LIMIT 1), \
                    (SELECT dsa_indicator FROM stock_data WHERE dsa_indicator IS NOT NULL \
                       ORDER BY CAST(dsa_indicator AS REAL) DESC LIMIT 1) \
             FROM stock_data",
            [],
            |row| {
                let total: i64 = row.get(0)?;
                let positive: i64 = row.get(1)?;
                let negative: i64 = row.get(2)?;
                let zero: i64 = row.get(3)?;
                let min: Option<String> = row.get(4)?;
                let max: Option<String> = row.get(5)?;
                Ok(DsaStats {
                    total: total as u64,
                    positive: positive as u64,
                    negative: negative as u64,
                    zero: zero as u64,
                    min: min.map(|t| decimal_from_sql(t, 4)).transpose()?,
                    max: max.map(|t| decimal_from_sql(t, 5)).transpose()?,
                })
            },
        )
        .map_err(query_err)
    }

    fn latest_for(&self, id: i32, limit: usize) -> Result<Vec<StockRecord>, StockpileError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ALL_COLUMNS} FROM stock_data \
                 WHERE id = ?1 ORDER BY trade_date DESC LIMIT ?2"
            ))
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![id, limit as i64], record_from_row)
            .map_err(query_err)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(query_err)?);
        }
        Ok(records)
    }
}
