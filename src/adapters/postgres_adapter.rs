//! PostgreSQL store adapter.
//!
//! Prices live in NUMERIC columns bound through `rust_decimal`, dates in
//! DATE columns bound through `chrono`, so no text conversion happens at
//! this boundary.

use crate::domain::error::StockpileError;
use crate::domain::record::StockRecord;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::{DerivedUpdate, DsaStats, SeriesRow, StorePort};
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use std::cell::RefCell;

const UPSERT_SQL: &str = "INSERT INTO stock_data \
     (id, stock_name, close_price, open_price, high_price, low_price, \
      volume, market_cap, pe_ratio, dividend_yield, sector, trade_date, \
      dsa_indicator, ma_5_days) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
     ON CONFLICT (id, trade_date) DO UPDATE SET \
     stock_name = EXCLUDED.stock_name, \
     close_price = EXCLUDED.close_price, \
     open_price = EXCLUDED.open_price, \
     high_price = EXCLUDED.high_price, \
     low_price = EXCLUDED.low_price, \
     volume = EXCLUDED.volume, \
     market_cap = EXCLUDED.market_cap, \
     pe_ratio = EXCLUDED.pe_ratio, \
     dividend_yield = EXCLUDED.dividend_yield, \
     sector = EXCLUDED.sector, \
     dsa_indicator = EXCLUDED.dsa_indicator, \
     ma_5_days = EXCLUDED.ma_5_days";

const UPDATE_DERIVED_SQL: &str = "UPDATE stock_data \
     SET dsa_indicator = $1, ma_5_days = $2 WHERE id = $3 AND trade_date = $4";

pub struct PostgresAdapter {
    client: RefCell<Client>,
}

fn connect_err(e: postgres::Error) -> StockpileError {
    StockpileError::ConnectionFailed {
        reason: e.to_string(),
    }
}

fn query_err(e: postgres::Error) -> StockpileError {
    match e.code() {
        Some(state) if state.code().starts_with("23") => StockpileError::ConstraintViolation {
            reason: e.to_string(),
        },
        _ => StockpileError::QueryFailed {
            reason: e.to_string(),
        },
    }
}

fn upsert_params(record: &StockRecord) -> [&(dyn ToSql + Sync); 14] {
    [
        &record.id,
        &record.name,
        &record.close,
        &record.open,
        &record.high,
        &record.low,
        &record.volume,
        &record.market_cap,
        &record.pe_ratio,
        &record.dividend_yield,
        &record.sector,
        &record.trade_date,
        &record.dsa_indicator,
        &record.ma_5_days,
    ]
}

fn record_from_row(row: &postgres::Row) -> StockRecord {
    StockRecord {
        id: row.get(0),
        name: row.get(1),
        close: row.get(2),
        open: row.get(3),
        high: row.get(4),
        low: row.get(5),
        volume: row.get(6),
        market_cap: row.get(7),
        pe_ratio: row.get(8),
        dividend_yield: row.get(9),
        sector: row.get(10),
        trade_date: row.get(11),
        dsa_indicator: row.get(12),
        ma_5_days: row.get(13),
    }
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockpileError> {
        let connection_string = config
            .get_string("postgres", "connection_string")
            .ok_or_else(|| StockpileError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let client = Client::connect(&connection_string, NoTls).map_err(connect_err)?;

        Ok(Self {
            client: RefCell::new(client),
        })
    }
}

impl StorePort for PostgresAdapter {
    fn ensure_schema(&self) -> Result<(), StockpileError> {
        self.client
            .borrow_mut()
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS stock_data (
                    id INT NOT NULL,
                    stock_name TEXT NOT NULL,
                    close_price NUMERIC(10, 2) NOT NULL,
                    open_price NUMERIC(10, 2) NOT NULL,
                    high_price NUMERIC(10, 2) NOT NULL,
                    low_price NUMERIC(10, 2) NOT NULL,
                    volume BIGINT NOT NULL,
                    market_cap NUMERIC(15, 2) NOT NULL,
                    pe_ratio NUMERIC(8, 2),
                    dividend_yield NUMERIC(5, 2),
                    sector TEXT NOT NULL,
                    trade_date DATE NOT NULL,
                    dsa_indicator NUMERIC(10, 6),
                    ma_5_days NUMERIC(10, 2),
                    PRIMARY KEY (id, trade_date)
                );
                CREATE INDEX IF NOT EXISTS idx_stock_data_trade_date ON stock_data(trade_date);
                CREATE INDEX IF NOT EXISTS idx_stock_data_sector ON stock_data(sector);",
            )
            .map_err(query_err)
    }

    fn clear_all(&self) -> Result<u64, StockpileError> {
        self.client
            .borrow_mut()
            .execute("DELETE FROM stock_data", &[])
            .map_err(query_err)
    }

    fn upsert(&self, record: &StockRecord) -> Result<(), StockpileError> {
        self.client
            .borrow_mut()
            .execute(UPSERT_SQL, &upsert_params(record))
            .map_err(query_err)?;
        Ok(())
    }

    fn upsert_batch(&self, records: &[StockRecord]) -> Result<(), StockpileError> {
        let mut client = self.client.borrow_mut();
        let mut tx = client.transaction().map_err(query_err)?;
        for record in records {
            tx.execute(UPSERT_SQL, &upsert_params(record))
                .map_err(query_err)?;
        }
        tx.commit().map_err(query_err)
    }

    fn distinct_ids(&self) -> Result<Vec<i32>, StockpileError> {
        let rows = self
            .client
            .borrow_mut()
            .query("SELECT DISTINCT id FROM stock_data ORDER BY id", &[])
            .map_err(query_err)?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    fn series_for(&self, id: i32) -> Result<Vec<SeriesRow>, StockpileError> {
        let rows = self
            .client
            .borrow_mut()
            .query(
                "SELECT trade_date, close_price, open_price, high_price, low_price \
                 FROM stock_data WHERE id = $1 ORDER BY trade_date ASC",
                &[&id],
            )
            .map_err(query_err)?;

        Ok(rows
            .into_iter()
            .map(|row| SeriesRow {
                trade_date: row.get(0),
                close: row.get(1),
                open: row.get(2),
                high: row.get(3),
                low: row.get(4),
            })
            .collect())
    }

    fn update_derived(&self, update: &DerivedUpdate) -> Result<(), StockpileError> {
        self.client
            .borrow_mut()
            .execute(
                UPDATE_DERIVED_SQL,
                &[
                    &update.dsa_indicator,
                    &update.ma_5_days,
                    &update.id,
                    &update.trade_date,
                ],
            )
            .map_err(query_err)?;
        Ok(())
    }

    fn update_derived_batch(&self, updates: &[DerivedUpdate]) -> Result<(), StockpileError> {
        let mut client = self.client.borrow_mut();
        let mut tx = client.transaction().map_err(query_err)?;
        for update in updates {
            tx.execute(
                UPDATE_DERIVED_SQL,
                &[
                    &update.dsa_indicator,
                    &update.ma_5_days,
                    &update.id,
                    &update.trade_date,
                ],
            )
            .map_err(query_err)?;
        }
        tx.commit().map_err(query_err)
    }

    fn count(&self) -> Result<u64, StockpileError> {
        let row = self
            .client
            .borrow_mut()
            .query_one("SELECT COUNT(*) FROM stock_data", &[])
            .map_err(query_err)?;
        let count: i64 = row.get(0);
        Ok(count as u64)
    }

    fn dsa_stats(&self) -> Result<DsaStats, StockpileError> {
        let row = self
            .client
            .borrow_mut()
            .query_one(
                "SELECT COUNT(*), \
                        COUNT(CASE WHEN dsa_indicator > 0 THEN 1 END), \
                        COUNT(CASE WHEN dsa_indicator < 0 THEN 1 END), \
                        COUNT(CASE WHEN dsa_indicator = 0 THEN 1 END), \
                        MIN(dsa_indicator), MAX(dsa_indicator) \
                 FROM stock_data",
                &[],
            )
            .map_err(query_err)?;

        let total: i64 = row.get(0);
        let positive: i64 = row.get(1);
        let negative: i64 = row.get(2);
        let zero: i64 = row.get(3);
        Ok(DsaStats {
            total: total as u64,
            positive: positive as u64,
            negative: negative as u64,
            zero: zero as u64,
            min: row.get(4),
            max: row.get(5),
        })
    }

    fn latest_for(&self, id: i32, limit: usize) -> Result<Vec<StockRecord>, StockpileError> {
        let rows = self
            .client
            .borrow_mut()
            .query(
                "SELECT id, stock_name, close_price, open_price, high_price, low_price, \
                        volume, market_cap, pe_ratio, dividend_yield, sector, trade_date, \
                        dsa_indicator, ma_5_days \
                 FROM stock_data WHERE id = $1 ORDER BY trade_date DESC LIMIT $2",
                &[&id, &(limit as i64)],
            )
            .map_err(query_err)?;

        Ok(rows.iter().map(record_from_row).collect())
    }
}
