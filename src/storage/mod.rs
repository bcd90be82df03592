mod stock;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::Result;

pub use stock::*;

const CREATE_STOCK_TABLE: &str = "
CREATE TABLE IF NOT EXISTS stock_entries (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    item_name TEXT NOT NULL,
    quantity_received REAL NOT NULL,
    quantity_sold REAL NOT NULL DEFAULT 0,
    unit_price REAL NOT NULL,
    selling_price REAL,
    week INTEGER NOT NULL,
    year INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

const CREATE_OWNER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_stock_entries_owner ON stock_entries(owner_id)";

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // one connection: an in-memory SQLite database exists per connection
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let storage = Storage { pool };
        storage.migrate().await?;
        Ok(storage)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_STOCK_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_OWNER_INDEX).execute(&self.pool).await?;
        tracing::info!("stock table ready");
        Ok(())
    }
}
