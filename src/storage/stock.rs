use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    models::{StockEntry, WeekFilter},
    AppError, Result,
};

use super::Storage;

const SELECT_COLUMNS: &str = "SELECT id, owner_id, item_name, quantity_received, quantity_sold, \
     unit_price, selling_price, week, year, created_at, updated_at FROM stock_entries";

#[derive(Debug, Clone, FromRow)]
struct StockEntryRow {
    id: String,
    owner_id: String,
    item_name: String,
    quantity_received: f64,
    quantity_sold: f64,
    unit_price: f64,
    selling_price: Option<f64>,
    week: i64,
    year: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<StockEntryRow> for StockEntry {
    type Error = AppError;

    fn try_from(value: StockEntryRow) -> Result<Self> {
        let owner_id = Uuid::parse_str(&value.owner_id)
            .map_err(|e| AppError::Db(format!("corrupt owner_id '{}': {e}", value.owner_id)))?;
        Ok(Self {
            id: value.id,
            owner_id,
            item_name: value.item_name,
            quantity_received: value.quantity_received,
            quantity_sold: value.quantity_sold,
            unit_price: value.unit_price,
            selling_price: value.selling_price,
            week: value.week as u32,
            year: value.year as i32,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

impl Storage {
    pub async fn insert(&self, entry: &StockEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO stock_entries (id, owner_id, item_name, quantity_received, \
             quantity_sold, unit_price, selling_price, week, year, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&entry.id)
        .bind(entry.owner_id.to_string())
        .bind(&entry.item_name)
        .bind(entry.quantity_received)
        .bind(entry.quantity_sold)
        .bind(entry.unit_price)
        .bind(entry.selling_price)
        .bind(entry.week as i64)
        .bind(entry.year as i64)
        .bind(&entry.created_at)
        .bind(&entry.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All entries owned by the caller, unsorted; ordering is a view concern.
    pub async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<StockEntry>> {
        let rows: Vec<StockEntryRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE owner_id = ?1"))
                .bind(owner.to_string())
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(StockEntry::try_from).collect()
    }

    /// Lookup scoped to the caller; foreign ids read as absent.
    pub async fn get_for_owner(&self, id: &str, owner: Uuid) -> Result<Option<StockEntry>> {
        let row: Option<StockEntryRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1 AND owner_id = ?2"))
                .bind(id)
                .bind(owner.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(StockEntry::try_from).transpose()
    }

    /// Persist the mutable sales fields of an existing entry.
    pub async fn update_sales(&self, entry: &StockEntry) -> Result<()> {
        let result = sqlx::query(
            "UPDATE stock_entries SET quantity_sold = ?1, unit_price = ?2, \
             selling_price = ?3, updated_at = ?4 WHERE id = ?5",
        )
        .bind(entry.quantity_sold)
        .bind(entry.unit_price)
        .bind(entry.selling_price)
        .bind(&entry.updated_at)
        .bind(&entry.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Stock not found".to_string()));
        }
        Ok(())
    }

    /// Caller-owned entries for a year under a week constraint, ascending by
    /// week.
    pub async fn filter_for_owner(
        &self,
        owner: Uuid,
        year: i32,
        week: WeekFilter,
    ) -> Result<Vec<StockEntry>> {
        let base = format!("{SELECT_COLUMNS} WHERE owner_id = ?1 AND year = ?2");
        let rows: Vec<StockEntryRow> = match week {
            WeekFilter::Any => {
                sqlx::query_as(&format!("{base} ORDER BY week ASC"))
                    .bind(owner.to_string())
                    .bind(year as i64)
                    .fetch_all(&self.pool)
                    .await?
            }
            WeekFilter::Exact(w) => {
                sqlx::query_as(&format!("{base} AND week = ?3 ORDER BY week ASC"))
                    .bind(owner.to_string())
                    .bind(year as i64)
                    .bind(w as i64)
                    .fetch_all(&self.pool)
                    .await?
            }
            WeekFilter::Range(start, end) => {
                sqlx::query_as(&format!(
                    "{base} AND week BETWEEN ?3 AND ?4 ORDER BY week ASC"
                ))
                .bind(owner.to_string())
                .bind(year as i64)
                .bind(start as i64)
                .bind(end as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(StockEntry::try_from).collect()
    }
}
