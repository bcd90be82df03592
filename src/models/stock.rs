use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppError, Result};

/// Storage offset for all timestamp strings (UTC+05:30).
const FIXED_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

fn fixed_offset() -> FixedOffset {
    FixedOffset::east_opt(FIXED_OFFSET_SECS).expect("offset in range")
}

/// Re-anchor a caller-supplied timestamp to the storage offset.
///
/// Accepts RFC 3339; timestamps without an offset (the external time service
/// emits those) are taken to already be at the storage offset.
pub fn to_fixed_offset(raw: &str) -> Result<String> {
    let offset = fixed_offset();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&offset).to_rfc3339());
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|_| AppError::Validation(format!("Invalid timestamp '{raw}'")))?;
    match naive.and_local_timezone(offset) {
        chrono::LocalResult::Single(anchored) => Ok(anchored.to_rfc3339()),
        _ => Err(AppError::Validation(format!("Invalid timestamp '{raw}'"))),
    }
}

/// Current time at the storage offset.
pub fn now_fixed_offset() -> String {
    Utc::now().with_timezone(&fixed_offset()).to_rfc3339()
}

/// One week's received/sold record for one item, owned by one user.
///
/// `created_at`/`updated_at` are fixed-format strings, not structured dates.
/// Since every stored stamp carries the same offset, lexicographic order on
/// them is chronological.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEntry {
    pub id: String,
    pub owner_id: Uuid,
    pub item_name: String,
    pub quantity_received: f64,
    #[serde(default)]
    pub quantity_sold: f64,
    pub unit_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<f64>,
    pub week: u32,
    pub year: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// Body of `POST /api/stocks/add`. Fields are optional so missing ones
/// surface as a 400 instead of a deserialization rejection.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStockRequest {
    pub item_name: Option<String>,
    pub quantity_received: Option<f64>,
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<f64>,
    pub week: Option<u32>,
    pub year: Option<i32>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl AddStockRequest {
    /// Validate and build the entry to persist. The owner comes from the
    /// resolved caller, never from the body.
    pub fn into_entry(self, owner_id: Uuid) -> Result<StockEntry> {
        let item_name = self
            .item_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AppError::Validation("itemName is required".to_string()))?;
        let quantity_received = self
            .quantity_received
            .ok_or_else(|| AppError::Validation("quantityReceived is required".to_string()))?;
        if quantity_received < 0.0 {
            return Err(AppError::Validation(
                "quantityReceived must be non-negative".to_string(),
            ));
        }
        let unit_price = self
            .unit_price
            .ok_or_else(|| AppError::Validation("unitPrice is required".to_string()))?;
        let week = self
            .week
            .ok_or_else(|| AppError::Validation("week is required".to_string()))?;
        if !(1..=53).contains(&week) {
            return Err(AppError::Validation(
                "week must be between 1 and 53".to_string(),
            ));
        }
        let year = self
            .year
            .ok_or_else(|| AppError::Validation("year is required".to_string()))?;
        let created_at = self
            .created_at
            .ok_or_else(|| AppError::Validation("createdAt is required".to_string()))?;
        let updated_at = self
            .updated_at
            .ok_or_else(|| AppError::Validation("updatedAt is required".to_string()))?;
        Ok(StockEntry {
            id: Uuid::new_v4().to_string(),
            owner_id,
            item_name,
            quantity_received,
            quantity_sold: 0.0,
            unit_price,
            selling_price: self.selling_price,
            week,
            year,
            created_at: to_fixed_offset(&created_at)?,
            updated_at: to_fixed_offset(&updated_at)?,
        })
    }
}

/// Body of `PUT /api/stocks/update-sales/{id}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesUpdateRequest {
    pub quantity_sold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<f64>,
}

/// Week constraint for the filter endpoint. A complete range takes
/// precedence over an exact week when both are supplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeekFilter {
    Any,
    Exact(u32),
    Range(u32, u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AddStockRequest {
        AddStockRequest {
            item_name: Some("Rye flour".to_string()),
            quantity_received: Some(40.0),
            unit_price: Some(3.5),
            selling_price: Some(5.0),
            week: Some(12),
            year: Some(2024),
            created_at: Some("2024-03-15T10:00:00Z".to_string()),
            updated_at: Some("2024-03-15T10:00:00Z".to_string()),
        }
    }

    #[test]
    fn timestamps_are_anchored_to_fixed_offset() {
        let anchored = to_fixed_offset("2024-03-15T10:00:00Z").unwrap();
        assert_eq!(anchored, "2024-03-15T15:30:00+05:30");
    }

    #[test]
    fn offsetless_timestamps_are_taken_as_local_to_the_fixed_offset() {
        let anchored = to_fixed_offset("2024-03-15T14:03:12.34").unwrap();
        assert_eq!(anchored, "2024-03-15T14:03:12.340+05:30");
    }

    #[test]
    fn garbage_timestamp_is_a_validation_error() {
        assert!(matches!(
            to_fixed_offset("yesterday"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn valid_request_becomes_an_entry() {
        let owner = Uuid::new_v4();
        let entry = request().into_entry(owner).unwrap();
        assert_eq!(entry.owner_id, owner);
        assert_eq!(entry.item_name, "Rye flour");
        assert_eq!(entry.quantity_sold, 0.0);
        assert_eq!(entry.created_at, "2024-03-15T15:30:00+05:30");
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn missing_item_name_is_rejected() {
        let mut req = request();
        req.item_name = Some("   ".to_string());
        assert!(matches!(
            req.into_entry(Uuid::new_v4()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn week_out_of_range_is_rejected() {
        for week in [0, 54] {
            let mut req = request();
            req.week = Some(week);
            assert!(matches!(
                req.into_entry(Uuid::new_v4()),
                Err(AppError::Validation(_))
            ));
        }
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let mut req = request();
        req.quantity_received = Some(-1.0);
        assert!(matches!(
            req.into_entry(Uuid::new_v4()),
            Err(AppError::Validation(_))
        ));
    }
}
