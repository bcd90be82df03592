use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthUser;
use crate::models::{AddStockRequest, AppState, SalesUpdateRequest, StockEntry, WeekFilter};
use crate::{models, AppError, Result};

pub(super) async fn add(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Json(body): Json<AddStockRequest>,
) -> Result<impl IntoResponse> {
    let entry = body.into_entry(owner)?;
    state.storage.insert(&entry).await?;
    tracing::info!("added stock entry {} for user {owner}", entry.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Stock added successfully" })),
    ))
}

pub(super) async fn list(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
) -> Result<Json<Vec<StockEntry>>> {
    Ok(Json(state.storage.list_for_owner(owner).await?))
}

pub(super) async fn update_sales(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<SalesUpdateRequest>,
) -> Result<impl IntoResponse> {
    let quantity_sold = body
        .quantity_sold
        .ok_or_else(|| AppError::Validation("quantitySold is required".to_string()))?;
    if quantity_sold < 0.0 {
        return Err(AppError::Validation(
            "quantitySold must be non-negative".to_string(),
        ));
    }
    let mut entry = state
        .storage
        .get_for_owner(&id, owner)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock not found".to_string()))?;
    if quantity_sold > entry.quantity_received {
        return Err(AppError::Validation(
            "Cannot sell more than received quantity".to_string(),
        ));
    }
    entry.quantity_sold = quantity_sold;
    if let Some(unit_price) = body.unit_price {
        entry.unit_price = unit_price;
    }
    if let Some(selling_price) = body.selling_price {
        entry.selling_price = Some(selling_price);
    }
    entry.updated_at = models::now_fixed_offset();
    state.storage.update_sales(&entry).await?;
    Ok(Json(
        json!({ "message": "Stock updated successfully", "stock": entry }),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FilterQuery {
    year: Option<i32>,
    week: Option<u32>,
    start_week: Option<u32>,
    end_week: Option<u32>,
}

pub(super) async fn filter(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<StockEntry>>> {
    let year = query
        .year
        .ok_or_else(|| AppError::Validation("year is required".to_string()))?;
    // a complete range overrides an exact week
    let week = match (query.start_week, query.end_week) {
        (Some(start), Some(end)) => WeekFilter::Range(start, end),
        _ => match query.week {
            Some(week) => WeekFilter::Exact(week),
            None => WeekFilter::Any,
        },
    };
    Ok(Json(state.storage.filter_for_owner(owner, year, week).await?))
}
