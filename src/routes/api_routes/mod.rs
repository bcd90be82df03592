use axum::routing::{get, post, put};
use axum::Router;

use crate::models::AppState;

mod stock;

pub fn init(state: AppState) -> Router {
    Router::new()
        .route("/api/stocks/add", post(stock::add))
        .route("/api/stocks", get(stock::list))
        .route("/api/stocks/", get(stock::list))
        .route("/api/stocks/update-sales/{id}", put(stock::update_sales))
        .route("/api/stocks/filter", get(stock::filter))
        .with_state(state)
}
