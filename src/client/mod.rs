mod dashboard;
mod time;

pub use dashboard::*;
pub use time::*;

use serde::Deserialize;

use crate::models::{AddStockRequest, SalesUpdateRequest, StockEntry, WeekFilter};
use crate::Result;

/// Explicit caller context: where the API lives and which credential to
/// present. Passed to every call instead of living in ambient storage.
#[derive(Clone)]
pub struct Session {
    pub base_url: String,
    pub token: String,
}

impl Session {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
        }
    }
}

#[derive(Deserialize)]
struct UpdateSalesResponse {
    stock: StockEntry,
}

/// HTTP client for the stock API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    session: Session,
}

impl ApiClient {
    pub fn new(session: Session) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, session })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.session.base_url)
    }

    pub async fn add_entry(&self, request: &AddStockRequest) -> Result<()> {
        self.http
            .post(self.url("/api/stocks/add"))
            .bearer_auth(&self.session.token)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn list_entries(&self) -> Result<Vec<StockEntry>> {
        let response = self
            .http
            .get(self.url("/api/stocks/"))
            .bearer_auth(&self.session.token)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn update_sales(
        &self,
        id: &str,
        update: &SalesUpdateRequest,
    ) -> Result<StockEntry> {
        let response = self
            .http
            .put(self.url(&format!("/api/stocks/update-sales/{id}")))
            .bearer_auth(&self.session.token)
            .json(update)
            .send()
            .await?
            .error_for_status()?;
        let body: UpdateSalesResponse = response.json().await?;
        Ok(body.stock)
    }

    pub async fn filter_entries(&self, year: i32, week: WeekFilter) -> Result<Vec<StockEntry>> {
        let mut params: Vec<(&str, String)> = vec![("year", year.to_string())];
        match week {
            WeekFilter::Any => {}
            WeekFilter::Exact(w) => params.push(("week", w.to_string())),
            WeekFilter::Range(start, end) => {
                params.push(("startWeek", start.to_string()));
                params.push(("endWeek", end.to_string()));
            }
        }
        let response = self
            .http
            .get(self.url("/api/stocks/filter"))
            .query(&params)
            .bearer_auth(&self.session.token)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}
