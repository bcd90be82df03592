use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Deserialize;

use crate::Result;

/// Payload of the external time service
/// (`/api/time/current/zone?timeZone=...`). `date_time` comes without an
/// offset and is already local to the requested zone.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTime {
    pub year: i32,
    pub date_time: String,
}

/// A moment resolved to the year/week the dashboard stamps on new rows.
#[derive(Debug, Clone)]
pub struct WeekStamp {
    pub year: i32,
    pub week: u32,
    pub timestamp: String,
}

/// Client for the external current-time collaborator. Every consumer falls
/// back to the local wall clock when the service is unreachable.
#[derive(Clone)]
pub struct TimeService {
    http: reqwest::Client,
    base_url: String,
    zone: String,
}

impl TimeService {
    pub fn new(base_url: impl Into<String>, zone: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            zone: zone.into(),
        })
    }

    pub async fn current(&self) -> Result<CurrentTime> {
        let url = format!(
            "{}/api/time/current/zone?timeZone={}",
            self.base_url, self.zone
        );
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Current timestamp string, local clock on failure.
    pub async fn now_or_local(&self) -> String {
        match self.current().await {
            Ok(current) => current.date_time,
            Err(err) => {
                tracing::warn!("time service unavailable, using local clock: {err}");
                Utc::now().to_rfc3339()
            }
        }
    }

    /// Year, week and timestamp for a new row, local clock on failure. The
    /// week always comes from [`week_of_year`], even when the service
    /// answers.
    pub async fn week_stamp(&self) -> WeekStamp {
        match self.current().await {
            Ok(current) => match parse_service_date(&current.date_time) {
                Some(date) => WeekStamp {
                    year: current.year,
                    week: week_of_year(date),
                    timestamp: current.date_time,
                },
                None => local_week_stamp(),
            },
            Err(err) => {
                tracing::warn!("time service unavailable, using local clock: {err}");
                local_week_stamp()
            }
        }
    }
}

fn local_week_stamp() -> WeekStamp {
    let now = Utc::now();
    WeekStamp {
        year: now.year(),
        week: week_of_year(now.date_naive()),
        timestamp: now.to_rfc3339(),
    }
}

fn parse_service_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.date_naive());
    }
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}

/// Week-of-year as the dashboard has always computed it: days into the year
/// plus the Sunday-based weekday index of Jan 1, plus one, divided by 7 and
/// rounded up. An approximation of ISO weeks, kept for output parity.
pub fn week_of_year(date: NaiveDate) -> u32 {
    let year_start = NaiveDate::from_ymd_opt(date.year(), 1, 1).expect("Jan 1 exists");
    let days = (date - year_start).num_days();
    let weekday_index = year_start.weekday().num_days_from_sunday() as i64;
    ((days + weekday_index + 1) as f64 / 7.0).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_formula_matches_hand_computation() {
        // 2024-03-15 is day 74 of a year starting on a Monday (index 1):
        // ceil((74 + 1 + 1) / 7) = 11
        assert_eq!(week_of_year(date(2024, 3, 15)), 11);
    }

    #[test]
    fn first_of_january_is_week_one() {
        assert_eq!(week_of_year(date(2024, 1, 1)), 1);
        assert_eq!(week_of_year(date(2023, 1, 1)), 1);
    }

    #[test]
    fn late_december_can_reach_week_fifty_three() {
        // 2023 starts on a Sunday (index 0): ceil((364 + 0 + 1) / 7) = 53
        assert_eq!(week_of_year(date(2023, 12, 31)), 53);
    }

    #[test]
    fn early_january_rolls_into_week_two() {
        // 2025 starts on a Wednesday (index 3): ceil((4 + 3 + 1) / 7) = 2
        assert_eq!(week_of_year(date(2025, 1, 5)), 2);
    }

    #[test]
    fn service_dates_parse_with_and_without_offset() {
        assert_eq!(
            parse_service_date("2024-03-15T14:03:12.34"),
            Some(date(2024, 3, 15))
        );
        assert_eq!(
            parse_service_date("2024-03-15T10:00:00+05:30"),
            Some(date(2024, 3, 15))
        );
        assert_eq!(parse_service_date("not a date"), None);
    }
}
