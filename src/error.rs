use std::{error::Error, fmt::Display};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Serialize)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    Unauthorized,
    Db(String),
    Http(String),
}

pub type Result<T> = core::result::Result<T, AppError>;

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
impl Error for AppError {}
impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        Self::Db(value.to_string())
    }
}
impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value.to_string())
    }
}
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                String::from("Missing or invalid credentials"),
            ),
            AppError::Db(err) => {
                tracing::error!("storage failure: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("Server error"),
                )
            }
            AppError::Http(err) => {
                tracing::error!("transport failure: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("Server error"),
                )
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
