mod error;

pub use error::{AppError, Result};

pub mod auth;
pub mod client;
pub mod config;
pub mod models;
pub mod routes;
pub mod storage;
