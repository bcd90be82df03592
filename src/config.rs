use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

pub struct ServerConfig {
    pub addr: SocketAddr,
    pub database_url: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8000);
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .expect("Invalid HOST/PORT");
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://stock.db".to_string());
        Self { addr, database_url }
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,axum=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
