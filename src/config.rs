use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://movies.db?mode=rwc".to_string());

        let db_max_connections: u32 =
            std::env::var("DB_MAX_CONNECTIONS").ok().and_then(|s| s.parse().ok()).unwrap_or(5);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            db_max_connections,
        })
    }
}

/// Settings for the terminal client.
#[derive(Clone, Debug)]
pub struct TuiConfig {
    pub server_url: String,
    pub timeout: Duration,
    pub fetch_limit: u64,
    pub log_file: Option<PathBuf>,
}

impl TuiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let server_url =
            std::env::var("MOVIEDB_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        let timeout_secs: u64 = std::env::var("MOVIEDB_TIMEOUT_SECS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .context("MOVIEDB_TIMEOUT_SECS")?;

        let fetch_limit: u64 =
            std::env::var("MOVIEDB_FETCH_LIMIT").ok().and_then(|s| s.parse().ok()).unwrap_or(100_000);

        let log_file = std::env::var_os("MOVIEDB_TUI_LOG").map(PathBuf::from);

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
            fetch_limit,
            log_file,
        })
    }
}
