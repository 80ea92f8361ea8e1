use std::env;
use std::net::SocketAddr;

use crate::error::AppError;
use crate::timetable::{TimetableConfig, parse_env};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub addr: SocketAddr,
    pub timetable: TimetableConfig,
}

impl AppConfig {
    /// Reads the process environment; call `dotenvy::dotenv()` first to honour a `.env` file.
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://studl.db?mode=rwc".to_string());
        let addr = parse_env("STUDL_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?;

        Ok(Self {
            database_url,
            addr,
            timetable: TimetableConfig::new_from_env()?,
        })
    }
}
