pub mod orders;
mod sqlite_impl;

use std::env;

use log::info;
pub use sqlite_impl::SqliteDatabase;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

const SQLITE_DB_URL: &str = "sqlite://data/orc_store.db";

pub fn db_url() -> String {
    let result = env::var("ORC_DATABASE_URL").unwrap_or_else(|_| {
        info!("ORC_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
