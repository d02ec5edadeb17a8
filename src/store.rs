//! Pool setup and table bootstrap for registered models. Creates missing tables only; never alters.

use crate::error::AppError;
use crate::model::{ModelDescriptor, Registry};
use crate::sql::create_table;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Open a pool, creating the database file if missing. In-memory databases get a single
/// connection so every query sees the same database.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::BadRequest(format!("invalid database url: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true);
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(opts)
        .await?;
    Ok(pool)
}

pub async fn ensure_table(pool: &SqlitePool, model: &ModelDescriptor) -> Result<(), AppError> {
    let ddl = create_table(model);
    tracing::debug!(model = %model.name, sql = %ddl, "ensure table");
    sqlx::query(&ddl).execute(pool).await?;
    Ok(())
}

pub async fn ensure_tables(pool: &SqlitePool, registry: &Registry) -> Result<(), AppError> {
    for (_, model) in registry.list() {
        ensure_table(pool, model).await?;
    }
    Ok(())
}
