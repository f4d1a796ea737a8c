use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::error::StoreError;

/// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    Ok(db)
}

/// Maps a sqlx error to a [`StoreError`], treating unique violations on
/// `field` as duplicates.
pub fn classify(err: sqlx::Error, field: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Duplicate(field);
        }
    }
    tracing::error!(error = %err, "database error");
    StoreError::Backend(err.to_string())
}
