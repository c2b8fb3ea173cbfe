//! Destination schema bootstrap.
//!
//! Runs once before the pipeline starts: makes sure the pgvector extension
//! and the `companies` table exist, then (unless disabled) clears rows left
//! by a previous run. Without that reset a second run inserts every company
//! again; duplicates are expected in that case, not a bug.

use sqlx::{Pool, Postgres};
use tracing::{info, warn};

use catalog_core::{defaults, Error, Result};

/// DDL for the companies table with an embedding column of `dimension`.
pub fn companies_ddl(dimension: usize) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {table} (
    id SERIAL PRIMARY KEY,
    source_id BIGINT,
    name TEXT,
    slug TEXT,
    website TEXT,
    "smallLogoUrl" TEXT,
    "oneLiner" TEXT,
    "longDescription" TEXT,
    "teamSize" INTEGER,
    url TEXT,
    batch TEXT,
    tags TEXT[],
    status TEXT,
    industries TEXT[],
    regions TEXT[],
    locations TEXT[],
    badges TEXT[],
    embedding VECTOR({dimension})
)"#,
        table = defaults::COMPANIES_TABLE,
        dimension = dimension
    )
}

/// Statement clearing the destination for a fresh full ingest.
pub fn reset_sql() -> String {
    format!(
        "TRUNCATE TABLE {} RESTART IDENTITY",
        defaults::COMPANIES_TABLE
    )
}

/// Prepare the destination for a run.
///
/// `reset` truncates the table; pass `false` to append to existing rows.
pub async fn bootstrap(pool: &Pool<Postgres>, dimension: usize, reset: bool) -> Result<()> {
    if dimension == 0 {
        return Err(Error::Config(
            "embedding dimension must be greater than zero".to_string(),
        ));
    }

    sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
        .execute(pool)
        .await
        .map_err(Error::Database)?;

    sqlx::query(&companies_ddl(dimension))
        .execute(pool)
        .await
        .map_err(Error::Database)?;

    if reset {
        sqlx::query(&reset_sql())
            .execute(pool)
            .await
            .map_err(Error::Database)?;
        info!(
            subsystem = "db",
            component = "schema",
            op = "bootstrap",
            dimension,
            "Companies table created and reset"
        );
    } else {
        warn!(
            subsystem = "db",
            component = "schema",
            op = "bootstrap",
            dimension,
            "Companies table kept; rows from earlier runs will be duplicated"
        );
    }
    Ok(())
}
