//! Company repository implementation.

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use catalog_core::{Company, Error, RecordStore, Result};

/// PostgreSQL implementation of [`RecordStore`] for companies.
#[derive(Clone)]
pub struct PgCompanyRepository {
    pool: Pool<Postgres>,
    dimension: usize,
}

impl PgCompanyRepository {
    /// Create a repository writing embeddings of `dimension` values.
    pub fn new(pool: Pool<Postgres>, dimension: usize) -> Self {
        Self { pool, dimension }
    }

    /// Number of stored companies.
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM companies")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.get("n"))
    }

    /// Number of stored rows carrying the given name.
    pub async fn count_by_name(&self, name: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM companies WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.get("n"))
    }
}

#[async_trait]
impl RecordStore for PgCompanyRepository {
    async fn store(&self, company: &Company, embedding: &Vector) -> Result<()> {
        let actual = embedding.as_slice().len();
        if actual != self.dimension {
            return Err(Error::InvalidInput(format!(
                "embedding for '{}' has {} dimensions, column expects {}",
                company.display_name(),
                actual,
                self.dimension
            )));
        }

        sqlx::query(
            r#"INSERT INTO companies (
                source_id, name, slug, website, "smallLogoUrl", "oneLiner", "longDescription",
                "teamSize", url, batch, tags, status, industries, regions, locations, badges,
                embedding
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"#,
        )
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.slug)
        .bind(&company.website)
        .bind(&company.small_logo_url)
        .bind(&company.one_liner)
        .bind(&company.long_description)
        .bind(company.team_size)
        .bind(&company.url)
        .bind(&company.batch)
        .bind(&company.tags)
        .bind(&company.status)
        .bind(&company.industries)
        .bind(&company.regions)
        .bind(&company.locations)
        .bind(&company.badges)
        .bind(embedding)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "companies",
            op = "store",
            company = %company.display_name(),
            "Company row inserted"
        );
        Ok(())
    }
}
