//! HTTP client for the paginated company catalog.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, info};

use catalog_core::{defaults, CatalogPage, CatalogSource, Error, Result};

/// Configuration for [`HttpCatalogSource`].
#[derive(Debug, Clone)]
pub struct CatalogSourceConfig {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for CatalogSourceConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::CATALOG_TIMEOUT_SECS,
        }
    }
}

impl CatalogSourceConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CATALOG_TIMEOUT` | `60` | Page request timeout (seconds) |
    pub fn from_env() -> Self {
        Self {
            timeout_seconds: std::env::var("CATALOG_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::CATALOG_TIMEOUT_SECS),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Fetches catalog pages with HTTP GET.
///
/// A `nextPage` given as a relative reference is resolved against the URL of
/// the page that carried it, so callers always receive absolute locators.
pub struct HttpCatalogSource {
    client: Client,
}

impl HttpCatalogSource {
    pub fn new(config: CatalogSourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(CatalogSourceConfig::from_env())
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_page(&self, locator: &str) -> Result<CatalogPage> {
        let start = Instant::now();
        let url = Url::parse(locator)
            .map_err(|e| Error::PageFetch(format!("invalid page locator '{}': {}", locator, e)))?;

        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::PageFetch(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::PageFetch(format!(
                "GET {} returned {}",
                url,
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::PageFetch(format!("reading {} failed: {}", url, e)))?;
        let mut page: CatalogPage = serde_json::from_slice(&body)
            .map_err(|e| Error::PageFetch(format!("malformed page from {}: {}", url, e)))?;

        page.next_page = match page.next_page.take().filter(|n| !n.is_empty()) {
            Some(next) => Some(resolve_locator(&url, &next)?),
            None => None,
        };

        debug!(
            subsystem = "pipeline",
            component = "catalog",
            op = "fetch_page",
            locator = %url,
            companies = page.companies.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Page fetched"
        );
        Ok(page)
    }
}

fn resolve_locator(base: &Url, next: &str) -> Result<String> {
    let resolved = base
        .join(next)
        .map_err(|e| Error::PageFetch(format!("invalid next page '{}': {}", next, e)))?;
    if resolved.as_str() != next {
        info!(
            subsystem = "pipeline",
            component = "catalog",
            next = %next,
            resolved = %resolved,
            "Resolved relative next page"
        );
    }
    Ok(resolved.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CatalogSourceConfig::default();
        assert_eq!(config.timeout_seconds, 60);
        assert_eq!(config.with_timeout_seconds(5).timeout_seconds, 5);
    }

    #[test]
    fn test_resolve_relative_and_absolute_locators() {
        let base = Url::parse("https://catalog.test/v0.1/companies?page=1").unwrap();

        assert_eq!(
            resolve_locator(&base, "companies?page=2").unwrap(),
            "https://catalog.test/v0.1/companies?page=2"
        );
        assert_eq!(
            resolve_locator(&base, "/v0.1/companies?page=3").unwrap(),
            "https://catalog.test/v0.1/companies?page=3"
        );
        assert_eq!(
            resolve_locator(&base, "https://other.test/p?page=4").unwrap(),
            "https://other.test/p?page=4"
        );
    }

    #[tokio::test]
    async fn test_invalid_locator_is_page_fetch_error() {
        let source = HttpCatalogSource::new(CatalogSourceConfig::default()).unwrap();
        let err = source.fetch_page("not a url").await.unwrap_err();
        assert!(matches!(err, Error::PageFetch(_)));
    }
}
