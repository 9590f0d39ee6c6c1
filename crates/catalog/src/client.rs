use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::{CatalogError, CatalogSnapshot};

/// HTTP client for the metrics catalog.
///
/// Used twice per process lifetime in a typical deployment: once at start-up to
/// pull the `/metrics` listing, then once per answered question to fetch data.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: Url,
}

impl CatalogClient {
    /// Build a client rooted at `base_url` (e.g. `http://dj:8000`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let base_url =
            Url::parse(base_url).map_err(|e| CatalogError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl(base_url.to_string()));
        }

        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET <catalog>/metrics`, decoded into an ordered snapshot.
    pub async fn fetch_snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        let url = endpoint(&self.base_url, &["metrics"])?;
        debug!(%url, "fetching catalog listing");

        let body = self.get_json(url).await?;
        let snapshot: CatalogSnapshot =
            serde_json::from_value(body).map_err(|e| CatalogError::Decode(e.to_string()))?;

        info!(metrics = snapshot.len(), "catalog snapshot loaded");
        Ok(snapshot)
    }

    /// `GET <catalog>/data/<metric>/?dimensions=..&filters=..`, returned verbatim.
    pub async fn fetch_data(
        &self,
        metric: &str,
        dimensions: &str,
        filters: &str,
    ) -> Result<Value, CatalogError> {
        let url = data_url(&self.base_url, metric, dimensions, filters)?;
        debug!(%url, "fetching metric data");
        self.get_json(url).await
    }

    async fn get_json(&self, url: Url) -> Result<Value, CatalogError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

/// Render the downstream data request for `metric`.
///
/// The metric becomes a percent-encoded path segment followed by a trailing
/// slash; dimensions and filters are passed as query values.
pub(crate) fn data_url(
    base: &Url,
    metric: &str,
    dimensions: &str,
    filters: &str,
) -> Result<Url, CatalogError> {
    let mut url = endpoint(base, &["data", metric, ""])?;
    url.query_pairs_mut()
        .append_pair("dimensions", dimensions)
        .append_pair("filters", filters);
    Ok(url)
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, CatalogError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| CatalogError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
