use crate::cache::RelationPageCache;
use crate::config::Config;
use crate::error::{RelkitError, Result};
use crate::relations::{
    ListRequest, PaginationMeta, RelationCandidate, RelationPage, RelationSearchService, SearchRequest,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Response body of both relation endpoints
#[derive(Deserialize)]
struct RelationsResponse {
    #[serde(default)]
    results: Vec<RelationResult>,
    #[serde(default)]
    pagination: Option<WirePagination>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePagination {
    page: u32,
    page_count: u32,
}

/// A related record; everything besides id and publication date is kept
/// so the configured main field can be read from it.
#[derive(Deserialize)]
struct RelationResult {
    id: Value,
    #[serde(rename = "publishedAt", default)]
    published_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl RelationResult {
    fn into_candidate(self, main_field: Option<&str>) -> RelationCandidate {
        let id = scalar_to_string(&self.id).unwrap_or_else(|| self.id.to_string());
        let display_label = main_field
            .and_then(|field| self.fields.get(field))
            .and_then(scalar_to_string)
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| id.clone());

        RelationCandidate {
            id,
            display_label,
            published: self.published_at.is_some(),
        }
    }
}

impl RelationsResponse {
    fn into_page(self, main_field: Option<&str>) -> RelationPage {
        RelationPage {
            results: self
                .results
                .into_iter()
                .map(|r| r.into_candidate(main_field))
                .collect(),
            // an empty result set reports pageCount 0
            pagination: self.pagination.map(|p| PaginationMeta {
                page: p.page.max(1),
                page_count: p.page_count.max(p.page.max(1)),
            }),
        }
    }
}

/// Content-manager relation endpoints over HTTP
///
/// Retries 429 and 5xx responses with exponential backoff and optionally
/// serves repeated requests from an LRU page cache.
pub struct HttpRelationService {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
    max_retries: usize,
    retry_base_delay: Duration,
    cache: Option<Arc<RelationPageCache>>,
}

impl HttpRelationService {
    /// Create a client for the admin API
    ///
    /// # Arguments
    /// * `base_url` - Admin root, e.g. `http://localhost:1337/admin`
    /// * `api_token` - Sent as a bearer token when present
    /// * `timeout` - Per-request timeout
    ///
    /// # Returns
    /// The service with 2 retries and no cache, or `RelkitError::Config` for
    /// a URL that cannot carry a path
    pub fn new(base_url: &str, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RelkitError::Config(format!("Invalid base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(RelkitError::Config(format!("Base URL cannot have paths: {}", base_url)));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            api_token,
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
            cache: None,
        })
    }

    /// Build from configuration: token from the configured env var, cache if capacity > 0
    pub fn from_config(config: &Config) -> Result<Self> {
        let service = Self::new(&config.api.base_url, config.api_token(), config.request_timeout())?
            .with_retry_policy(config.api.max_retries, Duration::from_millis(500));

        if config.cache.capacity > 0 {
            Ok(service.with_cache(Arc::new(RelationPageCache::new(config.cache.capacity))))
        } else {
            Ok(service)
        }
    }

    pub fn with_cache(mut self, cache: Arc<RelationPageCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_retry_policy(mut self, max_retries: usize, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RelkitError::Config(format!("Base URL cannot have paths: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["content-manager", "relations"])
            .extend(segments);
        Ok(url)
    }

    /// `GET /content-manager/relations/{model}/{field}?_q&page&pageSize&id`
    pub fn search_url(&self, request: &SearchRequest) -> Result<Url> {
        let mut url = self.endpoint(&[request.model.as_str(), request.attribute_name.as_str()])?;
        url.query_pairs_mut()
            .append_pair("_q", &request.query_text)
            .append_pair("page", &request.page.to_string())
            .append_pair("pageSize", &request.page_size.to_string())
            .append_pair("id", &request.parent_id);
        Ok(url)
    }

    /// `GET /content-manager/relations/{model}/{id}/{field}?page&pageSize`
    pub fn list_url(&self, request: &ListRequest) -> Result<Url> {
        let mut url = self.endpoint(&[
            request.model.as_str(),
            request.parent_id.as_str(),
            request.attribute_name.as_str(),
        ])?;
        url.query_pairs_mut()
            .append_pair("page", &request.page.to_string())
            .append_pair("pageSize", &request.page_size.to_string());
        Ok(url)
    }

    async fn fetch_page(&self, url: Url, main_field: Option<&str>, cacheable: bool) -> Result<RelationPage> {
        let key = match main_field {
            Some(field) => format!("{}#{}", url, field),
            None => url.to_string(),
        };
        let cache = self.cache.as_ref().filter(|_| cacheable);
        if let Some(cache) = cache {
            if let Some(cached) = cache.get(&key) {
                log::debug!("Cache hit for {}", key);
                return Ok(cached);
            }
        }

        let page = self.get_with_retry(&url).await?.into_page(main_field);

        if let Some(cache) = cache {
            cache.put(key, page.clone());
        }
        Ok(page)
    }

    async fn get_with_retry(&self, url: &Url) -> Result<RelationsResponse> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = self.retry_base_delay;

        loop {
            match self.get_once(url).await {
                Ok(response) => {
                    log::debug!("GET {} took {:?} (attempt {})", url, start.elapsed(), attempt + 1);
                    return Ok(response);
                }
                Err(e) if attempt < self.max_retries && e.is_retryable() => {
                    log::warn!("Retry {}/{} after error: {}", attempt + 1, self.max_retries, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &Url) -> Result<RelationsResponse> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(RelkitError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl RelationSearchService for HttpRelationService {
    async fn search(&self, request: &SearchRequest) -> Result<RelationPage> {
        let url = self.search_url(request)?;
        self.fetch_page(url, request.main_field.as_deref(), true).await
    }

    /// Attached relations change on every save, so they always go to the server.
    async fn list_attached(&self, request: &ListRequest) -> Result<RelationPage> {
        let url = self.list_url(request)?;
        self.fetch_page(url, request.main_field.as_deref(), false).await
    }
}
