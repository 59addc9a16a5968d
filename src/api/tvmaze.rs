//! TVmaze API client
//!
//! Thin transport over the public TVmaze REST API. Each call returns the
//! decoded payload together with the response status and headers; retries
//! and state live in the request layer, not here.
//! API docs: https://www.tvmaze.com/api

use anyhow::Result;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use crate::models::{CastMember, CrewMember, Episode, SearchHit, Season, Show};
use crate::net::{NetResult, RequestCtx, TransportError};

pub const DEFAULT_BASE_URL: &str = "https://api.tvmaze.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// TVmaze API client
#[derive(Debug, Clone)]
pub struct TvMazeClient {
    base_url: String,
    client: reqwest::Client,
    token: Option<String>,
}

impl Default for TvMazeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TvMazeClient {
    /// Client for the public API with the default timeout
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_options(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_options(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `endpoint`, honoring the context's cancellation token and headers
    async fn get<T: DeserializeOwned>(&self, endpoint: &str, ctx: &RequestCtx) -> Result<NetResult<T>> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%url, "GET");

        let mut request = self.client.get(&url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        for (name, value) in &ctx.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let send = fetch(request);

        match &ctx.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(TransportError::Aborted.into()),
                result = send => result,
            },
            None => send.await,
        }
    }

    /// One page of the full show index (`/shows?page=N`, 250 per page)
    pub async fn shows_page(&self, page: u32, ctx: &RequestCtx) -> Result<NetResult<Vec<Show>>> {
        self.get(&format!("/shows?page={}", page), ctx).await
    }

    /// Fuzzy show search. A blank query returns no hits without a request.
    pub async fn search_shows(
        &self,
        query: &str,
        page: u32,
        ctx: &RequestCtx,
    ) -> Result<NetResult<Vec<SearchHit>>> {
        if query.trim().is_empty() {
            return Ok(NetResult::new(Vec::new(), 200));
        }
        let endpoint = format!(
            "/search/shows?q={}&page={}",
            urlencoding::encode(query),
            page
        );
        self.get(&endpoint, ctx).await
    }

    pub async fn show(&self, id: u64, ctx: &RequestCtx) -> Result<NetResult<Show>> {
        self.get(&format!("/shows/{}", id), ctx).await
    }

    pub async fn seasons(&self, id: u64, ctx: &RequestCtx) -> Result<NetResult<Vec<Season>>> {
        self.get(&format!("/shows/{}/seasons", id), ctx).await
    }

    pub async fn show_episodes(&self, id: u64, ctx: &RequestCtx) -> Result<NetResult<Vec<Episode>>> {
        self.get(&format!("/shows/{}/episodes", id), ctx).await
    }

    pub async fn season_episodes(
        &self,
        season_id: u64,
        ctx: &RequestCtx,
    ) -> Result<NetResult<Vec<Episode>>> {
        self.get(&format!("/seasons/{}/episodes", season_id), ctx).await
    }

    pub async fn cast(&self, id: u64, ctx: &RequestCtx) -> Result<NetResult<Vec<CastMember>>> {
        self.get(&format!("/shows/{}/cast", id), ctx).await
    }

    pub async fn crew(&self, id: u64, ctx: &RequestCtx) -> Result<NetResult<Vec<CrewMember>>> {
        self.get(&format!("/shows/{}/crew", id), ctx).await
    }
}

/// Send the request and decode a successful JSON body
async fn fetch<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<NetResult<T>> {
    let response = request.send().await.map_err(TransportError::from)?;
    let status = response.status();

    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
        .into());
    }

    let headers: HashMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
        .collect();

    let body = response.text().await.map_err(TransportError::from)?;
    let data: T = serde_json::from_str(&body)
        .map_err(|e| TransportError::InvalidResponse(format!("JSON parse error: {}", e)))?;

    Ok(NetResult::new(data, status.as_u16()).with_headers(headers))
}
