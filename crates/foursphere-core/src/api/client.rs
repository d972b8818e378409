//! HTTP client for the Foursquare venue search API.
//!
//! This module provides the `VenueSource` trait and the `FoursquareClient`
//! implementation that queries `venues/explore` around a coordinate.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::models::Coordinate;

use super::{FetchError, RawResponse};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the venue search API
pub const DEFAULT_BASE_URL: &str = "https://api.foursquare.com/v2";

/// API version date sent as the `v` parameter.
pub const DEFAULT_API_VERSION: &str = "20130815";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Path of the explore endpoint, relative to the base URL
const EXPLORE_PATH: &str = "venues/explore";

/// Something that can run a nearby-venue query.
///
/// Implementations issue exactly one request per call and never retry.
#[async_trait]
pub trait VenueSource: Send + Sync {
    async fn fetch_nearby(&self, at: Coordinate, query: &str) -> Result<RawResponse, FetchError>;
}

/// Connection settings for `FoursquareClient`.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_version: String,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: None,
            client_secret: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// API client for Foursquare venue search.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct FoursquareClient {
    client: Client,
    settings: ClientSettings,
}

impl FoursquareClient {
    /// Create a new API client
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.request_timeout).build()?;

        if settings.client_id.is_none() || settings.client_secret.is_none() {
            warn!("Venue source credentials are not configured; requests will likely be rejected");
        }

        Ok(Self { client, settings })
    }

    fn explore_url(&self) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), EXPLORE_PATH)
    }

    /// Build the query string for one explore request.
    fn query_params(&self, at: Coordinate, query: &str) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(6);
        if let Some(ref id) = self.settings.client_id {
            params.push(("client_id", id.clone()));
        }
        if let Some(ref secret) = self.settings.client_secret {
            params.push(("client_secret", secret.clone()));
        }
        params.push(("v", self.settings.api_version.clone()));
        params.push(("ll", at.to_query_value()));
        params.push(("venuePhotos", "1".to_string()));
        params.push(("query", query.to_string()));
        params
    }

    /// Turn a non-success HTTP reply into an error, preferring the API's own
    /// `meta` block when the body carries one.
    fn rejection(status: reqwest::StatusCode, body: &str) -> FetchError {
        if let Ok(raw) = RawResponse::from_json_str(body) {
            if let Some(code) = raw.meta_code() {
                return FetchError::ServerRejected {
                    code,
                    detail: raw.error_detail().unwrap_or_default().to_string(),
                };
            }
        }
        FetchError::from_status(status, body)
    }
}

#[async_trait]
impl VenueSource for FoursquareClient {
    async fn fetch_nearby(&self, at: Coordinate, query: &str) -> Result<RawResponse, FetchError> {
        let url = self.explore_url();
        debug!(url = %url, ll = %at.to_query_value(), query = query, "Fetching nearby venues");

        let response = self
            .client
            .get(&url)
            .query(&self.query_params(at, query))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Self::rejection(status, &body));
        }

        let raw = RawResponse::from_json_str(&body)?;
        if raw.is_success() {
            debug!(bytes = body.len(), "Venue response received");
            return Ok(raw);
        }
        match raw.meta_code() {
            Some(code) => Err(FetchError::ServerRejected {
                detail: raw.error_detail().unwrap_or_default().to_string(),
                code,
            }),
            None => Err(FetchError::Malformed("missing meta.code".to_string())),
        }
    }
}
