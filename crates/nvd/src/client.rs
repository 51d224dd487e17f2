use crate::error::{ApiError, ApiResult};
use crate::models::VulnerabilityPage;
use crate::params::QueryParams;
use crate::VulnerabilityApi;
use chrono::{TimeDelta, Utc};
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://services.nvd.nist.gov/rest/json/cves/2.0";

/// The service rejects published-date windows wider than this.
pub const MAX_RECENT_DAYS: u32 = 120;

const API_KEY_HEADER: &str = "apiKey";
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Transport-level timeout. `None` waits for the server indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NvdClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl NvdClient {
    pub fn new(opts: ClientOptions) -> ApiResult<Self> {
        let base_url = Url::parse(&opts.base_url).map_err(|e| ApiError::InvalidBaseUrl {
            url: opts.base_url.clone(),
            reason: e.to_string(),
        })?;

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("vulnwatch/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            api_key: opts.api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    async fn fetch(&self, pairs: &[(String, String)]) -> ApiResult<VulnerabilityPage> {
        debug!("GET {} {:?}", self.base_url, pairs);

        let mut request = self.http.get(self.base_url.clone()).query(pairs);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("vulnerability service responded with {status}");
            return Err(ApiError::Status { status, body });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait::async_trait]
impl VulnerabilityApi for NvdClient {
    async fn search(&self, params: &QueryParams) -> ApiResult<VulnerabilityPage> {
        self.fetch(&params.to_query_pairs()).await
    }

    async fn get_by_id(&self, id: &str) -> ApiResult<VulnerabilityPage> {
        let pairs = [("cveId".to_string(), id.to_string())];
        match self.fetch(&pairs).await {
            Err(ApiError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                Err(ApiError::NotFound { id: id.to_string() })
            }
            other => other,
        }
    }

    async fn recent(&self, days: u32) -> ApiResult<VulnerabilityPage> {
        let clamped = days.clamp(1, MAX_RECENT_DAYS);
        if clamped != days {
            warn!("recent window of {days} days clamped to {clamped}");
        }

        let end = Utc::now();
        let start = end - TimeDelta::days(i64::from(clamped));
        let pairs = [
            ("pubStartDate".to_string(), start.format(DATE_FORMAT).to_string()),
            ("pubEndDate".to_string(), end.format(DATE_FORMAT).to_string()),
        ];
        self.fetch(&pairs).await
    }
}
