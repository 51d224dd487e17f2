//! Client side of the NVD CVE API.
//!
//! [`VulnerabilityApi`] is the seam the search engine talks to; [`NvdClient`]
//! is the HTTP implementation of it.

pub mod client;
pub mod error;
pub mod models;
pub mod params;

pub use client::{ClientOptions, NvdClient};
pub use error::{ApiError, ApiResult};
pub use models::{Cve, Description, Reference, Severity, SeverityScheme, Vulnerability, VulnerabilityPage};
pub use params::QueryParams;
pub use reqwest::StatusCode;

/// Remote query service for vulnerability records.
#[async_trait::async_trait]
pub trait VulnerabilityApi: Send + Sync {
    /// Filtered search with a flat, already normalized payload.
    async fn search(&self, params: &QueryParams) -> ApiResult<VulnerabilityPage>;

    /// Lookup by identifier. A miss is either an empty page or [`ApiError::NotFound`].
    async fn get_by_id(&self, id: &str) -> ApiResult<VulnerabilityPage>;

    /// Records published within the last `days` days.
    async fn recent(&self, days: u32) -> ApiResult<VulnerabilityPage>;
}
