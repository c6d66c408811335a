//! EDGAR registry access
//!
//! Provides:
//! - The `RecordFetcher` abstraction used by the ingestion pipeline
//! - A rate-limited HTTP client for the submissions endpoint

use crate::config::RegistryConfig;
use crate::db::models::{Cik, CompanySubmission};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use std::num::NonZeroU32;
use tracing::debug;

/// Result of a registry lookup that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Found(Box<CompanySubmission>),
    /// The registry has no record for this identifier
    NotFound { url: String },
}

/// Trait for retrieving one company's submissions document
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    /// `Ok(Fetched::NotFound)` is the only non-fatal miss; every `Err` aborts ingestion.
    async fn fetch(&self, cik: Cik) -> Result<Fetched>;
}

#[async_trait]
impl<T: RecordFetcher + ?Sized> RecordFetcher for std::sync::Arc<T> {
    async fn fetch(&self, cik: Cik) -> Result<Fetched> {
        (**self).fetch(cik).await
    }
}

/// Submissions endpoint client
pub struct EdgarClient {
    http: reqwest::Client,
    url_template: String,
    limiter: DefaultDirectRateLimiter,
}

impl EdgarClient {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let per_second = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            AppError::InvalidFormat {
                message: "registry.requests_per_second must be greater than zero".to_string(),
            }
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            url_template: config.submissions_url.clone(),
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    /// Submissions URL for a CIK
    pub fn submissions_url(&self, cik: Cik) -> String {
        submissions_url(&self.url_template, cik)
    }
}

/// Substitute the padded CIK into a URL template
pub fn submissions_url(template: &str, cik: Cik) -> String {
    template.replace("{cik}", &cik.padded())
}

#[async_trait]
impl RecordFetcher for EdgarClient {
    async fn fetch(&self, cik: Cik) -> Result<Fetched> {
        self.limiter.until_ready().await;

        let url = self.submissions_url(cik);
        debug!(%url, "Fetching submissions");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(Fetched::NotFound { url });
        }

        if !status.is_success() {
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        let submission: CompanySubmission = serde_json::from_slice(&body)?;

        Ok(Fetched::Found(Box::new(submission)))
    }
}
