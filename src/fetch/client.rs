// Page fetcher: plain HTTP GETs carrying a fixed browser identity.
//
// The fetcher knows nothing about pacing or status handling; it reports the
// status code and body and lets the ingestor decide what a non-200 means.
// The PageFetcher trait is the seam tests use to serve canned HTML.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use tracing::debug;

use crate::config::SiteConfig;

/// Raw response from a page fetch.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Anything that can GET a page. Transport failures are `Err`; HTTP error
/// statuses are `Ok` with the status set.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// reqwest-backed fetcher sending the configured user agent and session cookie.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(site: &SiteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        if !site.cookie.is_empty() {
            let cookie =
                HeaderValue::from_str(&site.cookie).context("THREADWATCH_COOKIE is not a valid header value")?;
            headers.insert(COOKIE, cookie);
        }

        let client = reqwest::Client::builder()
            .user_agent(site.user_agent.clone())
            .default_headers(headers)
            .timeout(site.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        debug!(url = url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request failed: {url}"))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {url}"))?;

        Ok(FetchedPage { status, body })
    }
}
