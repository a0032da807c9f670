// src/fetch/client.rs
use crate::utils::error::FetchError;
use reqwest::header;
use std::time::Duration;
use url::Url;

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; BlogMigrator/1.0)";
const ACCEPT: &str = "text/html,application/xhtml+xml,*/*";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
/// Politeness delay between two requests to the same blog.
pub const DEFAULT_DELAY_MS: u64 = 500;

/// Raw page plus the URL it was finally served from, after redirects.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    pub final_url: String,
}

/// Turns user-entered blog URLs into absolute ones: adds `https://` when no
/// scheme is given and strips a leading `www.` (the server redirects back if needed).
pub fn normalize_url(raw: &str) -> Result<String, FetchError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FetchError::InvalidUrl("empty URL".to_string()));
    }
    let lower = raw.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;
    if let Some(host) = url.host_str().map(str::to_string) {
        if let Some(bare) = host.strip_prefix("www.").filter(|h| !h.is_empty()) {
            url.set_host(Some(bare))
                .map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;
        }
    }
    Ok(url.to_string())
}

/// Fetch collaborator: one reqwest client, shared between sequential requests.
pub struct PageFetcher {
    client: reqwest::Client,
    timeout: Duration,
    delay: Duration,
}

impl PageFetcher {
    pub fn new(timeout_secs: u64, delay_ms: u64) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client, timeout, delay: Duration::from_millis(delay_ms) })
    }

    /// Downloads one page over http(s), following redirects.
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!("only http/https URLs are allowed: {url}")));
        }

        tracing::info!("Fetching page: {}", url);
        tracing::debug!("Using User-Agent: {}", USER_AGENT);

        let response = self
            .client
            .get(parsed)
            .header(header::ACCEPT, ACCEPT)
            .send()
            .await
            .map_err(|e| self.classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            return Err(FetchError::Http { status, url: url.to_string() });
        }

        let final_url = response.url().to_string();
        if final_url != url {
            tracing::debug!("Redirected to {}", final_url);
        }
        let html = response.text().await.map_err(|e| self.classify_error(url, e))?;
        tracing::debug!("Downloaded {} bytes from {}", html.len(), final_url);

        Ok(FetchedPage { html, final_url })
    }

    /// Waits out the inter-request delay.
    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn classify_error(&self, url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            tracing::warn!("Request timed out: {}", url);
            FetchError::Timeout { url: url.to_string(), seconds: self.timeout.as_secs() }
        } else {
            FetchError::Network(error)
        }
    }
}
