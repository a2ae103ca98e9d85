//! Outbound HTTP with browser-like request headers.
//!
//! The [`PageFetcher`] trait is the seam between the extractors and the
//! network. [`HttpClient`] is the production implementation on top of
//! `reqwest`; tests script their own fetchers.
//!
//! # Request shape
//!
//! Every request carries the header set a desktop browser sends on a
//! top-level navigation: a User-Agent picked at random from a small pool,
//! `Accept`, `Accept-Language`, the `Sec-Fetch-*` hints and, when the caller
//! knows one, a `Referer` pointing at the site's landing page.

use rand::{rng, seq::IndexedRandom};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::FetchConfig;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:130.0) Gecko/20100101 Firefox/130.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36",
];

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Errors a single fetch attempt can end in.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("timed out fetching {url}")]
    Timeout { url: String },
    #[error("{url} unreachable: {reason}")]
    Unreachable { url: String, reason: String },
    #[error("request to {url} failed: {reason}")]
    Other { url: String, reason: String },
}

impl FetchError {
    /// Map a transport error onto the fetch taxonomy.
    pub fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        let url = url.to_string();
        if e.is_timeout() {
            FetchError::Timeout { url }
        } else if e.is_connect() {
            FetchError::Unreachable { url, reason: e.to_string() }
        } else if let Some(status) = e.status() {
            FetchError::Status { status: status.as_u16(), url }
        } else {
            FetchError::Other { url, reason: e.to_string() }
        }
    }
}

/// A page that came back with HTTP 200.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Something that can GET a page.
pub trait PageFetcher {
    async fn fetch(&self, url: &str, referer: Option<&str>) -> Result<FetchedPage, FetchError>;
}

/// `reqwest`-backed [`PageFetcher`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers(&config.accept_language))
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(Policy::limited(config.max_redirects))
            .build()?;
        Ok(Self { client })
    }
}

fn default_headers(accept_language: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    let language = HeaderValue::from_str(accept_language).unwrap_or_else(|_| {
        warn!(accept_language, "Invalid Accept-Language in config; using tr-TR");
        HeaderValue::from_static("tr-TR,tr;q=0.9")
    });
    headers.insert(header::ACCEPT_LANGUAGE, language);
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    headers
}

fn pick_user_agent() -> &'static str {
    USER_AGENTS.choose(&mut rng()).copied().unwrap_or(USER_AGENTS[0])
}

impl PageFetcher for HttpClient {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str, referer: Option<&str>) -> Result<FetchedPage, FetchError> {
        let t0 = Instant::now();
        let mut request = self
            .client
            .get(url)
            .header(header::USER_AGENT, pick_user_agent());
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        let status = response.status().as_u16();
        if status != 200 {
            debug!(%url, status, elapsed_ms = t0.elapsed().as_millis() as u64, "Non-200 response");
            return Err(FetchError::Status { status, url: url.to_string() });
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        debug!(
            %url,
            %final_url,
            status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(FetchedPage { url: final_url, status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers_look_like_a_browser() {
        let headers = default_headers("tr-TR,tr;q=0.9");
        assert_eq!(headers[header::ACCEPT_LANGUAGE], "tr-TR,tr;q=0.9");
        assert_eq!(headers["sec-fetch-mode"], "navigate");
        assert_eq!(headers["sec-fetch-dest"], "document");
        assert!(headers.contains_key(header::ACCEPT));
    }

    #[test]
    fn test_invalid_accept_language_falls_back() {
        let headers = default_headers("tr\nTR");
        assert_eq!(headers[header::ACCEPT_LANGUAGE], "tr-TR,tr;q=0.9");
    }

    #[test]
    fn test_user_agent_comes_from_pool() {
        for _ in 0..10 {
            assert!(USER_AGENTS.contains(&pick_user_agent()));
        }
    }

    #[test]
    fn test_client_builds_from_default_config() {
        assert!(HttpClient::new(&FetchConfig::default()).is_ok());
    }

    #[test]
    fn test_fetch_error_display() {
        let e = FetchError::Status { status: 403, url: "https://example.com".into() };
        assert_eq!(e.to_string(), "unexpected status 403 from https://example.com");
    }
}
