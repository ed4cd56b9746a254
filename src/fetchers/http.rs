//! HTTP fetcher family
//!
//! reqwest-backed fetchers covering the HTTP-class tiers (plain, mobile
//! emulation, minimal). Stealth parameters such as user-agent rotation are
//! confined here; the router never sees them. Browser-engine tiers are
//! expected to be registered by collaborating subsystems through the
//! registry builder.

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use tracing::debug;

use crate::{
    error::FetchError,
    fetchers::{Fetcher, TierOptions},
    routing::types::FetchedContent,
};

const DESKTOP_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0",
];

const MOBILE_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36",
];

/// Client emulation mode for one HTTP tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMode {
    /// Rotating desktop user agents, browser-like accept headers
    Desktop,
    /// Rotating mobile user agents
    Mobile,
    /// Bare GET, no identity headers beyond what reqwest sends
    Minimal,
}

/// HTTP fetch strategy backed by a shared reqwest client
pub struct HttpFetcher {
    client: reqwest::Client,
    mode: HttpMode,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, mode: HttpMode) -> Self {
        Self { client, mode }
    }

    fn build_headers(&self, options: &TierOptions) -> HeaderMap {
        let mut headers = HeaderMap::new();

        match self.mode {
            HttpMode::Desktop => {
                let mut rng = rand::rng();
                if let Some(ua) = DESKTOP_USER_AGENTS.choose(&mut rng).copied() {
                    headers.insert(USER_AGENT, HeaderValue::from_static(ua));
                }
                headers.insert(
                    ACCEPT,
                    HeaderValue::from_static(
                        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                    ),
                );
            }
            HttpMode::Mobile => {
                let mut rng = rand::rng();
                if let Some(ua) = MOBILE_USER_AGENTS.choose(&mut rng).copied() {
                    headers.insert(USER_AGENT, HeaderValue::from_static(ua));
                }
            }
            HttpMode::Minimal => {}
        }

        // Caller-supplied headers win over emulation defaults
        for (name, value) in &options.headers {
            let parsed_name = name.parse::<HeaderName>();
            let parsed_value = HeaderValue::from_str(value);
            if let (Ok(name), Ok(value)) = (parsed_name, parsed_value) {
                headers.insert(name, value);
            }
        }

        headers
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        match self.mode {
            HttpMode::Desktop => "http_desktop",
            HttpMode::Mobile => "http_mobile",
            HttpMode::Minimal => "http_minimal",
        }
    }

    async fn fetch(&self, url: &str, options: &TierOptions) -> Result<FetchedContent, FetchError> {
        let method = reqwest::Method::from_bytes(options.method.as_bytes())
            .map_err(|_| FetchError::Other(format!("invalid method '{}'", options.method)))?;

        let headers = self.build_headers(options);
        debug!(url = %url, method = %method, mode = ?self.mode, "Sending HTTP fetch");

        let response = self
            .client
            .request(method, url)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 403 || status.as_u16() == 429 {
            return Err(FetchError::Blocked(format!(
                "target answered {} for {}",
                status, url
            )));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let content = response.text().await?;
        Ok(FetchedContent {
            content,
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options() -> TierOptions {
        TierOptions {
            method: "GET".to_string(),
            headers: HashMap::new(),
            stealth_strength: 1,
            supports_js: false,
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(reqwest::Client::new(), HttpMode::Minimal);
        let result = fetcher
            .fetch(&format!("{}/page", server.uri()), &options())
            .await
            .unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.content, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_desktop_mode_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(reqwest::Client::new(), HttpMode::Desktop);
        fetcher.fetch(&server.uri(), &options()).await.unwrap();
    }

    #[tokio::test]
    async fn test_403_classified_as_blocked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(reqwest::Client::new(), HttpMode::Minimal);
        let err = fetcher.fetch(&server.uri(), &options()).await.unwrap_err();
        assert!(matches!(err, FetchError::Blocked(_)));
    }

    #[tokio::test]
    async fn test_500_classified_as_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(reqwest::Client::new(), HttpMode::Minimal);
        let err = fetcher.fetch(&server.uri(), &options()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500 }));
    }

    #[tokio::test]
    async fn test_caller_headers_override_emulation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::header("user-agent", "custom-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let mut opts = options();
        opts.headers
            .insert("user-agent".to_string(), "custom-agent".to_string());

        let fetcher = HttpFetcher::new(reqwest::Client::new(), HttpMode::Desktop);
        fetcher.fetch(&server.uri(), &opts).await.unwrap();
    }
}
