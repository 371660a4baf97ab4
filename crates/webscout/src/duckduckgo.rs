//! DuckDuckGo provider, scraping the static html endpoint.
//!
//! This is the preferred upstream: no API key, decent result quality, but
//! aggressive about rate limiting, so every call goes through the pacer and
//! the rotated identity headers.

use crate::config::SearchConfig;
use crate::extract::{extract_results, ResultSelectors};
use crate::pacing::RequestPacer;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT_ENCODING, REFERER, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use webscout_core::{Error, Result, SearchProvider, SearchQuery, SearchResult, MAX_RESULTS_CAP};

const ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);

pub const DUCKDUCKGO_SELECTORS: ResultSelectors = ResultSelectors {
    containers: &[".result"],
    title_link: &[".result__title a"],
    snippet: &[".result__snippet"],
};

pub struct DuckDuckGo {
    client: reqwest::Client,
    pacer: Arc<RequestPacer>,
    base_url: String,
    default_results: usize,
    snippet_cap: usize,
    debug: bool,
}

impl DuckDuckGo {
    pub fn new(client: reqwest::Client, pacer: Arc<RequestPacer>, cfg: &SearchConfig) -> Self {
        Self {
            client,
            pacer,
            base_url: ENDPOINT.to_string(),
            default_results: cfg.search_results_count,
            snippet_cap: cfg.search_result_max_length,
            debug: cfg.debug,
        }
    }

    /// Point the provider at a different endpoint (loopback test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(self.pacer.user_agent()));
        headers.insert(
            HeaderName::from_static("accept"),
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            HeaderName::from_static("accept-language"),
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
        headers.insert(
            HeaderName::from_static("connection"),
            HeaderValue::from_static("keep-alive"),
        );
        headers.insert(
            HeaderName::from_static("upgrade-insecure-requests"),
            HeaderValue::from_static("1"),
        );
        headers.insert(REFERER, HeaderValue::from_static("https://duckduckgo.com/"));
        for (k, v) in self.pacer.extra_headers() {
            headers.insert(HeaderName::from_static(k), HeaderValue::from_static(v));
        }
        // Inserted after the rotated extras so it overrides whatever encoding
        // they advertised: the html endpoint answers Brotli by default and the
        // body has to stay readable no matter what the rotation asked for.
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        headers
    }
}

#[async_trait::async_trait]
impl SearchProvider for DuckDuckGo {
    fn name(&self) -> &'static str {
        "DuckDuckGo"
    }

    async fn search(&self, q: &SearchQuery) -> Result<Vec<SearchResult>> {
        let max_results = q
            .max_results
            .unwrap_or(self.default_results)
            .min(MAX_RESULTS_CAP);

        self.pacer.acquire().await;

        // `b=` pins the first results page.
        let mut req = self
            .client
            .get(&self.base_url)
            .query(&[("q", q.query.as_str()), ("b", "")]);
        if let Some(df) = q.date_filter {
            req = req.query(&[("df", df.as_param())]);
        }

        let resp = req
            .headers(self.request_headers())
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Search(format!("DuckDuckGo request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Search(format!("DuckDuckGo answered HTTP {status}")));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| Error::Search(format!("DuckDuckGo body read failed: {e}")))?;
        if html.trim().is_empty() {
            return Err(Error::Search("empty response from DuckDuckGo".to_string()));
        }

        let origin = Url::parse(&self.base_url)
            .map_err(|e| Error::Search(format!("bad DuckDuckGo endpoint: {e}")))?;
        let results = extract_results(
            &html,
            &DUCKDUCKGO_SELECTORS,
            &origin,
            max_results,
            self.snippet_cap,
        );
        if self.debug {
            tracing::debug!(
                query = %q.query,
                count = results.len(),
                "DuckDuckGo search parsed"
            );
        }
        Ok(results)
    }
}
