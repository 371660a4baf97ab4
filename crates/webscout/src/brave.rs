//! Brave Search provider, scraping the public results page.
//!
//! Serves as the fallback when the preferred upstream is suspended. Brave
//! shuffles its result markup between several shapes, hence the longer
//! selector candidate lists.

use crate::config::SearchConfig;
use crate::extract::{extract_results, ResultSelectors};
use crate::pacing::RequestPacer;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use webscout_core::{Error, Result, SearchProvider, SearchQuery, SearchResult, MAX_RESULTS_CAP};

const ENDPOINT: &str = "https://search.brave.com/search";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);

pub const BRAVE_SELECTORS: ResultSelectors = ResultSelectors {
    containers: &[
        ".snippet",
        ".web-result",
        ".result",
        "#results .fdb",
        "div[data-type='web']",
    ],
    title_link: &["h3 a", ".title a", ".result-title a", "a[href]"],
    snippet: &[".snippet-description", ".description", ".snippet-content", "p"],
};

pub struct Brave {
    client: reqwest::Client,
    pacer: Arc<RequestPacer>,
    base_url: String,
    default_results: usize,
    snippet_cap: usize,
    debug: bool,
}

impl Brave {
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
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            HeaderName::from_static("accept-language"),
            HeaderValue::from_static("en-US,en;q=0.5"),
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
        headers
    }
}

/// Rewrite grouped `site:` boolean-OR syntax into the form Brave accepts.
/// Queries enhanced for the preferred upstream arrive as
/// `term (site:a.com OR site:b.com)`; Brave wants the bare form.
fn normalize_site_groups(query: &str) -> String {
    if query.contains("site:") {
        query.replace("(site:", "site:").replace(')', "")
    } else {
        query.to_string()
    }
}

#[async_trait::async_trait]
impl SearchProvider for Brave {
    fn name(&self) -> &'static str {
        "Brave"
    }

    async fn search(&self, q: &SearchQuery) -> Result<Vec<SearchResult>> {
        let max_results = q
            .max_results
            .unwrap_or(self.default_results)
            .min(MAX_RESULTS_CAP);
        let query = normalize_site_groups(&q.query);

        self.pacer.acquire().await;

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", query.as_str())])
            .headers(self.request_headers())
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Search(format!("Brave request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Search(format!("Brave answered HTTP {status}")));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| Error::Search(format!("Brave body read failed: {e}")))?;
        if html.trim().is_empty() {
            return Err(Error::Search("empty response from Brave".to_string()));
        }

        let origin = Url::parse(&self.base_url)
            .map_err(|e| Error::Search(format!("bad Brave endpoint: {e}")))?;
        let results = extract_results(
            &html,
            &BRAVE_SELECTORS,
            &origin,
            max_results,
            self.snippet_cap,
        );
        if self.debug {
            tracing::debug!(query = %q.query, count = results.len(), "Brave search parsed");
        }
        Ok(results)
    }
}
