//! Full-page content fetch.
//!
//! Single upstream, no fallback: the caller named the URL, so an unreachable
//! page surfaces directly instead of being routed around. Parsing is
//! best-effort; a page we cannot make sense of yields placeholder fields,
//! not an error.

use crate::config::SearchConfig;
use crate::extract::{extract_main_content, extract_title};
use crate::textprep::{self, domain_of};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, LAST_MODIFIED, USER_AGENT};
use scraper::Html;
use std::time::Duration;
use webscout_core::{parse_http_url, Error, FetchResult, PageMetadata, Result};

const FETCH_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Hard bound on the whole network exchange, independent of pacer delays
/// elsewhere; a hung upstream must not pin the caller.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct PageFetcher {
    client: reqwest::Client,
    max_content_chars: usize,
    debug: bool,
}

impl PageFetcher {
    pub fn new(cfg: &SearchConfig) -> Result<Self> {
        Ok(Self::with_client(crate::http_client()?, cfg))
    }

    pub fn with_client(client: reqwest::Client, cfg: &SearchConfig) -> Self {
        Self {
            client,
            max_content_chars: cfg.fetch_result_max_length,
            debug: cfg.debug,
        }
    }

    pub async fn fetch(&self, raw_url: &str) -> Result<FetchResult> {
        let url = parse_http_url(raw_url)?;

        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, FETCH_USER_AGENT)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("HTTP {status}")));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        let last_modified = resp
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let html = resp
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("body read failed: {e}")))?;
        if html.is_empty() {
            return Err(Error::Fetch("empty response body".to_string()));
        }
        let byte_len = html.len();

        let doc = Html::parse_document(&html);
        let title = extract_title(&doc);
        let content = extract_main_content(&doc, self.max_content_chars);
        let keywords = textprep::page_keywords(&title, &content);
        let summary = textprep::page_summary(&title, &content, raw_url);

        if self.debug {
            tracing::debug!(
                url = raw_url,
                bytes = byte_len,
                content_chars = content.chars().count(),
                "page fetched"
            );
        }

        Ok(FetchResult {
            url: raw_url.to_string(),
            title,
            content,
            summary,
            keywords,
            metadata: PageMetadata {
                domain: domain_of(raw_url),
                content_type,
                length: byte_len,
                last_modified,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_urls_are_rejected_before_any_request() {
        let fetcher = PageFetcher::new(&SearchConfig::default()).unwrap();
        for bad in ["", "not a url", "ftp://example.com/file", "file:///etc/hosts"] {
            let err = fetcher.fetch(bad).await.unwrap_err();
            assert!(matches!(err, Error::InvalidUrl(_)), "expected InvalidUrl for {bad:?}");
        }
    }
}
