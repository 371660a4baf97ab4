//! Scrape-based web search aggregation.
//!
//! Two HTML search engines with no official API sit behind a single
//! search/fetch surface. The interesting parts are keeping the scrapers
//! alive and polite: outbound requests are paced and jittered
//! ([`pacing::RequestPacer`]), a failing primary is suspended with
//! exponential backoff while traffic falls back to the secondary
//! ([`router::SearchRouter`]), and result/page parsing works from ordered
//! selector-candidate lists so upstream markup drift degrades gracefully
//! ([`extract`]).

use std::time::Duration;

pub mod brave;
pub mod config;
pub mod duckduckgo;
pub mod extract;
pub mod fetch;
pub mod pacing;
pub mod router;
pub mod textprep;

pub use config::{PacerConfig, PrimaryProvider, SearchConfig, SuspensionConfig};
pub use fetch::PageFetcher;
pub use router::{PrimaryHealth, SearchRouter};
pub use webscout_core::{
    parse_http_url, DateFilter, Error, FetchResult, PageMetadata, Result, SearchProvider,
    SearchQuery, SearchResponse, SearchResult, MAX_RESULTS_CAP,
};

/// Shared HTTP client for providers and the page fetcher. Client-level
/// timeouts are a backstop; per-request timeouts still apply on top.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| Error::Fetch(e.to_string()))
}
