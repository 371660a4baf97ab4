use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("search failed: {0}")]
    Search(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Hard cap on requested results, enforced before any network call.
pub const MAX_RESULTS_CAP: usize = 50;

/// Upstream date-range filter, carried on the wire as `d`/`w`/`m`/`y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFilter {
    #[serde(rename = "d")]
    Day,
    #[serde(rename = "w")]
    Week,
    #[serde(rename = "m")]
    Month,
    #[serde(rename = "y")]
    Year,
}

impl DateFilter {
    pub fn as_param(&self) -> &'static str {
        match self {
            DateFilter::Day => "d",
            DateFilter::Week => "w",
            DateFilter::Month => "m",
            DateFilter::Year => "y",
        }
    }
}

impl FromStr for DateFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "d" => Ok(DateFilter::Day),
            "w" => Ok(DateFilter::Week),
            "m" => Ok(DateFilter::Month),
            "y" => Ok(DateFilter::Year),
            other => Err(Error::InvalidQuery(format!(
                "date filter must be one of d/w/m/y, got {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: Option<usize>,
    pub date_filter: Option<DateFilter>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: None,
            date_filter: None,
        }
    }

    /// Rejects malformed requests before any network I/O.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidQuery(
                "query is required and cannot be empty".to_string(),
            ));
        }
        if let Some(n) = self.max_results {
            if n > MAX_RESULTS_CAP {
                return Err(Error::InvalidQuery(format!(
                    "maximum results cannot exceed {MAX_RESULTS_CAP}, got {n}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    /// Lower-cased, de-duplicated, ordered by descending frequency.
    pub keywords: Vec<String>,
    /// 1-3 sentences; always ends in terminal punctuation.
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub total_results: usize,
    /// Name of the provider that actually produced the results, possibly
    /// annotated when the primary was suspended.
    pub provider: String,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMetadata {
    pub domain: String,
    pub content_type: String,
    /// Byte length of the raw response body.
    pub length: usize,
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub url: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub metadata: PageMetadata,
}

/// Parse and validate a caller-supplied fetch URL. Only http(s) is reachable.
pub fn parse_http_url(raw: &str) -> Result<url::Url> {
    if raw.trim().is_empty() {
        return Err(Error::InvalidUrl("url is required".to_string()));
    }
    let u = url::Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
    match u.scheme() {
        "http" | "https" => Ok(u),
        other => Err(Error::InvalidUrl(format!("unsupported scheme: {other}"))),
    }
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(&self, q: &SearchQuery) -> Result<Vec<SearchResult>>;
}
