//! Primary/secondary routing with timed suspension of the primary.
//!
//! A failing primary is suspended for an exponentially growing window and
//! traffic falls back to the secondary. Zero results from a healthy response
//! never suspend anything: sparse queries are legitimate, and treating them
//! as rate limiting would knock the primary out on ordinary traffic.

use crate::brave::Brave;
use crate::config::{PrimaryProvider, SearchConfig};
use crate::duckduckgo::DuckDuckGo;
use crate::pacing::RequestPacer;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Semaphore;
use webscout_core::{
    Error, Result, SearchProvider, SearchQuery, SearchResponse, SearchResult, MAX_RESULTS_CAP,
};

/// Suspension state for the primary provider. One instance per process,
/// owned by the router; mutated only here.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryHealth {
    /// Epoch millis until which the primary is skipped. Only ever moves
    /// forward on a new suspension.
    pub suspended_until_ms: u64,
    /// Grows the backoff; reset by a primary success, which does not touch
    /// an already-set `suspended_until_ms`.
    pub consecutive_suspensions: u32,
}

pub struct SearchRouter {
    primary: Arc<dyn SearchProvider>,
    secondary: Arc<dyn SearchProvider>,
    health: Mutex<PrimaryHealth>,
    permits: Semaphore,
    cfg: SearchConfig,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

impl SearchRouter {
    pub fn new(
        primary: Arc<dyn SearchProvider>,
        secondary: Arc<dyn SearchProvider>,
        cfg: SearchConfig,
    ) -> Self {
        let permits = Semaphore::new(cfg.max_concurrent_requests.max(1));
        Self {
            primary,
            secondary,
            health: Mutex::new(PrimaryHealth::default()),
            permits,
            cfg,
        }
    }

    /// Assemble the standard provider pair: both scrapers share one HTTP
    /// client and one pacer, ordered by the configured primary choice.
    pub fn from_config(cfg: SearchConfig) -> Result<Self> {
        let client = crate::http_client()?;
        let pacer = Arc::new(RequestPacer::new(cfg.pacer.clone()));
        let ddg: Arc<dyn SearchProvider> =
            Arc::new(DuckDuckGo::new(client.clone(), pacer.clone(), &cfg));
        let brave: Arc<dyn SearchProvider> = Arc::new(Brave::new(client, pacer, &cfg));
        let (primary, secondary) = match cfg.primary {
            PrimaryProvider::DuckDuckGo => (ddg, brave),
            PrimaryProvider::Brave => (brave, ddg),
        };
        Ok(Self::new(primary, secondary, cfg))
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        query.validate()?;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::Search("concurrency limiter closed".to_string()))?;

        let mut q = query.clone();
        q.max_results = Some(
            q.max_results
                .unwrap_or(self.cfg.search_results_count)
                .min(MAX_RESULTS_CAP),
        );

        if let Some(remaining) = self.suspension_remaining() {
            tracing::debug!(
                provider = self.primary.name(),
                remaining_secs = remaining.as_secs(),
                "primary suspended, serving from secondary"
            );
            let results = self.secondary.search(&q).await?;
            let tag = format!(
                "{} ({} suspended)",
                self.secondary.name(),
                self.primary.name()
            );
            return Ok(self.response(&q, tag, results));
        }

        match self.primary.search(&q).await {
            Ok(results) => {
                // An empty list from a well-formed response is a legitimate
                // outcome, not a health signal.
                self.record_primary_success();
                Ok(self.response(&q, self.primary.name().to_string(), results))
            }
            Err(primary_err) => {
                let suspended_for = self.suspend_primary();
                tracing::warn!(
                    provider = self.primary.name(),
                    error = %primary_err,
                    suspended_secs = suspended_for.as_secs(),
                    "primary failed, suspending and falling back"
                );
                match self.secondary.search(&q).await {
                    Ok(results) => {
                        Ok(self.response(&q, self.secondary.name().to_string(), results))
                    }
                    Err(secondary_err) => Err(Error::Search(format!(
                        "all providers failed: {}: {primary_err}; {}: {secondary_err}",
                        self.primary.name(),
                        self.secondary.name()
                    ))),
                }
            }
        }
    }

    /// Current suspension state, for embedders that surface health.
    pub fn primary_health(&self) -> PrimaryHealth {
        *self.health.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn suspension_remaining(&self) -> Option<Duration> {
        let h = self.health.lock().unwrap_or_else(|e| e.into_inner());
        let now = now_ms();
        (now < h.suspended_until_ms).then(|| Duration::from_millis(h.suspended_until_ms - now))
    }

    fn record_primary_success(&self) {
        let mut h = self.health.lock().unwrap_or_else(|e| e.into_inner());
        h.consecutive_suspensions = 0;
    }

    /// Escalate the backoff and push the suspension window out. Returns the
    /// duration of the newly computed window.
    fn suspend_primary(&self) -> Duration {
        let mut h = self.health.lock().unwrap_or_else(|e| e.into_inner());
        h.consecutive_suspensions += 1;
        let exp = (h.consecutive_suspensions - 1).min(31);
        let multiplier = (1u64 << exp)
            .min(self.cfg.suspension.max_multiplier as u64)
            .max(1);
        let duration = self.cfg.suspension.base_duration * multiplier as u32;
        h.suspended_until_ms = h
            .suspended_until_ms
            .max(now_ms() + duration.as_millis() as u64);
        duration
    }

    fn response(
        &self,
        q: &SearchQuery,
        provider: String,
        results: Vec<SearchResult>,
    ) -> SearchResponse {
        SearchResponse {
            query: q.query.clone(),
            total_results: results.len(),
            provider,
            results,
        }
    }
}
