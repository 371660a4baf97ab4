//! Outbound request pacing for one upstream pool.
//!
//! Scrape endpoints ban clients that hit them in a detectable rhythm. The
//! pacer spaces requests out (minimum gap + sliding-window cap), adds random
//! jitter so the interval is not constant, and rotates the client identity
//! headers between requests.

use crate::config::PacerConfig;
use rand::Rng;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::time::{sleep, sleep_until, Duration, Instant};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

#[derive(Debug, Default)]
struct CadenceState {
    last_request: Option<Instant>,
    /// Time-ordered log of recent requests; entries older than the window
    /// are evicted lazily on the next acquire.
    recent: VecDeque<Instant>,
}

/// Shared by every caller that talks to the same upstream pool. One instance
/// per process; cadence state lives behind a mutex so concurrent callers
/// serialize through the policy.
#[derive(Debug)]
pub struct RequestPacer {
    cfg: PacerConfig,
    state: Mutex<CadenceState>,
    request_counter: AtomicU64,
}

impl RequestPacer {
    pub fn new(cfg: PacerConfig) -> Self {
        Self {
            cfg,
            state: Mutex::new(CadenceState::default()),
            request_counter: AtomicU64::new(0),
        }
    }

    /// Suspends the calling task until the next request is safe to issue,
    /// then records it. The mutex is held across the sleeps: that is what
    /// serializes concurrent callers through the same cadence log.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        while let Some(&oldest) = state.recent.front() {
            if now.duration_since(oldest) > self.cfg.window {
                state.recent.pop_front();
            } else {
                break;
            }
        }

        if state.recent.len() >= self.cfg.max_per_window {
            if let Some(&oldest) = state.recent.front() {
                sleep_until(oldest + self.cfg.window + self.cfg.margin).await;
            }
        }

        if let Some(last) = state.last_request {
            // sleep_until with a past deadline returns immediately.
            sleep_until(last + self.cfg.min_delay).await;
        }

        let jitter_ms = self.cfg.jitter_max.as_millis() as u64;
        if jitter_ms > 0 {
            let delay = {
                let mut rng = rand::rng();
                rng.random_range(0..jitter_ms)
            };
            sleep(Duration::from_millis(delay)).await;
        }

        let now = Instant::now();
        state.last_request = Some(now);
        state.recent.push_back(now);
        self.request_counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Rotating client identity, round-robin over the request counter.
    pub fn user_agent(&self) -> &'static str {
        let n = self.request_counter.load(Ordering::Relaxed) as usize;
        USER_AGENTS[n % USER_AGENTS.len()]
    }

    /// Supplementary browser-ish headers. A couple of entries are included
    /// by independent coin flips so the header set is not a static
    /// fingerprint across requests.
    pub fn extra_headers(&self) -> BTreeMap<&'static str, &'static str> {
        let mut headers = BTreeMap::new();
        headers.insert(
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        );
        headers.insert("accept-language", "en-US,en;q=0.5");
        headers.insert("accept-encoding", "gzip, deflate, br");
        headers.insert("connection", "keep-alive");
        headers.insert("upgrade-insecure-requests", "1");
        headers.insert("sec-fetch-dest", "document");
        headers.insert("sec-fetch-mode", "navigate");
        headers.insert("sec-fetch-site", "none");

        let mut rng = rand::rng();
        if rng.random_bool(0.5) {
            headers.insert("dnt", "1");
        }
        if rng.random_bool(0.3) {
            headers.insert("cache-control", "max-age=0");
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn quiet_cfg() -> PacerConfig {
        PacerConfig {
            min_delay: Duration::ZERO,
            window: Duration::from_secs(60),
            max_per_window: 100,
            margin: Duration::from_secs(1),
            jitter_max: Duration::ZERO,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn enforces_minimum_gap_between_acquisitions() {
        let pacer = RequestPacer::new(PacerConfig {
            min_delay: Duration::from_millis(2000),
            jitter_max: Duration::ZERO,
            ..quiet_cfg()
        });

        let t0 = Instant::now();
        pacer.acquire().await;
        pacer.acquire().await;
        pacer.acquire().await;
        assert!(
            t0.elapsed() >= Duration::from_millis(4000),
            "three acquisitions must span at least two min-delay gaps, got {:?}",
            t0.elapsed()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn window_cap_blocks_until_oldest_entry_ages_out() {
        let pacer = RequestPacer::new(PacerConfig {
            min_delay: Duration::ZERO,
            window: Duration::from_secs(10),
            max_per_window: 2,
            margin: Duration::from_secs(1),
            jitter_max: Duration::ZERO,
        });

        let t0 = Instant::now();
        pacer.acquire().await;
        pacer.acquire().await;
        assert!(t0.elapsed() < Duration::from_secs(1));

        // Third acquisition has to wait out the first entry plus the margin.
        pacer.acquire().await;
        assert!(
            t0.elapsed() >= Duration::from_secs(11),
            "expected window+margin wait, got {:?}",
            t0.elapsed()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn jitter_stays_within_its_bound() {
        let pacer = RequestPacer::new(PacerConfig {
            min_delay: Duration::ZERO,
            jitter_max: Duration::from_millis(3000),
            ..quiet_cfg()
        });

        for _ in 0..10 {
            let t0 = Instant::now();
            pacer.acquire().await;
            assert!(t0.elapsed() < Duration::from_millis(3000));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_serialize_through_the_policy() {
        let pacer = Arc::new(RequestPacer::new(PacerConfig {
            min_delay: Duration::from_millis(500),
            jitter_max: Duration::ZERO,
            ..quiet_cfg()
        }));

        let t0 = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..4 {
            let p = pacer.clone();
            handles.push(tokio::spawn(async move { p.acquire().await }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert!(
            t0.elapsed() >= Duration::from_millis(1500),
            "four concurrent acquisitions must still respect the gap, got {:?}",
            t0.elapsed()
        );
    }

    #[tokio::test]
    async fn user_agent_rotates_with_the_request_counter() {
        let pacer = RequestPacer::new(quiet_cfg());
        let first = pacer.user_agent();
        pacer.acquire().await;
        let second = pacer.user_agent();
        assert_ne!(first, second);

        // Full cycle brings the rotation back around.
        for _ in 0..USER_AGENTS.len() - 1 {
            pacer.acquire().await;
        }
        assert_eq!(pacer.user_agent(), first);
    }

    #[test]
    fn extra_headers_are_drawn_from_a_fixed_set() {
        let pacer = RequestPacer::new(quiet_cfg());
        let allowed = [
            "accept",
            "accept-language",
            "accept-encoding",
            "connection",
            "upgrade-insecure-requests",
            "sec-fetch-dest",
            "sec-fetch-mode",
            "sec-fetch-site",
            "dnt",
            "cache-control",
        ];
        for _ in 0..20 {
            let headers = pacer.extra_headers();
            assert!(headers.len() >= 8);
            for k in headers.keys() {
                assert!(allowed.contains(k), "unexpected header {k}");
            }
        }
    }
}
