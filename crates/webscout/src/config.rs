//! Runtime knobs for pacing, suspension and extraction bounds.
//!
//! The embedder owns where values come from (file, flags, environment); this
//! module only defines the shape, the defaults, and an env-override
//! constructor for deployments that configure through the environment.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Which upstream is attempted first; the other becomes the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryProvider {
    #[default]
    DuckDuckGo,
    Brave,
}

impl FromStr for PrimaryProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duckduckgo" | "ddg" => Ok(PrimaryProvider::DuckDuckGo),
            "brave" => Ok(PrimaryProvider::Brave),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Outbound request cadence policy for one upstream pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacerConfig {
    /// Minimum gap between any two requests.
    pub min_delay: Duration,
    /// Sliding window over which `max_per_window` is enforced.
    pub window: Duration,
    pub max_per_window: usize,
    /// Safety margin added when waiting out a full window.
    pub margin: Duration,
    /// Upper bound for the uniformly-random per-request jitter.
    pub jitter_max: Duration,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(2000),
            window: Duration::from_secs(60),
            max_per_window: 10,
            margin: Duration::from_secs(1),
            jitter_max: Duration::from_millis(3000),
        }
    }
}

/// Exponential-backoff policy applied when the primary provider errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspensionConfig {
    pub base_duration: Duration,
    /// Cap on the backoff multiplier (20/40/80 min, then capped).
    pub max_multiplier: u32,
}

impl Default for SuspensionConfig {
    fn default() -> Self {
        Self {
            base_duration: Duration::from_secs(20 * 60),
            max_multiplier: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub primary: PrimaryProvider,
    /// Cap on concurrently in-flight search/fetch operations.
    pub max_concurrent_requests: usize,
    /// Results returned when the caller does not ask for a specific count.
    pub search_results_count: usize,
    /// Raw snippet cap (chars) applied before summarization.
    pub search_result_max_length: usize,
    /// Extracted page content cap (chars).
    pub fetch_result_max_length: usize,
    /// Gates the verbose per-selector diagnostics.
    pub debug: bool,
    pub pacer: PacerConfig,
    pub suspension: SuspensionConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            primary: PrimaryProvider::default(),
            max_concurrent_requests: 4,
            search_results_count: 10,
            search_result_max_length: 400,
            fetch_result_max_length: 5000,
            debug: false,
            pacer: PacerConfig::default(),
            suspension: SuspensionConfig::default(),
        }
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_usize(key: &str, default: usize) -> usize {
    env(key)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env(key)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str) -> bool {
    matches!(
        env(key).unwrap_or_default().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl SearchConfig {
    /// Defaults overridden by `WEBSCOUT_*` environment variables.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            primary: env("WEBSCOUT_PRIMARY_PROVIDER")
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.primary),
            max_concurrent_requests: env_usize(
                "WEBSCOUT_MAX_CONCURRENT",
                d.max_concurrent_requests,
            ),
            search_results_count: env_usize("WEBSCOUT_RESULTS_COUNT", d.search_results_count),
            search_result_max_length: env_usize(
                "WEBSCOUT_SNIPPET_MAX_CHARS",
                d.search_result_max_length,
            ),
            fetch_result_max_length: env_usize(
                "WEBSCOUT_FETCH_MAX_CHARS",
                d.fetch_result_max_length,
            ),
            debug: env_bool("WEBSCOUT_DEBUG"),
            pacer: PacerConfig {
                min_delay: Duration::from_millis(env_u64(
                    "WEBSCOUT_MIN_DELAY_MS",
                    d.pacer.min_delay.as_millis() as u64,
                )),
                window: Duration::from_secs(env_u64(
                    "WEBSCOUT_RATE_WINDOW_SECS",
                    d.pacer.window.as_secs(),
                )),
                max_per_window: env_usize("WEBSCOUT_RATE_LIMIT", d.pacer.max_per_window),
                margin: d.pacer.margin,
                jitter_max: Duration::from_millis(env_u64(
                    "WEBSCOUT_JITTER_MAX_MS",
                    d.pacer.jitter_max.as_millis() as u64,
                )),
            },
            suspension: SuspensionConfig {
                base_duration: Duration::from_secs(
                    60 * env_u64(
                        "WEBSCOUT_SUSPENSION_BASE_MINS",
                        d.suspension.base_duration.as_secs() / 60,
                    ),
                ),
                max_multiplier: env_u64(
                    "WEBSCOUT_SUSPENSION_MAX_MULTIPLIER",
                    d.suspension.max_multiplier as u64,
                ) as u32,
            },
        }
    }
}
