//! Runtime configuration.
//!
//! Defaults mirror the production deployment; every knob can be overridden
//! through an `INNSIGHT_*` environment variable so the service can be tuned
//! without a rebuild.

use std::env;
use std::time::Duration;

/// All tunables for the API layer and the extraction engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// API keys accepted in the `access_token` header.
    pub api_keys: Vec<String>,
    /// Serve canned listings when scraping yields nothing or fails.
    pub enable_mock_fallback: bool,

    /// Base URL of the target site.
    pub base_url: String,
    /// Currency code reported when the page does not state one.
    pub default_currency: String,
    /// Days from today used when no check-in date is given.
    pub checkin_offset_days: i64,
    /// Days from today used when no check-out date is given.
    pub checkout_offset_days: i64,

    /// Maximum listings returned per search.
    pub max_results: usize,
    /// Maximum reviews extracted per detail fetch.
    pub max_reviews: usize,
    /// Maximum room types extracted per detail fetch.
    pub max_room_types: usize,
    /// Maximum photos extracted per detail fetch.
    pub max_photos: usize,

    /// Navigation timeout for search pages.
    pub search_timeout: Duration,
    /// Navigation timeout for detail pages (heavier pages, longer budget).
    pub detail_timeout: Duration,
    /// How long to wait out a bot-challenge overlay before proceeding anyway.
    pub challenge_timeout: Duration,
    /// Pause after each scroll step while lazy content loads.
    pub scroll_pause: Duration,
    /// Whole-fetch attempts on navigation failure.
    pub max_retries: u32,
    /// Base delay between attempts; grows linearly with the attempt number.
    pub retry_delay: Duration,
    /// Browser identity strings; one is chosen per fetch.
    pub user_agents: Vec<String>,
    /// Upper bound on concurrent browser contexts.
    pub max_sessions: usize,

    /// Review/amenity counts that let a fetch skip scroll stabilization.
    pub fast_exit_min_reviews: usize,
    pub fast_exit_min_amenities: usize,

    /// Response cache time-to-live.
    pub cache_ttl: Duration,
    /// Response cache capacity before the oldest entry is evicted.
    pub cache_max_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_keys: vec![
                "user_123_secret_key".to_string(),
                "premium_user_key_999".to_string(),
            ],
            enable_mock_fallback: false,
            base_url: "https://www.booking.com".to_string(),
            default_currency: "INR".to_string(),
            checkin_offset_days: 7,
            checkout_offset_days: 8,
            max_results: 10,
            max_reviews: 10,
            max_room_types: 10,
            max_photos: 15,
            search_timeout: Duration::from_secs(30),
            detail_timeout: Duration::from_secs(45),
            challenge_timeout: Duration::from_secs(10),
            scroll_pause: Duration::from_secs(1),
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            ],
            max_sessions: 4,
            fast_exit_min_reviews: 3,
            fast_exit_min_amenities: 5,
            cache_ttl: Duration::from_secs(3600),
            cache_max_entries: 100,
        }
    }
}

impl Config {
    /// Build a config from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(keys) = env_list("INNSIGHT_API_KEYS") {
            cfg.api_keys = keys;
        }
        if let Some(v) = env_bool("INNSIGHT_MOCK_FALLBACK") {
            cfg.enable_mock_fallback = v;
        }
        if let Ok(v) = env::var("INNSIGHT_BASE_URL") {
            cfg.base_url = v;
        }
        if let Ok(v) = env::var("INNSIGHT_CURRENCY") {
            cfg.default_currency = v;
        }
        if let Some(v) = env_u64("INNSIGHT_MAX_RESULTS") {
            cfg.max_results = v as usize;
        }
        if let Some(v) = env_u64("INNSIGHT_MAX_REVIEWS") {
            cfg.max_reviews = v as usize;
        }
        if let Some(v) = env_u64("INNSIGHT_MAX_PHOTOS") {
            cfg.max_photos = v as usize;
        }
        if let Some(v) = env_u64("INNSIGHT_SEARCH_TIMEOUT_SECS") {
            cfg.search_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env_u64("INNSIGHT_DETAIL_TIMEOUT_SECS") {
            cfg.detail_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env_u64("INNSIGHT_MAX_RETRIES") {
            cfg.max_retries = v as u32;
        }
        if let Some(v) = env_u64("INNSIGHT_RETRY_DELAY_SECS") {
            cfg.retry_delay = Duration::from_secs(v);
        }
        if let Some(v) = env_u64("INNSIGHT_MAX_SESSIONS") {
            cfg.max_sessions = (v as usize).max(1);
        }
        if let Some(v) = env_u64("INNSIGHT_CACHE_TTL_SECS") {
            cfg.cache_ttl = Duration::from_secs(v);
        }
        if let Some(v) = env_u64("INNSIGHT_CACHE_MAX_ENTRIES") {
            cfg.cache_max_entries = v as usize;
        }
        cfg
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = env::var(key).ok()?;
    let items: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
