//! The extraction engine: drives a renderer through the fetch pipeline
//! and turns page snapshots into hotel records.
//!
//! One fetch is: navigate, wait out any bot-challenge overlay, snapshot,
//! extract. Detail pages additionally get scroll stabilization and a
//! review-trigger click when the first snapshot is too thin. Navigation
//! failures retry the whole fetch with a linearly growing delay; nothing
//! else retries.

use crate::config::Config;
use crate::error::FetchError;
use crate::extract::{
    assemble_detail, extract_dom, extract_listings, extract_structured, selectors, DetailDraft,
    ExtractLimits,
};
use crate::models::{HotelDetail, ListingSummary};
use crate::renderer::{ContextOptions, RenderContext, Renderer};
use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Poll interval for in-page condition checks.
const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Budget for core detail content to appear after navigation.
const CONTENT_WAIT: Duration = Duration::from_secs(5);
/// Budget for review cards to render after the trigger click.
const REVIEW_WAIT: Duration = Duration::from_secs(3);
/// Scroll step size in pixels during stabilization.
const SCROLL_STEP_PX: u32 = 1500;
const SCROLL_STEPS: u32 = 3;

/// Anything that can answer hotel queries. The REST layer depends on this
/// trait, not on the engine, so handlers are testable with a stub.
#[async_trait]
pub trait HotelSource: Send + Sync {
    /// Search for hotels in a city over a date range. Dates are
    /// `YYYY-MM-DD`, already resolved by [`resolve_dates`].
    async fn search(
        &self,
        city: &str,
        checkin: &str,
        checkout: &str,
    ) -> Result<Vec<ListingSummary>, FetchError>;

    /// Fetch one hotel's detail record. `Ok(None)` means the page loaded
    /// but held no extractable hotel.
    async fn fetch_details(&self, hotel_url: &str) -> Result<Option<HotelDetail>, FetchError>;
}

/// Fill in missing dates: one week out for check-in, the night after for
/// check-out.
pub fn resolve_dates(cfg: &Config, checkin: Option<&str>, checkout: Option<&str>) -> (String, String) {
    let today = Utc::now().date_naive();
    let fallback = |days: i64| (today + chrono::Duration::days(days)).format("%Y-%m-%d").to_string();
    let checkin = checkin
        .map(str::to_string)
        .unwrap_or_else(|| fallback(cfg.checkin_offset_days));
    let checkout = checkout
        .map(str::to_string)
        .unwrap_or_else(|| fallback(cfg.checkout_offset_days));
    (checkin, checkout)
}

/// Build the search-results URL for a city and date range.
pub fn search_url(cfg: &Config, city: &str, checkin: &str, checkout: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(&cfg.base_url)?;
    url.set_path("/searchresults.html");
    url.query_pairs_mut()
        .append_pair("ss", city)
        .append_pair("checkin", checkin)
        .append_pair("checkout", checkout)
        .append_pair("group_adults", "2")
        .append_pair("group_children", "0")
        .append_pair("no_rooms", "1");
    Ok(url.to_string())
}

/// The production [`HotelSource`]: a renderer plus a session limit.
pub struct ScrapeEngine {
    renderer: Arc<dyn Renderer>,
    config: Arc<Config>,
    sessions: Arc<Semaphore>,
}

impl ScrapeEngine {
    pub fn new(renderer: Arc<dyn Renderer>, config: Arc<Config>) -> Self {
        let sessions = Arc::new(Semaphore::new(config.max_sessions.max(1)));
        Self {
            renderer,
            config,
            sessions,
        }
    }

    async fn new_context(&self) -> Result<Box<dyn RenderContext>, FetchError> {
        let user_agent = self
            .config
            .user_agents
            .choose(&mut rand::thread_rng())
            .cloned();
        let opts = ContextOptions { user_agent };
        Ok(self.renderer.new_context(&opts).await?)
    }

    /// Count elements matching a CSS query inside the page.
    async fn count_elements(&self, ctx: &dyn RenderContext, query: &str) -> Option<u64> {
        let script = format!(
            "document.querySelectorAll({}).length",
            serde_json::to_string(query).ok()?
        );
        ctx.evaluate(&script).await.ok()?.as_u64()
    }

    /// Poll until at least `min` elements match, or the budget runs out.
    async fn wait_for_elements(
        &self,
        ctx: &dyn RenderContext,
        query: &str,
        budget: Duration,
        min: u64,
    ) -> u64 {
        let deadline = Instant::now() + budget;
        loop {
            let count = self.count_elements(ctx, query).await.unwrap_or(0);
            if count >= min || Instant::now() >= deadline {
                return count;
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait for a bot-challenge overlay to clear. Never fails the fetch:
    /// after the budget the pipeline proceeds and extraction decides.
    async fn wait_out_challenge(&self, ctx: &dyn RenderContext) {
        let deadline = Instant::now() + self.config.challenge_timeout;
        loop {
            let present = self
                .count_elements(ctx, &selectors::challenge_query())
                .await
                .unwrap_or(0)
                > 0;
            if !present {
                return;
            }
            if Instant::now() >= deadline {
                warn!("challenge overlay still present at budget, proceeding anyway");
                return;
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Step-scroll the page so lazy sections render.
    async fn stabilize(&self, ctx: &dyn RenderContext) -> Result<(), FetchError> {
        for step in 1..=SCROLL_STEPS {
            let script = format!(
                "(() => {{ window.scrollTo(0, {}); return true; }})()",
                step * SCROLL_STEP_PX
            );
            ctx.evaluate(&script).await?;
            sleep(self.config.scroll_pause).await;
        }
        ctx.evaluate("(() => { window.scrollTo(0, document.body.scrollHeight); return true; })()")
            .await?;
        sleep(self.config.scroll_pause).await;
        Ok(())
    }

    /// Click the first present review trigger, then wait for cards.
    async fn trigger_reviews(&self, ctx: &dyn RenderContext) {
        let candidates = match serde_json::to_string(selectors::REVIEW_TRIGGERS) {
            Ok(s) => s,
            Err(_) => return,
        };
        let script = format!(
            "(() => {{ for (const s of {candidates}) {{ const el = document.querySelector(s); \
             if (el) {{ el.click(); return s; }} }} return null; }})()"
        );
        match ctx.evaluate(&script).await {
            Ok(serde_json::Value::String(sel)) => {
                debug!(trigger = %sel, "clicked review trigger");
                self.wait_for_elements(ctx, &selectors::review_card_query(), REVIEW_WAIT, 1)
                    .await;
            }
            Ok(_) => debug!("no review trigger present"),
            Err(e) => debug!(error = %e, "review trigger click failed"),
        }
    }

    /// Whether the first snapshot is already rich enough to skip
    /// stabilization.
    fn fast_exit(&self, structured: &DetailDraft, dom: &DetailDraft) -> bool {
        let named = dom.name.is_some() || structured.name.is_some();
        let reviews = dom.reviews.len().max(structured.reviews.len());
        let amenities = dom.amenities.len().max(structured.amenities.len());
        named
            && reviews >= self.config.fast_exit_min_reviews
            && amenities >= self.config.fast_exit_min_amenities
    }

    async fn search_attempt(
        &self,
        ctx: &mut Box<dyn RenderContext>,
        url: &str,
    ) -> Result<Vec<ListingSummary>, FetchError> {
        let nav = ctx
            .navigate(url, self.config.search_timeout.as_millis() as u64)
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?;
        debug!(final_url = %nav.final_url, load_ms = nav.load_time_ms, "search page loaded");

        self.wait_out_challenge(ctx.as_ref()).await;
        self.wait_for_elements(
            ctx.as_ref(),
            &selectors::listing_card_query(),
            CONTENT_WAIT,
            1,
        )
        .await;
        ctx.evaluate("(() => { window.scrollTo(0, document.body.scrollHeight); return true; })()")
            .await?;
        sleep(self.config.scroll_pause).await;

        let html = ctx.html().await?;
        Ok(extract_listings(
            &html,
            &self.config.base_url,
            self.config.max_results,
            &self.config.default_currency,
        ))
    }

    async fn detail_attempt(
        &self,
        ctx: &mut Box<dyn RenderContext>,
        url: &str,
    ) -> Result<HotelDetail, FetchError> {
        let nav = ctx
            .navigate(url, self.config.detail_timeout.as_millis() as u64)
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?;
        debug!(final_url = %nav.final_url, load_ms = nav.load_time_ms, "detail page loaded");

        self.wait_out_challenge(ctx.as_ref()).await;
        let limits = ExtractLimits::from_config(&self.config);

        let html = ctx.html().await?;
        let structured = extract_structured(&html);
        let dom = extract_dom(&html, &limits);
        if self.fast_exit(&structured, &dom) {
            debug!("initial snapshot complete, skipping stabilization");
            return assemble_detail(structured, dom, &limits).ok_or(FetchError::ExtractionEmpty);
        }

        self.wait_for_elements(ctx.as_ref(), selectors::DETAIL_READY, CONTENT_WAIT, 1)
            .await;
        self.stabilize(ctx.as_ref()).await?;
        self.trigger_reviews(ctx.as_ref()).await;

        let html = ctx.html().await?;
        let structured = extract_structured(&html);
        let dom = extract_dom(&html, &limits);
        assemble_detail(structured, dom, &limits).ok_or(FetchError::ExtractionEmpty)
    }
}

#[async_trait]
impl HotelSource for ScrapeEngine {
    async fn search(
        &self,
        city: &str,
        checkin: &str,
        checkout: &str,
    ) -> Result<Vec<ListingSummary>, FetchError> {
        let fetch_id = Uuid::new_v4();
        let url = search_url(&self.config, city, checkin, checkout)
            .map_err(|e| FetchError::Extraction(anyhow::anyhow!("bad base URL: {e}")))?;
        info!(%fetch_id, %city, %checkin, %checkout, "starting search fetch");

        let _permit = self
            .sessions
            .acquire()
            .await
            .map_err(|e| FetchError::Extraction(anyhow::anyhow!("session pool closed: {e}")))?;

        let mut attempt = 1;
        loop {
            let mut ctx = match self.new_context().await {
                Ok(ctx) => ctx,
                Err(e) => {
                    warn!(%fetch_id, error = %e, "no browser context available");
                    return Ok(Vec::new());
                }
            };
            let result = self.search_attempt(&mut ctx, &url).await;
            if let Err(e) = ctx.close().await {
                debug!(%fetch_id, error = %e, "context close failed");
            }
            match result {
                Ok(listings) => {
                    info!(%fetch_id, count = listings.len(), "search fetch finished");
                    return Ok(listings);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_delay * attempt;
                    warn!(%fetch_id, attempt, error = %e, delay_ms = delay.as_millis() as u64, "retrying search");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(%fetch_id, attempt, error = %e, "search fetch failed");
                    return Err(e);
                }
            }
        }
    }

    async fn fetch_details(&self, hotel_url: &str) -> Result<Option<HotelDetail>, FetchError> {
        let fetch_id = Uuid::new_v4();
        info!(%fetch_id, url = %hotel_url, "starting detail fetch");

        let _permit = self
            .sessions
            .acquire()
            .await
            .map_err(|e| FetchError::Extraction(anyhow::anyhow!("session pool closed: {e}")))?;

        let mut attempt = 1;
        loop {
            let mut ctx = match self.new_context().await {
                Ok(ctx) => ctx,
                Err(e) => {
                    warn!(%fetch_id, error = %e, "no browser context available");
                    return Ok(None);
                }
            };
            let result = self.detail_attempt(&mut ctx, hotel_url).await;
            if let Err(e) = ctx.close().await {
                debug!(%fetch_id, error = %e, "context close failed");
            }
            match result {
                Ok(detail) => {
                    info!(%fetch_id, hotel_id = detail.hotel_id, name = %detail.name, "detail fetch finished");
                    return Ok(Some(detail));
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_delay * attempt;
                    warn!(%fetch_id, attempt, error = %e, delay_ms = delay.as_millis() as u64, "retrying detail fetch");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e @ FetchError::Navigation(_)) => {
                    warn!(%fetch_id, attempt, error = %e, "detail fetch failed");
                    return Err(e);
                }
                Err(FetchError::ExtractionEmpty) => {
                    info!(%fetch_id, "page held no extractable hotel");
                    return Ok(None);
                }
                Err(FetchError::Extraction(err)) => {
                    warn!(%fetch_id, error = %err, "extraction fault, treating as not found");
                    return Ok(None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::NavigationResult;
    use anyhow::{bail, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted renderer: serves one HTML document, optionally failing the
    /// first N navigations, and records every script it was asked to run.
    struct FakeRenderer {
        html: String,
        failures_left: Arc<AtomicUsize>,
        navigations: Arc<AtomicUsize>,
        scripts: Arc<Mutex<Vec<String>>>,
    }

    impl FakeRenderer {
        fn new(html: &str, failures: usize) -> Self {
            Self {
                html: html.to_string(),
                failures_left: Arc::new(AtomicUsize::new(failures)),
                navigations: Arc::new(AtomicUsize::new(0)),
                scripts: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn ran_script_containing(&self, needle: &str) -> bool {
            self.scripts
                .lock()
                .unwrap()
                .iter()
                .any(|s| s.contains(needle))
        }
    }

    #[async_trait]
    impl Renderer for FakeRenderer {
        async fn new_context(&self, _opts: &ContextOptions) -> Result<Box<dyn RenderContext>> {
            Ok(Box::new(FakeContext {
                html: self.html.clone(),
                failures_left: Arc::clone(&self.failures_left),
                navigations: Arc::clone(&self.navigations),
                scripts: Arc::clone(&self.scripts),
            }))
        }
        async fn shutdown(&self) -> Result<()> {
            Ok(())
        }
        fn active_contexts(&self) -> usize {
            0
        }
    }

    struct FakeContext {
        html: String,
        failures_left: Arc<AtomicUsize>,
        navigations: Arc<AtomicUsize>,
        scripts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl RenderContext for FakeContext {
        async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
            self.navigations.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                bail!("net::ERR_TIMED_OUT");
            }
            Ok(NavigationResult {
                final_url: url.to_string(),
                load_time_ms: 5,
            })
        }

        async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
            self.scripts.lock().unwrap().push(script.to_string());
            if script.contains("challenge") {
                return Ok(serde_json::json!(0));
            }
            if script.contains("querySelectorAll") {
                return Ok(serde_json::json!(1));
            }
            Ok(serde_json::Value::Null)
        }

        async fn html(&self) -> Result<String> {
            Ok(self.html.clone())
        }

        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    fn test_config() -> Arc<Config> {
        let mut cfg = Config::default();
        cfg.max_retries = 3;
        cfg.retry_delay = Duration::from_millis(0);
        cfg.scroll_pause = Duration::from_millis(0);
        cfg.challenge_timeout = Duration::from_millis(0);
        Arc::new(cfg)
    }

    fn engine_over(renderer: Arc<FakeRenderer>) -> ScrapeEngine {
        ScrapeEngine::new(renderer, test_config())
    }

    const SEARCH_HTML: &str = r#"
    <div data-testid="property-card">
      <a href="/hotel/in/sea-breeze.html"><div data-testid="title">Hotel Sea Breeze</div></a>
      <span data-testid="price-and-discounted-price">₹ 7,200</span>
    </div>"#;

    /// Rich enough for the fast-exit path: name, 3 reviews, 5 amenities.
    const RICH_DETAIL_HTML: &str = r#"
    <h2 data-testid="property-name">Grand Plaza</h2>
    <div data-testid="review-score-component" aria-label="Scored 8.8">8.8</div>
    <div data-testid="facility-group">
      <ul><li>WiFi</li><li>Pool</li><li>Gym</li><li>Bar</li><li>Parking</li></ul>
    </div>
    <div data-testid="review-card"><div data-testid="review-positive-text">Review one</div></div>
    <div data-testid="review-card"><div data-testid="review-positive-text">Review two</div></div>
    <div data-testid="review-card"><div data-testid="review-positive-text">Review three</div></div>"#;

    const SPARSE_DETAIL_HTML: &str = r#"<h2 data-testid="property-name">Thin Page Inn</h2>"#;

    #[tokio::test]
    async fn test_search_retries_failed_navigation() {
        let renderer = Arc::new(FakeRenderer::new(SEARCH_HTML, 2));
        let engine = engine_over(Arc::clone(&renderer));

        let listings = engine
            .search("Mumbai", "2026-09-01", "2026-09-02")
            .await
            .expect("search should succeed on the third attempt");
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Hotel Sea Breeze");
        assert_eq!(renderer.navigations.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_search_gives_up_after_max_retries() {
        let renderer = Arc::new(FakeRenderer::new(SEARCH_HTML, 10));
        let engine = engine_over(Arc::clone(&renderer));

        let err = engine
            .search("Mumbai", "2026-09-01", "2026-09-02")
            .await
            .expect_err("all attempts fail");
        assert!(matches!(err, FetchError::Navigation(_)));
        assert_eq!(renderer.navigations.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_detail_fast_exit_skips_stabilization() {
        let renderer = Arc::new(FakeRenderer::new(RICH_DETAIL_HTML, 0));
        let engine = engine_over(Arc::clone(&renderer));

        let detail = engine
            .fetch_details("https://www.booking.com/hotel/in/grand-plaza.html")
            .await
            .unwrap()
            .expect("rich page yields a record");
        assert_eq!(detail.name, "Grand Plaza");
        assert_eq!(detail.rating, 4.4);
        assert_eq!(detail.reviews.len(), 3);
        assert!(!renderer.ran_script_containing("scrollTo"));
    }

    #[tokio::test]
    async fn test_detail_sparse_page_stabilizes_and_triggers_reviews() {
        let renderer = Arc::new(FakeRenderer::new(SPARSE_DETAIL_HTML, 0));
        let engine = engine_over(Arc::clone(&renderer));

        let detail = engine
            .fetch_details("https://www.booking.com/hotel/in/thin.html")
            .await
            .unwrap()
            .expect("a name is enough for a record");
        assert_eq!(detail.name, "Thin Page Inn");
        assert!(renderer.ran_script_containing("scrollTo"));
        assert!(renderer.ran_script_containing("click"));
    }

    #[tokio::test]
    async fn test_detail_empty_page_is_not_found() {
        let renderer = Arc::new(FakeRenderer::new("<html><body></body></html>", 0));
        let engine = engine_over(renderer);

        let detail = engine
            .fetch_details("https://www.booking.com/hotel/in/gone.html")
            .await
            .unwrap();
        assert!(detail.is_none());
    }

    #[tokio::test]
    async fn test_search_without_browser_is_empty() {
        let engine = ScrapeEngine::new(Arc::new(crate::renderer::NoopRenderer), test_config());
        let listings = engine
            .search("Mumbai", "2026-09-01", "2026-09-02")
            .await
            .expect("missing browser is not a search error");
        assert!(listings.is_empty());
    }

    #[tokio::test]
    async fn test_detail_without_browser_is_not_found() {
        let engine = ScrapeEngine::new(Arc::new(crate::renderer::NoopRenderer), test_config());
        let detail = engine
            .fetch_details("https://www.booking.com/hotel/in/any.html")
            .await
            .unwrap();
        assert!(detail.is_none());
    }

    #[test]
    fn test_search_url_shape() {
        let cfg = Config::default();
        let url = search_url(&cfg, "New Delhi", "2026-09-01", "2026-09-02").unwrap();
        assert!(url.starts_with("https://www.booking.com/searchresults.html?"));
        assert!(url.contains("ss=New+Delhi"));
        assert!(url.contains("checkin=2026-09-01"));
        assert!(url.contains("checkout=2026-09-02"));
        assert!(url.contains("group_adults=2"));
        assert!(url.contains("no_rooms=1"));
    }

    #[test]
    fn test_resolve_dates_defaults_one_night_a_week_out() {
        let cfg = Config::default();
        let (checkin, checkout) = resolve_dates(&cfg, None, None);
        let today = Utc::now().date_naive();
        assert_eq!(
            checkin,
            (today + chrono::Duration::days(7)).format("%Y-%m-%d").to_string()
        );
        assert_eq!(
            checkout,
            (today + chrono::Duration::days(8)).format("%Y-%m-%d").to_string()
        );
    }

    #[test]
    fn test_resolve_dates_keeps_explicit_values() {
        let cfg = Config::default();
        let (checkin, checkout) = resolve_dates(&cfg, Some("2026-10-10"), None);
        assert_eq!(checkin, "2026-10-10");
        assert!(!checkout.is_empty());
    }
}
