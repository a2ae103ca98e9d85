//! Job board extractors.
//!
//! Each board gets a [`SiteProfile`] describing *where* listings live (the
//! candidate search urls, the card selectors and the per-field fallback
//! chains). [`SiteScraper`] owns *how* they are pulled out, which is the same
//! for every board:
//!
//! 1. Try candidate urls in order, most specific first. Every request goes
//!    through the shared [`RateGovernor`] and the [`RetryExecutor`]; failures
//!    are classified and only retryable ones are retried.
//! 2. The first HTTP 200 page larger than `min_body_bytes` wins. Smaller pages
//!    are soft-block interstitials and move on to the next candidate.
//! 3. Cards are located with the first card selector that matches anything;
//!    failing that, anchors whose path looks like a job detail page are used.
//! 4. Each field is read through its own [`FieldChain`].
//! 5. When no candidate yields listings, a labelled placeholder set is
//!    returned instead (see [`fallback`]), unless that is disabled.
//!
//! # Supported Sources
//!
//! | Source | Module | Notes |
//! |--------|--------|-------|
//! | Kariyer.net | [`kariyer`] | primary source |
//! | LinkedIn | [`linkedin`] | public guest search, no login |

pub mod fallback;
pub mod html;
pub mod kariyer;
pub mod linkedin;

use once_cell::sync::Lazy;
use rand::{Rng, rng};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::classify::{ClassifiedError, classify};
use crate::config::{ExtractionConfig, IngestConfig};
use crate::fetch::{FetchedPage, PageFetcher};
use crate::governor::RateGovernor;
use crate::models::{Extraction, Listing, Source};
use crate::retry::RetryExecutor;
use crate::utils::truncate_for_log;
use html::{FieldChain, LengthBounds, first_yielding, links_matching, resolve};

/// Company/location marker for listings found only through a bare link.
pub const PENDING_DETAIL: &str = "Pending detail fetch";

const NO_DESCRIPTION: &str = "See the listing page for details.";

/// Promo markers. "Reklam" only counts as the whole title or a `Reklam:` /
/// `Reklam -` prefix; elsewhere it names the advertising sector.
static EXCLUDED_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(advertisement|sponsored|sponsorlu)\b|^\s*reklam\s*([:|\-]|$)").unwrap()
});

const URL_BOUNDS: LengthBounds = LengthBounds::new(1, 2_048);
const DESCRIPTION_BOUNDS: LengthBounds = LengthBounds::new(10, 10_000);

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("search term is empty")]
    EmptySearchTerm,
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Where listings live on one job board.
pub struct SiteLayout {
    /// Card containers, most specific layout first.
    pub cards: Vec<Selector>,
    pub title: FieldChain,
    pub company: FieldChain,
    pub location: FieldChain,
    pub description: FieldChain,
    pub link: FieldChain,
    /// Path pattern of a job detail page, for the bare-link fallback.
    pub detail_path: Regex,
}

pub trait SiteProfile: Send + Sync {
    fn source(&self) -> Source;
    /// Landing page, used as Referer and as base for relative links.
    fn base_url(&self) -> &'static str;
    /// Ordered request targets for `search_term`; broader strategies last.
    fn candidate_urls(&self, search_term: &str) -> Vec<String>;
    fn layout(&self) -> &SiteLayout;
}

/// Anything that can produce listings for a search term.
pub trait ListingSource {
    fn source(&self) -> Source;
    async fn extract(
        &self,
        governor: &RateGovernor,
        search_term: &str,
        limit: usize,
    ) -> Result<Extraction, ScrapeError>;
}

/// Fields read from one card, before defaults are applied.
#[derive(Debug, Clone, PartialEq)]
struct RawCard {
    url: String,
    title: String,
    company: Option<String>,
    location: Option<String>,
    description: Option<String>,
}

/// The shared strategy-chain extractor, parameterised by a site profile.
pub struct SiteScraper<F> {
    profile: Box<dyn SiteProfile>,
    fetcher: Arc<F>,
    retry: RetryExecutor,
    settings: ExtractionConfig,
    min_body_bytes: usize,
}

impl<F: PageFetcher> SiteScraper<F> {
    pub fn new(profile: Box<dyn SiteProfile>, fetcher: Arc<F>, config: &IngestConfig) -> Self {
        Self {
            profile,
            fetcher,
            retry: RetryExecutor::new(&config.retry),
            settings: config.extraction.clone(),
            min_body_bytes: config.fetch.min_body_bytes,
        }
    }

    /// Walk the candidate urls and return the first usable page.
    async fn fetch_first_usable(&self, governor: &RateGovernor, candidates: &[String]) -> Option<FetchedPage> {
        let source = self.profile.source();
        let referer = self.profile.base_url();
        let fetcher = &*self.fetcher;

        for (strategy, url) in candidates.iter().enumerate() {
            let label = format!("{source}#{strategy}");
            info!(%source, strategy, %url, max_attempts = self.retry.max_attempts(), "Trying candidate url");
            let result = self
                .retry
                .execute_while(
                    &label,
                    |attempt| async move {
                        governor.wait().await;
                        debug!(%source, %url, attempt, "Fetch attempt");
                        fetcher
                            .fetch(url, Some(referer))
                            .await
                            .map_err(|e| classify(&e, source.as_str()))
                    },
                    |e: &ClassifiedError| e.retryable,
                )
                .await;

            match result {
                Ok(page) if page.body.len() > self.min_body_bytes => {
                    info!(%source, strategy, %url, status = page.status, bytes = page.body.len(), "Accepted page");
                    return Some(page);
                }
                Ok(page) => {
                    warn!(
                        %source,
                        strategy,
                        %url,
                        bytes = page.body.len(),
                        min_bytes = self.min_body_bytes,
                        preview = %truncate_for_log(&page.body, 120),
                        "Page too small (likely a block page); switching strategy"
                    );
                }
                Err(e) => {
                    warn!(
                        %source,
                        strategy,
                        %url,
                        kind = %e.kind,
                        retryable = e.retryable,
                        "Candidate failed; switching strategy"
                    );
                }
            }
        }
        None
    }

    fn title_bounds(&self) -> LengthBounds {
        LengthBounds::new(self.settings.min_title_len, self.settings.max_title_len)
    }

    fn field_bounds(&self) -> LengthBounds {
        LengthBounds::new(1, self.settings.max_field_len)
    }

    /// Parse cards out of a page. Synchronous: the parsed document never
    /// lives across an await point.
    fn parse_cards(&self, page: &FetchedPage) -> Vec<RawCard> {
        let source = self.profile.source();
        let layout = self.profile.layout();
        let base = Url::parse(&page.url)
            .or_else(|_| Url::parse(self.profile.base_url()))
            .ok();
        let Some(base) = base else {
            warn!(%source, url = %page.url, "Cannot resolve links without a base url");
            return Vec::new();
        };
        let document = Html::parse_document(&page.body);

        if let Some((selector, cards)) =
            first_yielding(&document, &layout.cards, |el| self.card_from_element(el, layout, &base))
        {
            debug!(%source, selector, cards = cards.len(), "Card selector yielded cards");
            return cards;
        }

        info!(%source, "No card selector yielded usable cards; falling back to detail-link scan");
        links_matching(&document, &base, &layout.detail_path)
            .into_iter()
            .filter_map(|(url, anchor)| {
                let title = link_title(anchor, self.title_bounds())?;
                self.keep_title(&title).then(|| RawCard {
                    url,
                    title,
                    company: Some(PENDING_DETAIL.to_string()),
                    location: Some(PENDING_DETAIL.to_string()),
                    description: None,
                })
            })
            .collect()
    }

    fn card_from_element(&self, el: ElementRef<'_>, layout: &SiteLayout, base: &Url) -> Option<RawCard> {
        let title = layout.title.extract(el, self.title_bounds())?;
        if !self.keep_title(&title) {
            return None;
        }
        let href = layout.link.extract(el, URL_BOUNDS)?;
        let url = resolve(base, &href)?;
        Some(RawCard {
            url,
            title,
            company: layout.company.extract(el, self.field_bounds()),
            location: layout.location.extract(el, self.field_bounds()),
            description: layout.description.extract(el, DESCRIPTION_BOUNDS),
        })
    }

    fn keep_title(&self, title: &str) -> bool {
        if EXCLUDED_TITLE.is_match(title) {
            debug!(title, "Dropping excluded title");
            return false;
        }
        true
    }

    fn to_listing(&self, card: RawCard, search_term: &str) -> Listing {
        let mut listing = Listing::new(card.url, card.title, self.profile.source(), search_term);
        listing.company = Some(card.company.unwrap_or_else(|| self.settings.default_company.clone()));
        listing.location = Some(card.location.unwrap_or_else(|| self.settings.default_location.clone()));
        listing.description = Some(card.description.unwrap_or_else(|| NO_DESCRIPTION.to_string()));
        listing
    }

    async fn pause_between_elements(&self) {
        let [lo, hi] = self.settings.element_delay_ms;
        let pause = rng().random_range(lo..=hi.max(lo));
        if pause > 0 {
            sleep(Duration::from_millis(pause)).await;
        }
    }

    fn degrade(&self, search_term: &str, limit: usize, reason: &str) -> Extraction {
        let source = self.profile.source();
        if !self.settings.synthetic_fallback {
            warn!(%source, reason, "No live listings and synthetic fallback disabled");
            return Extraction {
                success: false,
                listings: Vec::new(),
                message: format!("{source}: {reason}; no listings"),
            };
        }
        let listings = fallback::sample_listings(
            source,
            self.profile.base_url(),
            search_term,
            limit,
            &self.settings,
        );
        warn!(%source, reason, count = listings.len(), "Returning fallback sample listings");
        Extraction {
            success: true,
            message: format!("{source}: {reason}; returned {} fallback sample listings", listings.len()),
            listings,
        }
    }
}

/// Title for a bare job link: its text, then `title`, then `aria-label`.
fn link_title(anchor: ElementRef<'_>, bounds: LengthBounds) -> Option<String> {
    let attr = move |name: &'static str| move || anchor.value().attr(name).map(str::to_string);
    let strategies: [Box<dyn FnOnce() -> Option<String> + '_>; 3] = [
        Box::new(move || Some(html::element_text(anchor))),
        Box::new(attr("title")),
        Box::new(attr("aria-label")),
    ];
    html::first_valid(strategies, bounds)
}

impl<F: PageFetcher> ListingSource for SiteScraper<F> {
    fn source(&self) -> Source {
        self.profile.source()
    }

    #[instrument(level = "info", skip(self, governor), fields(source = %self.profile.source()))]
    async fn extract(
        &self,
        governor: &RateGovernor,
        search_term: &str,
        limit: usize,
    ) -> Result<Extraction, ScrapeError> {
        let search_term = search_term.trim();
        if search_term.is_empty() {
            return Err(ScrapeError::EmptySearchTerm);
        }
        Url::parse(self.profile.base_url())?;

        let candidates = self.profile.candidate_urls(search_term);
        let Some(page) = self.fetch_first_usable(governor, &candidates).await else {
            return Ok(self.degrade(search_term, limit, "every candidate url failed"));
        };

        let cards = self.parse_cards(&page);
        if cards.is_empty() {
            return Ok(self.degrade(search_term, limit, "page contained no recognisable listings"));
        }

        let mut listings = Vec::with_capacity(limit.min(cards.len()));
        for card in cards.into_iter().take(limit) {
            if !listings.is_empty() {
                self.pause_between_elements().await;
            }
            listings.push(self.to_listing(card, search_term));
        }

        let source = self.profile.source();
        info!(%source, count = listings.len(), url = %page.url, "Extracted listings");
        Ok(Extraction {
            success: true,
            message: format!("{source}: extracted {} listings", listings.len()),
            listings,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn scraper(fetcher: ScriptedFetcher, config: &IngestConfig) -> (SiteScraper<ScriptedFetcher>, Arc<ScriptedFetcher>) {
        let fetcher = Arc::new(fetcher);
        (SiteScraper::new(Box::new(kariyer::Kariyer), Arc::clone(&fetcher), config), fetcher)
    }

    #[tokio::test]
    async fn test_small_pages_everywhere_fall_back_to_samples() {
        let config = fast_config();
        let (scraper, fetcher) = scraper(ScriptedFetcher::every_url(Scripted::Page("x".repeat(200))), &config);
        let governor = RateGovernor::new(&config.governor);

        let extraction = scraper.extract(&governor, "rust", 5).await.unwrap();
        assert!(extraction.success);
        assert!(extraction.message.contains("fallback"));
        assert!(!extraction.listings.is_empty());
        assert!(extraction.listings.iter().all(|l| l.synthetic));
        // one request per candidate: a 200 is never retried
        assert_eq!(fetcher.calls().len(), kariyer::Kariyer.candidate_urls("rust").len());
    }

    #[tokio::test]
    async fn test_fallback_disabled_reports_failure() {
        let mut config = fast_config();
        config.extraction.synthetic_fallback = false;
        let (scraper, _) = scraper(ScriptedFetcher::every_url(Scripted::Status(404)), &config);
        let governor = RateGovernor::new(&config.governor);

        let extraction = scraper.extract(&governor, "rust", 5).await.unwrap();
        assert!(!extraction.success);
        assert!(extraction.listings.is_empty());
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried_but_blocked_is() {
        let config = fast_config();
        let candidates = kariyer::Kariyer.candidate_urls("rust");

        let (scraper404, fetcher404) = scraper(ScriptedFetcher::every_url(Scripted::Status(404)), &config);
        scraper404.extract(&RateGovernor::new(&config.governor), "rust", 5).await.unwrap();
        assert_eq!(fetcher404.calls().len(), candidates.len());

        let (scraper403, fetcher403) = scraper(ScriptedFetcher::every_url(Scripted::Status(403)), &config);
        scraper403.extract(&RateGovernor::new(&config.governor), "rust", 5).await.unwrap();
        assert_eq!(fetcher403.calls().len(), candidates.len() * config.retry.max_attempts);
    }

    #[tokio::test]
    async fn test_first_acceptable_candidate_wins() {
        let config = fast_config();
        let candidates = kariyer::Kariyer.candidate_urls("rust");
        let mut fetcher = ScriptedFetcher::default();
        fetcher.replies.insert(candidates[0].clone(), Scripted::Page("tiny".into()));
        fetcher.replies.insert(
            candidates[1].clone(),
            Scripted::Page(padded(
                r#"<a href="/is-ilani/acme-senior-rust-developer-1">Senior Rust Developer</a>"#,
            )),
        );
        let (scraper, fetcher) = scraper(fetcher, &config);

        let extraction = scraper.extract(&RateGovernor::new(&config.governor), "rust", 5).await.unwrap();
        assert!(extraction.success);
        assert_eq!(extraction.listings.len(), 1);
        assert!(!extraction.listings[0].synthetic);
        assert_eq!(fetcher.calls(), candidates[..2].to_vec());
    }

    #[tokio::test]
    async fn test_link_scan_marks_pending_fields_and_filters_titles() {
        let config = fast_config();
        let body = padded(
            r#"<a href="/is-ilani/acme-senior-rust-developer-1">Senior Rust Developer</a>
               <a href="/is-ilani/ad-2">Sponsorlu ilan: Advertisement</a>
               <a href="/is-ilani/short-3">QA</a>
               <a href="/firmalar/acme">Acme</a>"#,
        );
        let (scraper, _) = scraper(ScriptedFetcher::every_url(Scripted::Page(body)), &config);

        let extraction = scraper.extract(&RateGovernor::new(&config.governor), "rust", 10).await.unwrap();
        assert_eq!(extraction.listings.len(), 1);
        let listing = &extraction.listings[0];
        assert_eq!(listing.url, "https://www.kariyer.net/is-ilani/acme-senior-rust-developer-1");
        assert_eq!(listing.title, "Senior Rust Developer");
        assert_eq!(listing.company.as_deref(), Some(PENDING_DETAIL));
        assert_eq!(listing.location.as_deref(), Some(PENDING_DETAIL));
    }

    #[test]
    fn test_only_promo_labels_are_excluded() {
        let config = fast_config();
        let (scraper, _) = scraper(ScriptedFetcher::default(), &config);
        for promo in [
            "Sponsorlu",
            "Sponsorlu ilan: Java Developer",
            "Reklam",
            "Reklam: Yeni kampanya",
            "Advertisement - Apply now",
            "Java Developer (Sponsored)",
        ] {
            assert!(!scraper.keep_title(promo), "{promo} should be excluded");
        }
        for job in ["Dijital Reklam Uzmanı", "Reklam Ajansı Grafik Tasarımcı", "Advertising Sales Manager", "Adana Satış Temsilcisi"] {
            assert!(scraper.keep_title(job), "{job} should be kept");
        }
    }

    #[tokio::test]
    async fn test_advertising_sector_jobs_are_real_listings() {
        let config = fast_config();
        let body = padded(
            r#"<a class="k-ad-card" href="/is-ilani/medya-dijital-reklam-uzmani-7">
                 <span class="k-ad-card-title">Dijital Reklam Uzmanı</span>
               </a>
               <a class="k-ad-card" href="/is-ilani/ajans-grafik-tasarimci-8">
                 <span class="k-ad-card-title">Reklam Ajansı Grafik Tasarımcı</span>
               </a>"#,
        );
        let (scraper, _) = scraper(ScriptedFetcher::every_url(Scripted::Page(body)), &config);

        let extraction = scraper.extract(&RateGovernor::new(&config.governor), "reklam", 10).await.unwrap();
        assert!(extraction.success);
        assert!(!extraction.message.contains("fallback"));
        let titles: Vec<&str> = extraction.listings.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Dijital Reklam Uzmanı", "Reklam Ajansı Grafik Tasarımcı"]);
        assert!(extraction.listings.iter().all(|l| !l.synthetic));
    }

    #[tokio::test]
    async fn test_unusable_cards_fall_through_to_detail_links() {
        let config = fast_config();
        let body = padded(
            r#"<div class="job-card"><img src="/banner.png"></div>
               <a href="/is-ilani/acme-rust-developer-1">Rust Developer</a>
               <a href="/is-ilani/beta-go-developer-2">Go Developer</a>"#,
        );
        let (scraper, _) = scraper(ScriptedFetcher::every_url(Scripted::Page(body)), &config);

        let extraction = scraper.extract(&RateGovernor::new(&config.governor), "developer", 10).await.unwrap();
        assert!(extraction.success);
        assert_eq!(extraction.listings.len(), 2);
        assert!(extraction.listings.iter().all(|l| !l.synthetic));
        assert_eq!(extraction.listings[0].url, "https://www.kariyer.net/is-ilani/acme-rust-developer-1");
        assert_eq!(extraction.listings[1].company.as_deref(), Some(PENDING_DETAIL));
    }

    #[tokio::test]
    async fn test_output_is_capped_and_complete() {
        let config = fast_config();
        let cards: String = (1..=8)
            .map(|i| format!(r#"<a href="/is-ilani/firma-backend-developer-{i}">Backend Developer {i}</a>"#))
            .collect();
        let (scraper, _) = scraper(ScriptedFetcher::every_url(Scripted::Page(padded(&cards))), &config);

        let extraction = scraper.extract(&RateGovernor::new(&config.governor), "backend", 3).await.unwrap();
        assert_eq!(extraction.listings.len(), 3);
        for listing in &extraction.listings {
            assert!(!listing.title.is_empty());
            assert!(!listing.url.is_empty());
            assert!(listing.company.as_deref().is_some_and(|c| !c.is_empty()));
            assert!(listing.location.as_deref().is_some_and(|l| !l.is_empty()));
            assert_eq!(listing.search_term, "backend");
        }
    }

    #[tokio::test]
    async fn test_empty_search_term_is_an_error() {
        let config = fast_config();
        let (scraper, fetcher) = scraper(ScriptedFetcher::default(), &config);
        let result = scraper.extract(&RateGovernor::new(&config.governor), "   ", 5).await;
        assert!(matches!(result, Err(ScrapeError::EmptySearchTerm)));
        assert!(fetcher.calls().is_empty());
    }
}
