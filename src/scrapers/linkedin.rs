//! LinkedIn public job search.
//!
//! Uses the logged-out ("guest") search pages only. The HTML search page and
//! the `jobs-guest` fragment endpoint share the same `base-card` markup, so
//! one layout covers both. Detail pages live under `/jobs/view/`.

use once_cell::sync::Lazy;
use regex::Regex;
use urlencoding::encode;

use super::html::{FieldChain, compile};
use super::{SiteLayout, SiteProfile};
use crate::models::Source;

const BASE_URL: &str = "https://www.linkedin.com";
const LOCATION: &str = "Türkiye";

static LAYOUT: Lazy<SiteLayout> = Lazy::new(|| SiteLayout {
    cards: compile(&[
        "ul.jobs-search__results-list > li",
        "div.base-search-card",
        "div.job-search-card",
        "li.result-card",
    ]),
    title: FieldChain::text(&[
        "h3.base-search-card__title",
        ".job-search-card__title",
        "span.sr-only",
        "h3",
    ]),
    company: FieldChain::text(&[
        "h4.base-search-card__subtitle",
        ".base-search-card__subtitle a",
        "a.hidden-nested-link",
        "h4",
    ]),
    location: FieldChain::text(&[
        ".job-search-card__location",
        ".base-search-card__metadata span",
    ]),
    description: FieldChain::text(&[
        ".job-search-card__snippet",
        ".base-search-card__snippet",
    ]),
    link: FieldChain::default()
        .or_attr("a.base-card__full-link", "href")
        .or_attr("a[href*='/jobs/view/']", "href")
        .or_attr("a[href]", "href"),
    detail_path: Regex::new(r"^/jobs/view/[\w-]+").unwrap(),
});

#[derive(Debug, Clone, Copy, Default)]
pub struct Linkedin;

impl SiteProfile for Linkedin {
    fn source(&self) -> Source {
        Source::Linkedin
    }

    fn base_url(&self) -> &'static str {
        BASE_URL
    }

    fn candidate_urls(&self, search_term: &str) -> Vec<String> {
        let kw = encode(search_term);
        let loc = encode(LOCATION);
        vec![
            format!("{BASE_URL}/jobs/search?keywords={kw}"),
            format!("{BASE_URL}/jobs/search?keywords={kw}&location={loc}"),
            format!(
                "{BASE_URL}/jobs-guest/jobs/api/seeMoreJobPostings/search?keywords={kw}&location={loc}&start=0"
            ),
            format!("{BASE_URL}/jobs/search?location={loc}&f_TPR=r86400"),
        ]
    }

    fn layout(&self) -> &SiteLayout {
        &LAYOUT
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{ListingSource, PENDING_DETAIL, SiteScraper};
    use super::*;
    use crate::governor::RateGovernor;
    use std::sync::Arc;

    const RESULTS_PAGE: &str = r#"
        <ul class="jobs-search__results-list">
          <li>
            <div class="base-card base-search-card">
              <a class="base-card__full-link" href="https://tr.linkedin.com/jobs/view/rust-engineer-at-acme-3901?refId=abc&amp;trackingId=x"></a>
              <h3 class="base-search-card__title">  Rust Engineer </h3>
              <h4 class="base-search-card__subtitle"><a class="hidden-nested-link">Acme</a></h4>
              <span class="job-search-card__location">Ankara, Türkiye</span>
            </div>
          </li>
          <li>
            <div class="base-card">
              <h3 class="base-search-card__title">No link here</h3>
            </div>
          </li>
        </ul>"#;

    #[test]
    fn test_candidates_encode_location() {
        let urls = Linkedin.candidate_urls("data engineer");
        assert_eq!(urls.len(), 4);
        assert_eq!(urls[0], "https://www.linkedin.com/jobs/search?keywords=data%20engineer");
        assert!(urls[1].ends_with("&location=T%C3%BCrkiye"));
        assert!(urls[2].contains("/jobs-guest/"));
        assert!(!urls[3].contains("keywords="));
    }

    #[tokio::test]
    async fn test_extracts_base_cards_and_skips_linkless_cards() {
        let config = fast_config();
        let fetcher = Arc::new(ScriptedFetcher::every_url(Scripted::Page(padded(RESULTS_PAGE))));
        let scraper = SiteScraper::new(Box::new(Linkedin), fetcher, &config);

        let extraction = scraper
            .extract(&RateGovernor::new(&config.governor), "rust", 10)
            .await
            .unwrap();
        assert_eq!(extraction.listings.len(), 1);
        let listing = &extraction.listings[0];
        assert_eq!(
            listing.url,
            "https://tr.linkedin.com/jobs/view/rust-engineer-at-acme-3901?refId=abc&trackingId=x"
        );
        assert_eq!(listing.title, "Rust Engineer");
        assert_eq!(listing.company.as_deref(), Some("Acme"));
        assert_eq!(listing.location.as_deref(), Some("Ankara, Türkiye"));
        assert_eq!(listing.source, Source::Linkedin);
    }

    #[tokio::test]
    async fn test_detail_links_used_when_layout_unknown() {
        let config = fast_config();
        let body = padded(r#"<p><a href="/jobs/view/frontend-developer-at-beta-42">Frontend Developer</a></p>"#);
        let fetcher = Arc::new(ScriptedFetcher::every_url(Scripted::Page(body)));
        let scraper = SiteScraper::new(Box::new(Linkedin), fetcher, &config);

        let extraction = scraper
            .extract(&RateGovernor::new(&config.governor), "frontend", 10)
            .await
            .unwrap();
        assert_eq!(extraction.listings.len(), 1);
        assert_eq!(extraction.listings[0].url, "https://www.linkedin.com/jobs/view/frontend-developer-at-beta-42");
        assert_eq!(extraction.listings[0].company.as_deref(), Some(PENDING_DETAIL));
    }
}
