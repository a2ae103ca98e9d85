//! Kariyer.net job search.
//!
//! # URL Pattern
//!
//! Search results live under `/is-ilanlari`, optionally narrowed by a city or
//! a category path segment. Detail pages look like
//! `https://www.kariyer.net/is-ilani/acme-senior-rust-developer-4012345`.

use once_cell::sync::Lazy;
use regex::Regex;
use urlencoding::encode;

use super::html::{FieldChain, compile};
use super::{SiteLayout, SiteProfile};
use crate::models::Source;

const BASE_URL: &str = "https://www.kariyer.net";

static LAYOUT: Lazy<SiteLayout> = Lazy::new(|| SiteLayout {
    cards: compile(&[
        "div.list-items-wrapper div.list-items",
        "a.k-ad-card",
        "div[data-test='ad-card']",
        "div.job-card",
    ]),
    title: FieldChain::text(&[
        ".k-ad-card-title",
        "[data-test='ad-card-title']",
        "span.position-title",
        "h3",
    ])
    .or_attr("a[title]", "title")
    .or_own_attr("title"),
    company: FieldChain::text(&[
        ".k-ad-card-subtitle",
        "[data-test='subtitle']",
        "span.company-name",
        ".company",
    ]),
    location: FieldChain::text(&[
        ".k-ad-card-location",
        "[data-test='location']",
        "span.location",
        ".city",
    ]),
    description: FieldChain::text(&[
        ".k-ad-card-description",
        "[data-test='ad-card-description']",
        ".job-description",
    ]),
    link: FieldChain::default()
        .or_own_attr("href")
        .or_attr("a[href*='/is-ilani/']", "href")
        .or_attr("a[href]", "href"),
    detail_path: Regex::new(r"^/is-ilani/[\w-]+").unwrap(),
});

#[derive(Debug, Clone, Copy, Default)]
pub struct Kariyer;

impl SiteProfile for Kariyer {
    fn source(&self) -> Source {
        Source::Kariyer
    }

    fn base_url(&self) -> &'static str {
        BASE_URL
    }

    fn candidate_urls(&self, search_term: &str) -> Vec<String> {
        let kw = encode(search_term);
        vec![
            format!("{BASE_URL}/is-ilanlari?kw={kw}"),
            format!("{BASE_URL}/is-ilanlari/istanbul?kw={kw}"),
            format!("{BASE_URL}/is-ilanlari/bilgi-teknolojileri?kw={kw}"),
            format!("{BASE_URL}/is-ilanlari/bilgi-teknolojileri"),
        ]
    }

    fn layout(&self) -> &SiteLayout {
        &LAYOUT
    }
}
