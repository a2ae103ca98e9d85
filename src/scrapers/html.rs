//! Typed helpers over `scraper` for ordered selector fallbacks.
//!
//! Site markup drifts over time, so every lookup is expressed as a list of
//! alternatives tried left to right: the first one producing a non-empty,
//! length-valid value wins.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use crate::utils::collapse_whitespace;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Inclusive character-count window a field value must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn accepts(&self, value: &str) -> bool {
        let len = value.chars().count();
        len > 0 && len >= self.min && len <= self.max
    }
}

/// Evaluate `strategies` in order and return the first value that is
/// non-empty after whitespace collapsing and fits `bounds`.
///
/// Strategies are only run until one succeeds.
pub fn first_valid<I, F>(strategies: I, bounds: LengthBounds) -> Option<String>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Option<String>,
{
    strategies
        .into_iter()
        .filter_map(|strategy| strategy())
        .map(|raw| collapse_whitespace(&raw))
        .find(|value| bounds.accepts(value))
}

/// Compile CSS selectors, dropping (and logging) any that fail to parse.
pub fn compile(css: &[&str]) -> Vec<Selector> {
    css.iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!(selector = s, error = %e, "Skipping invalid selector");
                None
            }
        })
        .collect()
}

/// One way of reading a field out of an element.
#[derive(Debug, Clone)]
pub enum FieldStrategy {
    /// Text content of the first descendant matching the selector.
    Text(Selector),
    /// Attribute of the first descendant matching the selector.
    Attr(Selector, &'static str),
    /// Attribute of the element itself.
    OwnAttr(&'static str),
}

impl FieldStrategy {
    fn read(&self, el: ElementRef<'_>) -> Option<String> {
        match self {
            FieldStrategy::Text(selector) => el.select(selector).next().map(element_text),
            FieldStrategy::Attr(selector, attr) => el
                .select(selector)
                .next()
                .and_then(|found| found.value().attr(attr))
                .map(str::to_string),
            FieldStrategy::OwnAttr(attr) => el.value().attr(attr).map(str::to_string),
        }
    }
}

/// Ordered per-field fallback chain.
#[derive(Debug, Clone, Default)]
pub struct FieldChain {
    strategies: Vec<FieldStrategy>,
}

impl FieldChain {
    /// Text strategies for each selector, in order.
    pub fn text(css: &[&str]) -> Self {
        Self {
            strategies: compile(css).into_iter().map(FieldStrategy::Text).collect(),
        }
    }

    /// Append an attribute lookup on descendants matching `css`.
    pub fn or_attr(mut self, css: &str, attr: &'static str) -> Self {
        self.strategies
            .extend(compile(&[css]).into_iter().map(|s| FieldStrategy::Attr(s, attr)));
        self
    }

    /// Append an attribute lookup on the element itself.
    pub fn or_own_attr(mut self, attr: &'static str) -> Self {
        self.strategies.push(FieldStrategy::OwnAttr(attr));
        self
    }

    pub fn extract(&self, el: ElementRef<'_>, bounds: LengthBounds) -> Option<String> {
        first_valid(
            self.strategies.iter().map(|strategy| move || strategy.read(el)),
            bounds,
        )
    }
}

/// Whitespace-normalised text content of an element.
pub fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Values read from the first selector whose matches yield anything through
/// `read`, with that selector's index. Selectors that match only unusable
/// elements are skipped.
pub fn first_yielding<'a, T>(
    document: &'a Html,
    selectors: &[Selector],
    mut read: impl FnMut(ElementRef<'a>) -> Option<T>,
) -> Option<(usize, Vec<T>)> {
    selectors.iter().enumerate().find_map(|(i, selector)| {
        let found: Vec<T> = document.select(selector).filter_map(&mut read).collect();
        (!found.is_empty()).then_some((i, found))
    })
}

/// Anchors whose resolved path matches `pattern`, as `(absolute url, element)`.
/// Each target url is reported once, in document order.
pub fn links_matching<'a>(document: &'a Html, base: &Url, pattern: &Regex) -> Vec<(String, ElementRef<'a>)> {
    let mut seen = std::collections::HashSet::new();
    document
        .select(&ANCHOR)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let resolved = resolve(base, href)?;
            let path = Url::parse(&resolved).ok()?.path().to_string();
            (pattern.is_match(&path) && seen.insert(resolved.clone())).then_some((resolved, a))
        })
        .collect()
}

/// Resolve `href` against `base`, keeping only http(s) targets and dropping
/// the fragment.
pub fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}
