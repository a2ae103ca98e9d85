//! Placeholder listings for total source failure.
//!
//! When every live strategy of a source fails, the extractor can still hand
//! back a small, fixed set of listings so callers keep receiving "some data".
//! Every placeholder is unmistakable:
//!
//! - `synthetic` is set
//! - the title is prefixed with `[Sample]`
//! - the url carries a `#sample-N` fragment under a `/sample/` path
//! - the keyword set contains [`SAMPLE_KEYWORD`]
//!
//! Turn the behaviour off with `extraction.synthetic_fallback: false`.

use crate::config::ExtractionConfig;
use crate::models::{Listing, Source};

pub const SAMPLE_KEYWORD: &str = "sample-data";

/// (role suffix, company, location); an empty location means the configured default.
const TEMPLATES: &[(&str, &str, &str)] = &[
    ("Developer", "Sample Teknoloji A.Ş.", "İstanbul"),
    ("Engineer", "Örnek Yazılım Ltd.", "Ankara"),
    ("Specialist", "Demo Bilişim", ""),
];

/// Build at most `limit` labelled placeholder listings for `search_term`.
pub fn sample_listings(
    source: Source,
    base_url: &str,
    search_term: &str,
    limit: usize,
    settings: &ExtractionConfig,
) -> Vec<Listing> {
    let slug = slugify(search_term);
    TEMPLATES
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, (role, company, location))| {
            let n = i + 1;
            let url = format!("{}/sample/{}-{}#sample-{}", base_url.trim_end_matches('/'), slug, n, n);
            // source in the title keeps samples from different sources distinct after dedup
            let title = format!("[Sample] {} {} ({})", search_term, role, source);
            let mut listing = Listing::new(url, title, source, search_term);
            listing.company = Some(company.to_string());
            listing.location = Some(if location.is_empty() {
                settings.default_location.clone()
            } else {
                location.to_string()
            });
            listing.description = Some(format!(
                "Placeholder listing generated because {source} could not be reached. Not a real job posting."
            ));
            listing.keywords.insert(SAMPLE_KEYWORD.to_string());
            listing.synthetic = true;
            listing
        })
        .collect()
}

/// Lowercase, alphanumerics kept, everything else collapsed into single hyphens.
fn slugify(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_are_labelled() {
        let listings = sample_listings(Source::Kariyer, "https://www.kariyer.net", "Rust", 10, &ExtractionConfig::default());
        assert_eq!(listings.len(), TEMPLATES.len());
        for (i, listing) in listings.iter().enumerate() {
            assert!(listing.synthetic);
            assert!(listing.title.starts_with("[Sample]"));
            assert!(listing.keywords.contains(SAMPLE_KEYWORD));
            assert!(listing.url.ends_with(&format!("#sample-{}", i + 1)));
            assert!(listing.company.is_some());
            assert_eq!(listing.source, Source::Kariyer);
        }
        assert_eq!(listings[2].location.as_deref(), Some("Türkiye"));
    }

    #[test]
    fn test_samples_respect_limit() {
        let listings = sample_listings(Source::Linkedin, "https://www.linkedin.com/", "go", 2, &ExtractionConfig::default());
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].url, "https://www.linkedin.com/sample/go-1#sample-1");
    }

    #[test]
    fn test_samples_from_different_sources_do_not_collide() {
        let settings = ExtractionConfig::default();
        let kariyer = sample_listings(Source::Kariyer, "https://www.kariyer.net", "rust", 3, &settings);
        let linkedin = sample_listings(Source::Linkedin, "https://www.linkedin.com", "rust", 3, &settings);
        assert_eq!(kariyer[0].title, "[Sample] rust Developer (kariyer)");
        for (k, l) in kariyer.iter().zip(&linkedin) {
            assert_ne!(k.dedup_key(), l.dedup_key());
        }
    }

    #[test]
    fn test_sample_urls_differ_per_term() {
        let settings = ExtractionConfig::default();
        let a = sample_listings(Source::Kariyer, "https://k", "C# Developer", 1, &settings);
        let b = sample_listings(Source::Kariyer, "https://k", "Java", 1, &settings);
        assert_eq!(a[0].url, "https://k/sample/c-developer-1#sample-1");
        assert_ne!(a[0].url, b[0].url);
    }
}
