//! Dictionary-based keyword tagging.
//!
//! Plain case-insensitive substring matching against two fixed dictionaries.
//! No stemming or fuzzy matching: a term is either in the text or it is not.

use std::collections::BTreeSet;

const TECH_TERMS: &[&str] = &[
    "javascript", "typescript", "python", "java", "c#", "c++", ".net", "php", "ruby",
    "golang", "rust", "kotlin", "swift", "scala", "react", "angular", "vue", "node.js",
    "next.js", "django", "flask", "spring", "laravel", "flutter", "react native", "sql",
    "postgresql", "mysql", "mongodb", "redis", "elasticsearch", "kafka", "graphql", "rest",
    "docker", "kubernetes", "aws", "azure", "gcp", "linux", "git", "ci/cd", "terraform",
    "microservices", "machine learning", "data science", "html", "css", "sap", "excel",
];

const ROLE_TERMS: &[&str] = &[
    "frontend", "front-end", "backend", "back-end", "full stack", "fullstack", "devops",
    "mobile", "developer", "engineer", "architect", "analyst", "designer", "tester",
    "senior", "junior", "mid-level", "lead", "manager", "intern", "remote", "hybrid",
    "yazılım", "geliştirici", "mühendis", "uzman", "kıdemli", "stajyer", "uzaktan",
];

/// Every dictionary term that occurs in `text`, lowercased.
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
    let haystack = text.to_lowercase();
    TECH_TERMS
        .iter()
        .chain(ROLE_TERMS)
        .filter(|term| haystack.contains(*term))
        .map(|term| term.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_both_dictionaries() {
        let tags = extract_keywords("Senior Backend Developer (Rust, PostgreSQL, Docker)");
        for expected in ["senior", "backend", "developer", "rust", "postgresql", "sql", "docker"] {
            assert!(tags.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(extract_keywords("KUBERNETES"), extract_keywords("kubernetes"));
    }

    #[test]
    fn test_turkish_terms() {
        let tags = extract_keywords("Kıdemli Yazılım Geliştirici - Uzaktan");
        assert!(tags.contains("kıdemli"));
        assert!(tags.contains("yazılım"));
        assert!(tags.contains("geliştirici"));
        assert!(tags.contains("uzaktan"));
    }

    #[test]
    fn test_no_matches() {
        assert!(extract_keywords("Garson aranıyor").is_empty());
        assert!(extract_keywords("").is_empty());
    }

    #[test]
    fn test_substring_semantics() {
        // precision over recall: "javascript" also contains "java"
        let tags = extract_keywords("JavaScript");
        assert!(tags.contains("javascript"));
        assert!(tags.contains("java"));
    }
}
