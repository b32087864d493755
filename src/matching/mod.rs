// Keyword matching: fuzzy include keywords and plain-substring exclusions.
//
// Include keywords tolerate one arbitrary character between each pair of
// consecutive keyword characters ("整租" also hits "整-租", "room" also hits
// "r-o-o-m"). Exclude terms are plain substrings and always win.

pub mod fuzzy;

pub use fuzzy::{fuzzy_pattern, KeywordMatch, KeywordMatcher};

/// True if `title` or `body` contains any non-empty exclude term.
pub fn is_excluded(exclude: &[String], title: &str, body: &str) -> bool {
    exclude
        .iter()
        .filter(|term| !term.is_empty())
        .any(|term| title.contains(term.as_str()) || body.contains(term.as_str()))
}

/// True if `title` or `body` contains any of `terms` as a plain substring.
/// An empty term list allows everything.
pub fn contains_any(terms: &[String], title: &str, body: &str) -> bool {
    terms.is_empty()
        || terms
            .iter()
            .filter(|term| !term.is_empty())
            .any(|term| title.contains(term.as_str()) || body.contains(term.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_excluded() {
        let exclude = terms(&["中介", "agent"]);
        assert!(is_excluded(&exclude, "无中介费", ""));
        assert!(is_excluded(&exclude, "", "no agent fees"));
        assert!(!is_excluded(&exclude, "direct from landlord", "no fees"));
    }

    #[test]
    fn test_exclusion_is_not_fuzzy() {
        let exclude = terms(&["agent"]);
        assert!(!is_excluded(&exclude, "a-g-e-n-t", ""));
    }

    #[test]
    fn test_empty_exclude_terms_ignored() {
        assert!(!is_excluded(&terms(&["", ""]), "anything", "at all"));
        assert!(!is_excluded(&[], "anything", "at all"));
    }

    #[test]
    fn test_contains_any() {
        assert!(contains_any(&[], "whatever", ""));
        assert!(contains_any(&terms(&["room"]), "", "roommate wanted"));
        assert!(!contains_any(&terms(&["room"]), "r o o m", ""));
    }
}
