//! Fuzzy matching of free-text titles against season and episode names.
//!
//! Combines Jaro-Winkler (good for names, handles transpositions) with
//! normalized Levenshtein, plus small bonuses for containment and a matching
//! first word.

use strsim::{jaro_winkler, normalized_levenshtein};

#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    /// The normalized query string
    query: String,
    /// Weight for Jaro-Winkler (vs Levenshtein)
    jaro_weight: f64,
}

impl FuzzyMatcher {
    pub fn new(query: &str) -> Self {
        Self {
            query: normalize_for_matching(query),
            jaro_weight: 0.6,
        }
    }

    /// Score a candidate from 0.0 to 1.0.
    pub fn score(&self, candidate: &str) -> f64 {
        if candidate.is_empty() || self.query.is_empty() {
            return 0.0;
        }

        let normalized = normalize_for_matching(candidate);
        if normalized.is_empty() {
            return 0.0;
        }
        if normalized == self.query {
            return 1.0;
        }

        let jaro = jaro_winkler(&self.query, &normalized);
        let lev = normalized_levenshtein(&self.query, &normalized);
        let base_score = (self.jaro_weight * jaro) + ((1.0 - self.jaro_weight) * lev);

        let containment_bonus =
            if normalized.contains(&self.query) || self.query.contains(&normalized) {
                0.1
            } else {
                0.0
            };

        let first_word_bonus = match (
            self.query.split_whitespace().next(),
            normalized.split_whitespace().next(),
        ) {
            (Some(q), Some(c)) if q == c => 0.1,
            (Some(q), Some(c)) if jaro_winkler(q, c) > 0.9 => 0.05,
            _ => 0.0,
        };

        // Capped just below an exact match so exact names always win.
        (base_score + containment_bonus + first_word_bonus).min(0.99)
    }

    /// Highest scoring candidate. Ties keep the earliest one; a non-empty
    /// list always yields a winner.
    pub fn best<T, F>(&self, candidates: Vec<T>, text: F) -> Option<(T, f64)>
    where
        F: Fn(&T) -> &str,
    {
        let mut best: Option<(T, f64)> = None;
        for candidate in candidates {
            let score = self.score(text(&candidate));
            match &best {
                Some((_, top)) if score <= *top => {}
                _ => best = Some((candidate, score)),
            }
        }
        best
    }
}

/// Lowercase, turn separators into spaces, drop punctuation and leading
/// articles.
pub fn normalize_for_matching(s: &str) -> String {
    let s = s.to_lowercase().replace(['.', '_', '-', '[', ']', '(', ')'], " ");

    let s: String = s
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let words: Vec<&str> = s.split_whitespace().collect();
    let start = match words.first() {
        Some(&"the") | Some(&"a") | Some(&"an") if words.len() > 1 => 1,
        _ => 0,
    };
    words[start..].join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_for_matching("The.Long_Night!"), "long night");
        assert_eq!(normalize_for_matching("  A  "), "a");
        assert_eq!(normalize_for_matching("Winter-Is-Coming"), "winter is coming");
    }

    #[test]
    fn test_exact_match_scores_one() {
        let matcher = FuzzyMatcher::new("The Long Night");
        assert_eq!(matcher.score("long night"), 1.0);
    }

    #[test]
    fn test_closer_name_scores_higher() {
        let matcher = FuzzyMatcher::new("winter is comming");
        let good = matcher.score("Winter Is Coming");
        let bad = matcher.score("The Rains of Castamere");
        assert!(good > bad, "expected {} > {}", good, bad);
        assert!(good < 1.0);
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        assert_eq!(FuzzyMatcher::new("").score("anything"), 0.0);
        assert_eq!(FuzzyMatcher::new("query").score(""), 0.0);
        assert_eq!(FuzzyMatcher::new("query").score("!!!"), 0.0);
    }

    #[test]
    fn test_best_keeps_first_on_tie() {
        let matcher = FuzzyMatcher::new("pilot");
        let picked = matcher.best(vec!["Pilot", "pilot", "Other"], |s| *s);
        assert_eq!(picked.map(|(s, _)| s), Some("Pilot"));
    }

    #[test]
    fn test_best_always_returns_for_non_empty() {
        let matcher = FuzzyMatcher::new("zzzz");
        assert!(matcher.best(vec!["abc"], |s| *s).is_some());
        assert!(matcher.best(Vec::<&str>::new(), |s| *s).is_none());
    }
}
