//! Fuzzy matching for accepting a music-catalog search result as a match
//! for a free-text title+artist from elsewhere (spec §4.3.1).

use regex::Regex;
use std::sync::LazyLock;

/// Minimum similarity to accept a candidate, inclusive.
pub const ACCEPT_THRESHOLD: f64 = 0.5;

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\[(][^\])]*[\])]").expect("static fuzzy-match regex is valid")
});
static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static fuzzy-match regex is valid"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static fuzzy-match regex is valid"));

/// Lowercase, strip bracketed/parenthesized tags, fold non-alphanumerics to
/// spaces, collapse whitespace.
#[must_use]
pub fn normalize(input: &str) -> String {
    let lower = input.to_lowercase();
    let stripped = BRACKETED.replace_all(&lower, " ");
    let folded = NON_ALNUM.replace_all(&stripped, " ");
    WHITESPACE.replace_all(folded.trim(), " ").into_owned()
}

/// Similarity in `[0, 1]` between two already-normalized strings.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// A candidate considered by [`best_match`].
pub struct Candidate<T> {
    pub title: String,
    pub artist: String,
    pub value: T,
}

/// Combine title+artist, normalize, score every candidate against the
/// original `title`/`artist`, and return the highest scorer clearing
/// [`ACCEPT_THRESHOLD`] (ties broken by input order).
#[must_use]
pub fn best_match<T>(title: &str, artist: &str, candidates: Vec<Candidate<T>>) -> Option<T> {
    let wanted = normalize(&format!("{title} {artist}"));
    let mut best: Option<(f64, T)> = None;
    for candidate in candidates {
        let have = normalize(&format!("{} {}", candidate.title, candidate.artist));
        let score = similarity(&wanted, &have);
        if score < ACCEPT_THRESHOLD {
            continue;
        }
        if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
            best = Some((score, candidate.value));
        }
    }
    best.map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_bracketed_tags_and_folds_case() {
        assert_eq!(
            normalize("Rolling In The Deep (Official Music Video)"),
            "rolling in the deep"
        );
    }

    #[test]
    fn normalize_collapses_punctuation_to_single_spaces() {
        assert_eq!(normalize("J. Balvin -- Mi Gente!!"), "j balvin mi gente");
    }

    #[test]
    fn identical_strings_score_one() {
        assert!((similarity("hello world", "hello world") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn best_match_picks_highest_scoring_candidate_above_threshold() {
        let candidates = vec![
            Candidate {
                title: "Completely Unrelated Song".to_string(),
                artist: "Nobody".to_string(),
                value: "bad",
            },
            Candidate {
                title: "Rolling in the Deep".to_string(),
                artist: "Adele".to_string(),
                value: "good",
            },
        ];
        let picked = best_match("Rolling In The Deep", "Adele", candidates);
        assert_eq!(picked, Some("good"));
    }

    #[test]
    fn best_match_returns_none_when_nothing_clears_threshold() {
        let candidates = vec![Candidate {
            title: "Totally Different Track".to_string(),
            artist: "Someone Else".to_string(),
            value: "nope",
        }];
        assert_eq!(best_match("Rolling in the Deep", "Adele", candidates), None);
    }
}
