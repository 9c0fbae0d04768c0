//! Free-text search query cleanup.
//!
//! Distinct from filename sanitization (`offliner-download`'s stem
//! sanitizer): this strips video-specific noise — "(Official Video)"
//! style tags, raw URLs, social handles, quality markers, decorative
//! emoji — so a YouTube title makes a usable music-catalog search query.

use regex::Regex;
use std::sync::LazyLock;

static NOISE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)[\[(]\s*official\s*(lyric|audio|video|clip|trailer|teaser|stream)?\s*[\])]",
        r"(?i)[\[(]\s*video\s*oficial\s*[\])]",
        r"(?i)[\[(]\s*audio\s*oficial\s*[\])]",
        r"(?i)[\[(]\s*letra\s*[\])]",
        r"(?i)[\[(]\s*lyrics?\s*[\])]",
        r"(?i)[\[(]\s*visualizer\s*[\])]",
        r"(?i)[\[(]\s*live.*?[\])]",
        r"https?://\S+",
        r"(?i)www\.\S+",
        r"(?i)youtu\.?be\S*",
        r"@\w+",
        r"(?i)\b(4k|8k|uhd|hdr|full hd|1080p|720p|60fps|30fps|hq|lq)\b",
        r"[\u{1F300}-\u{1FAFF}\u{2600}-\u{27BF}\u{2B00}-\u{2BFF}]",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static search-cleanup regex is valid"))
    .collect()
});

/// Clean a video title into a search query for the music-specialized
/// catalog, keeping the essential song name.
#[must_use]
pub fn clean_title_for_search(title: &str) -> String {
    let mut cleaned = title.trim().to_string();
    for pattern in NOISE_PATTERNS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned = cleaned.replace("||", " ").replace('|', " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_official_video_tag() {
        assert_eq!(
            clean_title_for_search("Mi Gente (Official Music Video)"),
            "Mi Gente"
        );
    }

    #[test]
    fn strips_urls_and_handles() {
        assert_eq!(
            clean_title_for_search("Track Name https://youtu.be/xyz @someartist"),
            "Track Name"
        );
    }

    #[test]
    fn replaces_double_pipe_separator_with_space() {
        assert_eq!(
            clean_title_for_search("J Balvin || BZRP Music Sessions #62"),
            "J Balvin BZRP Music Sessions #62"
        );
    }

    #[test]
    fn strips_quality_markers() {
        assert_eq!(clean_title_for_search("Song Name (4K) (HQ)"), "Song Name");
    }
}
