//! Filename sanitization for the Download Engine's output path convention
//! (spec §4.4 "Path convention").

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const MAX_STEM_LENGTH: usize = 200;

static FORBIDDEN_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("static sanitize regex is valid"));
static TRAILING_DOTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.+$").expect("static sanitize regex is valid"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static sanitize regex is valid"));

/// Strip characters forbidden on common filesystems, trim trailing dots,
/// collapse whitespace, NFKD-normalize then ASCII-fold, cap at 200 chars.
#[must_use]
pub fn sanitize_stem(raw: &str) -> String {
    let trimmed = raw.trim();
    let no_forbidden = FORBIDDEN_CHARS.replace_all(trimmed, "");
    let no_trailing_dots = TRAILING_DOTS.replace(no_forbidden.trim(), "");
    let collapsed = WHITESPACE.replace_all(no_trailing_dots.trim(), " ");

    let folded: String = collapsed
        .nfkd()
        .filter(|c| c.is_ascii())
        .collect::<String>();
    let folded = if folded.trim().is_empty() {
        collapsed.trim().to_string()
    } else {
        folded.trim().to_string()
    };

    folded.chars().take(MAX_STEM_LENGTH).collect::<String>()
}

/// Extensions treated as post-processing sidecars, cleaned up after a
/// successful download (spec §4.4 "Sidecar cleanup").
pub const SIDECAR_EXTENSIONS: &[&str] = &["jpg", "png", "webp", "vtt", "srt", "ass"];

/// Whether `file_name` is a sidecar of `stem` — either a bare sidecar
/// extension or a language-suffixed subtitle variant
/// (`<stem>.en.srt`, `<stem>.es-orig.vtt`).
#[must_use]
pub fn is_sidecar_of(stem: &str, file_name: &str) -> bool {
    let Some(rest) = file_name.strip_prefix(stem) else {
        return false;
    };
    let Some(rest) = rest.strip_prefix('.') else {
        return false;
    };
    let Some(ext) = rest.rsplit('.').next() else {
        return false;
    };
    SIDECAR_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_windows_forbidden_characters() {
        assert_eq!(sanitize_stem(r#"a<b>c:d"e/f\g|h?i*j"#), "abcdefghij");
    }

    #[test]
    fn trims_trailing_dots_and_collapses_whitespace() {
        assert_eq!(sanitize_stem("My  Title...  "), "My Title");
    }

    #[test]
    fn ascii_folds_accented_characters() {
        assert_eq!(sanitize_stem("Café Münchën"), "Cafe Munchen");
    }

    #[test]
    fn caps_length_at_200_characters() {
        let long = "a".repeat(250);
        assert_eq!(sanitize_stem(&long).len(), 200);
    }

    #[test]
    fn keeps_hash_character_which_is_windows_legal() {
        assert_eq!(sanitize_stem("Track #3"), "Track #3");
    }

    #[test]
    fn detects_plain_sidecar_extension() {
        assert!(is_sidecar_of("My Song - Artist", "My Song - Artist.jpg"));
    }

    #[test]
    fn detects_language_suffixed_subtitle_sidecar() {
        assert!(is_sidecar_of("My Song - Artist", "My Song - Artist.es-orig.vtt"));
    }

    #[test]
    fn unrelated_file_is_not_a_sidecar() {
        assert!(!is_sidecar_of("My Song - Artist", "Other File.jpg"));
    }
}
