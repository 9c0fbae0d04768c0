//! The source-platform tag.
//!
//! Spec §9 Design Notes prefers a tagged variant over string comparison:
//! each variant carries its own URL-detection predicates instead of the
//! resolver doing `if tag == "youtube"` string matching throughout.

use serde::{Deserialize, Serialize};

/// Which external network a `Target` (or a raw user input) belongs to.
///
/// - `YouTube` is "platform A": the general video catalog, the only one the
///   Download Engine can actually pull bytes from.
/// - `YouTubeMusic` is "platform C": a music-specialized search catalog,
///   used only to narrow free-text audio searches (`prefer_alternate_source`).
/// - `Spotify` is "platform B": a music-license-centric metadata source.
///   Never downloadable directly; always resolved to a YouTube URL first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    YouTube,
    YouTubeMusic,
    Spotify,
}

impl Platform {
    /// Short, stable tag used in logs and progress details.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::YouTubeMusic => "youtube_music",
            Self::Spotify => "spotify",
        }
    }

    /// Whether this platform can ever produce a directly downloadable URL.
    ///
    /// Only `YouTube` can; `Spotify` references are always translated
    /// first (spec §4.3 "Cross-platform translation"), and `YouTubeMusic`
    /// is a search-only catalog in this deployment.
    #[must_use]
    pub const fn is_downloadable(self) -> bool {
        matches!(self, Self::YouTube)
    }

    /// Detect whether `url` is a single-item reference on this platform.
    #[must_use]
    pub fn is_single_item_url(self, url: &str) -> bool {
        let url = url.trim();
        match self {
            Self::YouTube => {
                (url.contains("youtube.com/watch") || url.contains("youtu.be/"))
                    && !Self::YouTube.is_playlist_url(url)
            }
            Self::YouTubeMusic => url.contains("music.youtube.com/watch"),
            Self::Spotify => url.contains("open.spotify.com/track/"),
        }
    }

    /// Detect whether `url` is a playlist/album reference on this platform.
    #[must_use]
    pub fn is_playlist_url(self, url: &str) -> bool {
        let url = url.trim();
        match self {
            Self::YouTube => url.contains("list=") || url.contains("youtube.com/playlist"),
            Self::YouTubeMusic => url.contains("music.youtube.com/playlist"),
            Self::Spotify => {
                url.contains("open.spotify.com/playlist/") || url.contains("open.spotify.com/album/")
            }
        }
    }

    /// Page size used when paginating this platform's playlist/album API
    /// (spec §4.3 "Playlist expansion": 50 for albums, 100 for playlists).
    #[must_use]
    pub const fn page_size(self, is_album: bool) -> usize {
        match self {
            Self::Spotify => {
                if is_album {
                    50
                } else {
                    100
                }
            }
            Self::YouTube | Self::YouTubeMusic => 100,
        }
    }

    /// Detect the platform of a raw URL, trying each recognized marker.
    /// Returns `None` for free text (the resolver then falls back to search).
    #[must_use]
    pub fn detect(url: &str) -> Option<Self> {
        for platform in [Self::Spotify, Self::YouTubeMusic, Self::YouTube] {
            if platform.is_single_item_url(url) || platform.is_playlist_url(url) {
                return Some(platform);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_youtube_single_item() {
        assert_eq!(
            Platform::detect("https://www.youtube.com/watch?v=abc123"),
            Some(Platform::YouTube)
        );
    }

    #[test]
    fn detects_youtube_playlist_over_single_item() {
        let url = "https://www.youtube.com/watch?v=abc123&list=PL123";
        assert!(Platform::YouTube.is_playlist_url(url));
        assert!(!Platform::YouTube.is_single_item_url(url));
    }

    #[test]
    fn detects_spotify_album() {
        assert_eq!(
            Platform::detect("https://open.spotify.com/album/xyz"),
            Some(Platform::Spotify)
        );
    }

    #[test]
    fn free_text_is_undetected() {
        assert_eq!(Platform::detect("never gonna give you up"), None);
    }

    #[test]
    fn only_youtube_is_downloadable() {
        assert!(Platform::YouTube.is_downloadable());
        assert!(!Platform::Spotify.is_downloadable());
        assert!(!Platform::YouTubeMusic.is_downloadable());
    }
}
