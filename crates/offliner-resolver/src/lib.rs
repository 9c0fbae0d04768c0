//! Media Resolver (spec §4.3): URL classification, cross-platform
//! translation, playlist expansion, and the fuzzy-match gate that backs it.

mod cache;
mod fuzzy;
mod platform_b_client;
mod resolver;
mod search_text;
mod youtube_client;

pub use platform_b_client::{PlatformBClient, PlatformBError, TrackMeta};
pub use resolver::MediaResolver;
pub use search_text::clean_title_for_search;
pub use youtube_client::{FlatEntry, YoutubeClientError, YoutubeToolClient};
