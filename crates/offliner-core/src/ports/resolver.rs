//! The Media Resolver port (spec §4.3).

use async_trait::async_trait;

use crate::domain::{ItemOverridesMap, Target};
use crate::error::CoreError;

/// Turns a job's raw inputs into an ordered list of `Target`s.
#[async_trait]
pub trait ResolverPort: Send + Sync {
    /// Resolve `raw_input` (or, in playlist mode, `selected_urls`) into
    /// concrete targets. Returns `CoreError::ResolutionFailed` if nothing
    /// could be resolved (spec §4.3 step 1 empty input is
    /// `CoreError::InputInvalid` instead, raised before this is called).
    async fn resolve(
        &self,
        raw_input: &str,
        is_playlist_mode: bool,
        selected_urls: &[String],
        item_configs: &ItemOverridesMap,
        prefer_alternate_source: bool,
        want_audio: bool,
    ) -> Result<Vec<Target>, CoreError>;
}
