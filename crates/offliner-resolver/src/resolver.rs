//! Media Resolver (spec §4.3): turns a job's raw inputs into an ordered
//! list of `Target`s.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use offliner_core::config::QuotaLimits;
use offliner_core::domain::{ItemOverridesMap, Platform, Target};
use offliner_core::error::CoreError;
use offliner_core::ports::ResolverPort;

use crate::cache::TtlCache;
use crate::fuzzy::{self, Candidate};
use crate::platform_b_client::PlatformBClient;
use crate::search_text::clean_title_for_search;
use crate::youtube_client::{FlatEntry, YoutubeToolClient};

const CACHE_TTL: Duration = Duration::from_secs(600);
const TRANSLATION_CACHE_CAPACITY: usize = 512;
const SEARCH_CACHE_CAPACITY: usize = 256;
const TRANSLATION_CONCURRENCY: usize = 8;
const SEARCH_CANDIDATE_LIMIT: usize = 10;

/// Resolves raw job input (a URL, free text, or a playlist selection) into
/// concrete, per-item `Target`s.
///
/// Cheaply `Clone`: every field is an `Arc`, so a clone can be moved into a
/// spawned translation task without borrowing from `self`.
#[derive(Clone)]
pub struct MediaResolver {
    youtube: Arc<YoutubeToolClient>,
    platform_b: Option<Arc<PlatformBClient>>,
    translation_cache: Arc<TtlCache<Option<Target>>>,
    search_cache: Arc<TtlCache<Vec<FlatEntry>>>,
    quota: QuotaLimits,
}

impl MediaResolver {
    #[must_use]
    pub fn new(youtube: YoutubeToolClient, platform_b: Option<PlatformBClient>) -> Self {
        Self::with_quota_limits(youtube, platform_b, QuotaLimits::default())
    }

    #[must_use]
    pub fn with_quota_limits(
        youtube: YoutubeToolClient,
        platform_b: Option<PlatformBClient>,
        quota: QuotaLimits,
    ) -> Self {
        Self {
            youtube: Arc::new(youtube),
            platform_b: platform_b.map(Arc::new),
            translation_cache: Arc::new(TtlCache::new(CACHE_TTL, TRANSLATION_CACHE_CAPACITY)),
            search_cache: Arc::new(TtlCache::new(CACHE_TTL, SEARCH_CACHE_CAPACITY)),
            quota,
        }
    }

    fn check_playlist_cap(&self, item_count: usize) -> Result<(), CoreError> {
        if self.quota.playlist_exceeds_cap(item_count) {
            return Err(CoreError::InputInvalid {
                message: format!(
                    "playlist has {item_count} items, which exceeds the configured cap of {}",
                    self.quota.max_playlist_items
                ),
            });
        }
        Ok(())
    }

    fn flat_entry_to_target(entry: &FlatEntry, platform: Platform) -> Target {
        let url = entry.resolved_url().unwrap_or_else(|| entry.id.clone());
        let mut target = Target::new(
            entry.id.clone(),
            url,
            entry
                .title
                .clone()
                .unwrap_or_else(|| "Unknown title".to_string()),
            entry
                .uploader
                .clone()
                .unwrap_or_else(|| "Unknown uploader".to_string()),
            platform,
        );
        if let Some(duration) = entry.duration {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let secs = duration.max(0.0) as u64;
            target = target.with_duration(secs);
        }
        target
    }

    async fn search_cached(
        &self,
        key: &str,
        prefer_music: bool,
        limit: usize,
    ) -> Result<Vec<FlatEntry>, CoreError> {
        if let Some(hit) = self.search_cache.get(key) {
            return Ok(hit);
        }
        let result = if prefer_music {
            self.youtube.search_music(key, limit).await
        } else {
            self.youtube.search(key, limit).await
        }
        .map_err(|e| CoreError::ResolutionFailed {
            message: e.to_string(),
        })?;
        self.search_cache.insert(key.to_string(), result.clone());
        Ok(result)
    }

    /// Translate a (title, artist) pair from platform B into a downloadable
    /// platform-A target, gated by the fuzzy-match threshold (spec §4.3.1).
    async fn translate_to_youtube(
        &self,
        title: &str,
        artist: &str,
        prefer_music_catalog: bool,
    ) -> Option<Target> {
        let cache_key = format!("{title}\u{1}{artist}\u{1}{prefer_music_catalog}");
        if let Some(cached) = self.translation_cache.get(&cache_key) {
            return cached;
        }

        let query = format!("{} {}", clean_title_for_search(title), artist);
        let candidates = match self
            .search_cached(&query, prefer_music_catalog, SEARCH_CANDIDATE_LIMIT)
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "platform-A search failed during translation");
                self.translation_cache.insert(cache_key, None);
                return None;
            }
        };

        let scored: Vec<Candidate<FlatEntry>> = candidates
            .into_iter()
            .map(|entry| Candidate {
                title: entry.title.clone().unwrap_or_default(),
                artist: entry.uploader.clone().unwrap_or_default(),
                value: entry,
            })
            .collect();

        let matched = fuzzy::best_match(title, artist, scored)
            .map(|entry| Self::flat_entry_to_target(&entry, Platform::YouTube));
        self.translation_cache.insert(cache_key, matched.clone());
        matched
    }

    fn spotify_id(url: &str) -> Option<&str> {
        url.split("spotify.com/")
            .nth(1)?
            .split('/')
            .nth(1)?
            .split(['?', '#'])
            .next()
    }

    async fn resolve_single_item(
        &self,
        url: &str,
        platform: Platform,
        prefer_alternate_source: bool,
        want_audio: bool,
    ) -> Result<Target, CoreError> {
        match platform {
            Platform::YouTube | Platform::YouTubeMusic => {
                let entry =
                    self.youtube
                        .probe_single(url)
                        .await
                        .map_err(|e| CoreError::ResolutionFailed {
                            message: e.to_string(),
                        })?;
                // A music.youtube.com/watch reference resolves to the same
                // underlying video the general tool can fetch directly, so
                // it's tagged YouTube here: the only platform the Download
                // Engine is ever handed.
                Ok(Self::flat_entry_to_target(&entry, Platform::YouTube))
            }
            Platform::Spotify => {
                let client =
                    self.platform_b
                        .as_ref()
                        .ok_or_else(|| CoreError::ResolutionFailed {
                            message: "platform-B credentials are not configured".to_string(),
                        })?;
                let id = Self::spotify_id(url).ok_or_else(|| CoreError::ResolutionFailed {
                    message: "unrecognized platform-B track URL".to_string(),
                })?;
                let meta =
                    client
                        .track(id)
                        .await
                        .map_err(|e| CoreError::ResolutionFailed {
                            message: e.to_string(),
                        })?;
                let prefer_music = prefer_alternate_source && want_audio;
                self.translate_to_youtube(&meta.title, &meta.artist, prefer_music)
                    .await
                    .ok_or_else(|| CoreError::ResolutionFailed {
                        message: format!(
                            "no matching platform-A result for '{}' by '{}'",
                            meta.title, meta.artist
                        ),
                    })
            }
        }
    }

    async fn expand_playlist(
        &self,
        url: &str,
        platform: Platform,
        prefer_alternate_source: bool,
        want_audio: bool,
    ) -> Result<Vec<Target>, CoreError> {
        match platform {
            Platform::YouTube | Platform::YouTubeMusic => {
                let entries =
                    self.youtube
                        .list_flat(url)
                        .await
                        .map_err(|e| CoreError::ResolutionFailed {
                            message: e.to_string(),
                        })?;
                self.check_playlist_cap(entries.len())?;
                Ok(entries
                    .iter()
                    .map(|entry| Self::flat_entry_to_target(entry, Platform::YouTube))
                    .collect())
            }
            Platform::Spotify => {
                let client =
                    self.platform_b
                        .as_ref()
                        .ok_or_else(|| CoreError::ResolutionFailed {
                            message: "platform-B credentials are not configured".to_string(),
                        })?;
                let is_album = url.contains("/album/");
                let collection_id =
                    Self::spotify_id(url).ok_or_else(|| CoreError::ResolutionFailed {
                        message: "unrecognized platform-B collection URL".to_string(),
                    })?;
                let page_size = platform.page_size(is_album);

                let mut pairs = Vec::new();
                let mut offset = 0;
                loop {
                    let page = client
                        .page(collection_id, is_album, offset, page_size)
                        .await
                        .map_err(|e| CoreError::ResolutionFailed {
                            message: e.to_string(),
                        })?;
                    let fetched = page.len();
                    pairs.extend(page);
                    if fetched < page_size {
                        break;
                    }
                    offset += page_size;
                }
                self.check_playlist_cap(pairs.len())?;

                let prefer_music = prefer_alternate_source && want_audio;
                let semaphore = Arc::new(Semaphore::new(TRANSLATION_CONCURRENCY));
                let mut joins = JoinSet::new();
                for pair in pairs {
                    let semaphore = semaphore.clone();
                    let resolver = self.clone();
                    joins.spawn(async move {
                        let _permit = semaphore.acquire_owned().await.ok();
                        resolver
                            .translate_to_youtube(&pair.title, &pair.artist, prefer_music)
                            .await
                    });
                }

                let mut targets = Vec::new();
                while let Some(result) = joins.join_next().await {
                    if let Ok(Some(target)) = result {
                        targets.push(target);
                    }
                }
                Ok(targets)
            }
        }
    }
}

fn apply_overrides(mut targets: Vec<Target>, item_configs: &ItemOverridesMap) -> Vec<Target> {
    for target in &mut targets {
        if let Some(overrides) = item_configs.get(&target.url) {
            target.override_mode = overrides.mode;
        }
    }
    targets
}

#[async_trait]
impl ResolverPort for MediaResolver {
    async fn resolve(
        &self,
        raw_input: &str,
        is_playlist_mode: bool,
        selected_urls: &[String],
        item_configs: &ItemOverridesMap,
        prefer_alternate_source: bool,
        want_audio: bool,
    ) -> Result<Vec<Target>, CoreError> {
        if is_playlist_mode && !selected_urls.is_empty() {
            self.check_playlist_cap(selected_urls.len())?;
            let semaphore = Arc::new(Semaphore::new(TRANSLATION_CONCURRENCY));
            let mut joins = JoinSet::new();
            for (index, url) in selected_urls.iter().cloned().enumerate() {
                let youtube = self.youtube.clone();
                let semaphore = semaphore.clone();
                joins.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let platform = Platform::detect(&url).unwrap_or(Platform::YouTube);
                    let entry = youtube.probe_single(&url).await;
                    (index, url, platform, entry)
                });
            }
            let mut ordered: Vec<Option<Target>> = vec![None; selected_urls.len()];
            while let Some(result) = joins.join_next().await {
                let (index, url, platform, entry) =
                    result.map_err(|e| CoreError::ResolutionFailed {
                        message: e.to_string(),
                    })?;
                match entry {
                    Ok(entry) => {
                        let tagged = if platform.is_downloadable() {
                            platform
                        } else {
                            Platform::YouTube
                        };
                        ordered[index] = Some(Self::flat_entry_to_target(&entry, tagged));
                    }
                    Err(e) => warn!(url = %url, error = %e, "skipping unresolvable selection"),
                }
            }
            let targets: Vec<Target> = ordered.into_iter().flatten().collect();
            if targets.is_empty() {
                return Err(CoreError::ResolutionFailed {
                    message: "none of the selected targets could be resolved".to_string(),
                });
            }
            return Ok(apply_overrides(targets, item_configs));
        }

        let trimmed = raw_input.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InputInvalid {
                message: "input must not be empty".to_string(),
            });
        }

        let targets = match Platform::detect(trimmed) {
            Some(platform) if platform.is_playlist_url(trimmed) => {
                self.expand_playlist(trimmed, platform, prefer_alternate_source, want_audio)
                    .await?
            }
            Some(platform) if platform.is_single_item_url(trimmed) => {
                vec![
                    self.resolve_single_item(
                        trimmed,
                        platform,
                        prefer_alternate_source,
                        want_audio,
                    )
                    .await?,
                ]
            }
            _ => {
                let prefer_music = prefer_alternate_source && want_audio;
                let entries = self.search_cached(trimmed, prefer_music, 1).await?;
                entries
                    .first()
                    .map(|entry| Self::flat_entry_to_target(entry, Platform::YouTube))
                    .into_iter()
                    .collect()
            }
        };

        if targets.is_empty() {
            return Err(CoreError::ResolutionFailed {
                message: "no results".to_string(),
            });
        }
        Ok(apply_overrides(targets, item_configs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_with_cap(max_playlist_items: u32) -> MediaResolver {
        let quota = QuotaLimits {
            max_playlist_items,
            ..QuotaLimits::default()
        };
        MediaResolver::with_quota_limits(YoutubeToolClient::new(), None, quota)
    }

    #[test]
    fn playlist_cap_boundary_is_inclusive() {
        let resolver = resolver_with_cap(2);
        assert!(resolver.check_playlist_cap(2).is_ok());
        assert!(resolver.check_playlist_cap(3).is_err());
    }

    #[test]
    fn playlist_cap_violation_is_input_invalid() {
        let resolver = resolver_with_cap(1);
        match resolver.check_playlist_cap(5) {
            Err(CoreError::InputInvalid { .. }) => {}
            other => panic!("expected InputInvalid, got {other:?}"),
        }
    }
}
