//! The `Request` (spec §3): owned by the HTTP edge until enqueued.

use serde::{Deserialize, Serialize};

use super::{ItemOverridesMap, RequestId, UserConfig};

/// A user's download request, immutable once enqueued.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub request_id: RequestId,
    /// Raw URL or free-text search query.
    pub raw_input: String,
    pub is_playlist_mode: bool,
    /// Selected target references, only meaningful when `is_playlist_mode`.
    pub selected_urls: Vec<String>,
    pub user_config: UserConfig,
    pub item_configs: ItemOverridesMap,
    /// Opaque string used only for quota accounting, never for authn/z.
    pub client_identity: String,
}

impl Request {
    /// Validate the input-shape invariants the HTTP edge must enforce
    /// before enqueueing (spec §8 "Empty input rejected... even when
    /// playlist-mode flag is true but selections are empty").
    pub fn validate(&self) -> Result<(), String> {
        self.user_config
            .validate()
            .map_err(|e| format!("invalid user_config: {e}"))?;

        if self.is_playlist_mode {
            if self.selected_urls.is_empty() {
                return Err("playlist-mode request has no selected_urls".to_string());
            }
        } else if self.raw_input.trim().is_empty() {
            return Err("raw_input is empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> Request {
        Request {
            request_id: RequestId::new(),
            raw_input: String::new(),
            is_playlist_mode: false,
            selected_urls: Vec::new(),
            user_config: UserConfig::default(),
            item_configs: ItemOverridesMap::new(),
            client_identity: "client-1".to_string(),
        }
    }

    #[test]
    fn empty_raw_input_rejected() {
        assert!(base_request().validate().is_err());
    }

    #[test]
    fn playlist_mode_with_empty_selection_rejected_even_if_flag_true() {
        let mut req = base_request();
        req.is_playlist_mode = true;
        req.raw_input = "ignored".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn playlist_mode_with_selection_accepted() {
        let mut req = base_request();
        req.is_playlist_mode = true;
        req.selected_urls = vec!["https://youtu.be/abc".to_string()];
        assert!(req.validate().is_ok());
    }
}
