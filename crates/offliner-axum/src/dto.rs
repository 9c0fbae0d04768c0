//! Wire shapes for the HTTP edge (spec §6). `POST /download` accepts
//! form-encoded fields, several of which are themselves JSON-encoded
//! strings — matching the source's `request.form.get("user_config")`
//! style rather than a single nested JSON body.

use serde::{Deserialize, Serialize};

use offliner_core::domain::{ItemOverridesMap, RequestId, UserConfig};

/// `POST /download` form fields.
#[derive(Debug, Deserialize)]
pub struct DownloadForm {
    #[serde(rename = "inputURL", default)]
    pub input_url: String,
    #[serde(default)]
    pub is_playlist_mode: bool,
    #[serde(default)]
    pub selected_urls: String,
    #[serde(default = "default_json_object")]
    pub user_config: String,
    #[serde(default = "default_json_object")]
    pub item_configs: String,
}

fn default_json_object() -> String {
    "{}".to_string()
}

#[derive(Debug, Serialize)]
pub struct DownloadAccepted {
    pub request_id: RequestId,
}

/// Parsed, pre-validation view of a `DownloadForm` — just the bits
/// `UserConfig`/`ItemOverridesMap` deserialization can fail on, kept
/// separate from `offliner_core::domain::Request` construction so a
/// malformed sub-field reports `BadRequest` instead of panicking.
pub struct ParsedDownloadForm {
    pub user_config: UserConfig,
    pub selected_urls: Vec<String>,
    pub item_configs: ItemOverridesMap,
}

impl DownloadForm {
    pub fn parse(&self) -> Result<ParsedDownloadForm, String> {
        let user_config: UserConfig =
            serde_json::from_str(&self.user_config).map_err(|e| format!("invalid user_config: {e}"))?;

        let selected_urls: Vec<String> = if self.is_playlist_mode && !self.selected_urls.is_empty() {
            serde_json::from_str(&self.selected_urls).map_err(|e| format!("invalid selected_urls: {e}"))?
        } else {
            Vec::new()
        };

        let item_configs: ItemOverridesMap = serde_json::from_str(&self.item_configs)
            .map_err(|e| format!("invalid item_configs: {e}"))?;

        Ok(ParsedDownloadForm {
            user_config,
            selected_urls,
            item_configs,
        })
    }
}
