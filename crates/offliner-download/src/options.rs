//! Builds the external media tool's option/argument set (spec §4.4
//! "Options construction").

use offliner_core::domain::{AudioFormat, Mode, Quality, UserConfig, VideoFormat};

pub const EXTRACTOR_RETRIES: u32 = 10;
pub const FRAGMENT_RETRIES: u32 = 10;
pub const FILE_ACCESS_RETRIES: u32 = 5;
pub const SOCKET_TIMEOUT_SECS: u32 = 60;
pub const CHUNK_SIZE_BYTES: u32 = 10 * 1024 * 1024;
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// A content-selector expression driven by `quality` and `mode`.
#[must_use]
pub fn format_selector(mode: Mode, quality: Quality, video_format: VideoFormat) -> String {
    match mode {
        Mode::Audio => match quality {
            Quality::Min => "worstaudio/worst".to_string(),
            Quality::Avg => "bestaudio[abr<=160]/bestaudio".to_string(),
            Quality::Max => "bestaudio/best".to_string(),
        },
        Mode::Video => {
            // MP4 muxing can't carry Opus audio, so MP4 requests avoid
            // pairing a webm/opus audio stream with an mp4 video stream.
            let audio_constraint = match video_format {
                VideoFormat::Mp4 => "[acodec^=mp4a]/bestaudio[ext=m4a]",
                VideoFormat::Mov | VideoFormat::Mkv | VideoFormat::Webm => "/bestaudio",
            };
            match quality {
                Quality::Min => format!("worstvideo+worstaudio{audio_constraint}/worst"),
                Quality::Avg => {
                    format!("bestvideo[height<=720]+bestaudio{audio_constraint}/best[height<=720]")
                }
                Quality::Max => format!("bestvideo+bestaudio{audio_constraint}/best"),
            }
        }
    }
}

/// Container extensions that can carry embedded cover art for each mode
/// (spec §4.4) — delegated to the domain types, which already encode this.
#[must_use]
pub fn supports_embedded_art(mode: Mode, audio_format: AudioFormat, video_format: VideoFormat) -> bool {
    match mode {
        Mode::Audio => audio_format.supports_embedded_art(),
        Mode::Video => video_format.supports_embedded_art(),
    }
}

/// Assembles the CLI argument vector for one (target, mode) download,
/// excluding the output template and URL (added by the caller).
#[must_use]
pub fn build_args(
    mode: Mode,
    config: &UserConfig,
    credentials_path: Option<&str>,
    include_sponsor_skip: bool,
    forced_client_arg: Option<&str>,
) -> Vec<String> {
    let mut args = vec![
        "-f".to_string(),
        format_selector(mode, config.quality, config.video_format),
        "--extractor-retries".to_string(),
        EXTRACTOR_RETRIES.to_string(),
        "--fragment-retries".to_string(),
        FRAGMENT_RETRIES.to_string(),
        "--file-access-retries".to_string(),
        FILE_ACCESS_RETRIES.to_string(),
        "--socket-timeout".to_string(),
        SOCKET_TIMEOUT_SECS.to_string(),
        "--http-chunk-size".to_string(),
        CHUNK_SIZE_BYTES.to_string(),
        "--user-agent".to_string(),
        USER_AGENT.to_string(),
        "--no-check-certificates".to_string(),
        "--force-ipv4".to_string(),
        "--no-continue".to_string(),
        "--no-part".to_string(),
    ];

    if let Some(path) = credentials_path {
        args.push("--cookies".to_string());
        args.push(path.to_string());
    }

    if include_sponsor_skip && config.sponsor_skip_enabled {
        let categories = if config.sponsor_skip_categories.is_empty() {
            "all".to_string()
        } else {
            config
                .sponsor_skip_categories
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(",")
        };
        args.push("--sponsorblock-remove".to_string());
        args.push(categories);
    }

    if mode == Mode::Audio {
        args.push("--extract-audio".to_string());
        args.push("--audio-format".to_string());
        args.push(config.audio_format.extension().to_string());
        args.push("--audio-quality".to_string());
        args.push(
            match config.quality {
                Quality::Min => "9",
                Quality::Avg => "5",
                Quality::Max => "0",
            }
            .to_string(),
        );
    }

    if config.embed_metadata {
        args.push("--add-metadata".to_string());
        args.push("--embed-thumbnail".to_string());
        if supports_embedded_art(mode, config.audio_format, config.video_format) {
            args.push("--convert-thumbnails".to_string());
            args.push("jpg".to_string());
        } else {
            args.push("--no-embed-thumbnail".to_string());
        }
    }

    if let Some(client) = forced_client_arg {
        args.push("--extractor-args".to_string());
        args.push(format!("youtube:player_client={client}"));
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_avg_quality_caps_bitrate() {
        assert_eq!(
            format_selector(Mode::Audio, Quality::Avg, VideoFormat::Mp4),
            "bestaudio[abr<=160]/bestaudio"
        );
    }

    #[test]
    fn mp4_video_selector_avoids_opus_audio() {
        let selector = format_selector(Mode::Video, Quality::Avg, VideoFormat::Mp4);
        assert!(selector.contains("acodec^=mp4a"));
    }

    #[test]
    fn webm_video_selector_has_no_mp4_constraint() {
        let selector = format_selector(Mode::Video, Quality::Max, VideoFormat::Webm);
        assert!(!selector.contains("acodec^=mp4a"));
    }

    #[test]
    fn sponsor_skip_only_applied_when_enabled_and_requested() {
        let mut config = UserConfig::default();
        config.sponsor_skip_enabled = false;
        let args = build_args(Mode::Audio, &config, None, true, None);
        assert!(!args.contains(&"--sponsorblock-remove".to_string()));

        config.sponsor_skip_enabled = true;
        let args = build_args(Mode::Audio, &config, None, true, None);
        assert!(args.contains(&"--sponsorblock-remove".to_string()));
    }

    #[test]
    fn skipping_sponsor_block_step_omits_it_even_if_enabled() {
        let mut config = UserConfig::default();
        config.sponsor_skip_enabled = true;
        let args = build_args(Mode::Audio, &config, None, false, None);
        assert!(!args.contains(&"--sponsorblock-remove".to_string()));
    }
}
