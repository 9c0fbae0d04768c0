//! Parses the external media tool's `--progress-template` JSON lines.
//!
//! The tool is invoked with two templates — `download:%(progress)j` and
//! `postprocess:%(progress)j` — so each emitted line carries a `download:`
//! or `postprocess:` prefix followed by a JSON object, letting a single
//! stdout reader dispatch both event kinds without guessing at shape.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DownloadProgress {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub downloaded_bytes: u64,
    #[serde(default)]
    pub total_bytes: Option<u64>,
    #[serde(default)]
    pub total_bytes_estimate: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub eta: Option<u64>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl DownloadProgress {
    #[must_use]
    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes.or_else(|| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            self.total_bytes_estimate.map(|v| v.max(0.0) as u64)
        })
    }

    #[must_use]
    pub fn local_percent(&self) -> u8 {
        match self.total_bytes() {
            Some(total) if total > 0 => {
                let pct = (self.downloaded_bytes as f64 / total as f64) * 100.0;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let pct = pct.clamp(0.0, 100.0) as u8;
                pct
            }
            _ => 0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PostprocessProgress {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub postprocessor: Option<String>,
}

pub enum Event {
    Download(DownloadProgress),
    Postprocess(PostprocessProgress),
}

/// Parse one stdout line into an `Event`, or `None` for lines that aren't
/// one of our progress-template outputs (e.g. warnings printed to stdout).
#[must_use]
pub fn parse_line(line: &str) -> Option<Event> {
    if let Some(rest) = line.strip_prefix("download:") {
        serde_json::from_str(rest).ok().map(Event::Download)
    } else if let Some(rest) = line.strip_prefix("postprocess:") {
        serde_json::from_str(rest).ok().map(Event::Postprocess)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_download_event() {
        let line = r#"download:{"status":"downloading","downloaded_bytes":500,"total_bytes":1000}"#;
        match parse_line(line) {
            Some(Event::Download(progress)) => {
                assert_eq!(progress.local_percent(), 50);
            }
            _ => panic!("expected a download event"),
        }
    }

    #[test]
    fn parses_postprocess_event() {
        let line = r#"postprocess:{"status":"started","postprocessor":"FFmpegExtractAudio"}"#;
        match parse_line(line) {
            Some(Event::Postprocess(progress)) => {
                assert_eq!(progress.postprocessor.as_deref(), Some("FFmpegExtractAudio"));
            }
            _ => panic!("expected a postprocess event"),
        }
    }

    #[test]
    fn non_protocol_lines_are_ignored() {
        assert!(parse_line("[youtube] Extracting URL").is_none());
    }

    #[test]
    fn falls_back_to_total_bytes_estimate() {
        let line =
            r#"download:{"status":"downloading","downloaded_bytes":250,"total_bytes_estimate":1000.0}"#;
        match parse_line(line) {
            Some(Event::Download(progress)) => assert_eq!(progress.local_percent(), 25),
            _ => panic!("expected a download event"),
        }
    }
}
