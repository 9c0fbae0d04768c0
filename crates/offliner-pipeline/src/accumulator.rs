//! The per-job result accumulator (spec §4.5 step 3): counters and
//! produced-files, shared across worker tasks behind a lock.

use std::path::PathBuf;

use offliner_core::domain::RequestId;

/// Success/failure counts per mode, for logging at job completion.
#[derive(Clone, Copy, Debug, Default)]
pub struct Counters {
    pub audio_ok: u32,
    pub audio_err: u32,
    pub video_ok: u32,
    pub video_err: u32,
}

/// Read by every worker task in the pool; always accessed through a
/// `tokio::sync::Mutex` since updates happen from async contexts.
#[derive(Clone, Debug)]
pub struct DownloadResult {
    pub request_id: RequestId,
    pub counters: Counters,
    pub produced_files: Vec<PathBuf>,
    pub total_items: u32,
    pub completed_items: u32,
}

impl DownloadResult {
    #[must_use]
    pub const fn new(request_id: RequestId, total_items: u32) -> Self {
        Self {
            request_id,
            counters: Counters {
                audio_ok: 0,
                audio_err: 0,
                video_ok: 0,
                video_err: 0,
            },
            produced_files: Vec::new(),
            total_items,
            completed_items: 0,
        }
    }

    /// `15 + (completed_items/total_items) * 70` (spec §4.5 step 6b).
    #[must_use]
    pub fn progress_pct(&self) -> u8 {
        if self.total_items == 0 {
            return 85;
        }
        let fraction = f64::from(self.completed_items) / f64::from(self.total_items);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = (15.0 + fraction * 70.0).clamp(0.0, 100.0) as u8;
        pct
    }

    /// `15 + ((completed_items + local_pct/100) / total_items) * 75`, capped
    /// at 90 (spec §4.4.1 transfer-hook overall-percent formula) — the
    /// per-byte path the external-tool progress callback actually drives,
    /// distinct from `progress_pct()`'s per-item (§4.5 step 6b) formula.
    #[must_use]
    pub fn interpolated_pct(&self, item_local_percent: u8) -> u8 {
        if self.total_items == 0 {
            return 85;
        }
        let base = f64::from(self.completed_items) / f64::from(self.total_items);
        let slice = 1.0 / f64::from(self.total_items);
        let fraction = base + slice * (f64::from(item_local_percent) / 100.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = (15.0 + fraction * 75.0).clamp(0.0, 90.0) as u8;
        pct
    }

    pub fn record_success(&mut self, mode: offliner_core::domain::Mode, path: PathBuf) {
        match mode {
            offliner_core::domain::Mode::Audio => self.counters.audio_ok += 1,
            offliner_core::domain::Mode::Video => self.counters.video_ok += 1,
        }
        self.produced_files.push(path);
        self.completed_items += 1;
    }

    pub fn record_failure(&mut self, mode: offliner_core::domain::Mode) {
        match mode {
            offliner_core::domain::Mode::Audio => self.counters.audio_err += 1,
            offliner_core::domain::Mode::Video => self.counters.video_err += 1,
        }
        self.completed_items += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offliner_core::domain::Mode;

    #[test]
    fn progress_pct_spans_15_to_85() {
        let mut result = DownloadResult::new(RequestId::new(), 4);
        assert_eq!(result.progress_pct(), 15);
        result.completed_items = 2;
        assert_eq!(result.progress_pct(), 50);
        result.completed_items = 4;
        assert_eq!(result.progress_pct(), 85);
    }

    #[test]
    fn interpolated_pct_moves_within_a_slice() {
        let result = DownloadResult::new(RequestId::new(), 2);
        let at_start = result.interpolated_pct(0);
        let at_half = result.interpolated_pct(50);
        assert!(at_half > at_start);
    }

    #[test]
    fn interpolated_pct_matches_transfer_hook_formula() {
        // 15 + ((0 + 50/100) / 1) * 75 = 52.5, truncated to 52.
        let result = DownloadResult::new(RequestId::new(), 1);
        assert_eq!(result.interpolated_pct(50), 52);
    }

    #[test]
    fn interpolated_pct_caps_at_90() {
        let result = DownloadResult::new(RequestId::new(), 1);
        assert_eq!(result.interpolated_pct(100), 90);
    }

    #[test]
    fn record_success_tracks_mode_and_file() {
        let mut result = DownloadResult::new(RequestId::new(), 1);
        result.record_success(Mode::Audio, PathBuf::from("/tmp/x.mp3"));
        assert_eq!(result.counters.audio_ok, 1);
        assert_eq!(result.produced_files.len(), 1);
        assert_eq!(result.completed_items, 1);
    }
}
