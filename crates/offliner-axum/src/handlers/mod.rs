pub mod download;
pub mod download_file;
pub mod stream_progress;
