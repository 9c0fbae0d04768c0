//! Core domain types and port definitions for Offliner.
//!
//! This crate defines the shapes shared by every adapter (the Redis-backed
//! progress store and broker, the media resolver, the download engine, the
//! job pipeline, the quota tracker, and the thin HTTP edge) without
//! depending on any of them. Adapters depend on `offliner-core`, never the
//! other way around.

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod ports;

pub use domain::{
    AudioFormat, ItemOverrides, ItemOverridesMap, Job, Mode, Platform, ProgressPhase,
    ProgressRecord, Quality, QuotaReason, Request, RequestId, Session, Target, UserConfig,
    VideoFormat,
};
pub use error::CoreError;
