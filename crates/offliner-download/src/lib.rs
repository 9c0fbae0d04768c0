//! Download Engine (spec §4.4): produces one on-disk artifact per
//! (Target, Mode, UserConfig) tuple via the external media tool.

mod engine;
mod options;
mod protocol;
mod sanitize;

pub use engine::ExternalToolEngine;
pub use options::{build_args, format_selector, supports_embedded_art};
pub use sanitize::{is_sidecar_of, sanitize_stem, SIDECAR_EXTENSIONS};
