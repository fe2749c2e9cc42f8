//! Default filesystem locations.
//!
//! Uses the [`dirs`] crate for the platform config directory. The working
//! directories for samples and output are relative to the current directory
//! unless overridden.
//!
//! # Environment Overrides
//!
//! - `GRIDSPLIT_CONFIG_DIR` overrides [`config_dir`]
//! - `GRIDSPLIT_OUTPUT_DIR` overrides [`output_dir`]
//! - `GRIDSPLIT_SAMPLES_DIR` overrides [`samples_dir`]

use std::path::PathBuf;

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/gridsplit/` by default.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("GRIDSPLIT_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("gridsplit"))
        .unwrap_or_else(|| PathBuf::from(".gridsplit"))
}

/// Config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Output root, `output` unless overridden.
#[must_use]
pub fn output_dir() -> PathBuf {
    std::env::var_os("GRIDSPLIT_OUTPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("output"))
}

/// Samples directory, `samples` unless overridden.
#[must_use]
pub fn samples_dir() -> PathBuf {
    std::env::var_os("GRIDSPLIT_SAMPLES_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("samples"))
}
