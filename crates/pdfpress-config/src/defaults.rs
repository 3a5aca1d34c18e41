//! Default values for a freshly initialised configuration.
//!
//! # Design
//! - Mirror the manual Ghostscript command the pipeline replaces.
//! - Keep every literal in one place so model defaults and tests agree.

/// Default configuration file name, resolved relative to the working directory.
pub const CONFIG_FILE_NAME: &str = "config.json";
/// Default PDF compatibility level passed to the compressor.
pub const COMPATIBILITY_LEVEL: &str = "1.4";
/// Default per-channel image resolution (dpi).
pub const IMAGE_RESOLUTION: u32 = 115;
/// Default downsample threshold; `1.0` forces downsampling of any image above target.
pub const DOWNSAMPLE_THRESHOLD: f64 = 1.0;
/// Compatibility levels accepted by the compressor.
pub const ALLOWED_COMPATIBILITY_LEVELS: &[&str] = &["1.3", "1.4", "1.5", "1.6", "1.7", "2.0"];
