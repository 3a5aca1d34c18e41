//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers shared by the service, the pipeline, and the API.
//! - Every struct carries `#[serde(default)]` so partial documents load cleanly.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults::{COMPATIBILITY_LEVEL, DOWNSAMPLE_THRESHOLD, IMAGE_RESOLUTION};
use crate::error::ConfigError;

/// Complete configuration record persisted by [`crate::ConfigService`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory watched for incoming PDFs.
    pub source_path: String,
    /// Directory receiving compressed outputs.
    pub dest_path: String,
    /// Explicit compressor executable; auto-detected when unset.
    pub ghostscript_path: Option<String>,
    /// Compression policy applied to every attempt.
    pub policy: CompressionPolicy,
}

impl Settings {
    /// Watched directory as a path, surrounding whitespace removed.
    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        PathBuf::from(self.source_path.trim())
    }

    /// Destination directory as a path, surrounding whitespace removed.
    #[must_use]
    pub fn dest_dir(&self) -> PathBuf {
        PathBuf::from(self.dest_path.trim())
    }
}

/// Knobs translated into compressor arguments for each attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionPolicy {
    /// Target PDF compatibility level (e.g. `1.4`).
    pub compatibility_level: String,
    /// Distiller preset the compressor starts from.
    pub pdf_settings: PdfPreset,
    /// Color image handling.
    pub color: ChannelPolicy,
    /// Grayscale image handling.
    pub gray: ChannelPolicy,
    /// Monochrome image handling.
    pub mono: ChannelPolicy,
    /// Collapse identical images into one object.
    pub detect_duplicate_images: bool,
    /// Compress page content streams.
    pub compress_pages: bool,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            compatibility_level: COMPATIBILITY_LEVEL.to_string(),
            pdf_settings: PdfPreset::Screen,
            color: ChannelPolicy::default(),
            gray: ChannelPolicy::default(),
            mono: ChannelPolicy::default(),
            detect_duplicate_images: true,
            compress_pages: true,
        }
    }
}

/// Per-channel image downsampling policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelPolicy {
    /// Target resolution in dpi.
    pub resolution: u32,
    /// Resampling method.
    pub downsample: DownsampleMethod,
    /// Ratio above target resolution that triggers downsampling.
    pub threshold: f64,
}

impl Default for ChannelPolicy {
    fn default() -> Self {
        Self {
            resolution: IMAGE_RESOLUTION,
            downsample: DownsampleMethod::Bicubic,
            threshold: DOWNSAMPLE_THRESHOLD,
        }
    }
}

/// Image resampling methods accepted by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownsampleMethod {
    /// Nearest-neighbour sampling.
    Nearest,
    /// Bilinear averaging.
    Bilinear,
    /// Bicubic interpolation.
    Bicubic,
    /// Plain subsampling.
    Subsample,
}

impl DownsampleMethod {
    /// Lowercase identifier used in configuration documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Bicubic => "bicubic",
            Self::Subsample => "subsample",
        }
    }
}

impl FromStr for DownsampleMethod {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            "bicubic" => Ok(Self::Bicubic),
            "subsample" => Ok(Self::Subsample),
            _ => Err(ConfigError::invalid(
                "policy",
                "downsample",
                Some(value.to_string()),
                "unsupported_method",
            )),
        }
    }
}

impl fmt::Display for DownsampleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distiller presets understood by the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfPreset {
    /// Lowest quality, smallest output.
    Screen,
    /// Medium quality.
    Ebook,
    /// High quality.
    Printer,
    /// Highest quality, colour preserving.
    Prepress,
    /// Compressor defaults.
    Default,
}

impl PdfPreset {
    /// Lowercase identifier used in configuration documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Screen => "screen",
            Self::Ebook => "ebook",
            Self::Printer => "printer",
            Self::Prepress => "prepress",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for PdfPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_document_fills_defaults() {
        let settings: Settings = serde_json::from_value(json!({
            "source_path": "/in",
            "policy": { "color": { "resolution": 150 } }
        }))
        .expect("partial settings should deserialize");

        assert_eq!(settings.source_path, "/in");
        assert!(settings.dest_path.is_empty());
        assert_eq!(settings.policy.color.resolution, 150);
        assert_eq!(settings.policy.color.downsample, DownsampleMethod::Bicubic);
        assert_eq!(settings.policy.gray.resolution, IMAGE_RESOLUTION);
        assert_eq!(settings.policy.pdf_settings, PdfPreset::Screen);
    }

    #[test]
    fn directories_ignore_surrounding_whitespace() {
        let settings = Settings {
            source_path: "  /in ".to_string(),
            dest_path: "\t/out\n".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.source_dir(), PathBuf::from("/in"));
        assert_eq!(settings.dest_dir(), PathBuf::from("/out"));
    }

    #[test]
    fn downsample_method_parses_case_insensitively() {
        assert_eq!(
            "Bicubic".parse::<DownsampleMethod>().expect("valid method"),
            DownsampleMethod::Bicubic
        );
        assert_eq!(
            " subsample ".parse::<DownsampleMethod>().expect("valid method"),
            DownsampleMethod::Subsample
        );
        assert!("lanczos".parse::<DownsampleMethod>().is_err());
    }

    #[test]
    fn enums_serialize_lowercase() {
        let value = serde_json::to_value(CompressionPolicy::default()).expect("serialize policy");
        assert_eq!(value["pdf_settings"], json!("screen"));
        assert_eq!(value["mono"]["downsample"], json!("bicubic"));
    }
}
