//! Translation of a compression policy into Ghostscript arguments.
//!
//! # Design
//! - Pure and total: every policy yields an argument vector, nothing is validated here.
//! - The output switch and the input path are always the final two arguments.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;

use pdfpress_config::{ChannelPolicy, CompressionPolicy, DownsampleMethod};

/// The two fixed compression profiles, in attempt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    /// Policy as configured with optimisation flags forced on.
    Standard,
    /// RGB colour conversion with JPEG re-encoding of colour and gray images.
    RgbFallback,
}

impl ProfileKind {
    /// Profiles in the order they are attempted.
    pub const ATTEMPT_ORDER: [Self; 2] = [Self::Standard, Self::RgbFallback];

    /// Label used in logs, metrics, and temp file names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::RgbFallback => "RGBFallback",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ghostscript name for a downsample method.
#[must_use]
pub const fn downsample_type(method: DownsampleMethod) -> &'static str {
    match method {
        DownsampleMethod::Bicubic => "/Bicubic",
        DownsampleMethod::Subsample | DownsampleMethod::Nearest => "/Subsample",
        DownsampleMethod::Bilinear => "/Average",
    }
}

/// Build the full argument vector for one attempt.
#[must_use]
pub fn build_args(
    policy: &CompressionPolicy,
    kind: ProfileKind,
    input: &Path,
    output: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-sDEVICE=pdfwrite".into(),
        format!("-dCompatibilityLevel={}", policy.compatibility_level.trim()).into(),
        format!("-dPDFSETTINGS=/{}", policy.pdf_settings).into(),
    ];

    for (channel, settings) in [
        ("Color", &policy.color),
        ("Gray", &policy.gray),
        ("Mono", &policy.mono),
    ] {
        push_channel(&mut args, channel, settings);
    }

    match kind {
        ProfileKind::Standard => {
            args.push("-dDetectDuplicateImages=true".into());
            args.push("-dCompressPages=true".into());
        }
        ProfileKind::RgbFallback => {
            args.extend(
                [
                    "-sColorConversionStrategy=RGB",
                    "-sProcessColorModel=DeviceRGB",
                    "-dAutoFilterColorImages=false",
                    "-dAutoFilterGrayImages=false",
                    "-dColorImageFilter=/DCTEncode",
                    "-dGrayImageFilter=/DCTEncode",
                ]
                .map(OsString::from),
            );
            args.push(format!("-dDetectDuplicateImages={}", policy.detect_duplicate_images).into());
            args.push(format!("-dCompressPages={}", policy.compress_pages).into());
        }
    }

    args.extend(["-dNOPAUSE", "-dBATCH", "-dQUIET"].map(OsString::from));

    let mut output_arg = OsString::from("-sOutputFile=");
    output_arg.push(output.as_os_str());
    args.push(output_arg);
    args.push(input.as_os_str().to_os_string());
    args
}

fn push_channel(args: &mut Vec<OsString>, channel: &str, settings: &ChannelPolicy) {
    args.push(format!("-dDownsample{channel}Images=true").into());
    args.push(format!("-d{channel}ImageDownsampleThreshold={}", settings.threshold).into());
    args.push(format!("-d{channel}ImageResolution={}", settings.resolution).into());
    args.push(
        format!(
            "-d{channel}ImageDownsampleType={}",
            downsample_type(settings.downsample)
        )
        .into(),
    );
}
