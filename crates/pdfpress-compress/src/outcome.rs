//! Result model for one processed file.

use std::fmt;

use serde::Serialize;

use crate::profile::ProfileKind;

/// Which artifact ended up at the final output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutcomeProfile {
    /// The standard profile reduced the file.
    #[serde(rename = "Standard")]
    Standard,
    /// The RGB fallback profile reduced the file.
    #[serde(rename = "RGBFallback")]
    RgbFallback,
    /// Neither profile helped; the original was copied unchanged.
    #[serde(rename = "Original-Irreducible")]
    OriginalIrreducible,
}

impl OutcomeProfile {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::RgbFallback => "RGBFallback",
            Self::OriginalIrreducible => "Original-Irreducible",
        }
    }
}

impl From<ProfileKind> for OutcomeProfile {
    fn from(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Standard => Self::Standard,
            ProfileKind::RgbFallback => Self::RgbFallback,
        }
    }
}

impl fmt::Display for OutcomeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Summary of a processed file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionOutcome {
    /// Artifact placed at the final output.
    pub profile: OutcomeProfile,
    /// Input size in bytes.
    pub original_size: u64,
    /// Final output size in bytes.
    pub final_size: u64,
    /// Percentage saved, `0.0` when nothing was saved.
    pub reduction_percent: f64,
    /// Whether the file counts as processed.
    pub success: bool,
}

impl CompressionOutcome {
    /// Outcome for an accepted compressed artifact.
    #[must_use]
    pub fn compressed(kind: ProfileKind, original_size: u64, final_size: u64) -> Self {
        Self {
            profile: kind.into(),
            original_size,
            final_size,
            reduction_percent: reduction_percent(original_size, final_size),
            success: true,
        }
    }

    /// Outcome when the original was kept.
    #[must_use]
    pub const fn irreducible(original_size: u64) -> Self {
        Self {
            profile: OutcomeProfile::OriginalIrreducible,
            original_size,
            final_size: original_size,
            reduction_percent: 0.0,
            success: true,
        }
    }

    /// Reduction rendered with one decimal, e.g. `60.0`.
    #[must_use]
    pub fn reduction_label(&self) -> String {
        format!("{:.1}", self.reduction_percent)
    }
}

/// `(original - final) / original * 100`, or `0.0` when nothing was saved.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn reduction_percent(original_size: u64, final_size: u64) -> f64 {
    if original_size == 0 || final_size >= original_size {
        return 0.0;
    }
    (original_size - final_size) as f64 / original_size as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_is_rendered_with_one_decimal() {
        let outcome = CompressionOutcome::compressed(ProfileKind::Standard, 10_000_000, 4_000_000);
        assert_eq!(outcome.reduction_label(), "60.0");

        let outcome = CompressionOutcome::compressed(ProfileKind::RgbFallback, 2_000_000, 1_500_000);
        assert_eq!(outcome.profile, OutcomeProfile::RgbFallback);
        assert_eq!(outcome.reduction_label(), "25.0");
    }

    #[test]
    fn empty_or_grown_files_report_zero() {
        assert!(reduction_percent(0, 0).abs() < f64::EPSILON);
        assert!(reduction_percent(10, 12).abs() < f64::EPSILON);
        assert_eq!(CompressionOutcome::irreducible(500_000).reduction_label(), "0.0");
    }

    #[test]
    fn irreducible_label_matches_wire_name() {
        let value = serde_json::to_value(OutcomeProfile::OriginalIrreducible);
        assert_eq!(OutcomeProfile::OriginalIrreducible.label(), "Original-Irreducible");
        assert_eq!(value.ok(), Some(serde_json::json!("Original-Irreducible")));
    }
}
