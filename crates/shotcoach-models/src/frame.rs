//! Per-frame measurements.
//!
//! Both value objects here are computed once per guidance request from the
//! decoded pixels and discarded afterwards:
//!
//! - `ImageMetrics`: size plus mean luminance and its tier
//! - `TiltEstimate`: horizon levelness as seen by the geometry detector

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean luminance below this is `Dim`.
pub const DIM_BELOW: f64 = 50.0;

/// Mean luminance below this (and not dim) is `Moderate`.
pub const MODERATE_BELOW: f64 = 120.0;

/// Coarse lighting label derived from mean luminance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BrightnessTier {
    Dim,
    Moderate,
    Bright,
}

impl BrightnessTier {
    /// Classify a 0-255 mean luminance value.
    pub fn from_brightness(brightness: f64) -> Self {
        if brightness < DIM_BELOW {
            BrightnessTier::Dim
        } else if brightness < MODERATE_BELOW {
            BrightnessTier::Moderate
        } else {
            BrightnessTier::Bright
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BrightnessTier::Dim => "dim",
            BrightnessTier::Moderate => "moderate",
            BrightnessTier::Bright => "bright",
        }
    }
}

impl fmt::Display for BrightnessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Basic readings of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImageMetrics {
    pub width: u32,
    pub height: u32,
    /// Mean luminance in 0-255, rounded to one decimal.
    pub brightness: f64,
    pub brightness_tier: BrightnessTier,
}

impl ImageMetrics {
    /// Build metrics from raw readings. The tier is classified from the
    /// unrounded mean, the stored brightness is rounded to 0.1.
    pub fn new(width: u32, height: u32, brightness: f64) -> Self {
        Self {
            width,
            height,
            brightness: (brightness * 10.0).round() / 10.0,
            brightness_tier: BrightnessTier::from_brightness(brightness),
        }
    }
}

/// Which side of the frame sits higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TiltDirection {
    #[default]
    Level,
    LeftHigh,
    RightHigh,
    /// Tilt reported but the high side could not be determined.
    Unknown,
}

impl TiltDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TiltDirection::Level => "level",
            TiltDirection::LeftHigh => "left_high",
            TiltDirection::RightHigh => "right_high",
            TiltDirection::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TiltDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Horizon levelness estimate for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TiltEstimate {
    pub is_level: bool,
    /// Absolute tilt in degrees.
    pub tilt_angle: f64,
    pub tilt_direction: TiltDirection,
    /// 0.0-1.0
    pub confidence: f64,
}

impl TiltEstimate {
    /// Confidence reported when no near-horizontal line was found.
    pub const NO_LINES_CONFIDENCE: f64 = 0.3;

    /// Confidence reported when detection itself failed.
    pub const FAILED_CONFIDENCE: f64 = 0.1;

    /// A level reading with the given confidence.
    pub fn level(confidence: f64) -> Self {
        Self {
            is_level: true,
            tilt_angle: 0.0,
            tilt_direction: TiltDirection::Level,
            confidence,
        }
    }

    /// Default when no qualifying lines exist.
    pub fn no_lines() -> Self {
        Self::level(Self::NO_LINES_CONFIDENCE)
    }

    /// Default when the detector hit an internal error.
    pub fn degraded() -> Self {
        Self::level(Self::FAILED_CONFIDENCE)
    }
}

/// Which detector produced the final levelness decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LevelSource {
    /// Pixel geometry reported the tilt (or level with a confirming second opinion).
    Geometry,
    /// The advisory level check overrode a level geometry reading.
    Secondary,
}

impl LevelSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelSource::Geometry => "geometry",
            LevelSource::Secondary => "secondary",
        }
    }
}

/// Analysis block returned alongside suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisSummary {
    pub is_level: bool,
    pub tilt_angle: f64,
    pub brightness_tier: BrightnessTier,
    /// Final arbitration outcome; `unknown` flags an unreadable second opinion.
    pub tilt_direction: TiltDirection,
    pub level_source: LevelSource,
}
