//! Horizon tilt estimation.
//!
//! Pipeline: grayscale frame → optional downscale → Canny → Hough →
//! keep near-horizontal lines → fold → average.
//!
//! Orientation convention: degrees in [0, 180) measured from the image's
//! x axis, counter-clockwise as seen on screen. After folding, a positive
//! angle means the right end of the line sits higher in the frame.

use image::imageops::{self, FilterType};
use image::GrayImage;
use shotcoach_models::{TiltDirection, TiltEstimate};
use tracing::{debug, warn};

use crate::edges::canny;
use crate::error::{VisionError, VisionResult};
use crate::hough::{hough_lines, HoughParams};

/// Smallest side length the detector will work on.
const MIN_SIDE: u32 = 3;

/// Tuning knobs for tilt detection.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub canny_low: f32,
    pub canny_high: f32,
    pub rho: f64,
    /// Hough angle step in degrees.
    pub theta_deg: f64,
    /// Fixed vote threshold; `None` uses a quarter of the shorter side.
    pub vote_threshold: Option<u32>,
    /// Lines within this many degrees of horizontal are considered.
    pub horizontal_window_deg: f64,
    /// Average tilt up to this magnitude still counts as level.
    pub tolerance_deg: f64,
    /// Number of qualifying lines that yields full confidence.
    pub full_confidence_lines: usize,
    /// Downscale frames whose long side exceeds this before analysis.
    pub max_side: Option<u32>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            rho: 1.0,
            theta_deg: 1.0,
            vote_threshold: None,
            horizontal_window_deg: 30.0,
            tolerance_deg: 2.0,
            full_confidence_lines: 10,
            max_side: Some(1280),
        }
    }
}

impl DetectorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tolerance_deg: std::env::var("SHOTCOACH_LEVEL_TOLERANCE_DEG")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.tolerance_deg),
            ..defaults
        }
    }
}

/// Orientation in degrees, [0, 180), of a Hough line given its normal angle
/// in radians.
pub fn line_orientation_deg(theta: f64) -> f64 {
    // Snap float noise from the radian round trip so window edges are stable.
    let theta_deg = (theta.to_degrees() * 1e6).round() / 1e6;
    (90.0 - theta_deg).rem_euclid(180.0)
}

/// Map the upper tail of near-horizontal orientations onto negative angles,
/// so 170° and -10° describe the same line.
pub fn fold_orientation(orientation_deg: f64) -> f64 {
    if orientation_deg > 90.0 {
        orientation_deg - 180.0
    } else {
        orientation_deg
    }
}

fn is_near_horizontal(orientation_deg: f64, window_deg: f64) -> bool {
    orientation_deg <= window_deg || orientation_deg >= 180.0 - window_deg
}

/// Turn folded line angles into a tilt estimate.
pub fn estimate_from_angles(folded: &[f64], tolerance_deg: f64, full_confidence_lines: usize) -> TiltEstimate {
    if folded.is_empty() {
        return TiltEstimate::no_lines();
    }

    let mean = folded.iter().sum::<f64>() / folded.len() as f64;
    let is_level = mean.abs() <= tolerance_deg;
    let tilt_direction = if is_level {
        TiltDirection::Level
    } else if mean > 0.0 {
        TiltDirection::RightHigh
    } else {
        TiltDirection::LeftHigh
    };

    let confidence = (folded.len() as f64 / full_confidence_lines.max(1) as f64).min(1.0);

    TiltEstimate {
        is_level,
        tilt_angle: (mean.abs() * 10.0).round() / 10.0,
        tilt_direction,
        confidence: (confidence * 100.0).round() / 100.0,
    }
}

/// Deterministic geometry-based level detector.
#[derive(Debug, Clone, Default)]
pub struct HorizonDetector {
    config: DetectorConfig,
}

impl HorizonDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Estimate tilt. Internal failures degrade to a low-confidence level
    /// reading instead of an error.
    pub fn detect(&self, gray: &GrayImage) -> TiltEstimate {
        match self.try_detect(gray) {
            Ok(estimate) => estimate,
            Err(e) => {
                warn!(error = %e, "Horizon detection failed, assuming level");
                TiltEstimate::degraded()
            }
        }
    }

    pub fn try_detect(&self, gray: &GrayImage) -> VisionResult<TiltEstimate> {
        let (width, height) = gray.dimensions();
        if width < MIN_SIDE || height < MIN_SIDE {
            return Err(VisionError::TooSmall { width, height });
        }

        let scaled;
        let working = match self.config.max_side {
            Some(max_side) if width.max(height) > max_side => {
                let scale = max_side as f64 / width.max(height) as f64;
                let nw = ((width as f64 * scale).round() as u32).max(MIN_SIDE);
                let nh = ((height as f64 * scale).round() as u32).max(MIN_SIDE);
                scaled = imageops::resize(gray, nw, nh, FilterType::Triangle);
                &scaled
            }
            _ => gray,
        };

        let edges = canny(working, self.config.canny_low, self.config.canny_high);
        let threshold = self
            .config
            .vote_threshold
            .unwrap_or_else(|| working.width().min(working.height()) / 4);
        let params = HoughParams {
            rho: self.config.rho,
            theta: self.config.theta_deg.to_radians(),
            threshold,
        };
        let lines = hough_lines(&edges, &params);

        let folded: Vec<f64> = lines
            .iter()
            .map(|line| line_orientation_deg(line.theta))
            .filter(|&o| is_near_horizontal(o, self.config.horizontal_window_deg))
            .map(fold_orientation)
            .collect();

        let estimate = estimate_from_angles(&folded, self.config.tolerance_deg, self.config.full_confidence_lines);

        debug!(
            width = working.width(),
            height = working.height(),
            edge_pixels = edges.edge_count(),
            lines = lines.len(),
            horizontal_lines = folded.len(),
            tilt_angle = estimate.tilt_angle,
            tilt_direction = %estimate.tilt_direction,
            "Horizon estimate"
        );

        Ok(estimate)
    }
}
