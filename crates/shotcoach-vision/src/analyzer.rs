//! One-shot frame analysis: metrics plus tilt.

use image::{DynamicImage, GrayImage};
use shotcoach_models::{ImageMetrics, TiltEstimate};

use crate::error::VisionResult;
use crate::frame::decode_bytes;
use crate::horizon::{DetectorConfig, HorizonDetector};
use crate::measure::measure;

/// Everything the decision engine needs to know about one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAnalysis {
    pub metrics: ImageMetrics,
    pub tilt: TiltEstimate,
}

/// Stateless analyser; safe to share across concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct FrameAnalyzer {
    detector: HorizonDetector,
}

impl FrameAnalyzer {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            detector: HorizonDetector::new(config),
        }
    }

    pub fn analyze(&self, image: &DynamicImage) -> FrameAnalysis {
        let gray = image.to_luma8();
        FrameAnalysis {
            metrics: measure(&gray),
            tilt: self.detect(&gray),
        }
    }

    /// Decode and measure a frame, returning the luma plane for `detect`.
    /// Only this step can fail.
    pub fn prepare(&self, bytes: &[u8]) -> VisionResult<(GrayImage, ImageMetrics)> {
        let gray = decode_bytes(bytes)?.to_luma8();
        let metrics = measure(&gray);
        Ok((gray, metrics))
    }

    pub fn detect(&self, gray: &GrayImage) -> TiltEstimate {
        self.detector.detect(gray)
    }

    /// Decode then analyse.
    pub fn analyze_bytes(&self, bytes: &[u8]) -> VisionResult<FrameAnalysis> {
        let (gray, metrics) = self.prepare(bytes)?;
        Ok(FrameAnalysis {
            metrics,
            tilt: self.detect(&gray),
        })
    }
}
