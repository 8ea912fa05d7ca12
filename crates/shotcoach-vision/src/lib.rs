//! Pixel-level analysis of a single camera frame.
//!
//! This crate provides:
//! - Frame decoding and upload downscaling
//! - Mean-luminance brightness metrics
//! - Canny edge extraction and a standard Hough line transform
//! - Horizon tilt estimation from near-horizontal lines

pub mod analyzer;
pub mod edges;
pub mod error;
pub mod frame;
pub mod horizon;
pub mod hough;
pub mod measure;

pub use analyzer::{FrameAnalysis, FrameAnalyzer};
pub use edges::{canny, EdgeMap};
pub use error::{VisionError, VisionResult};
pub use frame::{decode_bytes, load_path, prepare_upload, UploadLimits};
pub use horizon::{estimate_from_angles, fold_orientation, line_orientation_deg, DetectorConfig, HorizonDetector};
pub use hough::{hough_lines, HoughLine, HoughParams};
pub use measure::{mean_luminance, measure};
