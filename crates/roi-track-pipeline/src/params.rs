//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use roi_track_vision::{FeatureParams, MatchParams, RansacParams, ThresholdPolarity};

/// Region extraction settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RegionParams {
    /// Mask out pixels beyond the ROI radius before any detection runs.
    pub circular_mask: bool,
    /// Fill value for masked pixels. Should read as background for the
    /// configured threshold polarity (white for dark-on-light markers).
    pub mask_fill: u8,
}

impl Default for RegionParams {
    fn default() -> Self {
        Self {
            circular_mask: true,
            mask_fill: 255,
        }
    }
}

/// Shape classification settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ShapeParams {
    /// Polygon approximation tolerance as a fraction of the perimeter.
    /// Larger values yield fewer, coarser corners.
    pub approx_tolerance: f32,
    /// Minimum circularity `4*pi*area / perimeter^2` to accept a circle.
    pub min_circularity: f32,
    /// Bounding-box aspect ratio below which a quad counts as a square.
    pub max_square_aspect: f32,
    /// Drop contours smaller than this fraction of the patch area.
    pub min_area_frac: f32,
    /// Foreground polarity used when binarizing the patch.
    pub polarity: ThresholdPolarity,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            approx_tolerance: 0.04,
            min_circularity: 0.8,
            max_square_aspect: 1.2,
            min_area_frac: 0.01,
            polarity: ThresholdPolarity::DarkOnLight,
        }
    }
}

/// Shape re-identification settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct IdentityParams {
    /// Minimum Hu-moment similarity to accept a candidate as the same
    /// physical shape. Below this the ROI counts as not re-identified even
    /// when contours are present.
    pub min_similarity: f64,
}

impl Default for IdentityParams {
    fn default() -> Self {
        Self {
            min_similarity: 0.8,
        }
    }
}

/// Feature pose tracking settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PoseParams {
    /// Minimum keypoints for a usable extraction (reference or current).
    pub min_keypoints: usize,
    /// Minimum accepted matches before attempting a homography.
    pub min_matches: usize,
    /// `confidence >= match_threshold` declares the frame tracked.
    pub match_threshold: f32,
    pub features: FeatureParams,
    pub matching: MatchParams,
    pub ransac: RansacParams,
}

impl Default for PoseParams {
    fn default() -> Self {
        Self {
            min_keypoints: 10,
            min_matches: 8,
            match_threshold: 0.4,
            features: FeatureParams::default(),
            matching: MatchParams::default(),
            ransac: RansacParams::default(),
        }
    }
}

/// Occlusion debouncing settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct OcclusionParams {
    /// Visibility ratio (current / initial contour count) below which the
    /// frame reads as occluded.
    pub visibility_threshold: f32,
    /// The low-visibility condition must persist this long before the
    /// occluded flag flips.
    pub occlusion_delay_ms: f64,
    /// Likewise for the way back to visible.
    pub reappearance_delay_ms: f64,
}

impl Default for OcclusionParams {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.5,
            occlusion_delay_ms: 300.0,
            reappearance_delay_ms: 300.0,
        }
    }
}

/// Marker state machine timing.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MarkerParams {
    /// Continuous occlusion required to promote a tap into an engagement.
    pub engagement_duration_ms: f64,
    /// Dwell in the release state before returning to default.
    pub release_timeout_ms: f64,
}

impl Default for MarkerParams {
    fn default() -> Self {
        Self {
            engagement_duration_ms: 500.0,
            release_timeout_ms: 300.0,
        }
    }
}

/// Aggregated configuration for one tracking pipeline.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct TrackerParams {
    #[serde(default)]
    pub region: RegionParams,
    #[serde(default)]
    pub shape: ShapeParams,
    #[serde(default)]
    pub identity: IdentityParams,
    #[serde(default)]
    pub pose: PoseParams,
    #[serde(default)]
    pub occlusion: OcclusionParams,
    #[serde(default)]
    pub marker: MarkerParams,
}
