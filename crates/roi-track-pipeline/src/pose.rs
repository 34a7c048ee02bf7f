//! Feature-based pose tracking of the ROI contents.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use roi_track_vision::{
    detect_features, estimate_homography_ransac, match_descriptors, FeatureSet,
};

use crate::params::PoseParams;
use crate::region::RegionPatch;

/// Lifecycle of one ROI's pose tracker.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TrackerPhase {
    /// No reference captured yet.
    Uninitialized,
    /// Reference captured this frame; nothing to compare against yet.
    ReferenceCaptured,
    /// Last frame matched the reference.
    Tracking,
    /// Reference exists but the last frame did not match it.
    Lost,
}

/// Per-frame tracking output. Transient: produced fresh every frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackingResult {
    pub is_tracked: bool,
    /// Inlier fraction of the accepted matches, in [0, 1].
    pub confidence: f32,
    pub match_count: usize,
    pub inlier_count: usize,
    /// Tracked region center in source-frame pixels.
    pub center: Option<Point2<f32>>,
    /// In-plane rotation relative to the reference, radians.
    pub rotation: Option<f32>,
    /// Reference patch corners mapped into the current frame.
    pub corners: Option<[Point2<f32>; 4]>,
}

impl TrackingResult {
    fn missed() -> Self {
        Self {
            is_tracked: false,
            confidence: 0.0,
            match_count: 0,
            inlier_count: 0,
            center: None,
            rotation: None,
            corners: None,
        }
    }
}

/// Reference feature set captured on the first usable frame.
///
/// Owned by the tracker for one ROI; replaced only by explicit reset so the
/// identity survives occlusion and can be re-acquired.
#[derive(Clone, Debug)]
struct ReferenceFeatures {
    features: FeatureSet,
    /// Patch-space corner quad of the reference region.
    corners: [Point2<f32>; 4],
    /// Patch-space center of the reference region.
    center: Point2<f32>,
}

/// Tracks the ROI contents against a lazily captured reference.
#[derive(Clone, Debug)]
pub struct PoseTracker {
    params: PoseParams,
    reference: Option<ReferenceFeatures>,
    phase: TrackerPhase,
}

impl PoseTracker {
    pub fn new(params: PoseParams) -> Self {
        Self {
            params,
            reference: None,
            phase: TrackerPhase::Uninitialized,
        }
    }

    #[inline]
    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    #[inline]
    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Drop the reference; the next usable frame captures a new one.
    pub fn reset(&mut self) {
        self.reference = None;
        self.phase = TrackerPhase::Uninitialized;
    }

    /// Process one extracted patch.
    ///
    /// Captures the reference on the first frame with enough keypoints;
    /// afterwards matches each frame against that reference and estimates
    /// the region pose. Every failure mode short-circuits to a miss result
    /// without touching the stored reference.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, patch), fields(phase = ?self.phase))
    )]
    pub fn track(&mut self, patch: &RegionPatch) -> TrackingResult {
        let current = detect_features(&patch.gray.view(), &self.params.features);

        let Some(reference) = &self.reference else {
            if current.len() >= self.params.min_keypoints {
                let keypoints = current.len();
                let w = patch.gray.width as f32;
                let h = patch.gray.height as f32;
                self.reference = Some(ReferenceFeatures {
                    features: current,
                    corners: [
                        Point2::new(0.0, 0.0),
                        Point2::new(w, 0.0),
                        Point2::new(w, h),
                        Point2::new(0.0, h),
                    ],
                    center: patch.center_local(),
                });
                self.phase = TrackerPhase::ReferenceCaptured;
                log::debug!("reference captured with {keypoints} keypoints");
            }
            return TrackingResult::missed();
        };

        if current.len() < self.params.min_keypoints {
            self.phase = TrackerPhase::Lost;
            return TrackingResult::missed();
        }

        let matches = match_descriptors(&reference.features, &current, &self.params.matching);
        if matches.len() < self.params.min_matches {
            self.phase = TrackerPhase::Lost;
            return TrackingResult::missed();
        }

        let ref_pts: Vec<Point2<f32>> = matches
            .iter()
            .map(|m| {
                let k = &reference.features.keypoints[m.query];
                Point2::new(k.x, k.y)
            })
            .collect();
        let cur_pts: Vec<Point2<f32>> = matches
            .iter()
            .map(|m| {
                let k = &current.keypoints[m.train];
                Point2::new(k.x, k.y)
            })
            .collect();

        let Some(fit) =
            estimate_homography_ransac(&ref_pts, &cur_pts, &self.params.ransac)
        else {
            self.phase = TrackerPhase::Lost;
            return TrackingResult::missed();
        };

        let match_count = matches.len();
        let confidence = fit.inlier_count as f32 / match_count as f32;
        let is_tracked = confidence >= self.params.match_threshold;
        self.phase = if is_tracked {
            TrackerPhase::Tracking
        } else {
            TrackerPhase::Lost
        };

        let center = patch.to_frame(fit.homography.apply(reference.center));
        let corners = fit
            .homography
            .apply_quad(&reference.corners)
            .map(|p| patch.to_frame(p));

        TrackingResult {
            is_tracked,
            confidence,
            match_count,
            inlier_count: fit.inlier_count,
            center: Some(center),
            rotation: Some(fit.homography.rotation_angle()),
            corners: Some(corners),
        }
    }
}
