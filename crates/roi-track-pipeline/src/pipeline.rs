//! Per-frame orchestration of the tracking pipeline.
//!
//! One explicitly constructed pipeline object owns all per-ROI state
//! (feature reference, shape signature, debouncer, marker records) and
//! exposes results to the caller only by value. Stage order per frame:
//! region extraction, then shape classification + re-identification and
//! feature pose tracking over the same read-only patch, then occlusion
//! debouncing, then the marker state machine.

use std::sync::atomic::{AtomicBool, Ordering};

use roi_track_core::{CircularRoi, RgbaFrameView};
use roi_track_vision::{binarize, find_shapes, otsu_threshold, ShapeBlob};

use crate::calibrate::PixelToCmCalibration;
use crate::error::{CalibrationError, PipelineError};
use crate::identity::{best_match, ShapeSignature};
use crate::occlusion::{OcclusionDebouncer, VisibilityEvent};
use crate::params::TrackerParams;
use crate::pose::{PoseTracker, TrackerPhase, TrackingResult};
use crate::region::{extract, RegionPatch};
use crate::shape::{classify, ShapeDescription};
use crate::state::{MarkerStateMachine, MarkerStateRecord, MarkerTransition};

/// The re-identified shape seen this frame, reported in source-frame pixels.
#[derive(Clone, Debug)]
pub struct ShapeObservation {
    pub description: ShapeDescription,
    /// Hu-moment similarity against the stored reference signature.
    pub similarity: f64,
}

/// Debounced visibility, plus the raw ratio that produced it.
#[derive(Clone, Copy, Debug)]
pub struct VisibilitySnapshot {
    pub ratio: f32,
    pub contour_count: usize,
    pub is_visible: bool,
    pub event: Option<VisibilityEvent>,
}

/// Everything the rendering/application layer needs from one frame.
#[derive(Clone, Debug)]
pub struct FrameUpdate {
    pub roi_id: String,
    pub tracking: TrackingResult,
    pub phase: TrackerPhase,
    pub shape: Option<ShapeObservation>,
    pub visibility: VisibilitySnapshot,
    pub transition: Option<MarkerTransition>,
}

/// Per-ROI tracking state owned by the pipeline.
struct RoiEntry {
    roi: CircularRoi,
    pose: PoseTracker,
    debouncer: OcclusionDebouncer,
    /// Hu signature of the dominant shape at capture time. Replaced only by
    /// an explicit reset, so the same physical shape is re-acquired after
    /// occlusion.
    reference_signature: Option<ShapeSignature>,
    /// Binarization threshold frozen at capture time. Re-running Otsu on an
    /// occluded patch would promote the occluder to foreground and defeat
    /// the contour-count visibility ratio.
    reference_threshold: Option<u8>,
    /// Contour count at capture time; denominator of the visibility ratio.
    initial_contour_count: Option<usize>,
}

/// The ROI marker-tracking pipeline.
///
/// Construct one per application (or camera) and feed it every displayed
/// frame. A single ROI is active at a time; setting a new one implicitly
/// clears the previous ROI and its marker record.
pub struct RoiTrackerPipeline {
    params: TrackerParams,
    entry: Option<RoiEntry>,
    markers: MarkerStateMachine,
    calibration: PixelToCmCalibration,
    /// Skip-if-busy gate for re-entrant frame delivery: a frame arriving
    /// while one is being processed is dropped, never queued.
    busy: AtomicBool,
}

impl RoiTrackerPipeline {
    pub fn new(params: TrackerParams) -> Self {
        Self {
            params,
            entry: None,
            markers: MarkerStateMachine::new(params.marker),
            calibration: PixelToCmCalibration::default(),
            busy: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    /// The active ROI, if any.
    pub fn active_roi(&self) -> Option<&CircularRoi> {
        self.entry.as_ref().map(|e| &e.roi)
    }

    /// Marker record snapshot for the active ROI.
    pub fn marker_record(&self) -> Option<&MarkerStateRecord> {
        let entry = self.entry.as_ref()?;
        self.markers.record(&entry.roi.id)
    }

    /// Install a ROI, implicitly clearing any previous one.
    pub fn set_roi(&mut self, roi: CircularRoi) {
        self.clear_roi();
        log::debug!("tracking roi '{}' (r={:.3})", roi.id, roi.radius);
        self.entry = Some(RoiEntry {
            roi,
            pose: PoseTracker::new(self.params.pose),
            debouncer: OcclusionDebouncer::new(self.params.occlusion),
            reference_signature: None,
            reference_threshold: None,
            initial_contour_count: None,
        });
    }

    /// Remove the active ROI and its marker record.
    pub fn clear_roi(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.markers.remove(&entry.roi.id);
        }
    }

    /// Drop the captured references; the next usable frame re-captures.
    pub fn reset_reference(&mut self) -> Result<(), PipelineError> {
        let entry = self.entry.as_mut().ok_or(PipelineError::NoActiveRoi)?;
        entry.pose.reset();
        entry.reference_signature = None;
        entry.reference_threshold = None;
        entry.initial_contour_count = None;
        Ok(())
    }

    /// Recalibrate real-world size reporting from a known distance.
    pub fn update_pixel_to_cm_ratio(
        &mut self,
        known_distance_cm: f32,
        measured_pixel_distance: f32,
    ) -> Result<(), CalibrationError> {
        self.calibration
            .update(known_distance_cm, measured_pixel_distance)
    }

    /// Convert a pixel distance to centimetres, once calibrated.
    pub fn pixel_distance_cm(&self, pixels: f32) -> Option<f32> {
        self.calibration.to_cm(pixels)
    }

    /// Process one camera frame.
    ///
    /// Returns `None` when there is nothing to do this frame: no active
    /// ROI, the clamped region is empty, or a previous delivery is still
    /// in flight (the frame is dropped, never queued). These are routine
    /// conditions, not errors.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, frame), fields(w = frame.width, h = frame.height))
    )]
    pub fn process_frame(
        &mut self,
        frame: &RgbaFrameView<'_>,
        display_size: (usize, usize),
        now_ms: f64,
    ) -> Option<FrameUpdate> {
        if self.busy.swap(true, Ordering::Acquire) {
            log::warn!("frame dropped: previous frame still processing");
            return None;
        }
        let result = self.process_frame_inner(frame, display_size, now_ms);
        self.busy.store(false, Ordering::Release);
        result
    }

    fn process_frame_inner(
        &mut self,
        frame: &RgbaFrameView<'_>,
        display_size: (usize, usize),
        now_ms: f64,
    ) -> Option<FrameUpdate> {
        let entry = self.entry.as_mut()?;

        let patch = extract(&entry.roi, frame, display_size, &self.params.region)?;

        // Shape and pose stages read the same patch independently.
        let (shape, contour_count) = observe_shape(entry, &patch, &self.params);
        let tracking = entry.pose.track(&patch);

        let ratio = match entry.initial_contour_count {
            Some(initial) if initial > 0 => contour_count as f32 / initial as f32,
            _ => 1.0,
        };
        let vis = entry.debouncer.update(ratio, now_ms);

        // Latest known centroid: pose estimate first, then the shape match,
        // then whatever we knew before.
        let position = tracking
            .center
            .or_else(|| shape.as_ref().map(|s| s.description.center))
            .or_else(|| self.markers.record(&entry.roi.id).map(|r| r.position))
            .unwrap_or_else(|| patch.center);

        let transition = self
            .markers
            .update(&entry.roi.id, !vis.is_visible, position, now_ms);

        Some(FrameUpdate {
            roi_id: entry.roi.id.clone(),
            tracking,
            phase: entry.pose.phase(),
            shape,
            visibility: VisibilitySnapshot {
                ratio,
                contour_count,
                is_visible: vis.is_visible,
                event: vis.event,
            },
            transition,
        })
    }
}

/// Threshold, segment and re-identify the patch contents.
///
/// Captures the reference signature (and the visibility-ratio denominator)
/// from the dominant contour the first time anything usable is seen.
fn observe_shape(
    entry: &mut RoiEntry,
    patch: &RegionPatch,
    params: &TrackerParams,
) -> (Option<ShapeObservation>, usize) {
    let view = patch.gray.view();
    let threshold = entry
        .reference_threshold
        .unwrap_or_else(|| otsu_threshold(&view));
    let binary = binarize(&view, threshold, params.shape.polarity);
    let min_area = params.shape.min_area_frac * (patch.gray.width * patch.gray.height) as f32;
    let blobs = find_shapes(&binary, min_area);
    let contour_count = blobs.len();

    if blobs.is_empty() {
        return (None, 0);
    }

    let signatures: Vec<Option<ShapeSignature>> = blobs
        .iter()
        .map(|b| ShapeSignature::from_moments(&b.moments))
        .collect();

    if entry.reference_signature.is_none() {
        // Dominant shape = largest area.
        let dominant = blobs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.contour.area.total_cmp(&b.contour.area))
            .map(|(i, _)| i);
        if let Some(i) = dominant {
            if let Some(sig) = signatures[i] {
                entry.reference_signature = Some(sig);
                entry.reference_threshold = Some(threshold);
                entry.initial_contour_count = Some(contour_count);
                log::debug!(
                    "shape reference captured ({} contours in roi '{}')",
                    contour_count,
                    entry.roi.id
                );
            }
        }
    }

    let observation = entry
        .reference_signature
        .as_ref()
        .and_then(|reference| reidentify(reference, &blobs, &signatures, patch, params));

    (observation, contour_count)
}

/// Score every candidate against the reference and classify the winner.
fn reidentify(
    reference: &ShapeSignature,
    blobs: &[ShapeBlob],
    signatures: &[Option<ShapeSignature>],
    patch: &RegionPatch,
    params: &TrackerParams,
) -> Option<ShapeObservation> {
    let flat: Vec<ShapeSignature> = signatures.iter().filter_map(|s| *s).collect();
    let (idx, similarity) = best_match(reference, &flat, params.identity.min_similarity)?;

    // Map the filtered index back to its blob.
    let blob_idx = signatures
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_some())
        .nth(idx)
        .map(|(i, _)| i)?;

    let mut description = classify(&blobs[blob_idx].contour, &params.shape);
    description.center = patch.to_frame(description.center);
    for corner in &mut description.corners {
        *corner = patch.to_frame(*corner);
    }

    Some(ShapeObservation {
        description,
        similarity,
    })
}
