//! ROI marker-tracking pipeline.
//!
//! A user-drawn circular region of interest is tracked across camera
//! frames: the dominant shape inside it is re-identified by Hu-moment
//! similarity, the region pose (center, rotation, confidence) is estimated
//! from sparse feature matches, raw visibility is debounced into a stable
//! occlusion signal, and a per-marker state machine turns that signal into
//! tap / engage / release events.
//!
//! ## Quickstart
//!
//! ```
//! use nalgebra::Point2;
//! use roi_track_core::{CircularRoi, RgbaFrameView};
//! use roi_track_pipeline::{RoiTrackerPipeline, TrackerParams};
//!
//! let mut pipeline = RoiTrackerPipeline::new(TrackerParams::default());
//! pipeline.set_roi(CircularRoi::new("pad-0", Point2::new(0.5, 0.5), 0.1, 0.0));
//!
//! let buf = vec![0u8; 640 * 480 * 4];
//! let frame = RgbaFrameView::new(640, 480, &buf).unwrap();
//! if let Some(update) = pipeline.process_frame(&frame, (640, 480), 0.0) {
//!     println!("tracked: {}", update.tracking.is_tracked);
//! }
//! ```

mod calibrate;
mod error;
mod identity;
mod occlusion;
mod params;
mod pipeline;
mod pose;
mod region;
mod shape;
mod state;

pub use calibrate::PixelToCmCalibration;
pub use error::{CalibrationError, PipelineError};
pub use identity::{best_match, ShapeSignature};
pub use occlusion::{OcclusionDebouncer, VisibilityEvent, VisibilityUpdate};
pub use params::{
    IdentityParams, MarkerParams, OcclusionParams, PoseParams, RegionParams, ShapeParams,
    TrackerParams,
};
pub use pipeline::{
    FrameUpdate, RoiTrackerPipeline, ShapeObservation, VisibilitySnapshot,
};
pub use pose::{PoseTracker, TrackerPhase, TrackingResult};
pub use region::{extract, RegionPatch};
pub use shape::{classify, ShapeDescription, ShapeKind};
pub use state::{MarkerState, MarkerStateMachine, MarkerStateRecord, MarkerTransition};
