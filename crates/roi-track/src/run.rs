//! Helpers for driving the pipeline from decoded `image` frames.

use roi_track_core::RgbaFrameView;
use roi_track_pipeline::{FrameUpdate, RoiTrackerPipeline};

/// Feed one decoded RGBA frame to the pipeline.
///
/// The image's own dimensions are used as the display size, i.e. the ROI
/// is assumed to have been authored against this resolution.
pub fn process_image(
    pipeline: &mut RoiTrackerPipeline,
    frame: &image::RgbaImage,
    now_ms: f64,
) -> Option<FrameUpdate> {
    let (w, h) = (frame.width() as usize, frame.height() as usize);
    let view = RgbaFrameView::new(w, h, frame.as_raw())?;
    pipeline.process_frame(&view, (w, h), now_ms)
}

/// Feed one decoded RGBA frame authored against a different display size.
pub fn process_image_scaled(
    pipeline: &mut RoiTrackerPipeline,
    frame: &image::RgbaImage,
    display_size: (usize, usize),
    now_ms: f64,
) -> Option<FrameUpdate> {
    let (w, h) = (frame.width() as usize, frame.height() as usize);
    let view = RgbaFrameView::new(w, h, frame.as_raw())?;
    pipeline.process_frame(&view, display_size, now_ms)
}
