//! Region extraction: normalized circular ROI -> grayscale pixel patch.

use nalgebra::Point2;

use roi_track_core::{CircularRoi, GrayImage, RgbaFrameView};
use roi_track_vision::{apply_circular_mask, rgba_to_gray};

use crate::params::RegionParams;

/// Cropped (and optionally masked) grayscale patch plus the geometry needed
/// to map patch coordinates back into source-frame pixels.
#[derive(Clone, Debug)]
pub struct RegionPatch {
    pub gray: GrayImage,
    /// Top-left of the crop in source-frame pixels.
    pub origin: Point2<f32>,
    /// ROI center in source-frame pixels.
    pub center: Point2<f32>,
    /// ROI radius in source-frame pixels.
    pub radius: f32,
}

impl RegionPatch {
    /// Translate a patch-space point into source-frame pixels.
    #[inline]
    pub fn to_frame(&self, p: Point2<f32>) -> Point2<f32> {
        Point2::new(p.x + self.origin.x, p.y + self.origin.y)
    }

    /// ROI center in patch coordinates.
    #[inline]
    pub fn center_local(&self) -> Point2<f32> {
        Point2::new(self.center.x - self.origin.x, self.center.y - self.origin.y)
    }
}

/// Extract the ROI's bounding square from a frame.
///
/// The ROI is authored in display coordinates; when the native frame
/// resolution differs, a per-axis `source/display` correction is applied.
/// The crop is clamped to the frame, so a ROI spilling past the border
/// still yields a valid (smaller) patch. Returns `None` when the clamped
/// region is empty, a routine per-frame condition rather than an error.
pub fn extract(
    roi: &CircularRoi,
    frame: &RgbaFrameView<'_>,
    display_size: (usize, usize),
    params: &RegionParams,
) -> Option<RegionPatch> {
    if frame.width == 0 || frame.height == 0 || display_size.0 == 0 || display_size.1 == 0 {
        return None;
    }

    let scale_x = frame.width as f32 / display_size.0 as f32;
    let scale_y = frame.height as f32 / display_size.1 as f32;

    // Normalized ROI -> display pixels -> source pixels.
    let center = Point2::new(
        roi.center.x * display_size.0 as f32 * scale_x,
        roi.center.y * display_size.1 as f32 * scale_y,
    );
    let radius = roi.radius * display_size.0 as f32 * scale_x;
    if radius <= 0.0 {
        return None;
    }

    let x0 = ((center.x - radius).floor().max(0.0)) as usize;
    let y0 = ((center.y - radius).floor().max(0.0)) as usize;
    let x1 = ((center.x + radius).ceil()).min(frame.width as f32) as usize;
    let y1 = ((center.y + radius).ceil()).min(frame.height as f32) as usize;
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    let mut gray = rgba_to_gray(frame, x0, y0, x1 - x0, y1 - y0)?;

    if params.circular_mask {
        apply_circular_mask(
            &mut gray,
            center.x - x0 as f32,
            center.y - y0 as f32,
            radius,
            params.mask_fill,
        );
    }

    Some(RegionPatch {
        gray,
        origin: Point2::new(x0 as f32, y0 as f32),
        center,
        radius,
    })
}
