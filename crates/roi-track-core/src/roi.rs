use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// User-drawn circular region of interest.
///
/// Coordinates are normalized: `center` in `[0, 1]` per axis, `radius` as a
/// fraction of the frame width. The `id` is the region's identity for its
/// whole lifetime; redrawing creates a new id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CircularRoi {
    pub id: String,
    pub center: Point2<f32>,
    pub radius: f32,
    /// Host-clock creation time, milliseconds.
    pub created_at_ms: f64,
}

impl CircularRoi {
    pub fn new(id: impl Into<String>, center: Point2<f32>, radius: f32, created_at_ms: f64) -> Self {
        Self {
            id: id.into(),
            center,
            radius,
            created_at_ms,
        }
    }

    /// Center in pixel coordinates of a `width` x `height` frame.
    #[inline]
    pub fn center_px(&self, width: usize, height: usize) -> Point2<f32> {
        Point2::new(self.center.x * width as f32, self.center.y * height as f32)
    }

    /// Radius in pixels. By convention the radius is normalized to frame width.
    #[inline]
    pub fn radius_px(&self, width: usize) -> f32 {
        self.radius * width as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_mapping_uses_width_for_radius() {
        let roi = CircularRoi::new("roi-0", Point2::new(0.5, 0.5), 0.1, 0.0);
        let c = roi.center_px(640, 480);
        assert_eq!((c.x, c.y), (320.0, 240.0));
        assert_eq!(roi.radius_px(640), 64.0);
    }
}
