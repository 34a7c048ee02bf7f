//! Pixel-to-centimetre calibration.
//!
//! An external measurement (typically inferred from hand-knuckle spacing)
//! recalibrates how on-screen pixel distances map to real-world size.

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

/// Current pixel-to-cm mapping; uncalibrated until the first update.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct PixelToCmCalibration {
    cm_per_px: Option<f32>,
}

impl PixelToCmCalibration {
    /// Recalibrate from a known real-world distance and its measured pixel
    /// length in the current frame.
    pub fn update(
        &mut self,
        known_distance_cm: f32,
        measured_pixel_distance: f32,
    ) -> Result<(), CalibrationError> {
        if !(known_distance_cm > 0.0) {
            return Err(CalibrationError::NonPositiveDistance(known_distance_cm));
        }
        if !(measured_pixel_distance > 0.0) {
            return Err(CalibrationError::NonPositivePixels(measured_pixel_distance));
        }
        self.cm_per_px = Some(known_distance_cm / measured_pixel_distance);
        Ok(())
    }

    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.cm_per_px.is_some()
    }

    /// Convert a pixel distance to centimetres; `None` until calibrated.
    #[inline]
    pub fn to_cm(&self, pixels: f32) -> Option<f32> {
        self.cm_per_px.map(|r| r * pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncalibrated() {
        let c = PixelToCmCalibration::default();
        assert!(!c.is_calibrated());
        assert_eq!(c.to_cm(100.0), None);
    }

    #[test]
    fn update_then_convert() {
        let mut c = PixelToCmCalibration::default();
        c.update(8.5, 170.0).expect("valid calibration");
        assert!((c.to_cm(340.0).unwrap() - 17.0).abs() < 1e-5);
    }

    #[test]
    fn rejects_non_positive_inputs() {
        let mut c = PixelToCmCalibration::default();
        assert_eq!(
            c.update(0.0, 100.0),
            Err(CalibrationError::NonPositiveDistance(0.0))
        );
        assert_eq!(
            c.update(8.5, -3.0),
            Err(CalibrationError::NonPositivePixels(-3.0))
        );
        assert!(matches!(
            c.update(f32::NAN, 100.0),
            Err(CalibrationError::NonPositiveDistance(_))
        ));
        assert!(!c.is_calibrated());
    }
}
