/// Errors returned by the pipeline's explicit-misuse surfaces.
///
/// Per-frame absences (no frame yet, nothing matched, too few features) are
/// deliberately *not* errors; they come back as negative results so an
/// unbounded frame stream never throws.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("no active region of interest")]
    NoActiveRoi,
    #[error("calibration rejected: {0}")]
    Calibration(#[from] CalibrationError),
}

/// Invalid pixel-to-cm calibration input.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CalibrationError {
    #[error("known distance must be positive, got {0}")]
    NonPositiveDistance(f32),
    #[error("measured pixel distance must be positive, got {0}")]
    NonPositivePixels(f32),
}
