//! High-level facade crate for the `roi-track-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the core, vision and pipeline crates
//! - (feature-gated) helpers that run the tracking pipeline directly on
//!   decoded `image` frames
//! - a small CLI (`roi-track`, feature `cli`) that tracks a ROI across a
//!   directory of frame images and prints per-frame JSON lines.
//!
//! ## Quickstart
//!
//! ```
//! use nalgebra::Point2;
//! use roi_track::core::{CircularRoi, RgbaFrameView};
//! use roi_track::{RoiTrackerPipeline, TrackerParams};
//!
//! let mut pipeline = RoiTrackerPipeline::new(TrackerParams::default());
//! pipeline.set_roi(CircularRoi::new("pad-0", Point2::new(0.5, 0.5), 0.1, 0.0));
//!
//! let buf = vec![0u8; 320 * 240 * 4];
//! let frame = RgbaFrameView::new(320, 240, &buf).unwrap();
//! let update = pipeline.process_frame(&frame, (320, 240), 0.0);
//! println!("updated: {}", update.is_some());
//! ```
//!
//! ## API map
//! - `roi_track::core`: image views, homographies, the circular ROI type.
//! - `roi_track::vision`: thresholding, contours, Hu moments, FAST/BRIEF
//!   features, robust homography estimation.
//! - `roi_track::pipeline`: the per-frame tracking pipeline and its
//!   parameter, result and event types.
//! - `roi_track::run` (feature `image`): helpers for `image::RgbaImage`
//!   frames.

pub use roi_track_core as core;
pub use roi_track_pipeline as pipeline;
pub use roi_track_vision as vision;

pub use roi_track_core::CircularRoi;
pub use roi_track_pipeline::{
    FrameUpdate, MarkerState, MarkerTransition, RoiTrackerPipeline, TrackerParams, TrackingResult,
};

#[cfg(feature = "image")]
pub mod run;
