//! Core types and utilities for the ROI marker-tracking pipeline.
//!
//! This crate is intentionally small: image views over plain `u8` buffers,
//! homography estimation, and the circular region-of-interest type shared by
//! the higher-level crates. It does *not* depend on any concrete feature
//! detector or camera source.

mod homography;
mod image;
mod logger;
mod roi;

pub use homography::{estimate_homography, homography_from_4pt, Homography};
pub use image::{sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView, RgbaFrameView};
pub use roi::CircularRoi;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
