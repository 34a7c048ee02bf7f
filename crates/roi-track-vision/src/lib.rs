//! Vision primitives for the ROI marker-tracking pipeline.
//!
//! Everything here is synchronous, pure with respect to its input buffers,
//! and free of global state; the tracking pipeline treats this crate as its
//! provider boundary and never reaches past it. All primitives work on plain
//! row-major `u8` buffers from `roi-track-core`.

mod contour;
mod features;
mod gray;
mod matching;
mod moments;
mod polygon;
mod ransac;
mod threshold;

pub use contour::{find_shapes, Contour, ShapeBlob};
pub use features::{detect_features, Descriptor, FeatureParams, FeatureSet, Keypoint};
pub use gray::{apply_circular_mask, rgba_to_gray};
pub use matching::{hamming_distance, match_descriptors, DescriptorMatch, MatchParams};
pub use moments::{hu_moments, RegionMoments};
pub use polygon::approx_polygon;
pub use ransac::{estimate_homography_ransac, RansacParams, RansacResult};
pub use threshold::{binarize, otsu_threshold, BinaryImage, ThresholdPolarity};
