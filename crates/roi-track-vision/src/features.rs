//! Sparse keypoints and binary descriptors.
//!
//! FAST-9 segment-test corners with non-max suppression, intensity-centroid
//! orientation, and 256-bit steered BRIEF descriptors sampled from a
//! box-filtered copy of the patch.

use std::sync::OnceLock;

use roi_track_core::{GrayImage, GrayImageView};
use serde::{Deserialize, Serialize};

/// FAST corner with orientation (radians) and detector response.
#[derive(Clone, Copy, Debug)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub response: f32,
}

/// 256-bit binary descriptor.
pub type Descriptor = [u8; 32];

/// Keypoints plus their descriptors, index-aligned.
#[derive(Clone, Debug, Default)]
pub struct FeatureSet {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Detector configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FeatureParams {
    /// FAST intensity threshold.
    pub threshold: u8,
    /// Required contiguous arc length on the Bresenham circle (9 = FAST-9).
    pub min_consecutive: usize,
    /// Non-max suppression radius in pixels.
    pub nms_radius: f32,
    /// Keep at most this many keypoints, strongest first.
    pub max_keypoints: usize,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            threshold: 20,
            min_consecutive: 9,
            nms_radius: 3.0,
            max_keypoints: 300,
        }
    }
}

/// Bresenham circle of radius 3 around the candidate pixel.
const FAST_RING: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Descriptor sampling pairs stay within this radius; keypoints closer than
/// `DESCRIPTOR_MARGIN` to the border are discarded so steered sampling can
/// never leave the patch.
const SAMPLE_RADIUS: i32 = 12;
const DESCRIPTOR_MARGIN: i32 = 18;
const ORIENTATION_RADIUS: i32 = 7;

/// Detect FAST keypoints and compute steered BRIEF descriptors.
///
/// Returns an empty set (not an error) when the patch is too small or too
/// flat to produce corners.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(img, params), fields(width = img.width, height = img.height))
)]
pub fn detect_features(img: &GrayImageView<'_>, params: &FeatureParams) -> FeatureSet {
    let margin = DESCRIPTOR_MARGIN as usize;
    if img.width <= 2 * margin || img.height <= 2 * margin {
        return FeatureSet::default();
    }

    let mut candidates = detect_fast(img, params);
    if candidates.is_empty() {
        return FeatureSet::default();
    }

    // Strongest-first non-max suppression.
    candidates.sort_by(|a, b| b.response.total_cmp(&a.response));
    let r2 = params.nms_radius * params.nms_radius;
    let mut kept: Vec<Keypoint> = Vec::new();
    for c in candidates {
        if kept.len() >= params.max_keypoints {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            let dx = k.x - c.x;
            let dy = k.y - c.y;
            dx * dx + dy * dy < r2
        });
        if !suppressed {
            kept.push(c);
        }
    }

    let blurred = box_blur5(img);
    let bv = blurred.view();

    let mut set = FeatureSet {
        keypoints: Vec::with_capacity(kept.len()),
        descriptors: Vec::with_capacity(kept.len()),
    };
    for mut kp in kept {
        kp.angle = orientation(&bv, kp.x as i32, kp.y as i32);
        set.descriptors.push(describe(&bv, &kp));
        set.keypoints.push(kp);
    }
    set
}

fn detect_fast(img: &GrayImageView<'_>, params: &FeatureParams) -> Vec<Keypoint> {
    let margin = DESCRIPTOR_MARGIN;
    let t = params.threshold as i32;
    let need = params.min_consecutive.clamp(3, 16);
    // Any contiguous arc of `need` ring pixels covers at least `need / 4`
    // of the four compass pixels; fewer hits means no corner is possible.
    let compass_need = need / 4;
    let mut out = Vec::new();

    let at = |x: i32, y: i32| -> i32 { img.data[y as usize * img.width + x as usize] as i32 };

    for y in margin..img.height as i32 - margin {
        for x in margin..img.width as i32 - margin {
            let center = at(x, y);

            // Short-circuit on the four compass pixels first.
            let mut bright_fast = 0;
            let mut dark_fast = 0;
            for &i in &[0usize, 4, 8, 12] {
                let (dx, dy) = FAST_RING[i];
                let v = at(x + dx, y + dy);
                if v >= center + t {
                    bright_fast += 1;
                } else if v <= center - t {
                    dark_fast += 1;
                }
            }
            if bright_fast < compass_need && dark_fast < compass_need {
                continue;
            }

            let mut bright = [false; 16];
            let mut dark = [false; 16];
            let mut response = 0.0f32;
            for (i, &(dx, dy)) in FAST_RING.iter().enumerate() {
                let v = at(x + dx, y + dy);
                let d = v - center;
                if d >= t {
                    bright[i] = true;
                } else if -d >= t {
                    dark[i] = true;
                }
                let excess = d.abs() - t;
                if excess > 0 {
                    response += excess as f32;
                }
            }

            if max_wrapped_run(&bright) >= need || max_wrapped_run(&dark) >= need {
                out.push(Keypoint {
                    x: x as f32,
                    y: y as f32,
                    angle: 0.0,
                    response,
                });
            }
        }
    }
    out
}

/// Longest run of `true` in a circular 16-element array.
fn max_wrapped_run(flags: &[bool; 16]) -> usize {
    let mut best = 0usize;
    let mut run = 0usize;
    for i in 0..32 {
        if flags[i % 16] {
            run += 1;
            best = best.max(run.min(16));
        } else {
            run = 0;
        }
    }
    best
}

/// Intensity-centroid orientation over a disc around the keypoint.
fn orientation(img: &GrayImageView<'_>, cx: i32, cy: i32) -> f32 {
    let r = ORIENTATION_RADIUS;
    let r2 = r * r;
    let mut m10 = 0.0f32;
    let mut m01 = 0.0f32;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let x = cx + dx;
            let y = cy + dy;
            if x < 0 || y < 0 || x >= img.width as i32 || y >= img.height as i32 {
                continue;
            }
            let v = img.data[y as usize * img.width + x as usize] as f32;
            m10 += dx as f32 * v;
            m01 += dy as f32 * v;
        }
    }
    m01.atan2(m10)
}

/// One BRIEF comparison: two offsets inside the sampling disc.
type SamplePair = [i8; 4];

fn brief_pattern() -> &'static [SamplePair; 256] {
    static PATTERN: OnceLock<[SamplePair; 256]> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Fixed-seed xorshift so every build uses the identical pattern;
        // descriptors are only comparable against the same pattern.
        let mut state = 0x9e37_79b9_u32;
        let mut next_coord = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % (2 * SAMPLE_RADIUS as u32 + 1)) as i32 - SAMPLE_RADIUS
        };
        let mut pattern = [[0i8; 4]; 256];
        for pair in pattern.iter_mut() {
            loop {
                let c = [next_coord(), next_coord(), next_coord(), next_coord()];
                // Degenerate pairs compare a pixel against itself.
                if c[0] == c[2] && c[1] == c[3] {
                    continue;
                }
                *pair = [c[0] as i8, c[1] as i8, c[2] as i8, c[3] as i8];
                break;
            }
        }
        pattern
    })
}

/// Steered BRIEF: the sampling pattern is rotated by the keypoint angle.
fn describe(img: &GrayImageView<'_>, kp: &Keypoint) -> Descriptor {
    let (sin_a, cos_a) = kp.angle.sin_cos();
    let sample = |dx: f32, dy: f32| -> u8 {
        let rx = kp.x + dx * cos_a - dy * sin_a;
        let ry = kp.y + dx * sin_a + dy * cos_a;
        roi_track_core::sample_bilinear_u8(img, rx, ry)
    };

    let mut desc: Descriptor = [0u8; 32];
    for (bit, pair) in brief_pattern().iter().enumerate() {
        let a = sample(pair[0] as f32, pair[1] as f32);
        let b = sample(pair[2] as f32, pair[3] as f32);
        if a < b {
            desc[bit / 8] |= 1 << (bit % 8);
        }
    }
    desc
}

/// 5x5 box filter; the descriptor samples smoothed intensities.
fn box_blur5(img: &GrayImageView<'_>) -> GrayImage {
    let w = img.width;
    let h = img.height;
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0u32;
            let mut n = 0u32;
            for dy in -2i32..=2 {
                for dx in -2i32..=2 {
                    let sx = x as i32 + dx;
                    let sy = y as i32 + dy;
                    if sx < 0 || sy < 0 || sx >= w as i32 || sy >= h as i32 {
                        continue;
                    }
                    sum += img.data[sy as usize * w + sx as usize] as u32;
                    n += 1;
                }
            }
            out.data[y * w + x] = (sum / n) as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::hamming_distance;

    /// Deterministic blocky texture with strong corners everywhere.
    fn checker_texture(size: usize, block: usize) -> GrayImage {
        let mut img = GrayImage::new(size, size);
        let mut state = 0xace1_u32;
        let mut cells = Vec::new();
        let n = size.div_ceil(block);
        for _ in 0..n * n {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            cells.push(if state & 1 == 0 { 30u8 } else { 220u8 });
        }
        for y in 0..size {
            for x in 0..size {
                img.data[y * size + x] = cells[(y / block) * n + (x / block)];
            }
        }
        img
    }

    #[test]
    fn flat_patch_has_no_keypoints() {
        let img = GrayImage {
            width: 64,
            height: 64,
            data: vec![128u8; 64 * 64],
        };
        let set = detect_features(&img.view(), &FeatureParams::default());
        assert!(set.is_empty());
    }

    #[test]
    fn tiny_patch_is_rejected_not_panicking() {
        let img = GrayImage::new(10, 10);
        let set = detect_features(&img.view(), &FeatureParams::default());
        assert!(set.is_empty());
    }

    #[test]
    fn textured_patch_produces_capped_keypoints() {
        let img = checker_texture(128, 11);
        let params = FeatureParams {
            max_keypoints: 50,
            ..FeatureParams::default()
        };
        let set = detect_features(&img.view(), &params);
        assert!(set.len() >= 10, "only {} keypoints", set.len());
        assert!(set.len() <= 50);
        assert_eq!(set.keypoints.len(), set.descriptors.len());
    }

    #[test]
    fn descriptor_is_stable_across_runs() {
        let img = checker_texture(96, 9);
        let params = FeatureParams::default();
        let a = detect_features(&img.view(), &params);
        let b = detect_features(&img.view(), &params);
        assert_eq!(a.len(), b.len());
        for (da, db) in a.descriptors.iter().zip(&b.descriptors) {
            assert_eq!(hamming_distance(da, db), 0);
        }
    }

    #[test]
    fn max_wrapped_run_wraps_around() {
        let mut flags = [false; 16];
        for i in [14, 15, 0, 1, 2] {
            flags[i] = true;
        }
        assert_eq!(max_wrapped_run(&flags), 5);
    }
}
