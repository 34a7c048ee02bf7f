//! Robust homography estimation over matched point pairs.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use roi_track_core::{estimate_homography, homography_from_4pt, Homography};

/// RANSAC configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RansacParams {
    /// Number of 4-point hypotheses to draw.
    pub iterations: usize,
    /// Reprojection error (pixels) below which a pair is an inlier.
    pub inlier_threshold: f32,
    /// Seed for the deterministic sampler.
    pub seed: u64,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            iterations: 500,
            inlier_threshold: 3.0,
            seed: 0x5eed_cafe,
        }
    }
}

/// Best homography found, with its per-pair inlier mask.
#[derive(Clone, Debug)]
pub struct RansacResult {
    pub homography: Homography,
    pub inlier_mask: Vec<bool>,
    pub inlier_count: usize,
}

struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn next(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

/// Estimate a homography `cur ~ H * ref` robustly.
///
/// Draws random 4-point hypotheses, scores them by reprojection error, and
/// refits on the winning inlier set with the least-squares estimator. Needs
/// at least 4 pairs and at least 4 inliers to succeed.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip_all, fields(pairs = ref_pts.len()))
)]
pub fn estimate_homography_ransac(
    ref_pts: &[Point2<f32>],
    cur_pts: &[Point2<f32>],
    params: &RansacParams,
) -> Option<RansacResult> {
    let n = ref_pts.len();
    if n < 4 || cur_pts.len() != n {
        return None;
    }

    let mut rng = XorShift64::new(params.seed);
    let thr2 = params.inlier_threshold * params.inlier_threshold;

    let mut best: Option<(usize, Homography)> = None;

    for _ in 0..params.iterations {
        let idx = sample_distinct4(&mut rng, n);
        let src = [
            ref_pts[idx[0]],
            ref_pts[idx[1]],
            ref_pts[idx[2]],
            ref_pts[idx[3]],
        ];
        let dst = [
            cur_pts[idx[0]],
            cur_pts[idx[1]],
            cur_pts[idx[2]],
            cur_pts[idx[3]],
        ];
        let Some(h) = homography_from_4pt(&src, &dst) else {
            continue; // degenerate sample
        };

        let inliers = count_inliers(&h, ref_pts, cur_pts, thr2);
        if best.as_ref().map(|(c, _)| inliers > *c).unwrap_or(true) {
            best = Some((inliers, h));
        }
    }

    let (count, h) = best?;
    if count < 4 {
        return None;
    }

    // Refit on the consensus set; keep the hypothesis if the refit is
    // degenerate or loses support.
    let mask = inlier_mask(&h, ref_pts, cur_pts, thr2);
    let (in_ref, in_cur): (Vec<_>, Vec<_>) = mask
        .iter()
        .enumerate()
        .filter(|(_, &keep)| keep)
        .map(|(i, _)| (ref_pts[i], cur_pts[i]))
        .unzip();

    let mut final_h = h;
    if let Some(refined) = estimate_homography(&in_ref, &in_cur) {
        if count_inliers(&refined, ref_pts, cur_pts, thr2) >= count {
            final_h = refined;
        }
    }

    let inlier_mask = inlier_mask(&final_h, ref_pts, cur_pts, thr2);
    let inlier_count = inlier_mask.iter().filter(|&&b| b).count();
    Some(RansacResult {
        homography: final_h,
        inlier_mask,
        inlier_count,
    })
}

fn sample_distinct4(rng: &mut XorShift64, n: usize) -> [usize; 4] {
    let mut idx = [0usize; 4];
    let mut filled = 0;
    while filled < 4 {
        let c = rng.below(n);
        if !idx[..filled].contains(&c) {
            idx[filled] = c;
            filled += 1;
        }
    }
    idx
}

fn reprojection_err2(h: &Homography, r: Point2<f32>, c: Point2<f32>) -> f32 {
    let p = h.apply(r);
    let dx = p.x - c.x;
    let dy = p.y - c.y;
    dx * dx + dy * dy
}

fn count_inliers(
    h: &Homography,
    ref_pts: &[Point2<f32>],
    cur_pts: &[Point2<f32>],
    thr2: f32,
) -> usize {
    ref_pts
        .iter()
        .zip(cur_pts)
        .filter(|(&r, &c)| reprojection_err2(h, r, c) < thr2)
        .count()
}

fn inlier_mask(
    h: &Homography,
    ref_pts: &[Point2<f32>],
    cur_pts: &[Point2<f32>],
    thr2: f32,
) -> Vec<bool> {
    ref_pts
        .iter()
        .zip(cur_pts)
        .map(|(&r, &c)| reprojection_err2(h, r, c) < thr2)
        .collect()
}
