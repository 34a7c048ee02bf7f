//! Shape re-identification via Hu-moment signatures.
//!
//! Keeps the tracker locked onto the *same* physical shape when several
//! contours share the ROI: every candidate is scored against the stored
//! reference signature and only a sufficiently similar one is accepted.

use serde::{Deserialize, Serialize};

use roi_track_vision::{hu_moments, RegionMoments};

/// Log-compressed Hu-moment signature of a contour region.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeSignature {
    pub values: [f64; 7],
}

/// Weights per Hu component; the earlier moments are the most stable under
/// noise, the seventh the least.
const COMPONENT_WEIGHTS: [f64; 7] = [2.0, 1.5, 1.0, 1.0, 0.8, 0.8, 0.5];
const LOG_EPS: f64 = 1e-30;
const DECAY: f64 = 3.0;

impl ShapeSignature {
    /// Build a signature from region moments; `None` for an empty region.
    pub fn from_moments(m: &RegionMoments) -> Option<Self> {
        let hu = hu_moments(m)?;
        let mut values = [0.0f64; 7];
        for (dst, h) in values.iter_mut().zip(hu) {
            // Hu moments span many orders of magnitude; log-compress them.
            *dst = (h.abs() + LOG_EPS).ln();
        }
        Some(Self { values })
    }

    /// Similarity in [0, 1]; 1.0 means identical signatures.
    ///
    /// Weighted L1 distance, normalized by the total weight, mapped through
    /// an exponential decay. Non-finite inputs score 0 rather than
    /// propagating NaN into tracking decisions.
    pub fn similarity(&self, other: &ShapeSignature) -> f64 {
        let mut dist = 0.0f64;
        for i in 0..7 {
            let a = self.values[i];
            let b = other.values[i];
            if !a.is_finite() || !b.is_finite() {
                return 0.0;
            }
            dist += COMPONENT_WEIGHTS[i] * (a - b).abs();
        }
        let total: f64 = COMPONENT_WEIGHTS.iter().sum();
        (-DECAY * dist / total).exp()
    }
}

/// Best-scoring candidate index with its similarity, or `None` when no
/// candidate reaches `min_similarity`.
pub fn best_match(
    reference: &ShapeSignature,
    candidates: &[ShapeSignature],
    min_similarity: f64,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, cand) in candidates.iter().enumerate() {
        let score = reference.similarity(cand);
        if best.map(|(_, s)| score > s).unwrap_or(true) {
            best = Some((i, score));
        }
    }
    best.filter(|&(_, score)| score >= min_similarity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn moments_of_rect(x0: usize, y0: usize, w: usize, h: usize) -> RegionMoments {
        let mut m = RegionMoments::default();
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                m.push(x as f64, y as f64);
            }
        }
        m
    }

    fn moments_of_disc(cx: f64, cy: f64, r: f64) -> RegionMoments {
        let mut m = RegionMoments::default();
        let r2 = r * r;
        let lo = (cx - r) as i64;
        let hi = (cx + r) as i64 + 1;
        for y in lo..hi {
            for x in lo..hi {
                let dx = x as f64 - cx;
                let dy = y as f64 - cy;
                if dx * dx + dy * dy <= r2 {
                    m.push(x as f64, y as f64);
                }
            }
        }
        m
    }

    #[test]
    fn self_similarity_is_one() {
        let sig = ShapeSignature::from_moments(&moments_of_rect(3, 4, 20, 33)).unwrap();
        assert_relative_eq!(sig.similarity(&sig), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = ShapeSignature::from_moments(&moments_of_rect(0, 0, 20, 33)).unwrap();
        let b = ShapeSignature::from_moments(&moments_of_disc(30.0, 30.0, 14.0)).unwrap();
        assert_eq!(a.similarity(&b), b.similarity(&a));
    }

    #[test]
    fn same_shape_translated_and_scaled_scores_high() {
        let a = ShapeSignature::from_moments(&moments_of_rect(0, 0, 20, 40)).unwrap();
        let b = ShapeSignature::from_moments(&moments_of_rect(50, 30, 30, 60)).unwrap();
        assert!(a.similarity(&b) > 0.9, "score {}", a.similarity(&b));
    }

    #[test]
    fn different_shapes_score_lower_than_same() {
        let rect = ShapeSignature::from_moments(&moments_of_rect(0, 0, 12, 48)).unwrap();
        let rect2 = ShapeSignature::from_moments(&moments_of_rect(5, 5, 24, 96)).unwrap();
        let disc = ShapeSignature::from_moments(&moments_of_disc(40.0, 40.0, 20.0)).unwrap();
        assert!(rect.similarity(&rect2) > rect.similarity(&disc));
    }

    #[test]
    fn degenerate_signature_scores_zero() {
        let good = ShapeSignature::from_moments(&moments_of_rect(0, 0, 10, 10)).unwrap();
        let bad = ShapeSignature {
            values: [f64::NAN; 7],
        };
        assert_eq!(good.similarity(&bad), 0.0);
        assert_eq!(bad.similarity(&good), 0.0);
    }

    #[test]
    fn best_match_picks_highest_and_enforces_threshold() {
        let reference = ShapeSignature::from_moments(&moments_of_rect(0, 0, 12, 48)).unwrap();
        let candidates = vec![
            ShapeSignature::from_moments(&moments_of_disc(30.0, 30.0, 15.0)).unwrap(),
            ShapeSignature::from_moments(&moments_of_rect(7, 9, 12, 48)).unwrap(),
        ];
        let (idx, score) = best_match(&reference, &candidates, 0.8).expect("match");
        assert_eq!(idx, 1);
        assert!(score > 0.99);

        // A wrong object in view is not the tracked object.
        let only_disc = vec![candidates[0]];
        assert!(best_match(&reference, &only_disc, 0.8).is_none());
    }

    #[test]
    fn no_candidates_no_match() {
        let reference = ShapeSignature::from_moments(&moments_of_rect(0, 0, 10, 10)).unwrap();
        assert!(best_match(&reference, &[], 0.5).is_none());
    }
}
