//! Brute-force descriptor matching with greedy global assignment.

use serde::{Deserialize, Serialize};

use crate::features::{Descriptor, FeatureSet};

/// Matching configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MatchParams {
    /// Discard pairs whose Hamming distance exceeds this (bits, of 256).
    pub max_distance: u32,
    /// Spatial tie-break: added cost per pixel of keypoint displacement.
    /// Keeps near-identical descriptors from pairing across the patch.
    pub spatial_weight: f32,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            max_distance: 80,
            spatial_weight: 0.05,
        }
    }
}

/// An accepted pair: `query` indexes the reference set, `train` the current.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DescriptorMatch {
    pub query: usize,
    pub train: usize,
    pub distance: u32,
}

/// Hamming distance between two 256-bit descriptors.
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum()
}

/// Match `query` descriptors against `train` descriptors.
///
/// All pairs within the distance cutoff are ranked by Hamming distance plus
/// a spatial-proximity penalty; assignment is greedy on that combined cost,
/// consuming both sides, so no keypoint is used twice.
pub fn match_descriptors(
    query: &FeatureSet,
    train: &FeatureSet,
    params: &MatchParams,
) -> Vec<DescriptorMatch> {
    if query.is_empty() || train.is_empty() {
        return Vec::new();
    }

    struct Pair {
        query: usize,
        train: usize,
        distance: u32,
        cost: f32,
    }

    let mut pairs = Vec::new();
    for (qi, qd) in query.descriptors.iter().enumerate() {
        let qk = &query.keypoints[qi];
        for (ti, td) in train.descriptors.iter().enumerate() {
            let distance = hamming_distance(qd, td);
            if distance > params.max_distance {
                continue;
            }
            let tk = &train.keypoints[ti];
            let dx = qk.x - tk.x;
            let dy = qk.y - tk.y;
            let cost = distance as f32 + params.spatial_weight * (dx * dx + dy * dy).sqrt();
            pairs.push(Pair {
                query: qi,
                train: ti,
                distance,
                cost,
            });
        }
    }

    pairs.sort_by(|a, b| a.cost.total_cmp(&b.cost));

    let mut query_used = vec![false; query.len()];
    let mut train_used = vec![false; train.len()];
    let mut out = Vec::new();
    for p in pairs {
        if query_used[p.query] || train_used[p.train] {
            continue;
        }
        query_used[p.query] = true;
        train_used[p.train] = true;
        out.push(DescriptorMatch {
            query: p.query,
            train: p.train,
            distance: p.distance,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Keypoint;

    fn kp(x: f32, y: f32) -> Keypoint {
        Keypoint {
            x,
            y,
            angle: 0.0,
            response: 1.0,
        }
    }

    fn desc(fill: u8) -> Descriptor {
        [fill; 32]
    }

    fn set(items: Vec<(Keypoint, Descriptor)>) -> FeatureSet {
        let mut s = FeatureSet::default();
        for (k, d) in items {
            s.keypoints.push(k);
            s.descriptors.push(d);
        }
        s
    }

    #[test]
    fn hamming_counts_differing_bits() {
        assert_eq!(hamming_distance(&desc(0x00), &desc(0x00)), 0);
        assert_eq!(hamming_distance(&desc(0x00), &desc(0xff)), 256);
        assert_eq!(hamming_distance(&desc(0b1010), &desc(0b1000)), 32);
    }

    #[test]
    fn no_keypoint_is_assigned_twice() {
        // Two identical query descriptors compete for the same train one.
        let q = set(vec![(kp(0.0, 0.0), desc(1)), (kp(5.0, 0.0), desc(1))]);
        let t = set(vec![(kp(0.0, 0.0), desc(1))]);
        let matches = match_descriptors(&q, &t, &MatchParams::default());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].query, 0, "spatially closer query must win");
    }

    #[test]
    fn spatial_penalty_breaks_descriptor_ties() {
        let q = set(vec![(kp(10.0, 10.0), desc(7))]);
        let t = set(vec![(kp(90.0, 90.0), desc(7)), (kp(12.0, 10.0), desc(7))]);
        let matches = match_descriptors(&q, &t, &MatchParams::default());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].train, 1);
    }

    #[test]
    fn cutoff_discards_weak_pairs() {
        let q = set(vec![(kp(0.0, 0.0), desc(0x00))]);
        let t = set(vec![(kp(0.0, 0.0), desc(0xff))]);
        assert!(match_descriptors(&q, &t, &MatchParams::default()).is_empty());
    }
}
