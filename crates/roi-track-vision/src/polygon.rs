//! Polygon approximation of closed contours.

use nalgebra::Point2;

/// Approximate a closed contour with the Ramer-Douglas-Peucker algorithm.
///
/// `epsilon` is the maximum allowed deviation in pixels. The contour is
/// treated as closed: the split anchors are the first point and the point
/// farthest from it, so the result is stable under traversal start.
pub fn approx_polygon(points: &[Point2<f32>], epsilon: f32) -> Vec<Point2<f32>> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let anchor = points[0];
    let mut far = 0;
    let mut far_d = 0.0f32;
    for (i, p) in points.iter().enumerate() {
        let d = (p - anchor).norm_squared();
        if d > far_d {
            far_d = d;
            far = i;
        }
    }
    if far == 0 {
        // All points coincide.
        return vec![anchor];
    }

    // Two open halves: anchor..far and far..anchor (wrapping).
    let first: Vec<Point2<f32>> = points[..=far].to_vec();
    let mut second: Vec<Point2<f32>> = points[far..].to_vec();
    second.push(anchor);

    let mut out = rdp_open(&first, epsilon);
    let back = rdp_open(&second, epsilon);
    // Drop the duplicated junction points at `far` and at the anchor.
    out.extend_from_slice(&back[1..back.len() - 1]);
    out
}

fn rdp_open(points: &[Point2<f32>], epsilon: f32) -> Vec<Point2<f32>> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let a = points[0];
    let b = points[points.len() - 1];

    let mut split = 0;
    let mut max_d = 0.0f32;
    for (i, p) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let d = segment_distance(*p, a, b);
        if d > max_d {
            max_d = d;
            split = i;
        }
    }

    if max_d <= epsilon {
        return vec![a, b];
    }

    let mut left = rdp_open(&points[..=split], epsilon);
    let right = rdp_open(&points[split..], epsilon);
    left.pop(); // the split point is the first element of `right`
    left.extend(right);
    left
}

fn segment_distance(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= f32::EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    let proj = a + ab * t;
    (p - proj).norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_contour(w: usize, h: usize) -> Vec<Point2<f32>> {
        let mut pts = Vec::new();
        for x in 0..w {
            pts.push(Point2::new(x as f32, 0.0));
        }
        for y in 0..h {
            pts.push(Point2::new((w - 1) as f32, y as f32));
        }
        for x in (0..w).rev() {
            pts.push(Point2::new(x as f32, (h - 1) as f32));
        }
        for y in (1..h - 1).rev() {
            pts.push(Point2::new(0.0, y as f32));
        }
        pts
    }

    #[test]
    fn rectangle_collapses_to_four_vertices() {
        let contour = rect_contour(40, 25);
        let approx = approx_polygon(&contour, 2.0);
        assert_eq!(approx.len(), 4, "got {:?}", approx);
    }

    #[test]
    fn digital_circle_keeps_eight_to_twelve_vertices() {
        let r = 30.0f32;
        let n = 200;
        let contour: Vec<Point2<f32>> = (0..n)
            .map(|k| {
                let t = k as f32 / n as f32 * std::f32::consts::TAU;
                Point2::new(r * t.cos(), r * t.sin())
            })
            .collect();
        // 4% of the circumference, the classifier's default tolerance.
        let eps = 0.04 * std::f32::consts::TAU * r;
        let approx = approx_polygon(&contour, eps);
        assert!(
            (8..=12).contains(&approx.len()),
            "expected 8..=12 vertices, got {}",
            approx.len()
        );
    }

    #[test]
    fn short_input_is_returned_unchanged() {
        let pts = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)];
        assert_eq!(approx_polygon(&pts, 1.0).len(), 2);
    }
}
