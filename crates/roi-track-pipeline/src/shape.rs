//! Contour classification into coarse shape kinds.

use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use roi_track_vision::{approx_polygon, Contour};

use crate::params::ShapeParams;

/// Closed set of shapes the classifier can produce.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Triangle,
    Square,
    Rectangle,
    Circle,
    Unknown,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Triangle => "triangle",
            ShapeKind::Square => "square",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Classification output for one contour.
#[derive(Clone, Debug)]
pub struct ShapeDescription {
    pub shape: ShapeKind,
    /// Approximated polygon vertices, in contour order.
    pub corners: Vec<Point2<f32>>,
    pub perimeter: f32,
    pub area: f32,
    /// Centroid of the approximated polygon vertices.
    pub center: Point2<f32>,
}

/// Classify a contour by its approximated vertex count.
///
/// Pure function: 3 vertices make a triangle; 4 split into square vs
/// rectangle on bounding-box aspect; 8..=12 are circle candidates confirmed
/// by circularity; everything else is unknown.
pub fn classify(contour: &Contour, params: &ShapeParams) -> ShapeDescription {
    let epsilon = params.approx_tolerance * contour.perimeter;
    let corners = approx_polygon(&contour.points, epsilon);

    let shape = match corners.len() {
        3 => ShapeKind::Triangle,
        4 => {
            let (w, h) = bounding_size(&corners);
            let aspect = if w < h { h / w.max(1.0) } else { w / h.max(1.0) };
            if aspect < params.max_square_aspect {
                ShapeKind::Square
            } else {
                ShapeKind::Rectangle
            }
        }
        8..=12 => {
            let circularity = if contour.perimeter > 0.0 {
                4.0 * std::f32::consts::PI * contour.area
                    / (contour.perimeter * contour.perimeter)
            } else {
                0.0
            };
            if circularity > params.min_circularity {
                ShapeKind::Circle
            } else {
                ShapeKind::Unknown
            }
        }
        _ => ShapeKind::Unknown,
    };

    let center = vertex_centroid(&corners);

    ShapeDescription {
        shape,
        corners,
        perimeter: contour.perimeter,
        area: contour.area,
        center,
    }
}

fn bounding_size(points: &[Point2<f32>]) -> (f32, f32) {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    (max_x - min_x, max_y - min_y)
}

fn vertex_centroid(points: &[Point2<f32>]) -> Point2<f32> {
    if points.is_empty() {
        return Point2::new(0.0, 0.0);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for p in points {
        cx += p.x;
        cy += p.y;
    }
    let n = points.len() as f32;
    Point2::new(cx / n, cy / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contour_from_polygon(vertices: &[(f32, f32)], samples_per_edge: usize) -> Contour {
        let mut points = Vec::new();
        let n = vertices.len();
        let mut perimeter = 0.0f32;
        for i in 0..n {
            let a = Point2::new(vertices[i].0, vertices[i].1);
            let b = Point2::new(vertices[(i + 1) % n].0, vertices[(i + 1) % n].1);
            perimeter += (b - a).norm();
            for s in 0..samples_per_edge {
                let t = s as f32 / samples_per_edge as f32;
                points.push(Point2::new(
                    a.x + (b.x - a.x) * t,
                    a.y + (b.y - a.y) * t,
                ));
            }
        }
        // Polygon area via the shoelace formula stands in for the pixel count.
        let mut area2 = 0.0f32;
        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            area2 += a.0 * b.1 - b.0 * a.1;
        }
        Contour {
            points,
            area: area2.abs() / 2.0,
            perimeter,
        }
    }

    fn circle_contour(r: f32, samples: usize) -> Contour {
        let points: Vec<Point2<f32>> = (0..samples)
            .map(|k| {
                let t = k as f32 / samples as f32 * std::f32::consts::TAU;
                Point2::new(r * t.cos(), r * t.sin())
            })
            .collect();
        Contour {
            points,
            area: std::f32::consts::PI * r * r,
            perimeter: std::f32::consts::TAU * r,
        }
    }

    #[test]
    fn triangle_has_three_corners() {
        let c = contour_from_polygon(&[(0.0, 0.0), (60.0, 10.0), (25.0, 50.0)], 40);
        let d = classify(&c, &ShapeParams::default());
        assert_eq!(d.shape, ShapeKind::Triangle);
        assert_eq!(d.corners.len(), 3);
    }

    #[test]
    fn near_unit_aspect_quad_is_square() {
        let c = contour_from_polygon(
            &[(0.0, 0.0), (50.0, 0.0), (50.0, 55.0), (0.0, 55.0)],
            40,
        );
        let d = classify(&c, &ShapeParams::default());
        // aspect 1.1 < 1.2
        assert_eq!(d.shape, ShapeKind::Square);
    }

    #[test]
    fn elongated_quad_is_rectangle() {
        let c = contour_from_polygon(
            &[(0.0, 0.0), (90.0, 0.0), (90.0, 40.0), (0.0, 40.0)],
            40,
        );
        let d = classify(&c, &ShapeParams::default());
        // aspect 2.25 >= 1.2
        assert_eq!(d.shape, ShapeKind::Rectangle);
    }

    #[test]
    fn aspect_rule_is_exact_at_the_boundary() {
        let params = ShapeParams::default();
        let square = contour_from_polygon(
            &[(0.0, 0.0), (100.0, 0.0), (100.0, 119.0), (0.0, 119.0)],
            30,
        );
        assert_eq!(classify(&square, &params).shape, ShapeKind::Square);
        let rect = contour_from_polygon(
            &[(0.0, 0.0), (100.0, 0.0), (100.0, 121.0), (0.0, 121.0)],
            30,
        );
        assert_eq!(classify(&rect, &params).shape, ShapeKind::Rectangle);
    }

    #[test]
    fn round_contour_is_circle() {
        let d = classify(&circle_contour(40.0, 240), &ShapeParams::default());
        assert_eq!(d.shape, ShapeKind::Circle);
        assert!((8..=12).contains(&d.corners.len()));
    }

    #[test]
    fn star_contour_is_unknown() {
        // A 5-pointed star: 10 approximated vertices but low circularity.
        let mut vertices = Vec::new();
        for k in 0..10 {
            let r = if k % 2 == 0 { 50.0 } else { 20.0 };
            let t = k as f32 / 10.0 * std::f32::consts::TAU;
            vertices.push((r * t.cos(), r * t.sin()));
        }
        let c = contour_from_polygon(&vertices, 25);
        let d = classify(&c, &ShapeParams::default());
        assert_eq!(d.shape, ShapeKind::Unknown);
    }

    #[test]
    fn centroid_sits_inside_the_square() {
        let c = contour_from_polygon(
            &[(10.0, 10.0), (50.0, 10.0), (50.0, 50.0), (10.0, 50.0)],
            40,
        );
        let d = classify(&c, &ShapeParams::default());
        assert!((d.center.x - 30.0).abs() < 1.5);
        assert!((d.center.y - 30.0).abs() < 1.5);
    }
}
