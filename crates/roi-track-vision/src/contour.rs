//! Connected components and outer-boundary extraction on binary patches.

use nalgebra::Point2;

use crate::moments::RegionMoments;
use crate::threshold::BinaryImage;

/// Closed outer boundary of one connected component.
#[derive(Clone, Debug)]
pub struct Contour {
    /// Boundary pixels in tracing order.
    pub points: Vec<Point2<f32>>,
    /// Region area in pixels (not the polygon area of the boundary).
    pub area: f32,
    /// Length of the closed boundary polyline.
    pub perimeter: f32,
}

/// A connected component: its outer contour plus raw region moments.
#[derive(Clone, Debug)]
pub struct ShapeBlob {
    pub contour: Contour,
    pub moments: RegionMoments,
}

const NO_LABEL: i32 = -1;

/// 8-neighbourhood in clockwise order starting from west.
const MOORE: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

/// Label 8-connected foreground components and extract their outer contours.
///
/// Components smaller than `min_area` pixels are dropped. Blobs come back in
/// scan order (topmost-leftmost first).
pub fn find_shapes(bin: &BinaryImage, min_area: f32) -> Vec<ShapeBlob> {
    let w = bin.width;
    let h = bin.height;
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let mut labels = vec![NO_LABEL; w * h];
    let mut blobs = Vec::new();
    let mut next_label = 0i32;
    let mut queue: Vec<(usize, usize)> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            if bin.data[idx] == 0 || labels[idx] != NO_LABEL {
                continue;
            }

            // Flood-fill one component, accumulating moments as we go.
            let label = next_label;
            next_label += 1;
            let mut moments = RegionMoments::default();
            labels[idx] = label;
            queue.clear();
            queue.push((x, y));

            while let Some((px, py)) = queue.pop() {
                moments.push(px as f64, py as f64);
                for (dx, dy) in MOORE {
                    let nx = px as i32 + dx;
                    let ny = py as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                        continue;
                    }
                    let nidx = ny as usize * w + nx as usize;
                    if bin.data[nidx] != 0 && labels[nidx] == NO_LABEL {
                        labels[nidx] = label;
                        queue.push((nx as usize, ny as usize));
                    }
                }
            }

            if (moments.m00 as f32) < min_area {
                continue;
            }

            // (x, y) is the topmost-leftmost pixel of this component by scan
            // order, which is the canonical start for Moore tracing.
            let points = trace_boundary(&labels, w, h, x, y, label);
            let perimeter = closed_polyline_length(&points);
            blobs.push(ShapeBlob {
                contour: Contour {
                    points,
                    area: moments.m00 as f32,
                    perimeter,
                },
                moments,
            });
        }
    }

    blobs
}

/// Moore-neighbour boundary tracing with Jacob's stopping criterion.
fn trace_boundary(
    labels: &[i32],
    w: usize,
    h: usize,
    sx: usize,
    sy: usize,
    label: i32,
) -> Vec<Point2<f32>> {
    let inside = |x: i32, y: i32| -> bool {
        x >= 0
            && y >= 0
            && x < w as i32
            && y < h as i32
            && labels[y as usize * w + x as usize] == label
    };

    let mut points = vec![Point2::new(sx as f32, sy as f32)];

    // The start pixel was found scanning left-to-right, so it was entered
    // from the west: begin the clockwise scan there.
    let mut cx = sx as i32;
    let mut cy = sy as i32;
    let mut enter_dir = 0usize; // index into MOORE pointing at the backtrack cell
    let start_dir;

    // First step; a single-pixel component has no neighbours and is done.
    match next_boundary_step(&inside, cx, cy, enter_dir) {
        Some((nx, ny, dir)) => {
            start_dir = dir;
            cx = nx;
            cy = ny;
            enter_dir = (dir + 4) % 8;
            if !(cx == sx as i32 && cy == sy as i32) {
                points.push(Point2::new(cx as f32, cy as f32));
            }
        }
        None => return points,
    }

    let max_steps = 4 * w * h;
    for _ in 0..max_steps {
        if cx == sx as i32 && cy == sy as i32 {
            // Back at the start: stop once we leave it the same way we
            // originally did (Jacob's criterion).
            if let Some((_, _, dir)) = next_boundary_step(&inside, cx, cy, enter_dir) {
                if dir == start_dir {
                    break;
                }
            }
        }
        let Some((nx, ny, dir)) = next_boundary_step(&inside, cx, cy, enter_dir) else {
            break;
        };
        cx = nx;
        cy = ny;
        enter_dir = (dir + 4) % 8;
        if cx == sx as i32 && cy == sy as i32 {
            continue;
        }
        points.push(Point2::new(cx as f32, cy as f32));
    }

    points
}

/// Scan the Moore neighbourhood clockwise from just past `enter_dir` and
/// return the first component pixel together with its direction index.
fn next_boundary_step(
    inside: &dyn Fn(i32, i32) -> bool,
    cx: i32,
    cy: i32,
    enter_dir: usize,
) -> Option<(i32, i32, usize)> {
    for step in 1..=8 {
        let dir = (enter_dir + step) % 8;
        let (dx, dy) = MOORE[dir];
        let nx = cx + dx;
        let ny = cy + dy;
        if inside(nx, ny) {
            return Some((nx, ny, dir));
        }
    }
    None
}

fn closed_polyline_length(points: &[Point2<f32>]) -> f32 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut len = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        len += (a - b).norm();
    }
    len
}
