//! Minimal drum-pad loop over synthetic frames.
//!
//! Builds a short synthetic sequence (marker visible, then covered, then
//! uncovered), runs the tracking pipeline over it and prints the marker
//! transitions a real application would map to pad hits.

use log::LevelFilter;
use nalgebra::Point2;

use roi_track::core::{init_with_level, CircularRoi, RgbaFrameView};
use roi_track::{RoiTrackerPipeline, TrackerParams};

const W: usize = 640;
const H: usize = 480;

fn solid_frame(v: u8) -> Vec<u8> {
    let mut buf = vec![v; W * H * 4];
    for px in buf.chunks_exact_mut(4) {
        px[3] = 255;
    }
    buf
}

fn draw_rect(buf: &mut [u8], x0: usize, y0: usize, w: usize, h: usize, v: u8) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let i = (y * W + x) * 4;
            buf[i] = v;
            buf[i + 1] = v;
            buf[i + 2] = v;
        }
    }
}

fn draw_disc(buf: &mut [u8], cx: f32, cy: f32, r: f32, v: u8) {
    let r2 = r * r;
    for y in 0..H {
        for x in 0..W {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy <= r2 {
                let i = (y * W + x) * 4;
                buf[i] = v;
                buf[i + 1] = v;
                buf[i + 2] = v;
            }
        }
    }
}

fn main() {
    let _ = init_with_level(LevelFilter::Info);

    // Marker: dark square centred in the frame.
    let mut visible = solid_frame(230);
    draw_rect(&mut visible, 290, 210, 60, 60, 25);

    // The same scene with a "hand" over the ROI.
    let mut covered = visible.clone();
    draw_disc(&mut covered, 320.0, 240.0, 80.0, 140);

    let mut pipeline = RoiTrackerPipeline::new(TrackerParams::default());
    pipeline.set_roi(CircularRoi::new("pad-0", Point2::new(0.5, 0.5), 0.1, 0.0));

    // 30 fps timeline: visible 0..1s, covered 1..2.5s, visible again.
    let mut t = 0.0;
    while t <= 3500.0 {
        let buf = if (1000.0..2500.0).contains(&t) {
            &covered
        } else {
            &visible
        };
        let frame = RgbaFrameView::new(W, H, buf).expect("frame");
        if let Some(update) = pipeline.process_frame(&frame, (W, H), t) {
            if let Some(tr) = update.transition {
                println!(
                    "t={:6.0} ms  pad '{}': {} -> {} [{}]",
                    t, tr.marker_id, tr.prev, tr.next, tr.code
                );
            }
        }
        t += 1000.0 / 30.0;
    }
}
