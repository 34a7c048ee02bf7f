//! Track a circular ROI across a directory of frame images.
//!
//! Frames are processed in lexicographic filename order at a fixed frame
//! rate; every frame prints one JSON line with the tracking result, the
//! re-identified shape and any marker transition.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use nalgebra::Point2;
use serde::Serialize;

use roi_track::core::{init_with_level, CircularRoi};
use roi_track::pipeline::{FrameUpdate, TrackerParams};
use roi_track::run::process_image;
use roi_track::RoiTrackerPipeline;

#[derive(Parser, Debug)]
#[command(name = "roi-track", about = "Track a circular ROI across image frames")]
struct Args {
    /// Directory containing the frame images (png/jpg), in filename order.
    #[arg(long)]
    frames: PathBuf,

    /// ROI as `cx,cy,r` in normalized coordinates (r relative to width).
    #[arg(long, default_value = "0.5,0.5,0.1")]
    roi: String,

    /// Frame rate used to derive per-frame timestamps.
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Optional JSON file with `TrackerParams` overrides.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info", value_parser = parse_log_level)]
    log_level: LevelFilter,
}

fn parse_log_level(s: &str) -> Result<LevelFilter, String> {
    s.parse::<LevelFilter>()
        .map_err(|_| format!("invalid log level '{s}'"))
}

#[derive(Serialize)]
struct OutputLine<'a> {
    frame: usize,
    time_ms: f64,
    tracked: bool,
    confidence: f32,
    matches: usize,
    inliers: usize,
    rotation_rad: Option<f32>,
    center: Option<[f32; 2]>,
    shape: Option<&'a str>,
    similarity: Option<f64>,
    visible: bool,
    state: Option<char>,
    transition: Option<String>,
}

fn parse_roi(spec: &str) -> Result<CircularRoi, String> {
    let parts: Vec<f32> = spec
        .split(',')
        .map(|s| s.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("bad roi spec '{spec}': {e}"))?;
    if parts.len() != 3 {
        return Err(format!("roi spec '{spec}' must be cx,cy,r"));
    }
    Ok(CircularRoi::new(
        "cli-roi",
        Point2::new(parts[0], parts[1]),
        parts[2],
        0.0,
    ))
}

fn load_params(path: Option<&PathBuf>) -> Result<TrackerParams, String> {
    let Some(path) = path else {
        return Ok(TrackerParams::default());
    };
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))
}

fn frame_paths(dir: &PathBuf) -> Result<Vec<PathBuf>, String> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| format!("{}: {e}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("png" | "jpg" | "jpeg" | "bmp")
            )
        })
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err(format!("no frame images in {}", dir.display()));
    }
    Ok(paths)
}

fn print_update(frame: usize, time_ms: f64, update: &FrameUpdate) {
    let shape_name;
    let line = OutputLine {
        frame,
        time_ms,
        tracked: update.tracking.is_tracked,
        confidence: update.tracking.confidence,
        matches: update.tracking.match_count,
        inliers: update.tracking.inlier_count,
        rotation_rad: update.tracking.rotation,
        center: update.tracking.center.map(|c| [c.x, c.y]),
        shape: match &update.shape {
            Some(s) => {
                shape_name = s.description.shape.to_string();
                Some(shape_name.as_str())
            }
            None => None,
        },
        similarity: update.shape.as_ref().map(|s| s.similarity),
        visible: update.visibility.is_visible,
        state: update.transition.as_ref().map(|t| t.code),
        transition: update
            .transition
            .as_ref()
            .map(|t| format!("{} -> {}", t.prev, t.next)),
    };
    match serde_json::to_string(&line) {
        Ok(json) => println!("{json}"),
        Err(err) => log::warn!("frame {frame}: serialization failed: {err}"),
    }
}

fn main() -> Result<(), String> {
    let args = Args::parse();
    let _ = init_with_level(args.log_level);

    let roi = parse_roi(&args.roi)?;
    let params = load_params(args.params.as_ref())?;
    let paths = frame_paths(&args.frames)?;

    let mut pipeline = RoiTrackerPipeline::new(params);
    pipeline.set_roi(roi);

    let frame_interval_ms = 1000.0 / args.fps.max(1.0);

    for (idx, path) in paths.iter().enumerate() {
        let time_ms = idx as f64 * frame_interval_ms;
        let frame = image::ImageReader::open(path)
            .map_err(|e| format!("{}: {e}", path.display()))?
            .decode()
            .map_err(|e| format!("{}: {e}", path.display()))?
            .to_rgba8();

        match process_image(&mut pipeline, &frame, time_ms) {
            Some(update) => {
                if let Some(tr) = &update.transition {
                    log::info!(
                        "frame {idx}: marker '{}' {} -> {}",
                        tr.marker_id,
                        tr.prev,
                        tr.next
                    );
                }
                print_update(idx, time_ms, &update);
            }
            None => log::debug!("frame {idx}: skipped"),
        }
    }

    Ok(())
}
