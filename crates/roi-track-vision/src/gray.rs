use roi_track_core::{GrayImage, RgbaFrameView};

/// Convert a packed RGBA frame (or crop thereof) to 8-bit grayscale.
///
/// BT.601 integer weights; alpha is ignored. The crop rectangle is given in
/// frame pixels and must lie inside the frame.
pub fn rgba_to_gray(
    frame: &RgbaFrameView<'_>,
    x0: usize,
    y0: usize,
    width: usize,
    height: usize,
) -> Option<GrayImage> {
    if width == 0 || height == 0 || x0 + width > frame.width || y0 + height > frame.height {
        return None;
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        let src_row = (y0 + y) * frame.width;
        for x in 0..width {
            let i = (src_row + x0 + x) * 4;
            let r = frame.data[i] as u32;
            let g = frame.data[i + 1] as u32;
            let b = frame.data[i + 2] as u32;
            // y = 0.299 r + 0.587 g + 0.114 b, fixed-point
            let v = (77 * r + 150 * g + 29 * b) >> 8;
            out.data[y * width + x] = v as u8;
        }
    }
    Some(out)
}

/// Replace every pixel outside the inscribed circle with `fill`.
///
/// The circle is centered at (`cx`, `cy`) in patch pixels with radius `r`.
/// Keeps background clutter outside a circular ROI from contributing
/// contours or features.
pub fn apply_circular_mask(img: &mut GrayImage, cx: f32, cy: f32, r: f32, fill: u8) {
    let r2 = r * r;
    for y in 0..img.height {
        let dy = y as f32 + 0.5 - cy;
        for x in 0..img.width {
            let dx = x as f32 + 0.5 - cx;
            if dx * dx + dy * dy > r2 {
                img.data[y * img.width + x] = fill;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_rgba(width: usize, height: usize, rgba: [u8; 4]) -> Vec<u8> {
        rgba.iter()
            .copied()
            .cycle()
            .take(width * height * 4)
            .collect()
    }

    #[test]
    fn gray_conversion_weights_green_highest() {
        let w = 4;
        let h = 2;
        let red = solid_rgba(w, h, [255, 0, 0, 255]);
        let green = solid_rgba(w, h, [0, 255, 0, 255]);

        let rf = RgbaFrameView::new(w, h, &red).unwrap();
        let gf = RgbaFrameView::new(w, h, &green).unwrap();

        let rg = rgba_to_gray(&rf, 0, 0, w, h).unwrap();
        let gg = rgba_to_gray(&gf, 0, 0, w, h).unwrap();
        assert!(gg.data[0] > rg.data[0]);
    }

    #[test]
    fn out_of_bounds_crop_is_rejected() {
        let buf = solid_rgba(4, 4, [0, 0, 0, 255]);
        let frame = RgbaFrameView::new(4, 4, &buf).unwrap();
        assert!(rgba_to_gray(&frame, 2, 2, 4, 4).is_none());
        assert!(rgba_to_gray(&frame, 0, 0, 0, 4).is_none());
    }

    #[test]
    fn circular_mask_clears_corners_keeps_center() {
        let mut img = GrayImage {
            width: 9,
            height: 9,
            data: vec![100u8; 81],
        };
        apply_circular_mask(&mut img, 4.5, 4.5, 4.0, 255);
        assert_eq!(img.get(0, 0), 255);
        assert_eq!(img.get(8, 8), 255);
        assert_eq!(img.get(4, 4), 100);
    }
}
