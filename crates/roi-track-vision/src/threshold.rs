//! Global thresholding of grayscale patches.

use roi_track_core::GrayImageView;

/// Which side of the threshold counts as foreground.
///
/// The threshold is the last intensity of the dark class: dark foreground
/// is `v <= threshold`, light foreground `v > threshold`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolarity {
    /// Dark marker on a light background.
    DarkOnLight,
    /// Light marker on a dark background.
    LightOnDark,
}

/// Binary image; 1 = foreground, 0 = background. Row-major, len = w*h.
#[derive(Clone, Debug)]
pub struct BinaryImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl BinaryImage {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

/// Compute the Otsu threshold of a grayscale patch.
pub fn otsu_threshold(img: &GrayImageView<'_>) -> u8 {
    if img.data.is_empty() {
        return 127;
    }

    let mut min_v = 255u8;
    let mut max_v = 0u8;
    for &v in img.data {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v == max_v {
        return min_v;
    }

    let mut hist = [0u32; 256];
    for &v in img.data {
        hist[v as usize] += 1;
    }
    let nonzero_bins = hist.iter().filter(|&&h| h > 0).count();
    if nonzero_bins <= 2 {
        return ((min_v as u16 + max_v as u16) / 2) as u8;
    }

    let total = img.data.len() as f64;
    let mut sum_total = 0f64;
    for (i, &h) in hist.iter().enumerate() {
        sum_total += (i as f64) * (h as f64);
    }

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += (t as f64) * (h as f64);
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}

/// Binarize a patch against `threshold` with the given polarity.
pub fn binarize(img: &GrayImageView<'_>, threshold: u8, polarity: ThresholdPolarity) -> BinaryImage {
    let mut data = vec![0u8; img.width * img.height];
    for (dst, &v) in data.iter_mut().zip(img.data) {
        let fg = match polarity {
            ThresholdPolarity::DarkOnLight => v <= threshold,
            ThresholdPolarity::LightOnDark => v > threshold,
        };
        *dst = fg as u8;
    }
    BinaryImage {
        width: img.width,
        height: img.height,
        data,
    }
}
