//! Region moments and Hu invariants.

/// Raw pixel moments of a labeled region, accumulated up to third order.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegionMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
    pub m30: f64,
    pub m21: f64,
    pub m12: f64,
    pub m03: f64,
}

impl RegionMoments {
    /// Accumulate one foreground pixel at (x, y).
    #[inline]
    pub fn push(&mut self, x: f64, y: f64) {
        let x2 = x * x;
        let y2 = y * y;
        self.m00 += 1.0;
        self.m10 += x;
        self.m01 += y;
        self.m20 += x2;
        self.m11 += x * y;
        self.m02 += y2;
        self.m30 += x2 * x;
        self.m21 += x2 * y;
        self.m12 += x * y2;
        self.m03 += y2 * y;
    }

    /// Region centroid; `None` for an empty region.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00 <= 0.0 {
            return None;
        }
        Some((self.m10 / self.m00, self.m01 / self.m00))
    }
}

/// The seven Hu moment invariants of a region.
///
/// Invariant to translation, scale and rotation; the seventh flips sign
/// under mirroring. Returns `None` for an empty region.
pub fn hu_moments(m: &RegionMoments) -> Option<[f64; 7]> {
    let (cx, cy) = m.centroid()?;

    // Central moments.
    let mu20 = m.m20 - cx * m.m10;
    let mu02 = m.m02 - cy * m.m01;
    let mu11 = m.m11 - cx * m.m01;
    let mu30 = m.m30 - 3.0 * cx * m.m20 + 2.0 * cx * cx * m.m10;
    let mu03 = m.m03 - 3.0 * cy * m.m02 + 2.0 * cy * cy * m.m01;
    let mu21 = m.m21 - 2.0 * cx * m.m11 - cy * m.m20 + 2.0 * cx * cx * m.m01;
    let mu12 = m.m12 - 2.0 * cy * m.m11 - cx * m.m02 + 2.0 * cy * cy * m.m10;

    // Scale-normalized central moments: eta_pq = mu_pq / m00^(1 + (p+q)/2).
    let n2 = m.m00 * m.m00;
    let n3 = n2 * m.m00.sqrt();
    let eta20 = mu20 / n2;
    let eta02 = mu02 / n2;
    let eta11 = mu11 / n2;
    let eta30 = mu30 / n3;
    let eta03 = mu03 / n3;
    let eta21 = mu21 / n3;
    let eta12 = mu12 / n3;

    let h1 = eta20 + eta02;
    let h2 = (eta20 - eta02).powi(2) + 4.0 * eta11 * eta11;
    let h3 = (eta30 - 3.0 * eta12).powi(2) + (3.0 * eta21 - eta03).powi(2);
    let h4 = (eta30 + eta12).powi(2) + (eta21 + eta03).powi(2);
    let h5 = (eta30 - 3.0 * eta12)
        * (eta30 + eta12)
        * ((eta30 + eta12).powi(2) - 3.0 * (eta21 + eta03).powi(2))
        + (3.0 * eta21 - eta03)
            * (eta21 + eta03)
            * (3.0 * (eta30 + eta12).powi(2) - (eta21 + eta03).powi(2));
    let h6 = (eta20 - eta02) * ((eta30 + eta12).powi(2) - (eta21 + eta03).powi(2))
        + 4.0 * eta11 * (eta30 + eta12) * (eta21 + eta03);
    let h7 = (3.0 * eta21 - eta03)
        * (eta30 + eta12)
        * ((eta30 + eta12).powi(2) - 3.0 * (eta21 + eta03).powi(2))
        - (eta30 - 3.0 * eta12)
            * (eta21 + eta03)
            * (3.0 * (eta30 + eta12).powi(2) - (eta21 + eta03).powi(2));

    Some([h1, h2, h3, h4, h5, h6, h7])
}
