//! Linear approximation for scanline projection.
//!
//! Instead of projecting every pixel, computes exact source coordinates at a few
//! points per scanline and linearly interpolates between them, recursively
//! subdividing when the interpolation error exceeds a tolerance.

/// Subdivision stops here even if the tolerance is not met.
const MAX_DEPTH: usize = 20;

/// Scanline projection approximator using recursive subdivision.
#[derive(Debug, Clone, Copy)]
pub struct LinearApprox {
    /// Maximum allowed interpolation error in source pixels.
    pub tolerance_px: f64,
}

impl Default for LinearApprox {
    fn default() -> Self {
        Self { tolerance_px: 0.2 }
    }
}

impl LinearApprox {
    pub fn new(tolerance_px: f64) -> Self {
        Self { tolerance_px }
    }

    /// Fill `out_x`/`out_y` with the source pixel coordinates of every pixel
    /// center on destination row `row`.
    ///
    /// `project` maps a destination pixel location to a source pixel location,
    /// returning `None` where the transform is undefined; such pixels come out
    /// as NaN. A zero tolerance projects every pixel exactly.
    pub fn transform_scanline<F>(&self, project: F, row: usize, out_x: &mut [f64], out_y: &mut [f64])
    where
        F: Fn(f64, f64) -> Option<(f64, f64)>,
    {
        let width = out_x.len().min(out_y.len());
        if width == 0 {
            return;
        }

        let row_f = row as f64 + 0.5; // pixel center
        let exact = |i: usize| project(i as f64 + 0.5, row_f);

        if self.tolerance_px <= 0.0 {
            for i in 0..width {
                write(out_x, out_y, i, exact(i));
            }
            return;
        }

        let left = exact(0);
        let right = exact(width - 1);
        self.subdivide(&exact, 0, width - 1, left, right, out_x, out_y, 0);
    }

    #[allow(clippy::too_many_arguments)]
    fn subdivide<F>(
        &self,
        exact: &F,
        left_idx: usize,
        right_idx: usize,
        left: Option<(f64, f64)>,
        right: Option<(f64, f64)>,
        out_x: &mut [f64],
        out_y: &mut [f64],
        depth: usize,
    ) where
        F: Fn(usize) -> Option<(f64, f64)>,
    {
        // Base case: adjacent or same pixel
        if right_idx <= left_idx + 1 {
            write(out_x, out_y, left_idx, left);
            write(out_x, out_y, right_idx, right);
            return;
        }

        let (Some((lx, ly)), Some((rx, ry))) = (left, right) else {
            // Undefined endpoint: no line to interpolate along
            for i in left_idx..=right_idx {
                write(out_x, out_y, i, exact(i));
            }
            return;
        };

        let mid_idx = (left_idx + right_idx) / 2;
        let mid = exact(mid_idx);

        let t = (mid_idx - left_idx) as f64 / (right_idx - left_idx) as f64;
        let err = match mid {
            Some((mx, my)) => {
                let ix = lx + t * (rx - lx);
                let iy = ly + t * (ry - ly);
                (mx - ix).abs().max((my - iy).abs())
            }
            None => f64::INFINITY,
        };

        if err > self.tolerance_px && depth < MAX_DEPTH {
            self.subdivide(exact, left_idx, mid_idx, left, mid, out_x, out_y, depth + 1);
            self.subdivide(exact, mid_idx, right_idx, mid, right, out_x, out_y, depth + 1);
        } else {
            // Linear interpolation is good enough for this segment
            for i in left_idx..=right_idx {
                let t = (i - left_idx) as f64 / (right_idx - left_idx) as f64;
                out_x[i] = lx + t * (rx - lx);
                out_y[i] = ly + t * (ry - ly);
            }
            write(out_x, out_y, mid_idx, mid);
        }
    }
}

#[inline]
fn write(out_x: &mut [f64], out_y: &mut [f64], i: usize, value: Option<(f64, f64)>) {
    let (x, y) = value.unwrap_or((f64::NAN, f64::NAN));
    out_x[i] = x;
    out_y[i] = y;
}
