//! Interpolation kernels for source sampling.
//!
//! Coordinates are continuous source pixel coordinates with the pixel corner
//! convention: pixel `(i, j)` covers `[i, i+1) x [j, j+1)` and its center
//! sits at `(i + 0.5, j + 0.5)`. A location outside `[0, width) x [0, height)`
//! has no value. Neighbors that fall off the raster edge are clamped.

use raster::SampleBuffer;

use crate::options::ResamplingMethod;

/// Sample `band` at `(x, y)` with the given kernel.
#[inline]
pub fn sample(
    band: &SampleBuffer,
    width: usize,
    height: usize,
    x: f64,
    y: f64,
    method: ResamplingMethod,
) -> Option<f64> {
    if !covers(width, height, x, y) {
        return None;
    }
    let v = match method {
        ResamplingMethod::Nearest => nearest_interpolate(band, width, x, y),
        ResamplingMethod::Bilinear => bilinear_interpolate(band, width, height, x, y),
        ResamplingMethod::Cubic => cubic_interpolate(band, width, height, x, y),
    };
    Some(v)
}

/// Whether `(x, y)` lies on the raster.
#[inline]
pub fn covers(width: usize, height: usize, x: f64, y: f64) -> bool {
    x >= 0.0 && y >= 0.0 && x < width as f64 && y < height as f64
}

/// Nearest neighbor: the value of the pixel containing the point.
pub fn nearest_interpolate(band: &SampleBuffer, width: usize, x: f64, y: f64) -> f64 {
    let col = x.floor() as usize;
    let row = y.floor() as usize;
    band.get_f64(row * width + col)
}

/// Bilinear interpolation between the four nearest pixel centers.
pub fn bilinear_interpolate(band: &SampleBuffer, width: usize, height: usize, x: f64, y: f64) -> f64 {
    let cx = x - 0.5;
    let cy = y - 0.5;
    let x0 = cx.floor();
    let y0 = cy.floor();
    let xf = cx - x0;
    let yf = cy - y0;

    let col = |i: f64| i.clamp(0.0, (width - 1) as f64) as usize;
    let row = |j: f64| j.clamp(0.0, (height - 1) as f64) as usize;
    let at = |i: f64, j: f64| band.get_f64(row(j) * width + col(i));

    let v00 = at(x0, y0);
    let v10 = at(x0 + 1.0, y0);
    let v01 = at(x0, y0 + 1.0);
    let v11 = at(x0 + 1.0, y0 + 1.0);

    // Handle NaN values - if any corner is NaN, return NaN
    if v00.is_nan() || v10.is_nan() || v01.is_nan() || v11.is_nan() {
        return f64::NAN;
    }

    let top = v00 * (1.0 - xf) + v10 * xf;
    let bottom = v01 * (1.0 - xf) + v11 * xf;
    top * (1.0 - yf) + bottom * yf
}

/// Bicubic interpolation over the surrounding 4x4 pixel centers.
pub fn cubic_interpolate(band: &SampleBuffer, width: usize, height: usize, x: f64, y: f64) -> f64 {
    let cx = x - 0.5;
    let cy = y - 0.5;
    let xi = cx.floor() as i64;
    let yi = cy.floor() as i64;
    let xf = cx - xi as f64;
    let yf = cy - yi as f64;

    let mut values = [[0.0f64; 4]; 4];
    for (j, row_values) in values.iter_mut().enumerate() {
        let py = (yi + j as i64 - 1).clamp(0, height as i64 - 1) as usize;
        for (i, value) in row_values.iter_mut().enumerate() {
            let px = (xi + i as i64 - 1).clamp(0, width as i64 - 1) as usize;
            *value = band.get_f64(py * width + px);

            // If any value is NaN, fall back to bilinear
            if value.is_nan() {
                return bilinear_interpolate(band, width, height, x, y);
            }
        }
    }

    let mut row_values = [0.0f64; 4];
    for (j, v) in values.iter().enumerate() {
        row_values[j] = cubic_1d(v[0], v[1], v[2], v[3], xf);
    }
    cubic_1d(row_values[0], row_values[1], row_values[2], row_values[3], yf)
}

/// 1D cubic interpolation using Catmull-Rom spline.
#[inline]
fn cubic_1d(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;

    let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
    let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let c = -0.5 * p0 + 0.5 * p2;
    let d = p1;

    a * t3 + b * t2 + c * t + d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid3() -> SampleBuffer {
        SampleBuffer::F64(vec![
            1.0, 2.0, 3.0, //
            4.0, 5.0, 6.0, //
            7.0, 8.0, 9.0,
        ])
    }

    #[test]
    fn test_nearest_uses_containing_pixel() {
        let band = grid3();
        assert_eq!(nearest_interpolate(&band, 3, 0.1, 0.9), 1.0);
        assert_eq!(nearest_interpolate(&band, 3, 1.5, 1.5), 5.0);
        assert_eq!(nearest_interpolate(&band, 3, 2.99, 0.0), 3.0);
    }

    #[test]
    fn test_all_kernels_hit_pixel_centers_exactly() {
        let band = grid3();
        for method in [
            ResamplingMethod::Nearest,
            ResamplingMethod::Bilinear,
            ResamplingMethod::Cubic,
        ] {
            for j in 0..3 {
                for i in 0..3 {
                    let v = sample(&band, 3, 3, i as f64 + 0.5, j as f64 + 0.5, method).unwrap();
                    assert!((v - band.get_f64(j * 3 + i)).abs() < 1e-12, "{} at ({}, {})", method, i, j);
                }
            }
        }
    }

    #[test]
    fn test_bilinear_midpoint() {
        let band = SampleBuffer::U8(vec![0, 100, 100, 200]);
        let v = bilinear_interpolate(&band, 2, 2, 1.0, 1.0);
        assert!((v - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_cubic_reproduces_linear_ramp() {
        // Catmull-Rom is exact on linear data away from the clamped edges
        let band = SampleBuffer::I32((0..8).map(|i| i * 10).collect());
        let v = cubic_interpolate(&band, 8, 1, 3.75, 0.5);
        assert!((v - 32.5).abs() < 1e-9);
    }

    #[test]
    fn test_outside_raster_has_no_value() {
        let band = grid3();
        assert!(sample(&band, 3, 3, -0.01, 1.0, ResamplingMethod::Nearest).is_none());
        assert!(sample(&band, 3, 3, 3.0, 1.0, ResamplingMethod::Cubic).is_none());
        assert!(sample(&band, 3, 3, 1.0, f64::NAN, ResamplingMethod::Bilinear).is_none());
    }

    #[test]
    fn test_bilinear_with_nan() {
        let band = SampleBuffer::F32(vec![1.0, f32::NAN, 3.0, 4.0]);
        assert!(bilinear_interpolate(&band, 2, 2, 1.0, 1.0).is_nan());
    }
}
