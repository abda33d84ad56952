//! Synthetic band generators.
//!
//! Every generator returns samples in row-major order and produces the same
//! values on every call, so tests can check exact pixels.

/// Horizontal 8-bit ramp: column 0 is 0, the last column is 255.
///
/// ```
/// use test_utils::gradient_u8;
///
/// let band = gradient_u8(3, 2);
/// assert_eq!(band, vec![0, 128, 255, 0, 128, 255]);
/// ```
pub fn gradient_u8(width: usize, height: usize) -> Vec<u8> {
    let denom = width.saturating_sub(1).max(1) as f64;
    (0..height)
        .flat_map(|_| (0..width).map(move |col| ((col as f64 / denom) * 255.0).round() as u8))
        .collect()
}

/// Vertical 16-bit ramp spanning the full `u16` range.
pub fn gradient_u16(width: usize, height: usize) -> Vec<u16> {
    let denom = height.saturating_sub(1).max(1) as f64;
    (0..height)
        .flat_map(|row| {
            let v = ((row as f64 / denom) * 65535.0).round() as u16;
            std::iter::repeat(v).take(width)
        })
        .collect()
}

/// Identifies each cell: `col * 1000 + row`.
pub fn cell_id_i32(width: usize, height: usize) -> Vec<i32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as i32);
        }
    }
    data
}

/// Alternating `low`/`high` squares of `cell` pixels.
pub fn checkerboard_u8(width: usize, height: usize, cell: usize, low: u8, high: u8) -> Vec<u8> {
    let cell = cell.max(1);
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(if (row / cell + col / cell) % 2 == 0 { low } else { high });
        }
    }
    data
}

/// Palette indices cycling through `0..colors`.
pub fn index_pattern(width: usize, height: usize, colors: u8) -> Vec<u8> {
    let colors = colors.max(1) as usize;
    (0..width * height).map(|i| (i % colors) as u8).collect()
}

/// Interleave equally sized bands into chunky pixel order.
pub fn interleave<T: Copy>(bands: &[Vec<T>]) -> Vec<T> {
    let Some(first) = bands.first() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(first.len() * bands.len());
    for i in 0..first.len() {
        for band in bands {
            out.push(band[i]);
        }
    }
    out
}
