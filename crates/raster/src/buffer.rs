//! Typed sample buffers, one per band.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-sample data type of a raster band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleType {
    U8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl SampleType {
    pub fn bits(&self) -> u32 {
        match self {
            SampleType::U8 => 8,
            SampleType::U16 | SampleType::I16 => 16,
            SampleType::U32 | SampleType::I32 | SampleType::F32 => 32,
            SampleType::F64 => 64,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SampleType::U8 => "Byte",
            SampleType::U16 => "UInt16",
            SampleType::I16 => "Int16",
            SampleType::U32 => "UInt32",
            SampleType::I32 => "Int32",
            SampleType::F32 => "Float32",
            SampleType::F64 => "Float64",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw samples of one band in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl SampleBuffer {
    /// Zero-filled buffer of the given type.
    pub fn zeroed(sample_type: SampleType, len: usize) -> Self {
        match sample_type {
            SampleType::U8 => SampleBuffer::U8(vec![0; len]),
            SampleType::U16 => SampleBuffer::U16(vec![0; len]),
            SampleType::I16 => SampleBuffer::I16(vec![0; len]),
            SampleType::U32 => SampleBuffer::U32(vec![0; len]),
            SampleType::I32 => SampleBuffer::I32(vec![0; len]),
            SampleType::F32 => SampleBuffer::F32(vec![0.0; len]),
            SampleType::F64 => SampleBuffer::F64(vec![0.0; len]),
        }
    }

    pub fn sample_type(&self) -> SampleType {
        match self {
            SampleBuffer::U8(_) => SampleType::U8,
            SampleBuffer::U16(_) => SampleType::U16,
            SampleBuffer::I16(_) => SampleType::I16,
            SampleBuffer::U32(_) => SampleType::U32,
            SampleBuffer::I32(_) => SampleType::I32,
            SampleBuffer::F32(_) => SampleType::F32,
            SampleBuffer::F64(_) => SampleType::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::U8(v) => v.len(),
            SampleBuffer::U16(v) => v.len(),
            SampleBuffer::I16(v) => v.len(),
            SampleBuffer::U32(v) => v.len(),
            SampleBuffer::I32(v) => v.len(),
            SampleBuffer::F32(v) => v.len(),
            SampleBuffer::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at `index` widened to f64.
    #[inline]
    pub fn get_f64(&self, index: usize) -> f64 {
        match self {
            SampleBuffer::U8(v) => v[index] as f64,
            SampleBuffer::U16(v) => v[index] as f64,
            SampleBuffer::I16(v) => v[index] as f64,
            SampleBuffer::U32(v) => v[index] as f64,
            SampleBuffer::I32(v) => v[index] as f64,
            SampleBuffer::F32(v) => v[index] as f64,
            SampleBuffer::F64(v) => v[index],
        }
    }

    /// Store `value` at `index`, rounding and saturating to the buffer's type.
    #[inline]
    pub fn set_f64(&mut self, index: usize, value: f64) {
        // `as` casts from float saturate and map NaN to zero
        let rounded = value.round();
        match self {
            SampleBuffer::U8(v) => v[index] = rounded as u8,
            SampleBuffer::U16(v) => v[index] = rounded as u16,
            SampleBuffer::I16(v) => v[index] = rounded as i16,
            SampleBuffer::U32(v) => v[index] = rounded as u32,
            SampleBuffer::I32(v) => v[index] = rounded as i32,
            SampleBuffer::F32(v) => v[index] = value as f32,
            SampleBuffer::F64(v) => v[index] = value,
        }
    }

    /// Minimum and maximum sample values, ignoring NaN.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for i in 0..self.len() {
            let v = self.get_f64(i);
            if v.is_nan() {
                continue;
            }
            range = Some(match range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
        range
    }
}
