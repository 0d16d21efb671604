//! Sample types and rasters.
//!
//! The storage type of a raster is a closed set, so it is an enum:
//! - Exhaustive matching catches a missing type at compile time
//! - The type is selected once per tile, then a generic kernel runs
//!   monomorphized over the concrete sample type
//! - No per-pixel virtual dispatch

use crate::core::error::{ConfigError, ConfigResult};
use crate::core::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage type of raster samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    /// Unsigned 8-bit.
    U8,
    /// Unsigned 16-bit.
    U16,
    /// Signed 16-bit.
    I16,
    /// Signed 32-bit.
    I32,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
}

impl SampleType {
    /// Size of one sample in bytes.
    pub fn size_bytes(&self) -> usize {
        match self {
            SampleType::U8 => 1,
            SampleType::U16 | SampleType::I16 => 2,
            SampleType::I32 | SampleType::F32 => 4,
            SampleType::F64 => 8,
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleType::U8 => "u8",
            SampleType::U16 => "u16",
            SampleType::I16 => "i16",
            SampleType::I32 => "i32",
            SampleType::F32 => "f32",
            SampleType::F64 => "f64",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SampleType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "u8" | "byte" => Ok(SampleType::U8),
            "u16" | "ushort" => Ok(SampleType::U16),
            "i16" | "short" => Ok(SampleType::I16),
            "i32" | "int" => Ok(SampleType::I32),
            "f32" | "float" => Ok(SampleType::F32),
            "f64" | "double" => Ok(SampleType::F64),
            _ => Err(ConfigError::UnsupportedSampleType(s.to_string())),
        }
    }
}

/// A sample type the resampling kernels can run on.
pub trait Sample: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The matching storage tag.
    const TYPE: SampleType;

    /// Widen to `f64`.
    fn to_f64(self) -> f64;

    /// Narrow from an interpolated `f64`.
    ///
    /// Integer types round half away from zero and saturate at the type
    /// range; NaN becomes zero.
    fn from_f64(value: f64) -> Self;

    /// Borrow the samples if `data` stores this type.
    fn slice(data: &RasterData) -> Option<&[Self]>;

    /// Mutably borrow the samples if `data` stores this type.
    fn slice_mut(data: &mut RasterData) -> Option<&mut [Self]>;

    /// Wrap a vector of this type.
    fn wrap(values: Vec<Self>) -> RasterData;
}

macro_rules! impl_sample {
    ($ty:ty, $variant:ident, $narrow:expr) => {
        impl Sample for $ty {
            const TYPE: SampleType = SampleType::$variant;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                let narrow: fn(f64) -> $ty = $narrow;
                narrow(value)
            }

            fn slice(data: &RasterData) -> Option<&[Self]> {
                match data {
                    RasterData::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn slice_mut(data: &mut RasterData) -> Option<&mut [Self]> {
                match data {
                    RasterData::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }

            fn wrap(values: Vec<Self>) -> RasterData {
                RasterData::$variant(values)
            }
        }
    };
}

// `as` from f64 saturates and maps NaN to zero.
impl_sample!(u8, U8, |v| v.round() as u8);
impl_sample!(u16, U16, |v| v.round() as u16);
impl_sample!(i16, I16, |v| v.round() as i16);
impl_sample!(i32, I32, |v| v.round() as i32);
impl_sample!(f32, F32, |v| v as f32);
impl_sample!(f64, F64, |v| v);

/// Pixel-interleaved sample storage.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterData {
    /// `u8` samples.
    U8(Vec<u8>),
    /// `u16` samples.
    U16(Vec<u16>),
    /// `i16` samples.
    I16(Vec<i16>),
    /// `i32` samples.
    I32(Vec<i32>),
    /// `f32` samples.
    F32(Vec<f32>),
    /// `f64` samples.
    F64(Vec<f64>),
}

/// Apply an expression to the typed vector inside a [`RasterData`].
macro_rules! with_data {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            RasterData::U8($v) => $body,
            RasterData::U16($v) => $body,
            RasterData::I16($v) => $body,
            RasterData::I32($v) => $body,
            RasterData::F32($v) => $body,
            RasterData::F64($v) => $body,
        }
    };
}

impl RasterData {
    /// Storage type tag.
    pub fn sample_type(&self) -> SampleType {
        match self {
            RasterData::U8(_) => SampleType::U8,
            RasterData::U16(_) => SampleType::U16,
            RasterData::I16(_) => SampleType::I16,
            RasterData::I32(_) => SampleType::I32,
            RasterData::F32(_) => SampleType::F32,
            RasterData::F64(_) => SampleType::F64,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        with_data!(self, v => v.len())
    }

    /// Check if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage of `pixels` pixels, each band set to its fill value.
    fn filled(sample_type: SampleType, pixels: usize, fill: &[f64]) -> Self {
        fn build<T: Sample>(pixels: usize, fill: &[f64]) -> RasterData {
            let pixel: Vec<T> = fill.iter().map(|&v| T::from_f64(v)).collect();
            let mut values = Vec::with_capacity(pixels * pixel.len());
            for _ in 0..pixels {
                values.extend_from_slice(&pixel);
            }
            T::wrap(values)
        }

        match sample_type {
            SampleType::U8 => build::<u8>(pixels, fill),
            SampleType::U16 => build::<u16>(pixels, fill),
            SampleType::I16 => build::<i16>(pixels, fill),
            SampleType::I32 => build::<i32>(pixels, fill),
            SampleType::F32 => build::<f32>(pixels, fill),
            SampleType::F64 => build::<f64>(pixels, fill),
        }
    }
}

/// A rectangle of pixel-interleaved samples positioned in image space.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    rect: Rect,
    bands: usize,
    data: RasterData,
}

impl Raster {
    /// Create a raster with every pixel set to `fill` (one value per band).
    pub fn filled(rect: Rect, sample_type: SampleType, fill: &[f64]) -> Self {
        let bands = fill.len().max(1);
        let fill = if fill.is_empty() { &[0.0][..] } else { fill };
        Self {
            rect,
            bands,
            data: RasterData::filled(sample_type, rect.area() as usize, fill),
        }
    }

    /// Wrap a typed sample vector.
    pub fn from_vec<T: Sample>(rect: Rect, bands: usize, values: Vec<T>) -> ConfigResult<Self> {
        let expected = rect.area() as usize * bands;
        if values.len() != expected || bands == 0 {
            return Err(ConfigError::BufferSize {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            rect,
            bands,
            data: T::wrap(values),
        })
    }

    /// Build a raster by evaluating `f(x, y, band)` for every sample.
    pub fn from_fn<T, F>(rect: Rect, bands: usize, mut f: F) -> Self
    where
        T: Sample,
        F: FnMut(i64, i64, usize) -> T,
    {
        let bands = bands.max(1);
        let mut values = Vec::with_capacity(rect.area() as usize * bands);
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                for b in 0..bands {
                    values.push(f(x, y, b));
                }
            }
        }
        Self {
            rect,
            bands,
            data: T::wrap(values),
        }
    }

    /// Rectangle covered by this raster.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Number of bands.
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Storage type.
    pub fn sample_type(&self) -> SampleType {
        self.data.sample_type()
    }

    /// Typed storage.
    pub fn data(&self) -> &RasterData {
        &self.data
    }

    /// Mutable typed storage.
    pub fn data_mut(&mut self) -> &mut RasterData {
        &mut self.data
    }

    /// Borrow the samples as `T`, if that is the storage type.
    pub fn as_slice<T: Sample>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    /// Sample at an image-space position, widened to `f64`.
    ///
    /// Returns `None` outside the raster.
    pub fn get(&self, x: i64, y: i64, band: usize) -> Option<f64> {
        if !self.rect.contains_point(x, y) || band >= self.bands {
            return None;
        }
        let index = self.rect.offset_of(x, y) * self.bands + band;
        Some(with_data!(&self.data, v => v[index].to_f64()))
    }

    /// Copy of the samples inside `region` (clipped to this raster).
    pub fn crop(&self, region: Rect) -> Raster {
        let region = region.intersect(&self.rect);
        let bands = self.bands;
        let src_rect = self.rect;

        fn copy<T: Sample>(src: &[T], src_rect: Rect, region: Rect, bands: usize) -> RasterData {
            let mut out = Vec::with_capacity(region.area() as usize * bands);
            for y in region.y..region.bottom() {
                let start = src_rect.offset_of(region.x, y) * bands;
                out.extend_from_slice(&src[start..start + region.width as usize * bands]);
            }
            T::wrap(out)
        }

        let data = with_data!(&self.data, v => copy(v, src_rect, region, bands));
        Raster {
            rect: region,
            bands,
            data,
        }
    }

    /// Copy the overlapping part of `other` into this raster.
    ///
    /// Rasters of a different storage type or band count are ignored and
    /// `false` is returned.
    pub fn paste(&mut self, other: &Raster) -> bool {
        if other.sample_type() != self.sample_type() || other.bands != self.bands {
            return false;
        }
        let region = other.rect.intersect(&self.rect);
        let bands = self.bands;
        let (dst_rect, src_rect) = (self.rect, other.rect);

        fn copy<T: Sample>(dst: &mut [T], dst_rect: Rect, src: &RasterData, src_rect: Rect, region: Rect, bands: usize) {
            let Some(src) = T::slice(src) else {
                return;
            };
            let row = region.width as usize * bands;
            for y in region.y..region.bottom() {
                let d = dst_rect.offset_of(region.x, y) * bands;
                let s = src_rect.offset_of(region.x, y) * bands;
                dst[d..d + row].copy_from_slice(&src[s..s + row]);
            }
        }

        with_data!(&mut self.data, v => copy(v, dst_rect, &other.data, src_rect, region, bands));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_type_parse() {
        assert_eq!("u8".parse::<SampleType>().unwrap(), SampleType::U8);
        assert_eq!("Double".parse::<SampleType>().unwrap(), SampleType::F64);
        assert!(matches!(
            "bit".parse::<SampleType>(),
            Err(ConfigError::UnsupportedSampleType(_))
        ));
        assert_eq!(SampleType::I16.to_string(), "i16");
        assert_eq!(SampleType::F32.size_bytes(), 4);
    }

    #[test]
    fn test_integer_narrowing_rounds_and_saturates() {
        assert_eq!(u8::from_f64(2.5), 3);
        assert_eq!(u8::from_f64(-3.0), 0);
        assert_eq!(u8::from_f64(300.0), 255);
        assert_eq!(u8::from_f64(f64::NAN), 0);
        assert_eq!(i16::from_f64(-2.5), -3);
        assert_eq!(i32::from_f64(1e12), i32::MAX);
        assert_eq!(f32::from_f64(0.25), 0.25);
    }

    #[test]
    fn test_filled_raster() {
        let raster = Raster::filled(Rect::new(-2, 0, 3, 2), SampleType::I16, &[7.0, -1.0]);
        assert_eq!(raster.bands(), 2);
        assert_eq!(raster.data().len(), 12);
        assert_eq!(raster.get(-2, 0, 0), Some(7.0));
        assert_eq!(raster.get(0, 1, 1), Some(-1.0));
        assert_eq!(raster.get(1, 1, 0), None);
    }

    #[test]
    fn test_from_vec_checks_length() {
        let ok = Raster::from_vec(Rect::new(0, 0, 2, 2), 1, vec![1u8, 2, 3, 4]);
        assert!(ok.is_ok());
        let err = Raster::from_vec(Rect::new(0, 0, 2, 2), 1, vec![1u8, 2, 3]);
        assert!(matches!(err, Err(ConfigError::BufferSize { expected: 4, actual: 3 })));
    }

    #[test]
    fn test_crop_and_paste() {
        let raster = Raster::from_fn(Rect::new(0, 0, 4, 4), 1, |x, y, _| (y * 4 + x) as u16);
        let crop = raster.crop(Rect::new(1, 1, 2, 5));
        assert_eq!(crop.rect(), Rect::new(1, 1, 2, 3));
        assert_eq!(crop.as_slice::<u16>().unwrap(), &[5, 6, 9, 10, 13, 14]);

        let mut target = Raster::filled(Rect::new(0, 0, 4, 4), SampleType::U16, &[0.0]);
        assert!(target.paste(&crop));
        assert_eq!(target.get(2, 3, 0), Some(14.0));
        assert_eq!(target.get(0, 0, 0), Some(0.0));

        let other = Raster::filled(Rect::new(0, 0, 1, 1), SampleType::U8, &[1.0]);
        assert!(!target.paste(&other));
    }
}
