//! Boxed pixel values, used to move a pixel across the
//! type-erased image interface.

use std::fmt;

use itertools::Itertools;
use num_complex::Complex;

use crate::errors::Result;
use crate::pixel::{CompoundKind, PixelType, ScalarKind, TypeDescriptor};

/// One sample of any scalar kind, kind preserved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScalarValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::U8(_) => ScalarKind::U8,
            ScalarValue::I8(_) => ScalarKind::I8,
            ScalarValue::U16(_) => ScalarKind::U16,
            ScalarValue::I16(_) => ScalarKind::I16,
            ScalarValue::U32(_) => ScalarKind::U32,
            ScalarValue::I32(_) => ScalarKind::I32,
            ScalarValue::U64(_) => ScalarKind::U64,
            ScalarValue::I64(_) => ScalarKind::I64,
            ScalarValue::F32(_) => ScalarKind::F32,
            ScalarValue::F64(_) => ScalarKind::F64,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::U8(v) => write!(f, "{}", v),
            ScalarValue::I8(v) => write!(f, "{}", v),
            ScalarValue::U16(v) => write!(f, "{}", v),
            ScalarValue::I16(v) => write!(f, "{}", v),
            ScalarValue::U32(v) => write!(f, "{}", v),
            ScalarValue::I32(v) => write!(f, "{}", v),
            ScalarValue::U64(v) => write!(f, "{}", v),
            ScalarValue::I64(v) => write!(f, "{}", v),
            ScalarValue::F32(v) => write!(f, "{}", v),
            ScalarValue::F64(v) => write!(f, "{}", v),
        }
    }
}

/// `PixelValue` holds one pixel of any supported compound type.
///
/// Built with `PixelType::to_value` and read back with
/// `PixelType::from_value`, which converts between types when
/// the layouts are compatible (see `PixelType::from_value`).
///
/// ## Example
///
/// ```
/// use yayi_core::{PixelValue, PixelType, Pixel3};
///
/// let v = PixelValue::from_pixel(300u16);
/// assert_eq!(u8::from_value(&v).unwrap(), 300u16 as u8);
/// assert_eq!(Pixel3::<f32>::from_value(&v).unwrap(), Pixel3([300.0; 3]));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PixelValue {
    Scalar(ScalarValue),
    /// Channels share one scalar kind.
    Pixel3([ScalarValue; 3]),
    Pixel4([ScalarValue; 4]),
    Complex32(Complex<f32>),
    Complex64(Complex<f64>),
}

impl PixelValue {
    pub fn from_pixel<T : PixelType>(pixel : T) -> PixelValue {
        pixel.to_value()
    }

    /// Converts to a concrete pixel type.
    pub fn to_pixel<T : PixelType>(&self) -> Result<T> {
        T::from_value(self)
    }

    /// Descriptor of the pixel type this value was built from.
    pub fn dynamic_type(&self) -> TypeDescriptor {
        match self {
            PixelValue::Scalar(v) => TypeDescriptor::new(v.kind(), CompoundKind::Scalar),
            PixelValue::Pixel3(channels) => TypeDescriptor::new(channels[0].kind(), CompoundKind::Pixel3),
            PixelValue::Pixel4(channels) => TypeDescriptor::new(channels[0].kind(), CompoundKind::Pixel4),
            PixelValue::Complex32(_) => TypeDescriptor::new(ScalarKind::F32, CompoundKind::Complex),
            PixelValue::Complex64(_) => TypeDescriptor::new(ScalarKind::F64, CompoundKind::Complex),
        }
    }
}

impl fmt::Display for PixelValue {
    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelValue::Scalar(v) => write!(f, "{}", v),
            PixelValue::Pixel3(channels) => write!(f, "[{}]", channels.iter().join(", ")),
            PixelValue::Pixel4(channels) => write!(f, "[{}]", channels.iter().join(", ")),
            PixelValue::Complex32(c) => write!(f, "{}", c),
            PixelValue::Complex64(c) => write!(f, "{}", c),
        }
    }
}
