//! `Pixel`
//!
//! The closed set of pixel types an image can hold: ten scalar
//! kinds crossed with the scalar, 3-channel and 4-channel
//! layouts, plus complex pixels over `f32` and `f64`.
//!
//! `PixelType` maps each concrete type to its runtime
//! `TypeDescriptor` and converts it to and from the boxed
//! `PixelValue`.

mod descriptor;
mod value;

pub use descriptor::{CompoundKind, ScalarKind, TypeDescriptor};
pub use value::{PixelValue, ScalarValue};

use std::fmt::Debug;

use bytemuck::{Pod, Zeroable};
use num_complex::Complex;

use crate::errors::{ImageError, Result};

/// Implemented by every type an `Image` can store.
///
/// `Pod` lets codecs view the buffer as plain bytes.
pub trait PixelType : Pod + Default + PartialEq + Debug + Send + Sync {
    /// Runtime descriptor of this compound type
    const TYPE : TypeDescriptor;

    /// Boxes the pixel
    fn to_value(self) -> PixelValue;

    /// Reads a boxed pixel, converting it when possible:
    ///
    /// * scalar kinds convert among themselves like an `as` cast
    /// * 3- and 4-channel pixels convert channel-wise with the same rule
    /// * a scalar fills every channel of a 3/4-channel pixel, or the
    /// real part of a complex pixel
    /// * complex converts to complex
    ///
    /// Any other pairing fails with `BadParameters`.
    fn from_value(value : &PixelValue) -> Result<Self>;
}

/// Scalar sample types.
pub trait Scalar : PixelType + PartialOrd {
    const KIND : ScalarKind;

    fn into_scalar_value(self) -> ScalarValue;

    fn from_scalar_value(value : ScalarValue) -> Self;
}

/// Three channels of the same scalar kind (e.g. RGB).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pixel3<S>(pub [S; 3]);

/// Four channels of the same scalar kind (e.g. RGBA).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pixel4<S>(pub [S; 4]);

// SAFETY: `repr(C)` wrappers around arrays of a `Pod` scalar have no padding.
unsafe impl<S : Pod> Zeroable for Pixel3<S> {}
unsafe impl<S : Pod> Pod for Pixel3<S> {}
unsafe impl<S : Pod> Zeroable for Pixel4<S> {}
unsafe impl<S : Pod> Pod for Pixel4<S> {}

fn incompatible(from : TypeDescriptor, to : TypeDescriptor) -> ImageError {
    ImageError::BadParameters(format!("Cannot convert a {} pixel into a {} pixel", from, to))
}

macro_rules! impl_scalar {
    ($t : ty, $kind : ident) => {
        impl Scalar for $t {
            const KIND : ScalarKind = ScalarKind::$kind;

            #[inline]
            fn into_scalar_value(self) -> ScalarValue {
                ScalarValue::$kind(self)
            }

            #[inline]
            fn from_scalar_value(value : ScalarValue) -> Self {
                match value {
                    ScalarValue::U8(v) => v as $t,
                    ScalarValue::I8(v) => v as $t,
                    ScalarValue::U16(v) => v as $t,
                    ScalarValue::I16(v) => v as $t,
                    ScalarValue::U32(v) => v as $t,
                    ScalarValue::I32(v) => v as $t,
                    ScalarValue::U64(v) => v as $t,
                    ScalarValue::I64(v) => v as $t,
                    ScalarValue::F32(v) => v as $t,
                    ScalarValue::F64(v) => v as $t,
                }
            }
        }

        impl PixelType for $t {
            const TYPE : TypeDescriptor = TypeDescriptor::scalar(ScalarKind::$kind);

            fn to_value(self) -> PixelValue {
                PixelValue::Scalar(self.into_scalar_value())
            }

            fn from_value(value : &PixelValue) -> Result<Self> {
                match value {
                    PixelValue::Scalar(v) => Ok(Self::from_scalar_value(*v)),
                    other => Err(incompatible(other.dynamic_type(), Self::TYPE)),
                }
            }
        }
    };
}

impl_scalar!(u8, U8);
impl_scalar!(i8, I8);
impl_scalar!(u16, U16);
impl_scalar!(i16, I16);
impl_scalar!(u32, U32);
impl_scalar!(i32, I32);
impl_scalar!(u64, U64);
impl_scalar!(i64, I64);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);

macro_rules! impl_multichannel {
    ($pixel : ident, $compound : ident, $channels : literal) => {
        impl<S : Scalar> PixelType for $pixel<S> {
            const TYPE : TypeDescriptor = TypeDescriptor::new(S::KIND, CompoundKind::$compound);

            fn to_value(self) -> PixelValue {
                PixelValue::$pixel(self.0.map(|channel| channel.into_scalar_value()))
            }

            fn from_value(value : &PixelValue) -> Result<Self> {
                match value {
                    PixelValue::$pixel(channels) => Ok($pixel(channels.map(S::from_scalar_value))),
                    PixelValue::Scalar(v) => {
                        Ok($pixel([S::from_scalar_value(*v); $channels]))
                    },
                    other => Err(incompatible(other.dynamic_type(), Self::TYPE)),
                }
            }
        }
    };
}

impl_multichannel!(Pixel3, Pixel3, 3);
impl_multichannel!(Pixel4, Pixel4, 4);

macro_rules! impl_complex {
    ($float : ty, $variant : ident) => {
        impl PixelType for Complex<$float> {
            const TYPE : TypeDescriptor = TypeDescriptor::new(<$float as Scalar>::KIND, CompoundKind::Complex);

            fn to_value(self) -> PixelValue {
                PixelValue::$variant(self)
            }

            fn from_value(value : &PixelValue) -> Result<Self> {
                match value {
                    PixelValue::Complex32(c) => Ok(Complex::new(c.re as $float, c.im as $float)),
                    PixelValue::Complex64(c) => Ok(Complex::new(c.re as $float, c.im as $float)),
                    PixelValue::Scalar(v) => Ok(Complex::new(<$float>::from_scalar_value(*v), 0.0)),
                    other => Err(incompatible(other.dynamic_type(), Self::TYPE)),
                }
            }
        }
    };
}

impl_complex!(f32, Complex32);
impl_complex!(f64, Complex64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_support() {
        assert_eq!(u8::TYPE.to_string(), "u8:scalar");
        assert_eq!(<Pixel3<i16>>::TYPE.to_string(), "i16:pixel3");
        assert_eq!(<Pixel4<f64>>::TYPE.to_string(), "f64:pixel4");
        assert_eq!(<Complex<f32>>::TYPE.to_string(), "f32:complex");
    }

    #[test]
    fn test_layout_sizes() {
        assert_eq!(std::mem::size_of::<Pixel3<u16>>(), 6);
        assert_eq!(std::mem::size_of::<Pixel4<f32>>(), 16);
        let px = [Pixel3([1u8, 2, 3]), Pixel3([4, 5, 6])];
        assert_eq!(bytemuck::cast_slice::<Pixel3<u8>, u8>(&px), &[1, 2, 3, 4, 5, 6]);
    }
}
