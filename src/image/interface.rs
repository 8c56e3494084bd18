//! The type-erased image interface and the `create` factory.
//!
//! `create` is the only place that enumerates the concrete
//! `(scalar kind x layout)` product. Callers holding a
//! `Box<dyn ImageInterface>` get back to the typed image with
//! `downcast_ref` / `downcast_mut`.

use std::any::Any;
use std::fmt::Debug;

use num_complex::Complex;

use crate::coordinate::Coordinate;
use crate::errors::{ImageError, Result};
use crate::image::{ColorSpace, Image, ReadLock, WriteLock};
use crate::pixel::{CompoundKind, Pixel3, Pixel4, PixelType, PixelValue, ScalarKind, TypeDescriptor};

/// Reference-like access to one pixel of a type-erased image.
pub trait PixelHandle {
    fn get(&self) -> PixelValue;

    /// Converts `value` to the image's pixel type and stores it.
    fn set(&mut self, value : &PixelValue) -> Result<()>;
}

struct TypedPixelHandle<'a, T : PixelType> {
    pixel : &'a mut T,
}

impl<'a, T : PixelType> PixelHandle for TypedPixelHandle<'a, T> {
    fn get(&self) -> PixelValue {
        self.pixel.to_value()
    }

    fn set(&mut self, value : &PixelValue) -> Result<()> {
        *self.pixel = T::from_value(value)?;
        Ok(())
    }
}

/// Operations every image supports regardless of its pixel type.
///
/// Pixel access through this interface is always checked and goes
/// through `PixelValue`; typed code should downcast and use the
/// `Image` accessors and iterators instead.
pub trait ImageInterface : Send + Sync + Debug {
    fn dimension(&self) -> usize;

    fn size(&self) -> Coordinate;

    fn set_size(&mut self, size : Coordinate) -> Result<()>;

    fn allocate_image(&mut self) -> Result<()>;

    fn free_image(&mut self) -> Result<()>;

    fn is_allocated(&self) -> bool;

    fn dynamic_type(&self) -> TypeDescriptor;

    /// Bytes per pixel.
    fn pixel_size(&self) -> usize;

    fn description(&self) -> String;

    fn color_space(&self) -> ColorSpace;

    fn set_color_space(&mut self, color_space : ColorSpace);

    /// Boxed copy of the pixel at `coord`.
    fn get_pixel(&self, coord : &Coordinate) -> Result<PixelValue>;

    /// Converts and stores `value` at `coord`.
    fn set_pixel(&mut self, coord : &Coordinate, value : &PixelValue) -> Result<()>;

    /// A handle on the pixel at `coord`, for read-modify-write.
    fn pixel_handle(&mut self, coord : &Coordinate) -> Result<Box<dyn PixelHandle + '_>>;

    /// Every pixel in buffer order.
    fn pixel_values(&self) -> Result<Box<dyn Iterator<Item = PixelValue> + '_>>;

    fn can_read_lock(&self) -> bool;

    fn can_write_lock(&self) -> bool;

    fn read_lock(&self) -> Result<ReadLock>;

    fn write_lock(&self) -> Result<WriteLock>;

    /// The buffer as raw bytes, empty while unallocated.
    fn as_bytes(&self) -> &[u8];

    fn as_bytes_mut(&mut self) -> &mut [u8];

    /// Takes the size of `other`, whatever its type; ends unallocated.
    fn set_same_as(&mut self, other : &dyn ImageInterface) -> Result<()>;

    /// O(1) exchange with an image of the same concrete type.
    /// Fails with `BadParameters` across types.
    fn swap_with(&mut self, other : &mut dyn ImageInterface) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn ImageInterface {
    /// The typed image behind the interface, if its pixel type is `T`.
    pub fn downcast_ref<T : PixelType>(&self) -> Option<&Image<T>> {
        self.as_any().downcast_ref::<Image<T>>()
    }

    pub fn downcast_mut<T : PixelType>(&mut self) -> Option<&mut Image<T>> {
        self.as_any_mut().downcast_mut::<Image<T>>()
    }
}

impl<T : PixelType> ImageInterface for Image<T> {
    fn dimension(&self) -> usize {
        Image::dimension(self)
    }

    fn size(&self) -> Coordinate {
        Image::size(self)
    }

    fn set_size(&mut self, size : Coordinate) -> Result<()> {
        Image::set_size(self, size)
    }

    fn allocate_image(&mut self) -> Result<()> {
        Image::allocate_image(self)
    }

    fn free_image(&mut self) -> Result<()> {
        Image::free_image(self)
    }

    fn pixel_size(&self) -> usize {
        std::mem::size_of::<T>()
    }

    fn is_allocated(&self) -> bool {
        Image::is_allocated(self)
    }

    fn dynamic_type(&self) -> TypeDescriptor {
        T::TYPE
    }

    fn description(&self) -> String {
        Image::description(self)
    }

    fn color_space(&self) -> ColorSpace {
        Image::color_space(self)
    }

    fn set_color_space(&mut self, color_space : ColorSpace) {
        Image::set_color_space(self, color_space)
    }

    fn get_pixel(&self, coord : &Coordinate) -> Result<PixelValue> {
        Ok(self.try_pixel_at(coord)?.to_value())
    }

    fn set_pixel(&mut self, coord : &Coordinate, value : &PixelValue) -> Result<()> {
        *self.try_pixel_at_mut(coord)? = T::from_value(value)?;
        Ok(())
    }

    fn pixel_handle(&mut self, coord : &Coordinate) -> Result<Box<dyn PixelHandle + '_>> {
        let pixel = self.try_pixel_at_mut(coord)?;
        Ok(Box::new(TypedPixelHandle { pixel }))
    }

    fn pixel_values(&self) -> Result<Box<dyn Iterator<Item = PixelValue> + '_>> {
        Ok(Box::new(self.begin_block()?.values().map(|pixel| pixel.to_value())))
    }

    fn can_read_lock(&self) -> bool {
        Image::can_read_lock(self)
    }

    fn can_write_lock(&self) -> bool {
        Image::can_write_lock(self)
    }

    fn read_lock(&self) -> Result<ReadLock> {
        Image::read_lock(self)
    }

    fn write_lock(&self) -> Result<WriteLock> {
        Image::write_lock(self)
    }

    fn as_bytes(&self) -> &[u8] {
        Image::as_bytes(self)
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        Image::as_bytes_mut(self)
    }

    fn set_same_as(&mut self, other : &dyn ImageInterface) -> Result<()> {
        self.set_same_size(other.size())
    }

    fn swap_with(&mut self, other : &mut dyn ImageInterface) -> Result<()> {
        let other_type = other.dynamic_type();
        match other.as_any_mut().downcast_mut::<Image<T>>() {
            Some(other) => self.swap(other),
            None => Err(ImageError::BadParameters(format!(
                "Cannot swap a {} image with a {} image", T::TYPE, other_type
            ))),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Lets `by_scalar!` treat plain scalars like the channel wrappers.
type Plain<S> = S;

fn boxed<T : PixelType>(dim : usize) -> Result<Box<dyn ImageInterface>> {
    Ok(Box::new(Image::<T>::new(dim)?))
}

macro_rules! by_scalar {
    ($descriptor : expr, $layout : ident, $dim : expr) => {
        match $descriptor.scalar {
            ScalarKind::U8 => boxed::<$layout<u8>>($dim),
            ScalarKind::I8 => boxed::<$layout<i8>>($dim),
            ScalarKind::U16 => boxed::<$layout<u16>>($dim),
            ScalarKind::I16 => boxed::<$layout<i16>>($dim),
            ScalarKind::U32 => boxed::<$layout<u32>>($dim),
            ScalarKind::I32 => boxed::<$layout<i32>>($dim),
            ScalarKind::U64 => boxed::<$layout<u64>>($dim),
            ScalarKind::I64 => boxed::<$layout<i64>>($dim),
            ScalarKind::F32 => boxed::<$layout<f32>>($dim),
            ScalarKind::F64 => boxed::<$layout<f64>>($dim),
            ScalarKind::Undefined => Err(ImageError::UnsupportedType($descriptor)),
        }
    };
}

/// Allocates a new, unsized and unallocated image of the concrete
/// type matching `descriptor`.
///
/// ## Arguments
///
/// * `descriptor` - Runtime pixel type of the image
///
/// * `dim` - Number of axes, `1..=MAX_DIMENSION`
///
/// ## Errors
///
/// * `UnsupportedType` if no concrete image implements `descriptor`
///
/// * `BadParameters` if `dim` is out of range
///
/// ## Example
///
/// ```
/// use yayi_core::{create, Coordinate, TypeDescriptor, PixelValue};
///
/// let mut image = create(TypeDescriptor::create("u16:pixel3"), 2).unwrap();
/// image.set_size(Coordinate::from([4, 4])).unwrap();
/// image.allocate_image().unwrap();
/// image.set_pixel(&Coordinate::from([1, 1]), &PixelValue::from_pixel(5u8)).unwrap();
/// assert_eq!(image.get_pixel(&Coordinate::from([1, 1])).unwrap().to_string(), "[5, 5, 5]");
/// ```
pub fn create(descriptor : TypeDescriptor, dim : usize) -> Result<Box<dyn ImageInterface>> {
    log::debug!("Creating an image of type {} and dimension {}", descriptor, dim);
    let image = match descriptor.compound {
        CompoundKind::Scalar => by_scalar!(descriptor, Plain, dim),
        CompoundKind::Pixel3 => by_scalar!(descriptor, Pixel3, dim),
        CompoundKind::Pixel4 => by_scalar!(descriptor, Pixel4, dim),
        CompoundKind::Complex => match descriptor.scalar {
            ScalarKind::F32 => boxed::<Complex<f32>>(dim),
            ScalarKind::F64 => boxed::<Complex<f64>>(dim),
            _ => Err(ImageError::UnsupportedType(descriptor)),
        },
        _ => Err(ImageError::UnsupportedType(descriptor)),
    };
    if let Err(err) = &image {
        log::warn!("Cannot create an image of type {}: {}", descriptor, err);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported() -> impl Iterator<Item = TypeDescriptor> {
        TypeDescriptor::all().filter(|t| match t.compound {
            CompoundKind::Scalar | CompoundKind::Pixel3 | CompoundKind::Pixel4 => {
                t.scalar != ScalarKind::Undefined
            },
            CompoundKind::Complex => matches!(t.scalar, ScalarKind::F32 | ScalarKind::F64),
            _ => false,
        })
    }

    #[test]
    fn test_create_every_supported_type() {
        let mut count = 0;
        for t in supported() {
            let image = create(t, 2).unwrap();
            assert_eq!(image.dynamic_type(), t);
            assert_eq!(image.dimension(), 2);
            assert!(!image.is_allocated());
            count += 1;
        }
        assert_eq!(count, 32);
    }

    #[test]
    fn test_create_unsupported() {
        for text in ["u8:complex", "i32:complex", "u8:vector", "undefined", "f32:undefined"] {
            let t = TypeDescriptor::create(text);
            assert!(matches!(create(t, 2), Err(ImageError::UnsupportedType(_))), "created {}", text);
        }
        assert!(matches!(create(u8::TYPE, 0), Err(ImageError::BadParameters(_))));
    }

    #[test]
    fn test_downcast() {
        let mut image = create(f32::TYPE, 1).unwrap();
        assert!(image.downcast_ref::<u8>().is_none());
        let typed = image.downcast_mut::<f32>().unwrap();
        typed.set_size(Coordinate::from([3])).unwrap();
        typed.allocate_image().unwrap();
        typed.as_mut_slice().copy_from_slice(&[0.5, 1.5, 2.5]);

        let values : Vec<String> = image.pixel_values().unwrap().map(|v| v.to_string()).collect();
        assert_eq!(values, vec!["0.5", "1.5", "2.5"]);
    }

    #[test]
    fn test_pixel_handle() {
        let mut image = create(Pixel4::<u8>::TYPE, 2).unwrap();
        image.set_size(Coordinate::from([2, 2])).unwrap();
        assert!(matches!(image.get_pixel(&Coordinate::from([0, 0])), Err(ImageError::NotAllocated)));
        image.allocate_image().unwrap();

        let at = Coordinate::from([1, 0]);
        {
            let mut handle = image.pixel_handle(&at).unwrap();
            handle.set(&PixelValue::from_pixel(Pixel4([1u16, 2, 3, 300]))).unwrap();
            assert_eq!(handle.get().to_pixel::<Pixel4<u8>>().unwrap(), Pixel4([1, 2, 3, 44]));
            assert!(handle.set(&PixelValue::from_pixel(Complex::new(1.0f32, 0.0))).is_err());
        }
        assert!(matches!(image.pixel_handle(&Coordinate::from([2, 0])), Err(ImageError::OutOfBounds(_))));
        assert_eq!(&image.as_bytes()[4..8], &[1, 2, 3, 44]);
    }

    #[test]
    fn test_swap_and_set_same_across_interface() {
        let mut a = create(u8::TYPE, 2).unwrap();
        a.set_size(Coordinate::from([3, 3])).unwrap();
        a.allocate_image().unwrap();
        let mut b = create(u8::TYPE, 2).unwrap();
        let mut c = create(i16::TYPE, 2).unwrap();

        a.swap_with(b.as_mut()).unwrap();
        assert!(b.is_allocated());
        assert!(!a.is_allocated());
        assert!(matches!(b.swap_with(c.as_mut()), Err(ImageError::BadParameters(_))));

        c.set_same_as(b.as_ref()).unwrap();
        assert_eq!(c.size(), Coordinate::from([3, 3]));
        assert!(!c.is_allocated());
    }
}
