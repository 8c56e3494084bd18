//! `Image`
//!
//! The concrete, statically typed N-dimensional image: one
//! contiguous row-major buffer (axis 0 fastest) of
//! `total_number_of_points(size)` pixels, plus its size, colour
//! space tag and lock.
//!
//! Structural operations return a `Result`. Pixel accessors follow
//! the two-tier policy of `access_check!`.

mod interface;
mod iterator;
mod lock;
mod window;

pub use interface::{create, ImageInterface, PixelHandle};
pub use iterator::{
    BlockCursor,
    BlockIter,
    BlockIterMut,
    Cursor,
    PixelIter,
    PixelIterMut,
    Values,
    WindowCursor,
    WindowIter,
    WindowIterMut,
};
pub use lock::{LockState, LockStatus, ReadLock, WriteLock};
pub use window::Window;

use std::fmt;

use ndarray::{ArrayViewD, ArrayViewMutD, IxDyn, Slice};

use crate::coordinate::{
    checked_total_number_of_points,
    from_coordinate_to_offset,
    is_point_inside,
    Coordinate,
    MAX_DIMENSION,
};
use crate::errors::{ImageError, Result};
use crate::pixel::{PixelType, TypeDescriptor};
use crate::utils::access_check;

/// Colour space tag carried by an image. Purely descriptive:
/// nothing in the container converts between spaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    #[default]
    Undefined,
    Grey,
    Rgb,
    Hls,
    Yuv,
    Lab,
    Xyz,
}

impl ColorSpace {
    pub const ALL : [ColorSpace; 7] = [
        ColorSpace::Undefined, ColorSpace::Grey, ColorSpace::Rgb, ColorSpace::Hls,
        ColorSpace::Yuv, ColorSpace::Lab, ColorSpace::Xyz,
    ];

    /// Stable on-disk code, used by the raw codec.
    pub fn code(&self) -> u8 {
        Self::ALL.iter().position(|space| space == self).unwrap_or(0) as u8
    }

    pub fn from_code(code : u8) -> Option<ColorSpace> {
        Self::ALL.get(code as usize).copied()
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorSpace::Undefined => "undefined",
            ColorSpace::Grey => "grey",
            ColorSpace::Rgb => "rgb",
            ColorSpace::Hls => "hls",
            ColorSpace::Yuv => "yuv",
            ColorSpace::Lab => "lab",
            ColorSpace::Xyz => "xyz",
        };
        write!(f, "{}", name)
    }
}

/// An N-dimensional image of pixels of type `T`.
///
/// The dimension is fixed at construction. The size can be set
/// while the image is unallocated, and the buffer is then
/// allocated once with `allocate_image`.
///
/// ## Example
///
/// ```
/// use yayi_core::{Coordinate, Image};
///
/// let mut image = Image::<u8>::new(2).unwrap();
/// image.set_size(Coordinate::from([10, 20])).unwrap();
/// image.allocate_image().unwrap();
///
/// *image.pixel_at_mut(&Coordinate::from([3, 1])) = 42;
/// assert_eq!(*image.pixel(13), 42);
/// ```
#[derive(Debug)]
pub struct Image<T : PixelType> {
    size : Coordinate,
    pixels : Option<Vec<T>>,
    color_space : ColorSpace,
    locks : LockState,
}

impl<T : PixelType> Image<T> {
    /// An unallocated image of `dim` axes with no size yet.
    pub fn new(dim : usize) -> Result<Image<T>> {
        if dim == 0 || dim > MAX_DIMENSION {
            return Err(ImageError::BadParameters(format!(
                "Image dimension must be in 1..={}, got {}", MAX_DIMENSION, dim
            )));
        }
        Ok(Image {
            size : Coordinate::new(dim),
            pixels : None,
            color_space : ColorSpace::default(),
            locks : LockState::new(),
        })
    }

    /// An unallocated image of size `size`.
    pub fn with_size(size : Coordinate) -> Result<Image<T>> {
        let mut image = Image::new(size.dimension())?;
        image.set_size(size)?;
        Ok(image)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.size.dimension()
    }

    /// Configured size, all zeros until `set_size` succeeds.
    #[inline]
    pub fn size(&self) -> Coordinate {
        self.size
    }

    /// ## Arguments
    ///
    /// * `size` - New size, same dimension as the image, every axis `> 0`
    ///
    /// ## Errors
    ///
    /// * `BadParameters` on a non-positive axis or a dimension mismatch
    ///
    /// * `AlreadyAllocated` if the buffer exists, even when `size`
    /// equals the current size (free the image first)
    pub fn set_size(&mut self, size : Coordinate) -> Result<()> {
        if size.dimension() != self.dimension() {
            return Err(ImageError::BadParameters(format!(
                "Size {} does not match the image dimension {}", size, self.dimension()
            )));
        }
        if let Some((axis, extent)) = size.iter().enumerate().find(|(_, &v)| v <= 0) {
            return Err(ImageError::BadParameters(format!(
                "Axis {} of size {} is {}, sizes must be strictly positive", axis, size, extent
            )));
        }
        if self.is_allocated() {
            log::warn!("Refusing to resize an allocated image of size {} to {}", self.size, size);
            return Err(ImageError::AlreadyAllocated);
        }
        self.size = size;
        Ok(())
    }

    /// Allocates exactly `total_number_of_points(size)` pixels,
    /// initialized to `T::default()`.
    ///
    /// ## Errors
    ///
    /// * `BadParameters` if the size was never set
    ///
    /// * `AlreadyAllocated` if the buffer already exists
    ///
    /// * `MemoryError` if the buffer cannot be reserved; the image
    /// stays unallocated
    pub fn allocate_image(&mut self) -> Result<()> {
        if self.is_allocated() {
            return Err(ImageError::AlreadyAllocated);
        }
        let count = checked_total_number_of_points(&self.size).map_err(|err| match err {
            ImageError::BadParameters(_) => ImageError::BadParameters(
                format!("Cannot allocate an image whose size {} is not set", self.size)
            ),
            other => other,
        })?;
        let mut buffer : Vec<T> = Vec::new();
        buffer.try_reserve_exact(count).map_err(|err| {
            log::warn!("Allocation of {} pixels failed: {}", count, err);
            ImageError::MemoryError(format!(
                "Cannot allocate {} pixels of type {}: {}", count, T::TYPE, err
            ))
        })?;
        buffer.resize(count, T::default());
        log::debug!(
            "Allocated {} pixels of type {} for size {}", count, T::TYPE, self.size
        );
        self.pixels = Some(buffer);
        Ok(())
    }

    /// Releases the buffer, keeping the size. A no-op on an
    /// unallocated image.
    ///
    /// ## Errors
    ///
    /// * `Locked` while any lock is held on the image
    pub fn free_image(&mut self) -> Result<()> {
        if !self.is_allocated() {
            return Ok(());
        }
        if !self.locks.can_write_lock() {
            log::warn!("Refusing to free a locked image of size {}", self.size);
            return Err(ImageError::Locked);
        }
        self.pixels = None;
        log::debug!("Freed image of size {}", self.size);
        Ok(())
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.pixels.is_some()
    }

    pub fn dynamic_type(&self) -> TypeDescriptor {
        T::TYPE
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn set_color_space(&mut self, color_space : ColorSpace) {
        self.color_space = color_space;
    }

    /// Human-readable summary, for logs and error messages.
    pub fn description(&self) -> String {
        format!(
            "Image\n\ttype: {}\n\tdimension: {}\n\tsize: {}\n\tcolor space: {}\n\t{}\n",
            T::TYPE,
            self.dimension(),
            self.size,
            self.color_space,
            if self.is_allocated() { "allocated" } else { "non allocated" },
        )
    }

    /// Exchanges size, buffer and colour space with `other` in O(1).
    ///
    /// ## Errors
    ///
    /// * `Locked` if either image holds a lock
    pub fn swap(&mut self, other : &mut Image<T>) -> Result<()> {
        if !self.locks.can_write_lock() || !other.locks.can_write_lock() {
            log::warn!("Refusing to swap locked images");
            return Err(ImageError::Locked);
        }
        std::mem::swap(&mut self.size, &mut other.size);
        std::mem::swap(&mut self.pixels, &mut other.pixels);
        std::mem::swap(&mut self.color_space, &mut other.color_space);
        log::debug!("Swapped images of sizes {} and {}", self.size, other.size);
        Ok(())
    }

    /// Gives this image the size of `other`, whatever its pixel type.
    /// The image ends up unallocated.
    pub fn set_same<U : PixelType>(&mut self, other : &Image<U>) -> Result<()> {
        self.set_same_size(other.size())
    }

    pub (crate) fn set_same_size(&mut self, size : Coordinate) -> Result<()> {
        if size.dimension() != self.dimension() {
            return Err(ImageError::BadParameters(format!(
                "Cannot copy size {} into an image of dimension {}", size, self.dimension()
            )));
        }
        self.free_image()?;
        self.set_size(size)
    }

    /// The buffer, empty while unallocated.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.pixels.as_deref().unwrap_or(&[])
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.pixels.as_deref_mut().unwrap_or(&mut [])
    }

    /// The buffer as raw bytes, for codecs.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(self.as_mut_slice())
    }

    /// Pixel at a buffer offset.
    #[inline]
    pub fn pixel(&self, offset : usize) -> &T {
        access_check!(self.is_allocated(), "Pixel access on an unallocated image");
        &self.as_slice()[offset]
    }

    #[inline]
    pub fn pixel_mut(&mut self, offset : usize) -> &mut T {
        access_check!(self.is_allocated(), "Pixel access on an unallocated image");
        &mut self.as_mut_slice()[offset]
    }

    /// Pixel at a position. The position is checked axis by axis
    /// only in checked builds.
    #[inline]
    pub fn pixel_at(&self, coord : &Coordinate) -> &T {
        access_check!(
            is_point_inside(&self.size, coord),
            "Pixel {} outside of image of size {}", coord, self.size
        );
        self.pixel(from_coordinate_to_offset(&self.size, coord) as usize)
    }

    #[inline]
    pub fn pixel_at_mut(&mut self, coord : &Coordinate) -> &mut T {
        access_check!(
            is_point_inside(&self.size, coord),
            "Pixel {} outside of image of size {}", coord, self.size
        );
        let offset = from_coordinate_to_offset(&self.size, coord) as usize;
        self.pixel_mut(offset)
    }

    /// ## Safety
    ///
    /// The image must be allocated and `offset` must be smaller than
    /// the number of pixels.
    #[inline]
    pub unsafe fn pixel_unchecked(&self, offset : usize) -> &T {
        self.as_slice().get_unchecked(offset)
    }

    /// ## Safety
    ///
    /// Same contract as `pixel_unchecked`.
    #[inline]
    pub unsafe fn pixel_unchecked_mut(&mut self, offset : usize) -> &mut T {
        self.as_mut_slice().get_unchecked_mut(offset)
    }

    /// Pixel at a position, always checked.
    pub fn try_pixel_at(&self, coord : &Coordinate) -> Result<&T> {
        let offset = self.checked_offset(coord)?;
        Ok(&self.as_slice()[offset])
    }

    pub fn try_pixel_at_mut(&mut self, coord : &Coordinate) -> Result<&mut T> {
        let offset = self.checked_offset(coord)?;
        Ok(&mut self.as_mut_slice()[offset])
    }

    fn checked_offset(&self, coord : &Coordinate) -> Result<usize> {
        if !self.is_allocated() {
            return Err(ImageError::NotAllocated);
        }
        if !is_point_inside(&self.size, coord) {
            return Err(ImageError::OutOfBounds(format!(
                "Pixel {} outside of image of size {}", coord, self.size
            )));
        }
        Ok(from_coordinate_to_offset(&self.size, coord) as usize)
    }

    fn require_allocated(&self) -> Result<()> {
        if !self.is_allocated() {
            return Err(ImageError::NotAllocated);
        }
        Ok(())
    }

    pub (crate) fn clipped(&self, window : &Window) -> Result<Window> {
        if window.dimension() != self.dimension() {
            return Err(ImageError::BadParameters(format!(
                "Window of dimension {} on an image of dimension {}",
                window.dimension(), self.dimension()
            )));
        }
        Ok(window.clip_to(&self.size))
    }

    fn block_cursor(&self, offset : i64) -> BlockCursor {
        BlockCursor::new(self.size, self.as_slice().len() as i64, offset)
    }

    fn window_cursor(&self, window : &Window, at_end : bool) -> Result<WindowCursor> {
        self.require_allocated()?;
        let mut cursor = WindowCursor::new(&self.size, &self.clipped(window)?);
        if at_end {
            cursor.seek(cursor.len());
        }
        Ok(cursor)
    }

    /// First pixel of the whole buffer.
    pub fn begin_block(&self) -> Result<BlockIter<'_, T>> {
        self.require_allocated()?;
        Ok(PixelIter::new(self.as_slice(), self.block_cursor(0)))
    }

    /// One past the last pixel of the whole buffer.
    pub fn end_block(&self) -> Result<BlockIter<'_, T>> {
        self.require_allocated()?;
        Ok(PixelIter::new(self.as_slice(), self.block_cursor(self.as_slice().len() as i64)))
    }

    pub fn begin_block_mut(&mut self) -> Result<BlockIterMut<'_, T>> {
        self.require_allocated()?;
        let cursor = self.block_cursor(0);
        Ok(PixelIterMut::new(self.as_mut_slice(), cursor))
    }

    /// First pixel of `window` clipped to the image.
    ///
    /// ## Errors
    ///
    /// * `NotAllocated` on an unallocated image
    ///
    /// * `BadParameters` if the window dimension differs from the image's
    pub fn begin_window(&self, window : &Window) -> Result<WindowIter<'_, T>> {
        let cursor = self.window_cursor(window, false)?;
        Ok(PixelIter::new(self.as_slice(), cursor))
    }

    /// End sentinel of `window` clipped to the image.
    pub fn end_window(&self, window : &Window) -> Result<WindowIter<'_, T>> {
        let cursor = self.window_cursor(window, true)?;
        Ok(PixelIter::new(self.as_slice(), cursor))
    }

    pub fn begin_window_mut(&mut self, window : &Window) -> Result<WindowIterMut<'_, T>> {
        let cursor = self.window_cursor(window, false)?;
        Ok(PixelIterMut::new(self.as_mut_slice(), cursor))
    }

    fn ndarray_shape(&self) -> IxDyn {
        IxDyn(&self.size.iter().rev().map(|&v| v as usize).collect::<Vec<_>>())
    }

    /// The buffer as an `ndarray` view. Axes are reversed: the
    /// view's last axis is the image's axis 0.
    pub fn view(&self) -> Result<ArrayViewD<'_, T>> {
        self.require_allocated()?;
        Ok(ArrayViewD::from_shape(self.ndarray_shape(), self.as_slice())?)
    }

    pub fn view_mut(&mut self) -> Result<ArrayViewMutD<'_, T>> {
        self.require_allocated()?;
        let shape = self.ndarray_shape();
        Ok(ArrayViewMutD::from_shape(shape, self.as_mut_slice())?)
    }

    /// Every pixel of `window` clipped to the image, in window order.
    pub fn window_pixels_mut(&mut self, window : &Window)
    -> Result<impl Iterator<Item = &mut T>> {
        let clipped = self.clipped(window)?;
        let dim = self.dimension();
        let mut view = self.view_mut()?;
        view.slice_each_axis_inplace(|axis| {
            let image_axis = dim - 1 - axis.axis.index();
            let start = clipped.origin()[image_axis] as isize;
            let end = start + clipped.extent()[image_axis] as isize;
            Slice::new(start, Some(end), 1)
        });
        Ok(view.into_iter())
    }

    pub fn lock_status(&self) -> LockStatus {
        self.locks.status()
    }

    pub fn can_read_lock(&self) -> bool {
        self.locks.can_read_lock()
    }

    pub fn can_write_lock(&self) -> bool {
        self.locks.can_write_lock()
    }

    pub fn read_lock(&self) -> Result<ReadLock> {
        self.locks.read_lock()
    }

    pub fn write_lock(&self) -> Result<WriteLock> {
        self.locks.write_lock()
    }
}
