//! `yayi_core`
//!
//! Generic N-dimensional image container: coordinates, the closed
//! set of pixel types and their runtime descriptors, the typed
//! `Image` with its block and window iterators, a type-erased
//! `ImageInterface` built by `create`, per-image locks, a parallel
//! window dispatcher and a raw codec.

pub mod coordinate;
pub mod errors;
pub mod image;
pub mod io;
pub mod pixel;
mod utils;

pub use coordinate::{
    from_coordinate_to_offset,
    from_offset_to_coordinate,
    total_number_of_points,
    Coordinate,
    MAX_DIMENSION,
};
pub use errors::{ImageError, Result};
pub use image::{
    create,
    ColorSpace,
    Cursor,
    Image,
    ImageInterface,
    PixelHandle,
    Window,
};
pub use pixel::{
    CompoundKind,
    Pixel3,
    Pixel4,
    PixelType,
    PixelValue,
    Scalar,
    ScalarKind,
    ScalarValue,
    TypeDescriptor,
};
pub use utils::{ParallelConfig, WindowDispatcher};

/// `create_image(type_name, size)` builds an allocated image
/// from the text form of its pixel type.
///
/// ## Arguments
///
/// * `type_name` - Canonical pixel type text, e.g. `"u8:scalar"`
///
/// * `size` - Size of the image, every axis `> 0`
///
/// ## Example
///
/// ```
/// use yayi_core::{create_image, Coordinate};
///
/// let image = create_image("f64:complex", Coordinate::from([16, 16])).unwrap();
/// assert!(image.is_allocated());
/// assert_eq!(image.as_bytes().len(), 16 * 16 * 16);
/// ```
pub fn create_image(type_name : &str, size : Coordinate) -> Result<Box<dyn ImageInterface>> {
    let descriptor : TypeDescriptor = type_name.parse()?;
    let mut image = create(descriptor, size.dimension())?;
    image.set_size(size)?;
    image.allocate_image()?;
    Ok(image)
}
