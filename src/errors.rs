//! Result kinds for every structural operation on an image.
//!
//! Pixel-level accessors do not go through this channel: they
//! assert (see `access_check!`) instead of returning a `Result`.

use thiserror::Error;

use crate::pixel::TypeDescriptor;

pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur while configuring, allocating,
/// locking or (de)serializing an image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Malformed arguments: non-positive axis, mismatched dimension,
    /// incompatible pixel conversion...
    #[error("Bad parameters: {0}")]
    BadParameters(String),

    /// A pixel or iterator was requested before `allocate_image`.
    #[error("Image is not allocated")]
    NotAllocated,

    /// The requested structural change needs an unallocated image.
    #[error("Image is already allocated")]
    AlreadyAllocated,

    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    #[error("Memory error: {0}")]
    MemoryError(String),

    /// No concrete image implements the requested descriptor.
    #[error("Unsupported pixel type: {0}")]
    UnsupportedType(TypeDescriptor),

    /// A read or write lock is held on the image.
    #[error("Image is locked")]
    Locked,

    #[error("IOError: {0}")]
    IOError(#[from] std::io::Error),

    /// The byte stream handed to a codec is not a valid image.
    #[error("FormatError: {0}")]
    FormatError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<binrw::Error> for ImageError {
    fn from(err : binrw::Error) -> Self {
        match err {
            binrw::Error::Io(io_err) => ImageError::IOError(io_err),
            binrw::Error::BadMagic { pos, .. } => {
                ImageError::FormatError(format!("Bad magic number at byte {}", pos))
            },
            other => ImageError::FormatError(other.to_string()),
        }
    }
}

impl From<ndarray::ShapeError> for ImageError {
    fn from(err : ndarray::ShapeError) -> Self {
        ImageError::BadParameters(format!("Buffer does not match the image size: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binrw_conversion() {
        let io_err = binrw::Error::Io(
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read")
        );
        assert!(matches!(ImageError::from(io_err), ImageError::IOError(_)));

        let magic_err = binrw::Error::BadMagic { pos : 0, found : Box::new(0u32) };
        assert!(matches!(ImageError::from(magic_err), ImageError::FormatError(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(ImageError::NotAllocated.to_string(), "Image is not allocated");
        assert_eq!(
            ImageError::BadParameters("axis 0 is 0".to_string()).to_string(),
            "Bad parameters: axis 0 is 0"
        );
    }
}
