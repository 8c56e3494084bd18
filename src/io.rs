//! Bulk readers and writers for images.
//!
//! Only the raw container lives here; it moves the buffer in one
//! copy through `ImageInterface::as_bytes` and rebuilds images with
//! `create`, the way any codec plugs into the container.

pub mod raw;

pub use raw::{load_raw, read_raw, save_raw, write_raw, RAW_FORMAT_VERSION};
