//! The raw image container.
//!
//! Layout, all header fields little-endian:
//!
//! | field        | type          |
//! |--------------|---------------|
//! | magic        | `b"YRAW"`     |
//! | version      | `u16`         |
//! | scalar kind  | `u8` code     |
//! | layout       | `u8` code     |
//! | color space  | `u8` code     |
//! | byte order   | `u8`, 0 little / 1 big, of the pixel data |
//! | dimension    | `u8`          |
//! | size         | `i64` x dimension |
//!
//! followed by the pixel buffer in block order.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use binrw::{binrw, BinRead, BinWrite};

use crate::coordinate::{checked_total_number_of_points, Coordinate, MAX_DIMENSION};
use crate::errors::{ImageError, Result};
use crate::image::{create, ColorSpace, ImageInterface};
use crate::pixel::{CompoundKind, ScalarKind, TypeDescriptor};

pub const RAW_FORMAT_VERSION : u16 = 1;

const HOST_BYTE_ORDER : u8 = if cfg!(target_endian = "little") { 0 } else { 1 };

#[binrw]
#[brw(little, magic = b"YRAW")]
#[derive(Debug, PartialEq)]
struct RawHeader {
    version : u16,
    scalar : u8,
    compound : u8,
    color_space : u8,
    byte_order : u8,
    #[bw(try_calc = u8::try_from(size.len()))]
    dimension : u8,
    #[br(count = dimension)]
    size : Vec<i64>,
}

impl RawHeader {
    fn describe(image : &dyn ImageInterface) -> RawHeader {
        let descriptor = image.dynamic_type();
        RawHeader {
            version : RAW_FORMAT_VERSION,
            scalar : descriptor.scalar.code(),
            compound : descriptor.compound.code(),
            color_space : image.color_space().code(),
            byte_order : HOST_BYTE_ORDER,
            size : image.size().as_slice().to_vec(),
        }
    }

    fn descriptor(&self) -> Result<TypeDescriptor> {
        let scalar = ScalarKind::from_code(self.scalar).ok_or_else(|| ImageError::FormatError(
            format!("Unknown scalar kind code {}", self.scalar)
        ))?;
        let compound = CompoundKind::from_code(self.compound).ok_or_else(|| ImageError::FormatError(
            format!("Unknown pixel layout code {}", self.compound)
        ))?;
        Ok(TypeDescriptor::new(scalar, compound))
    }

    fn validate(&self) -> Result<()> {
        if self.version != RAW_FORMAT_VERSION {
            return Err(ImageError::FormatError(format!(
                "Unsupported raw format version {} (expected {})", self.version, RAW_FORMAT_VERSION
            )));
        }
        if self.byte_order != HOST_BYTE_ORDER {
            return Err(ImageError::FormatError(
                "Pixel data byte order differs from this machine's".to_string()
            ));
        }
        if self.size.is_empty() || self.size.len() > MAX_DIMENSION {
            return Err(ImageError::FormatError(format!(
                "Invalid dimension {}", self.size.len()
            )));
        }
        Ok(())
    }
}

/// Writes `image` to `writer` as a raw container.
///
/// ## Errors
///
/// * `NotAllocated` if the image has no buffer
///
/// * `IOError` if the writer fails
pub fn write_raw<W : Write + Seek>(image : &dyn ImageInterface, writer : &mut W) -> Result<()> {
    if !image.is_allocated() {
        return Err(ImageError::NotAllocated);
    }
    RawHeader::describe(image).write(writer)?;
    writer.write_all(image.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Reads an image written by `write_raw`.
///
/// ## Errors
///
/// * `FormatError` on a wrong magic, version, byte order or code, or
/// when the stream holds fewer bytes than the declared buffer; nothing
/// is allocated in that case
///
/// * `UnsupportedType` if no image implements the stored type
///
/// * `IOError` if the reader fails
///
/// ## Example
///
/// ```
/// use std::io::Cursor;
/// use yayi_core::{create, Coordinate, TypeDescriptor};
/// use yayi_core::io::{read_raw, write_raw};
///
/// let mut image = create(TypeDescriptor::create("i16:scalar"), 2).unwrap();
/// image.set_size(Coordinate::from([3, 2])).unwrap();
/// image.allocate_image().unwrap();
///
/// let mut stream = Cursor::new(Vec::new());
/// write_raw(image.as_ref(), &mut stream).unwrap();
/// stream.set_position(0);
///
/// let back = read_raw(&mut stream).unwrap();
/// assert_eq!(back.size(), Coordinate::from([3, 2]));
/// assert_eq!(back.dynamic_type(), image.dynamic_type());
/// ```
pub fn read_raw<R : Read + Seek>(reader : &mut R) -> Result<Box<dyn ImageInterface>> {
    let header = RawHeader::read(reader)?;
    header.validate()?;
    let descriptor = header.descriptor()?;

    let mut image = create(descriptor, header.size.len())?;
    image.set_size(Coordinate::try_from_slice(&header.size)?)
        .map_err(|err| ImageError::FormatError(format!("Invalid stored size: {}", err)))?;
    image.set_color_space(ColorSpace::from_code(header.color_space).unwrap_or_default());

    let expected = checked_total_number_of_points(&image.size()).ok()
        .and_then(|points| points.checked_mul(image.pixel_size()))
        .and_then(|bytes| u64::try_from(bytes).ok())
        .ok_or_else(|| ImageError::FormatError(format!(
            "Stored size {} exceeds any addressable buffer", image.size()
        )))?;
    let available = remaining_bytes(reader)?;
    if available < expected {
        return Err(ImageError::FormatError(format!(
            "Stream holds {} bytes of pixel data, size {} needs {}", available, image.size(), expected
        )));
    }

    image.allocate_image()?;
    reader.read_exact(image.as_bytes_mut())?;

    log::debug!("Read a raw image of type {} and size {}", descriptor, image.size());
    Ok(image)
}

fn remaining_bytes<R : Seek>(reader : &mut R) -> Result<u64> {
    let here = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(here))?;
    Ok(end.saturating_sub(here))
}

/// `write_raw` into a new file at `path`.
pub fn save_raw<P : AsRef<Path>>(image : &dyn ImageInterface, path : P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_raw(image, &mut writer)
}

/// `read_raw` from the file at `path`.
pub fn load_raw<P : AsRef<Path>>(path : P) -> Result<Box<dyn ImageInterface>> {
    let mut reader = BufReader::new(File::open(path)?);
    read_raw(&mut reader)
}
