//! Just enough TIFF to tell which way up a drawing is.
//!
//! Reads the 8-byte header, jumps to the first image file directory and pulls
//! out `ImageWidth` (256) and `ImageLength` (257). Nothing else in the file is
//! touched, which matters when the file sits on a slow network share.

pub mod error;

use crate::error::{ErrorKind, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use exn::ResultExt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
/// Sanity cap; real drawings have a couple of dozen entries.
const MAX_DIRECTORY_ENTRIES: u16 = 4096;

/// Result of an orientation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
    /// Square, or the header could not be read. Treated as acceptable.
    Indeterminate,
}
impl Orientation {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        match width.cmp(&height) {
            std::cmp::Ordering::Greater => Orientation::Landscape,
            std::cmp::Ordering::Less => Orientation::Portrait,
            std::cmp::Ordering::Equal => Orientation::Indeterminate,
        }
    }

    /// Drawings are archived landscape; anything else was scanned sideways.
    pub fn is_acceptable(&self) -> bool {
        !matches!(self, Orientation::Portrait)
    }
}

/// Pixel dimensions from the first image directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Reads the dimensions of the first image in a TIFF stream.
pub fn read_dimensions<R: Read + Seek>(mut reader: R) -> Result<Dimensions> {
    let mut mark = [0u8; 2];
    reader.read_exact(&mut mark).or_raise(|| ErrorKind::Io)?;
    match &mark {
        b"II" => read_directory::<LittleEndian, _>(reader),
        b"MM" => read_directory::<BigEndian, _>(reader),
        _ => exn::bail!(ErrorKind::NotTiff),
    }
}

fn read_directory<B: ByteOrder, R: Read + Seek>(mut reader: R) -> Result<Dimensions> {
    if reader.read_u16::<B>().or_raise(|| ErrorKind::Io)? != 42 {
        // 43 would be BigTIFF, which no plotter we care about produces.
        exn::bail!(ErrorKind::NotTiff);
    }
    let offset = reader.read_u32::<B>().or_raise(|| ErrorKind::Io)?;
    reader.seek(SeekFrom::Start(u64::from(offset))).or_raise(|| ErrorKind::Io)?;
    let entries = reader.read_u16::<B>().or_raise(|| ErrorKind::Io)?.min(MAX_DIRECTORY_ENTRIES);

    let mut width = None;
    let mut height = None;
    for index in 0..entries {
        let entry_at = u64::from(offset) + 2 + u64::from(index) * 12;
        reader.seek(SeekFrom::Start(entry_at)).or_raise(|| ErrorKind::Io)?;
        let tag = reader.read_u16::<B>().or_raise(|| ErrorKind::Io)?;
        if tag != TAG_IMAGE_WIDTH && tag != TAG_IMAGE_LENGTH {
            continue;
        }
        let value = read_entry_value::<B, _>(&mut reader)?;
        if tag == TAG_IMAGE_WIDTH {
            width = Some(value);
        } else {
            height = Some(value);
        }
        if let (Some(width), Some(height)) = (width, height) {
            return Ok(Dimensions { width, height });
        }
    }
    exn::bail!(ErrorKind::MissingDimensions)
}

/// Reads the first value of a directory entry, positioned just after its tag.
///
/// Values that fit in the 4-byte value field are stored inline (left-aligned);
/// larger ones live at the offset stored there instead.
fn read_entry_value<B: ByteOrder, R: Read + Seek>(reader: &mut R) -> Result<u32> {
    let field_type = reader.read_u16::<B>().or_raise(|| ErrorKind::Io)?;
    let count = reader.read_u32::<B>().or_raise(|| ErrorKind::Io)?;
    let size: u64 = match field_type {
        TYPE_SHORT => 2,
        TYPE_LONG => 4,
        other => exn::bail!(ErrorKind::UnsupportedFieldType(other)),
    };
    if u64::from(count) * size > 4 {
        let pointer = reader.read_u32::<B>().or_raise(|| ErrorKind::Io)?;
        reader.seek(SeekFrom::Start(u64::from(pointer))).or_raise(|| ErrorKind::Io)?;
    }
    Ok(match field_type {
        TYPE_SHORT => u32::from(reader.read_u16::<B>().or_raise(|| ErrorKind::Io)?),
        _ => reader.read_u32::<B>().or_raise(|| ErrorKind::Io)?,
    })
}

/// Checks the orientation of the TIFF at `path`.
///
/// Never fails: an unreadable or odd header resolves to
/// [`Orientation::Indeterminate`].
pub fn orientation(path: impl AsRef<Path>) -> Orientation {
    let path = path.as_ref();
    let dimensions = File::open(path).or_raise(|| ErrorKind::Io).and_then(|f| read_dimensions(BufReader::new(f)));
    match dimensions {
        Ok(Dimensions { width, height }) => {
            tracing::debug!(path = %path.display(), width, height, "Read TIFF dimensions");
            Orientation::from_dimensions(width, height)
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = ?e, "Could not read TIFF header; accepting orientation");
            Orientation::Indeterminate
        },
    }
}
