use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, warn};

use crate::error::ReaderError;
use crate::format::FormatHint;
use crate::{converter, CONTAINER_MAGIC, FORMAT_VERSION};

/// Texture is streamed by the engine
pub const FORMAT_BIT_STREAM: u32 = 1 << 22;
/// Texture carries mipmaps
pub const FORMAT_BIT_HAS_MIPMAPS: u32 = 1 << 23;
/// Engine should re-import the texture when it is used in 3D
pub const FORMAT_BIT_DETECT_3D: u32 = 1 << 24;
/// Engine should re-import the texture when it is used as a normal map
pub const FORMAT_BIT_DETECT_NORMAL: u32 = 1 << 26;
/// Engine should re-import the texture when it is used as a roughness map
pub const FORMAT_BIT_DETECT_ROUGHNESS: u32 = 1 << 27;

/// Encoding of the image data following the header
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataFormat {
    /// Raw pixels in the engine's own layout
    Image,
    Png,
    Webp,
    BasisUniversal,
}

impl DataFormat {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Image),
            1 => Some(Self::Png),
            2 => Some(Self::Webp),
            3 => Some(Self::BasisUniversal),
            _ => None,
        }
    }

    /// Whether the data is a complete image file that can be written as is
    pub fn is_embedded_stream(self) -> bool {
        matches!(self, Self::Png | Self::Webp)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatFlags(pub u32);

impl FormatFlags {
    pub fn is_stream(self) -> bool {
        self.0 & FORMAT_BIT_STREAM != 0
    }

    pub fn has_mipmaps(self) -> bool {
        self.0 & FORMAT_BIT_HAS_MIPMAPS != 0
    }

    pub fn detect_3d(self) -> bool {
        self.0 & FORMAT_BIT_DETECT_3D != 0
    }

    pub fn detect_normal(self) -> bool {
        self.0 & FORMAT_BIT_DETECT_NORMAL != 0
    }

    pub fn detect_roughness(self) -> bool {
        self.0 & FORMAT_BIT_DETECT_ROUGHNESS != 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Container version
    pub version: u32,
    /// Texture width
    pub width: u32,
    /// Texture height
    pub height: u32,
    pub flags: FormatFlags,
    pub mipmap_limit: i32,
    pub data_format: DataFormat,
    /// Width of the stored image
    pub image_width: u16,
    /// Height of the stored image
    pub image_height: u16,
    /// Number of mipmaps stored after the base image
    pub mipmap_count: u32,
    /// Engine pixel format identifier
    pub pixel_format: u32,
}

/// Image stream embedded in a container
#[derive(Clone, Debug)]
pub struct ExtractedPayload<'a> {
    pub header: Header,
    /// Offset of the stream inside the container
    pub offset: usize,
    /// Stream bytes, starting at the stream's own magic
    pub bytes: &'a [u8],
    pub hint: FormatHint,
}

/// Locate the first embedded image stream of a container.
pub fn extract(bytes: &[u8]) -> Result<ExtractedPayload<'_>, ReaderError> {
    check_magic(bytes)?;

    let mut reader = FieldReader::new(bytes, CONTAINER_MAGIC.len());
    let header = read_header(&mut reader)?;
    debug!("container header: {header:?}");

    let (offset, payload) = read_first_stream(&mut reader)?;
    let hint = FormatHint::detect(payload);

    let expected = match header.data_format {
        DataFormat::Png => FormatHint::Png,
        _ => FormatHint::Webp,
    };
    if hint != expected {
        warn!(
            "{:?} container holds a payload detected as {hint:?}",
            header.data_format
        );
    }

    Ok(ExtractedPayload {
        header,
        offset,
        bytes: payload,
        hint,
    })
}

fn check_magic(bytes: &[u8]) -> Result<(), ReaderError> {
    match bytes.get(..CONTAINER_MAGIC.len()) {
        Some(magic) if magic == CONTAINER_MAGIC => Ok(()),
        received => Err(ReaderError::InvalidContainerFormat {
            received: received.unwrap_or(bytes).to_vec(),
        }),
    }
}

/// Walk the fields following the magic, up to the first stream length.
fn read_header(reader: &mut FieldReader<'_>) -> Result<Header, ReaderError> {
    let version = reader.u32("version")?;
    if version > FORMAT_VERSION {
        return Err(ReaderError::UnsupportedVersion {
            supported: FORMAT_VERSION,
            received: version,
        });
    }

    let width = reader.u32("width")?;
    let height = reader.u32("height")?;
    let flags = FormatFlags(reader.u32("format flags")?);
    let mipmap_limit = reader.i32("mipmap limit")?;
    for _ in 0..3 {
        reader.u32("reserved")?;
    }

    let data_format_raw = reader.u32("data format")?;
    let data_format = match DataFormat::from_raw(data_format_raw) {
        Some(format) if format.is_embedded_stream() => format,
        _ => {
            return Err(ReaderError::UnsupportedDataFormat {
                received: data_format_raw,
            })
        }
    };

    let image_width = reader.u16("image width")?;
    let image_height = reader.u16("image height")?;
    let mipmap_count = reader.u32("mipmap count")?;
    let pixel_format = reader.u32("pixel format")?;

    Ok(Header {
        version,
        width,
        height,
        flags,
        mipmap_limit,
        data_format,
        image_width,
        image_height,
        mipmap_count,
        pixel_format,
    })
}

/// The base image comes first; mipmap streams after it are not needed.
fn read_first_stream<'a>(reader: &mut FieldReader<'a>) -> Result<(usize, &'a [u8]), ReaderError> {
    let length = converter::u32_to_usize(reader.u32("stream length")?)?;
    if length == 0 {
        return Err(ReaderError::NoEmbeddedPayload);
    }

    let offset = reader.offset();
    let payload = reader.bytes(length, "stream data")?;
    Ok((offset, payload))
}

/// Sequential little-endian reader naming every field it consumes.
struct FieldReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> FieldReader<'a> {
    fn new(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn u16(&mut self, field: &'static str) -> Result<u16, ReaderError> {
        let value = self
            .remaining()
            .read_u16::<LittleEndian>()
            .map_err(|_| self.truncated(field))?;
        self.offset += 2;
        Ok(value)
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, ReaderError> {
        let value = self
            .remaining()
            .read_u32::<LittleEndian>()
            .map_err(|_| self.truncated(field))?;
        self.offset += 4;
        Ok(value)
    }

    fn i32(&mut self, field: &'static str) -> Result<i32, ReaderError> {
        let value = self
            .remaining()
            .read_i32::<LittleEndian>()
            .map_err(|_| self.truncated(field))?;
        self.offset += 4;
        Ok(value)
    }

    fn bytes(&mut self, length: usize, field: &'static str) -> Result<&'a [u8], ReaderError> {
        let end = converter::region_end(self.offset, length)?;
        let Some(data) = self.bytes.get(self.offset..end) else {
            return Err(self.truncated(field));
        };
        self.offset = end;
        Ok(data)
    }

    fn remaining(&self) -> &'a [u8] {
        self.bytes.get(self.offset..).unwrap_or_default()
    }

    fn truncated(&self, field: &'static str) -> ReaderError {
        ReaderError::TruncatedContainer {
            field,
            offset: self.offset,
            size: self.bytes.len(),
        }
    }
}
