use core::ops::Range;

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use crate::converter;
use crate::error::{ConverterError, ScanError};
use crate::format::is_riff_webp;

/// Size of the RIFF chunk header (tag and size) not counted by the size field
const RIFF_HEADER_SIZE: usize = 8;

/// Find the first complete RIFF/WEBP stream anywhere in `bytes`.
///
/// Does not look at the container header at all, so it also works on
/// containers the header walk rejects.
pub fn find_webp(bytes: &[u8]) -> Result<Range<usize>, ScanError> {
    let mut position = 0;

    while let Some(found) = find_riff(&bytes[position..]) {
        let start = position + found;
        if let Ok(Some(range)) = candidate(bytes, start) {
            return Ok(range);
        }
        trace!("rejected RIFF candidate at offset {start}");
        position = start + 1;
    }

    Err(ScanError::NoWebpSignature { size: bytes.len() })
}

fn find_riff(haystack: &[u8]) -> Option<usize> {
    haystack.windows(4).position(|window| window == b"RIFF")
}

fn candidate(bytes: &[u8], start: usize) -> Result<Option<Range<usize>>, ConverterError> {
    let data = &bytes[start..];
    if !is_riff_webp(data) {
        return Ok(None);
    }

    let size = converter::u32_to_usize(LittleEndian::read_u32(&data[4..8]))?;
    let length = converter::region_end(size, RIFF_HEADER_SIZE)?;
    let end = converter::region_end(start, length)?;

    if end > bytes.len() {
        return Ok(None);
    }
    Ok(Some(start..end))
}
