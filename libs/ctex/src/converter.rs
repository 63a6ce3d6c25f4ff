use crate::error::ConverterError;

/// Method for converting u32 to usize.
pub fn u32_to_usize(value: u32) -> Result<usize, ConverterError> {
    match usize::try_from(value) {
        Err(error) => Err(ConverterError::TryFromIntError(error)),
        Ok(result) => Ok(result),
    }
}

/// Method for converting usize to u64.
pub fn usize_to_u64(value: usize) -> Result<u64, ConverterError> {
    match u64::try_from(value) {
        Err(error) => Err(ConverterError::TryFromIntError(error)),
        Ok(result) => Ok(result),
    }
}

/// Method for computing the end of a `len`-byte region starting at `offset`.
pub fn region_end(offset: usize, len: usize) -> Result<usize, ConverterError> {
    offset.checked_add(len).ok_or(ConverterError::Overflow {
        offset,
        length: len,
    })
}
