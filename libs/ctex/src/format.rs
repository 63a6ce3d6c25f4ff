const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Payload format detected from its leading magic bytes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormatHint {
    Webp,
    Png,
    Jpeg,
    Unknown,
}

impl FormatHint {
    pub fn detect(payload: &[u8]) -> Self {
        if is_riff_webp(payload) {
            Self::Webp
        } else if payload.starts_with(&PNG_MAGIC) {
            Self::Png
        } else if payload.starts_with(&JPEG_MAGIC) {
            Self::Jpeg
        } else {
            Self::Unknown
        }
    }

    /// File extension without the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Unknown => "bin",
        }
    }
}

/// `RIFF` followed by a 4-byte size and the `WEBP` form type
pub(crate) fn is_riff_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}
