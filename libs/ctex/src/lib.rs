/// Magic marker of the compressed texture container ("GST2")
pub const CONTAINER_MAGIC: [u8; 4] = *b"GST2";
/// Newest container version whose layout is understood
pub const FORMAT_VERSION: u32 = 1;
/// Extension of the cache container files
pub const CACHE_EXTENSION: &str = ".ctex";
/// Accepted lengths of the hash suffix (MD5 hex digest and the short form)
pub const HASH_TOKEN_LENGTHS: [usize; 2] = [32, 8];
/// Import cache location relative to the project root
pub const IMPORTED_DIR: [&str; 2] = [".godot", "imported"];
/// Output location relative to the project root when none is given
pub const DEFAULT_OUTPUT_DIR: &str = "extracted_images";

pub mod batch;
mod converter;
pub mod error;
pub mod format;
pub mod name;
pub mod reader;
pub mod scan;
