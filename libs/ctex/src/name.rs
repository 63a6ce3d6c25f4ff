use crate::error::NameError;
use crate::format::FormatHint;
use crate::{CACHE_EXTENSION, HASH_TOKEN_LENGTHS};

/// Characters that cannot appear in an output file name
const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Recover the original asset name from a cache file name.
///
/// `icon.svg-218a8f2b.ctex` resolves to `icon.svg`. The hash boundary is the
/// rightmost hyphen followed by a hash-shaped token, so hyphens inside the
/// original name survive. An original name that itself ends in a
/// hash-shaped segment (`a.b-0123abcd.png`) is ambiguous and resolves at
/// the last boundary.
pub fn resolve(cache_file_name: &str) -> Result<String, NameError> {
    let Some(body) = cache_file_name.strip_suffix(CACHE_EXTENSION) else {
        return Err(NameError::NotACacheFile {
            name: cache_file_name.to_string(),
            expected: CACHE_EXTENSION,
        });
    };

    for (position, _) in body.rmatch_indices('-') {
        let original = &body[..position];
        let token = &body[position + 1..];

        if is_hash_token(token) && has_extension(original) {
            return Ok(original.to_string());
        }
    }

    Err(NameError::UnrecognizedNamingScheme {
        name: cache_file_name.to_string(),
    })
}

/// Name a cache file whose original name cannot be recovered.
///
/// Strips `.ctex` and a trailing hash token when present, then appends the
/// extension detected from the payload.
pub fn fallback_name(cache_file_name: &str, hint: FormatHint) -> String {
    let body = cache_file_name
        .strip_suffix(CACHE_EXTENSION)
        .unwrap_or(cache_file_name);

    let stem = match body.rsplit_once('-') {
        Some((stem, token)) if !stem.is_empty() && is_hash_token(token) => stem,
        _ => body,
    };

    format!("{}.{}", stem, hint.extension())
}

/// Replace characters which are unsafe in a file name
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if UNSAFE_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

fn is_hash_token(token: &str) -> bool {
    HASH_TOKEN_LENGTHS.contains(&token.len()) && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

fn has_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, extension)) => !stem.is_empty() && !extension.is_empty(),
        None => false,
    }
}
