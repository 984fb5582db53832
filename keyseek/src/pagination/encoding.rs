//! Transport encoding for cursor payloads.
//!
//! JSON bytes are compressed with raw DEFLATE and rendered as URL-safe base64
//! without padding, so tokens can travel in a query string unescaped.

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

use super::cursor::CursorError;

/// Compress and base64-encode `json`.
pub(super) fn seal(json: &[u8]) -> Result<String, CursorError> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(json.len()), Compression::default());
    encoder
        .write_all(json)
        .map_err(|e| CursorError::Encoding(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| CursorError::Encoding(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Reverse [`seal`], refusing to inflate past `max_len` bytes.
pub(super) fn open(token: &str, max_len: usize) -> Result<Vec<u8>, CursorError> {
    let compressed = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| CursorError::InvalidEncoding)?;

    // One byte over the cap is enough to detect an oversized payload
    let cap = u64::try_from(max_len).unwrap_or(u64::MAX).saturating_add(1);
    let mut json = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .take(cap)
        .read_to_end(&mut json)
        .map_err(|_| CursorError::Decompression)?;

    if json.len() > max_len {
        return Err(CursorError::TooLarge);
    }
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let json = br#"{"sort":"age,id","properties":{"age":25,"id":2}}"#;
        let token = seal(json).unwrap();
        assert_eq!(open(&token, 1024).unwrap(), json);
    }

    #[test]
    fn test_token_is_url_safe() {
        let json = "{\"name\":\"ÿÿÿ???>>>~~~\"}".repeat(8);
        let token = seal(json.as_bytes()).unwrap();
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "{token}"
        );
    }

    #[test]
    fn test_invalid_base64() {
        assert_eq!(open("not base64!", 1024), Err(CursorError::InvalidEncoding));
        assert_eq!(open("YWJj==", 1024), Err(CursorError::InvalidEncoding));
    }

    #[test]
    fn test_decompression_cap() {
        let json = vec![b' '; 10_000];
        let token = seal(&json).unwrap();
        // Highly compressible input stays small on the wire
        assert!(token.len() < 200);
        assert_eq!(open(&token, 1024), Err(CursorError::TooLarge));
        assert_eq!(open(&token, 10_000).unwrap().len(), 10_000);
    }
}
