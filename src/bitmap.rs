//! Locate BMP streams inside arbitrary bytes.
//!
//! A BMP starts with `"BM"` followed by its total size as a
//! little-endian `u32`. Anything claiming to be smaller than
//! the file header plus a `BITMAPINFOHEADER` (54 bytes), or
//! running past the end of the buffer, is a false positive.
use std::ops::Range;

use tracing::trace;

pub const SIGNATURE: &[u8; 2] = b"BM";
pub const MIN_BITMAP_LEN: usize = 54;

/// Declared size of a bitmap starting at `data[0]`, if the
/// bytes look like a BMP that fits in `data`.
pub fn bitmap_len(data: &[u8]) -> Option<usize> {
    if data.len() < 6 || &data[..2] != SIGNATURE {
        return None;
    }
    let mut size = [0u8; 4];
    size.copy_from_slice(&data[2..6]);
    let size = u32::from_le_bytes(size) as usize;
    if size < MIN_BITMAP_LEN || size > data.len() {
        return None;
    }
    Some(size)
}

/// Find up to `limit` bitmaps in `data`, in order of
/// appearance. A found bitmap is skipped as a whole, so
/// signatures inside its pixel data are not reported.
pub fn scan_bitmaps(data: &[u8], limit: Option<usize>) -> Vec<Range<usize>> {
    let limit = limit.unwrap_or(usize::MAX);
    let mut found = vec![];
    let mut idx = 0;

    while found.len() < limit && idx + 1 < data.len() {
        let offset = match data[idx..]
            .windows(2)
            .position(|w| w == SIGNATURE)
        {
            Some(pos) => idx + pos,
            None => break,
        };

        match bitmap_len(&data[offset..]) {
            Some(len) => {
                trace!(offset, len, "found bitmap");
                found.push(offset..offset + len);
                idx = offset + len;
            }
            None => {
                trace!(offset, "rejected bitmap signature");
                idx = offset + SIGNATURE.len();
            }
        }
    }
    found
}
