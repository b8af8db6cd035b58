//! Raw truecolor (TGA) encoding.
//!
//! Layout: an 18-byte header (no image id, no color map, image type 2
//! uncompressed truecolor, zero origin, width and height as little-endian
//! 16-bit fields, 24-bit pixel depth, top-left image descriptor) followed by
//! rows from the top image row down, each pixel as blue, green, red. Alpha is
//! dropped. Output bytes are a pure function of the input pixels.

use crate::foundation::error::{TurnshotError, TurnshotResult};
use crate::render::context::FrameRgba;
use anyhow::Context as _;
use std::path::Path;

const HEADER_LEN: usize = 18;

/// Encode a frame in the raw truecolor layout.
pub fn encode_tga(frame: &FrameRgba) -> TurnshotResult<Vec<u8>> {
    let expected_len = frame.width as usize * frame.height as usize * 4;
    if frame.data.len() != expected_len {
        return Err(TurnshotError::encode(
            "pixel buffer does not match its declared size",
        ));
    }
    if frame.width > u16::MAX as u32 || frame.height > u16::MAX as u32 {
        return Err(TurnshotError::encode(
            "dimensions exceed the 16-bit header fields",
        ));
    }

    let mut out = Vec::with_capacity(HEADER_LEN + expected_len / 4 * 3);
    out.push(0x00); // no image id
    out.push(0x00); // no color map
    out.push(0x02); // uncompressed truecolor
    out.extend_from_slice(&[0x00; 5]); // color map spec, unused
    out.extend_from_slice(&0u16.to_le_bytes()); // x origin
    out.extend_from_slice(&0u16.to_le_bytes()); // y origin
    out.extend_from_slice(&(frame.width as u16).to_le_bytes());
    out.extend_from_slice(&(frame.height as u16).to_le_bytes());
    out.push(24); // pixel depth
    out.push(0x20); // top-left origin descriptor

    // Buffer row 0 is the bottom image row; the descriptor wants top-down.
    let row_len = frame.width as usize * 4;
    for y in (0..frame.height as usize).rev() {
        let row = &frame.data[y * row_len..(y + 1) * row_len];
        for px in row.chunks_exact(4) {
            out.push(px[2]);
            out.push(px[1]);
            out.push(px[0]);
        }
    }
    Ok(out)
}

/// Write one frame to `path` in the raw truecolor layout.
pub fn write_tga(path: &Path, frame: &FrameRgba) -> TurnshotResult<()> {
    let bytes = encode_tga(frame)?;
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}
