//! PNG encoding through the `image` crate.
//!
//! Rows are supplied top-down so the file's visual orientation matches the
//! raw truecolor path. An encode or IO failure aborts only the frame being
//! written; callers continue with the next frame.

use crate::foundation::error::{TurnshotError, TurnshotResult};
use crate::render::context::FrameRgba;
use anyhow::Context as _;
use std::path::Path;

/// Encode a frame as RGBA8 PNG bytes.
pub fn encode_png(frame: &FrameRgba) -> TurnshotResult<Vec<u8>> {
    let img: image::RgbaImage =
        image::ImageBuffer::from_raw(frame.width, frame.height, flip_rows(frame)?).ok_or_else(
            || TurnshotError::encode("pixel buffer does not match its declared size"),
        )?;

    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| TurnshotError::encode(format!("png encode failed: {e}")))?;
    Ok(out.into_inner())
}

/// Write one frame to `path` as PNG.
pub fn write_png(path: &Path, frame: &FrameRgba) -> TurnshotResult<()> {
    let bytes = encode_png(frame)?;
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}

/// Reverse row order: the framebuffer is bottom-up, PNG rows are top-down.
fn flip_rows(frame: &FrameRgba) -> TurnshotResult<Vec<u8>> {
    let row_len = frame.width as usize * 4;
    let expected_len = row_len * frame.height as usize;
    if frame.data.len() != expected_len {
        return Err(TurnshotError::encode(
            "pixel buffer does not match its declared size",
        ));
    }

    let mut flipped = Vec::with_capacity(expected_len);
    for y in (0..frame.height as usize).rev() {
        flipped.extend_from_slice(&frame.data[y * row_len..(y + 1) * row_len]);
    }
    Ok(flipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_png_matches_source_with_rows_flipped() {
        let frame = FrameRgba {
            width: 2,
            height: 2,
            data: vec![
                255, 0, 0, 255, // bottom-left, red
                0, 255, 0, 255, // bottom-right, green
                0, 0, 255, 255, // top-left, blue
                255, 255, 255, 255, // top-right, white
            ],
        };
        let bytes = encode_png(&frame).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (2, 2));
        // image rows are top-down: (0, 0) is the top-left pixel
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(decoded.get_pixel(1, 0).0, [255, 255, 255, 255]);
        assert_eq!(decoded.get_pixel(0, 1).0, [255, 0, 0, 255]);
        assert_eq!(decoded.get_pixel(1, 1).0, [0, 255, 0, 255]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let frame = FrameRgba {
            width: 3,
            height: 2,
            data: (0..24).collect(),
        };
        assert_eq!(encode_png(&frame).unwrap(), encode_png(&frame).unwrap());
    }

    #[test]
    fn truncated_buffers_are_rejected() {
        let frame = FrameRgba {
            width: 2,
            height: 2,
            data: vec![0; 15],
        };
        assert!(encode_png(&frame).is_err());
    }
}
