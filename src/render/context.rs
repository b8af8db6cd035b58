use crate::foundation::core::Viewport;
use crate::foundation::error::{TurnshotError, TurnshotResult};

/// A rendered frame as RGBA8 pixels.
///
/// Row 0 is the **bottom** image row (framebuffer convention); encoders are
/// responsible for emitting rows in their format's order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgba {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, bottom row first.
    pub data: Vec<u8>,
}

/// Bounds applied when activating the offscreen context.
#[derive(Clone, Copy, Debug)]
pub struct ContextLimits {
    /// Largest accepted framebuffer width or height in pixels. Zero makes the
    /// context unconstructible.
    pub max_dimension: u32,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            max_dimension: 4096,
        }
    }
}

/// Background color the buffer is cleared to (0xf0f0f0, opaque).
pub(crate) const CLEAR_RGBA: [u8; 4] = [240, 240, 240, 255];

/// The single reusable offscreen render target: an RGBA8 color buffer plus a
/// depth buffer, resized on activation and reused across tasks.
///
/// Exclusively owned by whichever thread renders; never shared.
#[derive(Debug)]
pub struct OffscreenContext {
    limits: ContextLimits,
    viewport: Viewport,
    color: Vec<u8>,
    depth: Vec<f32>,
}

impl OffscreenContext {
    /// Create the context. Fails when the limits cannot back any framebuffer.
    pub fn new(limits: ContextLimits) -> TurnshotResult<Self> {
        if limits.max_dimension == 0 {
            return Err(TurnshotError::render(
                "context limits allow no framebuffer (max_dimension = 0)",
            ));
        }
        Ok(Self {
            limits,
            viewport: Viewport {
                width: 0,
                height: 0,
            },
            color: Vec::new(),
            depth: Vec::new(),
        })
    }

    /// Activate the context against a pixel buffer of the given size,
    /// reusing existing allocations where possible.
    pub fn make_current(&mut self, viewport: Viewport) -> TurnshotResult<()> {
        let max = self.limits.max_dimension;
        if viewport.width == 0 || viewport.height == 0 {
            return Err(TurnshotError::render("framebuffer size must be non-zero"));
        }
        if viewport.width > max || viewport.height > max {
            return Err(TurnshotError::render(format!(
                "{}x{} exceeds the context limit of {max}",
                viewport.width, viewport.height
            )));
        }
        self.viewport = viewport;
        self.color.resize(viewport.rgba_len(), 0);
        self.depth.resize(viewport.pixel_count(), 1.0);
        Ok(())
    }

    /// Clear the color buffer to the background and reset depth to the far
    /// plane.
    pub fn clear(&mut self) {
        for px in self.color.chunks_exact_mut(4) {
            px.copy_from_slice(&CLEAR_RGBA);
        }
        self.depth.fill(1.0);
    }

    /// Currently active framebuffer size.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Copy out the current color buffer.
    pub fn frame(&self) -> FrameRgba {
        FrameRgba {
            width: self.viewport.width,
            height: self.viewport.height,
            data: self.color.clone(),
        }
    }

    pub(crate) fn buffers_mut(&mut self) -> (&mut [u8], &mut [f32], Viewport) {
        (&mut self.color, &mut self.depth, self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limits_fail_construction() {
        let err = OffscreenContext::new(ContextLimits { max_dimension: 0 }).unwrap_err();
        assert!(err.to_string().contains("render error:"));
    }

    #[test]
    fn make_current_rejects_oversized_buffers() {
        let mut ctx = OffscreenContext::new(ContextLimits { max_dimension: 64 }).unwrap();
        assert!(
            ctx.make_current(Viewport {
                width: 65,
                height: 8
            })
            .is_err()
        );
        assert!(
            ctx.make_current(Viewport {
                width: 0,
                height: 8
            })
            .is_err()
        );
        ctx.make_current(Viewport {
            width: 64,
            height: 8,
        })
        .unwrap();
        assert_eq!(ctx.frame().data.len(), 64 * 8 * 4);
    }

    #[test]
    fn clear_fills_background_and_far_depth() {
        let mut ctx = OffscreenContext::new(ContextLimits::default()).unwrap();
        ctx.make_current(Viewport {
            width: 2,
            height: 2,
        })
        .unwrap();
        ctx.clear();
        let frame = ctx.frame();
        assert!(frame.data.chunks_exact(4).all(|px| px == CLEAR_RGBA));
        let (_, depth, _) = ctx.buffers_mut();
        assert!(depth.iter().all(|&d| d == 1.0));
    }
}
