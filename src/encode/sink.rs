use crate::encode::{ImageFormat, ensure_parent_dir, png, tga};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{TurnshotError, TurnshotResult};
use crate::render::context::FrameRgba;
use std::path::PathBuf;

/// Configuration provided to a [`FrameSink`] before any frames are pushed.
#[derive(Debug, Clone, Copy)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
}

/// Sink contract for consuming rendered frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing
/// [`FrameIndex`] order within one task.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> TurnshotResult<()>;
    /// Push one frame in strictly increasing index order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> TurnshotResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> TurnshotResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRgba)>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRgba)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> TurnshotResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> TurnshotResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> TurnshotResult<()> {
        Ok(())
    }
}

/// Path of frame `idx` for a task writing `<base><index>.<ext>` files.
pub fn frame_path(base: &str, format: ImageFormat, idx: FrameIndex) -> PathBuf {
    PathBuf::from(format!("{base}{}.{}", idx.0, format.extension()))
}

/// Sink writing one image file per frame as `<base><index>.<ext>`.
#[derive(Debug)]
pub struct FileSequenceSink {
    base: String,
    format: ImageFormat,
    cfg: Option<SinkConfig>,
}

impl FileSequenceSink {
    /// Create a sink writing `<base><index>.<ext>` files.
    pub fn new(base: impl Into<String>, format: ImageFormat) -> Self {
        Self {
            base: base.into(),
            format,
            cfg: None,
        }
    }
}

impl FrameSink for FileSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> TurnshotResult<()> {
        ensure_parent_dir(&frame_path(&self.base, self.format, FrameIndex(0)))?;
        self.cfg = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> TurnshotResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| TurnshotError::encode("file sink used before begin"))?;
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(TurnshotError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        let path = frame_path(&self.base, self.format, idx);
        match self.format {
            ImageFormat::Png => png::write_png(&path, frame),
            ImageFormat::Tga => tga::write_tga(&path, frame),
        }
    }

    fn end(&mut self) -> TurnshotResult<()> {
        Ok(())
    }
}
