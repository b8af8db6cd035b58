//! Frame encoding: the sink boundary plus the raw truecolor and PNG writers.

pub mod png;
pub mod sink;
pub mod tga;

use crate::foundation::error::TurnshotResult;
use std::path::Path;

/// Output image container for a task's frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageFormat {
    /// Standard compressed RGBA.
    #[default]
    Png,
    /// Self-contained raw truecolor; no codec involved.
    Tga,
}

impl ImageFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Tga => "tga",
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub(crate) fn ensure_parent_dir(path: &Path) -> TurnshotResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            use anyhow::Context as _;
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create output directory '{}'", parent.display())
            })?;
        }
    }
    Ok(())
}
