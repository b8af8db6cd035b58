use crate::scene::model::{MeshGroup, RenderRequestDef};

/// Default output width and height in pixels.
pub const DEFAULT_DIMENSION: u32 = 128;

/// Default orbit frame count.
pub const DEFAULT_FRAMES: u32 = 8;

/// One render request, owned by the queue until the worker takes it, then by
/// the worker until its frames are written (or until shutdown drains it).
#[derive(Debug, Clone)]
pub struct RenderTask {
    /// Output file prefix: the model name with its extension stripped and
    /// `_` appended. Frame `i` is written to `<file_base><i>.<ext>`.
    pub file_base: String,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Number of orbit frames.
    pub frames: u32,
    /// Ordered mesh groups making up the scene.
    pub groups: Vec<MeshGroup>,
    /// Opaque completion token; `None` or empty disables notification.
    pub callback: Option<String>,
}

impl RenderTask {
    /// Build a task from a host request, silently replacing malformed
    /// numeric fields with defaults.
    pub fn from_def(def: RenderRequestDef) -> Self {
        Self {
            file_base: file_base_for(&def.model),
            width: positive_or(def.width, DEFAULT_DIMENSION),
            height: positive_or(def.height, DEFAULT_DIMENSION),
            frames: positive_or(def.frame, DEFAULT_FRAMES),
            groups: def.render.into_iter().map(MeshGroup::from).collect(),
            callback: def.callback,
        }
    }
}

/// Strip the extension (substring after the last `.`) and append `_`.
fn file_base_for(model: &str) -> String {
    let stem = match model.rfind('.') {
        Some(pos) => &model[..pos],
        None => model,
    };
    format!("{stem}_")
}

fn positive_or(value: f64, default: u32) -> u32 {
    let truncated = value as u32;
    if truncated > 0 { truncated } else { default }
}
