use crate::foundation::error::{TurnshotError, TurnshotResult};
use glam::{Mat4, Vec3};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One render request as submitted by the host, before defaulting.
///
/// Field semantics match the host message: numeric fields that are missing or
/// non-positive fall back to defaults when the request is turned into a
/// [`crate::service::task::RenderTask`].
#[derive(Debug, Clone, Deserialize)]
pub struct RenderRequestDef {
    /// Model identifier; the output file base name derives from it.
    pub model: String,
    /// Ordered mesh groups making up the scene.
    #[serde(default)]
    pub render: Vec<MeshGroupDef>,
    /// Output width in pixels.
    #[serde(default)]
    pub width: f64,
    /// Output height in pixels.
    #[serde(default)]
    pub height: f64,
    /// Number of orbit frames to render.
    #[serde(default)]
    pub frame: f64,
    /// Opaque completion token; absent or empty disables notification.
    #[serde(default)]
    pub callback: Option<String>,
}

impl RenderRequestDef {
    /// Parse a request from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> TurnshotResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| TurnshotError::validation(format!("parse render request JSON: {e}")))
    }

    /// Parse a request from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> TurnshotResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            TurnshotError::validation(format!("open render request '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }
}

/// One drawable geometry block within a request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeshGroupDef {
    /// Vertex positions, three floats each.
    #[serde(default)]
    pub vertices: Vec<[f32; 3]>,
    /// Vertex normals, three floats each.
    #[serde(default)]
    pub normals: Vec<[f32; 3]>,
    /// Per-vertex colors, three floats each, in `[0, 1]`.
    #[serde(default)]
    pub colors: Vec<[f32; 3]>,
    /// 0-based triangle indices into this group's `vertices`.
    #[serde(default)]
    pub indices: Vec<u32>,
    /// Optional column-major 4x4 world transform applied to `vertices`.
    #[serde(default)]
    pub world_matrix: Option<[f32; 16]>,
}

/// Runtime mesh group with parsed math types.
#[derive(Debug, Clone, Default)]
pub struct MeshGroup {
    /// Vertex positions.
    pub vertices: Vec<Vec3>,
    /// Vertex normals. May be sized independently of `vertices`; missing
    /// entries fall back to a default at draw time.
    pub normals: Vec<Vec3>,
    /// Per-vertex colors in `[0, 1]`.
    pub colors: Vec<Vec3>,
    /// 0-based triangle indices into `vertices`.
    pub indices: Vec<u32>,
    /// Optional world transform applied to `vertices` when flattening.
    pub world: Option<Mat4>,
}

impl From<MeshGroupDef> for MeshGroup {
    fn from(def: MeshGroupDef) -> Self {
        Self {
            vertices: def.vertices.into_iter().map(Vec3::from).collect(),
            normals: def.normals.into_iter().map(Vec3::from).collect(),
            colors: def.colors.into_iter().map(Vec3::from).collect(),
            indices: def.indices,
            world: def.world_matrix.map(|m| Mat4::from_cols_array(&m)),
        }
    }
}
