use crate::foundation::error::{TurnshotError, TurnshotResult};
use crate::scene::model::MeshGroup;
use glam::Vec3;

/// Axis-aligned bounding extrema over a flattened scene's vertices.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    /// Componentwise minimum corner.
    pub min: Vec3,
    /// Componentwise maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Midpoint of the box.
    pub fn center(self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Size along each axis (`max - min`).
    pub fn extents(self) -> Vec3 {
        self.max - self.min
    }

    fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }
}

/// Element range contributed by one mesh group to the flattened index buffer.
///
/// Groups are drawn one range at a time, preserving submission order even
/// though their geometry is merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawRange {
    /// First element within the flattened index buffer.
    pub start: usize,
    /// Number of elements.
    pub count: usize,
}

/// Merged geometry for one task: contiguous vertex/normal/color/index buffers
/// with rebased indices, per-group draw ranges, and bounding extrema.
#[derive(Clone, Debug, Default)]
pub struct FlattenedScene {
    /// All vertex positions, group world transforms already applied.
    pub vertices: Vec<Vec3>,
    /// All normals, carried over untransformed.
    pub normals: Vec<Vec3>,
    /// All per-vertex colors.
    pub colors: Vec<Vec3>,
    /// Triangle indices addressing `vertices`.
    pub indices: Vec<u32>,
    /// One element range per input group, in submission order.
    pub ranges: Vec<DrawRange>,
    /// Bounding extrema over all (transformed) vertices.
    pub bounds: Aabb,
}

impl FlattenedScene {
    /// Total number of triangles across all groups.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Flatten an ordered sequence of mesh groups into unified buffers.
///
/// Group world transforms are applied to vertices before merging; normals and
/// colors are carried over untransformed (lighting stays in object space).
/// Indices are 0-based within their group and are rebased onto the merged
/// vertex buffer; an index outside its group's vertex range is a scene error.
/// A group with no vertices contributes an empty draw range and leaves the
/// running offset untouched.
pub fn flatten(groups: &[MeshGroup]) -> TurnshotResult<FlattenedScene> {
    let mut scene = FlattenedScene::default();
    let mut bounds: Option<Aabb> = None;
    let mut offset: u32 = 0;

    for (group_index, group) in groups.iter().enumerate() {
        for &vertex in &group.vertices {
            let p = match group.world {
                Some(world) => world.transform_point3(vertex),
                None => vertex,
            };
            match bounds.as_mut() {
                Some(b) => b.grow(p),
                None => bounds = Some(Aabb { min: p, max: p }),
            }
            scene.vertices.push(p);
        }
        scene.normals.extend_from_slice(&group.normals);
        scene.colors.extend_from_slice(&group.colors);

        let start = scene.indices.len();
        let vertex_count = group.vertices.len() as u32;
        for &index in &group.indices {
            if index >= vertex_count {
                return Err(TurnshotError::scene(format!(
                    "group {group_index}: index {index} out of range for {vertex_count} vertices"
                )));
            }
            scene.indices.push(index + offset);
        }
        scene.ranges.push(DrawRange {
            start,
            count: scene.indices.len() - start,
        });

        offset = offset.checked_add(vertex_count).ok_or_else(|| {
            TurnshotError::scene(format!("group {group_index}: vertex count overflow"))
        })?;
    }

    scene.bounds = bounds.unwrap_or_default();
    Ok(scene)
}
