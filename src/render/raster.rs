//! Fixed-function triangle pipeline: per-vertex lighting, Gouraud
//! interpolation, depth test, back-face culling.

use crate::foundation::core::Viewport;
use glam::{Mat3, Mat4, Vec3};

// Single positional light, eye space. Values from the fixed pipeline setup.
const LIGHT_POSITION: Vec3 = Vec3::new(17.0, 30.0, 9.0);
const LIGHT_AMBIENT: Vec3 = Vec3::new(68.0 / 255.0, 68.0 / 255.0, 68.0 / 255.0);
const LIGHT_DIFFUSE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
const LIGHT_SPECULAR: Vec3 = Vec3::new(1.0, 1.0, 1.0);

// Material: ambient and diffuse track the per-vertex color; specular and
// shininess are fixed.
const SCENE_AMBIENT: Vec3 = Vec3::new(0.2, 0.2, 0.2);
const MATERIAL_SPECULAR: Vec3 = Vec3::new(1.0, 0.980392, 0.549020);
const SHININESS: f32 = 200.0;

// Non-local viewer: specular uses the +Z view direction for every vertex.
const VIEW_DIR: Vec3 = Vec3::new(0.0, 0.0, 1.0);

const DEFAULT_NORMAL: Vec3 = Vec3::new(0.0, 0.0, 1.0);
const DEFAULT_COLOR: Vec3 = Vec3::new(1.0, 1.0, 1.0);

/// Per-frame transform state.
pub(crate) struct Pipeline {
    modelview: Mat4,
    projection: Mat4,
    normal_matrix: Mat3,
}

impl Pipeline {
    /// Build the pipeline for one view. The projection must be affine
    /// (orthographic): no perspective divide is performed downstream.
    pub(crate) fn new(modelview: Mat4, projection: Mat4) -> Self {
        let basis = Mat3::from_mat4(modelview);
        // Inverse-transpose for normals; a singular basis (degenerate scale)
        // falls back to the raw basis.
        let normal_matrix = if basis.determinant().abs() > f32::EPSILON {
            basis.inverse().transpose()
        } else {
            basis
        };
        Self {
            modelview,
            projection,
            normal_matrix,
        }
    }
}

/// A vertex after transform and lighting: window coordinates plus lit color.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScreenVertex {
    /// x, y in pixels (y up, matching the bottom-first framebuffer), z as
    /// depth in `[0, 1]`.
    pos: Vec3,
    /// Gouraud-lit color, clamped to `[0, 1]`.
    color: Vec3,
}

/// Transform and light every vertex once per view.
///
/// Buffers follow vertex-array semantics: they are bound once per task and
/// shaded here per frame. Normal and color arrays may be shorter than the
/// vertex array; missing entries use fixed defaults.
pub(crate) fn transform_and_shade(
    pipe: &Pipeline,
    viewport: Viewport,
    vertices: &[Vec3],
    normals: &[Vec3],
    colors: &[Vec3],
) -> Vec<ScreenVertex> {
    let half_w = viewport.width as f32 * 0.5;
    let half_h = viewport.height as f32 * 0.5;

    vertices
        .iter()
        .enumerate()
        .map(|(i, &vertex)| {
            let normal = normals.get(i).copied().unwrap_or(DEFAULT_NORMAL);
            let base = colors.get(i).copied().unwrap_or(DEFAULT_COLOR);

            let eye = pipe.modelview.transform_point3(vertex);
            let color = shade(pipe, eye, normal, base);

            let ndc = pipe.projection.transform_point3(eye);
            let pos = Vec3::new(
                (ndc.x + 1.0) * half_w,
                (ndc.y + 1.0) * half_h,
                (ndc.z + 1.0) * 0.5,
            );
            ScreenVertex { pos, color }
        })
        .collect()
}

fn shade(pipe: &Pipeline, eye: Vec3, normal: Vec3, base: Vec3) -> Vec3 {
    let n = (pipe.normal_matrix * normal).normalize_or_zero();
    let l = (LIGHT_POSITION - eye).normalize_or_zero();
    let n_dot_l = n.dot(l).max(0.0);

    let mut color = base * SCENE_AMBIENT + base * LIGHT_AMBIENT + base * LIGHT_DIFFUSE * n_dot_l;
    if n_dot_l > 0.0 {
        let half = (l + VIEW_DIR).normalize_or_zero();
        let spec = n.dot(half).max(0.0).powf(SHININESS);
        color += MATERIAL_SPECULAR * LIGHT_SPECULAR * spec;
    }
    color.clamp(Vec3::ZERO, Vec3::ONE)
}

/// Rasterize an indexed triangle list into the color and depth buffers.
///
/// Front faces wind counter-clockwise in window space; back faces and
/// degenerate triangles are culled. Depth test is less-or-equal against a
/// `[0, 1]` buffer cleared to 1.0.
pub(crate) fn rasterize_triangles(
    color: &mut [u8],
    depth: &mut [f32],
    viewport: Viewport,
    shaded: &[ScreenVertex],
    indices: &[u32],
) {
    let width = viewport.width;
    let height = viewport.height;

    for tri in indices.chunks_exact(3) {
        let (Some(a), Some(b), Some(c)) = (
            shaded.get(tri[0] as usize),
            shaded.get(tri[1] as usize),
            shaded.get(tri[2] as usize),
        ) else {
            // Indices were validated at flatten time.
            continue;
        };

        let area = edge(a.pos.x, a.pos.y, b.pos.x, b.pos.y, c.pos.x, c.pos.y);
        if area <= 0.0 {
            continue;
        }
        let inv_area = 1.0 / area;

        let min_x = a.pos.x.min(b.pos.x).min(c.pos.x).floor().max(0.0) as u32;
        let min_y = a.pos.y.min(b.pos.y).min(c.pos.y).floor().max(0.0) as u32;
        let max_x = a.pos.x.max(b.pos.x).max(c.pos.x).ceil().min(width as f32) as u32;
        let max_y = a.pos.y.max(b.pos.y).max(c.pos.y).ceil().min(height as f32) as u32;

        for y in min_y..max_y {
            let py = y as f32 + 0.5;
            for x in min_x..max_x {
                let px = x as f32 + 0.5;
                let w0 = edge(b.pos.x, b.pos.y, c.pos.x, c.pos.y, px, py);
                let w1 = edge(c.pos.x, c.pos.y, a.pos.x, a.pos.y, px, py);
                let w2 = edge(a.pos.x, a.pos.y, b.pos.x, b.pos.y, px, py);
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let (u, v, w) = (w0 * inv_area, w1 * inv_area, w2 * inv_area);
                let z = u * a.pos.z + v * b.pos.z + w * c.pos.z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }

                let i = (y * width + x) as usize;
                if z <= depth[i] {
                    depth[i] = z;
                    let lit = a.color * u + b.color * v + c.color * w;
                    let o = i * 4;
                    color[o] = (lit.x * 255.0 + 0.5) as u8;
                    color[o + 1] = (lit.y * 255.0 + 0.5) as u8;
                    color[o + 2] = (lit.z * 255.0 + 0.5) as u8;
                    color[o + 3] = 255;
                }
            }
        }
    }
}

fn edge(ax: f32, ay: f32, bx: f32, by: f32, px: f32, py: f32) -> f32 {
    (bx - ax) * (py - ay) - (by - ay) * (px - ax)
}
