use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, Viewport};
use crate::foundation::error::{TurnshotError, TurnshotResult};
use crate::render::context::OffscreenContext;
use crate::render::raster::{self, Pipeline};
use crate::scene::flatten::FlattenedScene;
use glam::{Mat4, Vec3};

/// Smallest extent used when normalizing model scale; keeps degenerate
/// scenes (a single point, an empty scene) on a finite transform path.
const MIN_EXTENT: f32 = 1e-6;

/// Fixed downward tilt applied before the per-frame azimuth rotation.
const TILT_DEGREES: f32 = -90.0;

/// Geometry bound for repeated drawing: built once per task from the
/// flattened buffers, replayed once per frame, one draw per group range.
pub(crate) struct DrawBatch<'a> {
    scene: &'a FlattenedScene,
}

impl<'a> DrawBatch<'a> {
    pub(crate) fn new(scene: &'a FlattenedScene) -> Self {
        Self { scene }
    }

    /// Replay the batch for one view: shade every vertex once, then issue
    /// one rasterization per recorded group range, in group order.
    pub(crate) fn draw(&self, pipe: &Pipeline, ctx: &mut OffscreenContext) {
        let shaded = raster::transform_and_shade(
            pipe,
            ctx.viewport(),
            &self.scene.vertices,
            &self.scene.normals,
            &self.scene.colors,
        );
        let (color, depth, viewport) = ctx.buffers_mut();
        for range in &self.scene.ranges {
            let Some(slice) = self
                .scene
                .indices
                .get(range.start..range.start + range.count)
            else {
                continue;
            };
            raster::rasterize_triangles(color, depth, viewport, &shaded, slice);
        }
    }
}

/// Orthographic projection fitted to the viewport aspect ratio, z in
/// `[-10, 10]`.
fn projection_for(viewport: Viewport) -> Mat4 {
    let w = viewport.width as f32;
    let h = viewport.height as f32;
    if w <= h {
        Mat4::orthographic_rh_gl(-1.0, 1.0, -h / w, h / w, -10.0, 10.0)
    } else {
        Mat4::orthographic_rh_gl(-w / h, w / h, -1.0, 1.0, -10.0, 10.0)
    }
}

/// Uniform scale normalizing the model's largest extent into the view
/// volume. Extents are clamped so the result is always finite.
pub(crate) fn fit_scale(extents: Vec3) -> f32 {
    1.0 / extents.max_element().max(MIN_EXTENT)
}

/// Render `frames` views of `scene` into `sink`, one azimuth step
/// (`360° / frames`) apart around a fixed elevation.
///
/// Frames are produced in strictly increasing index order. A sink failure
/// for one frame aborts only that frame's write; rendering continues with
/// the next frame.
pub fn render_orbit(
    ctx: &mut OffscreenContext,
    scene: &FlattenedScene,
    viewport: Viewport,
    frames: u32,
    sink: &mut dyn FrameSink,
) -> TurnshotResult<()> {
    if frames == 0 {
        return Err(TurnshotError::validation("frame count must be positive"));
    }
    ctx.make_current(viewport)?;
    sink.begin(SinkConfig {
        width: viewport.width,
        height: viewport.height,
    })?;

    let projection = projection_for(viewport);
    let center = scene.bounds.center();
    let scale = fit_scale(scene.bounds.extents());
    let step = 360.0 / frames as f32;

    let batch = DrawBatch::new(scene);
    for i in 0..frames {
        ctx.clear();
        // recenter on the bounding-box midpoint, normalize size, then orbit
        let modelview = Mat4::from_rotation_x(TILT_DEGREES.to_radians())
            * Mat4::from_rotation_z((step * i as f32).to_radians())
            * Mat4::from_scale(Vec3::splat(scale))
            * Mat4::from_translation(-center);
        let pipe = Pipeline::new(modelview, projection);
        batch.draw(&pipe, ctx);

        let frame = ctx.frame();
        if let Err(err) = sink.push_frame(FrameIndex(i), &frame) {
            tracing::warn!(frame = i, %err, "frame write failed; continuing with next frame");
        }
    }
    sink.end()
}
