//! Turnshot renders 3D mesh scenes into orbiting thumbnail image sequences.
//!
//! The crate is built around a single-worker rendering service:
//!
//! - Submit a [`RenderTask`] to a [`RenderService`] from any thread
//! - One worker thread flattens the scene, renders N frames at evenly spaced
//!   azimuth angles, and writes one image file per frame
//! - An optional completion callback reports the finished filename back to
//!   the embedding layer
//!
//! Rendering is entirely CPU-side: a fixed-function triangle pipeline with
//! per-vertex lighting, depth testing, and back-face culling draws into a
//! reusable offscreen buffer. Frames can be encoded as PNG or as a
//! self-contained raw truecolor format.
#![forbid(unsafe_code)]

mod foundation;

pub mod encode;
pub mod render;
pub mod scene;
pub mod service;

pub use crate::foundation::core::{FrameIndex, Viewport};
pub use crate::foundation::error::{TurnshotError, TurnshotResult};

pub use crate::encode::ImageFormat;
pub use crate::encode::sink::{FileSequenceSink, FrameSink, InMemorySink, SinkConfig, frame_path};
pub use crate::render::context::{ContextLimits, FrameRgba, OffscreenContext};
pub use crate::render::sequencer::render_orbit;
pub use crate::scene::flatten::{Aabb, DrawRange, FlattenedScene, flatten};
pub use crate::scene::model::{MeshGroup, MeshGroupDef, RenderRequestDef};
pub use crate::service::task::RenderTask;
pub use crate::service::worker::{RenderService, RenderServiceOpts};
