use crate::encode::ImageFormat;
use crate::encode::sink::{FileSequenceSink, frame_path};
use crate::foundation::core::{FrameIndex, Viewport};
use crate::render::context::{ContextLimits, OffscreenContext};
use crate::render::sequencer::render_orbit;
use crate::scene::flatten::flatten;
use crate::service::task::RenderTask;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

/// Completion callback, invoked on the worker thread as
/// `(first_frame_filename, token)` once per finished task.
pub type CompletionFn = dyn Fn(&str, &str) + Send + Sync;

/// Options for constructing a [`RenderService`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderServiceOpts {
    /// Output container for rendered frames.
    pub format: ImageFormat,
    /// Framebuffer bounds for the offscreen context.
    pub limits: ContextLimits,
}

/// Queue element: one task, or the shutdown marker.
enum Command {
    Render(Box<RenderTask>),
    Shutdown,
}

/// The render service: a thread-safe FIFO of tasks drained by one worker
/// thread.
///
/// [`submit`](Self::submit) is callable from any thread; the worker is
/// spawned lazily on first submission and processes tasks one at a time in
/// strict submission order. The offscreen context is owned by the worker for
/// its whole life and is torn down only after the worker has been joined.
///
/// Intended lifetime: the embedding layer constructs exactly one service and
/// shares it by reference. Dropping the service (or calling
/// [`shutdown`](Self::shutdown)) stops the worker after the in-flight task,
/// discarding anything still queued.
pub struct RenderService {
    state: Mutex<ServiceState>,
    stop: Arc<AtomicBool>,
    opts: RenderServiceOpts,
    notifier: Option<Arc<CompletionFn>>,
}

struct ServiceState {
    tx: Sender<Command>,
    rx: Option<Receiver<Command>>,
    context: Option<OffscreenContext>,
    worker: Option<JoinHandle<()>>,
}

impl RenderService {
    /// Create a service with no completion notifier.
    pub fn new(opts: RenderServiceOpts) -> Self {
        Self::build(opts, None)
    }

    /// Create a service that reports each finished task's first filename and
    /// callback token. The notifier runs on the worker thread; it must not
    /// block.
    pub fn with_notifier(
        opts: RenderServiceOpts,
        notifier: impl Fn(&str, &str) + Send + Sync + 'static,
    ) -> Self {
        Self::build(opts, Some(Arc::new(notifier)))
    }

    fn build(opts: RenderServiceOpts, notifier: Option<Arc<CompletionFn>>) -> Self {
        let (tx, rx) = mpsc::channel();
        // A failed context leaves the service constructible but degraded:
        // every task is consumed and skipped at the render step.
        let context = match OffscreenContext::new(opts.limits) {
            Ok(ctx) => Some(ctx),
            Err(err) => {
                tracing::warn!(%err, "offscreen context unavailable; tasks will be skipped");
                None
            }
        };
        Self {
            state: Mutex::new(ServiceState {
                tx,
                rx: Some(rx),
                context,
                worker: None,
            }),
            stop: Arc::new(AtomicBool::new(false)),
            opts,
            notifier,
        }
    }

    /// Queue one task. Non-blocking beyond a short lock; spawns the worker
    /// on first use.
    pub fn submit(&self, task: RenderTask) {
        let mut state = self.lock_state();
        if state.worker.is_none() {
            if let Some(rx) = state.rx.take() {
                let context = state.context.take();
                let stop = Arc::clone(&self.stop);
                let notifier = self.notifier.clone();
                let opts = self.opts;
                state.worker = Some(std::thread::spawn(move || {
                    worker_loop(rx, context, opts, stop, notifier);
                }));
            }
        }
        if state.tx.send(Command::Render(Box::new(task))).is_err() {
            tracing::warn!("task submitted after shutdown; dropping");
        }
    }

    /// Stop the worker: the in-flight task finishes, everything still queued
    /// is discarded unrendered, and the worker thread is joined. Idempotent.
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::Release);
        let (tx, worker) = {
            let mut state = self.lock_state();
            (state.tx.clone(), state.worker.take())
        };
        let Some(worker) = worker else {
            return;
        };
        let _ = tx.send(Command::Shutdown);
        if worker.join().is_err() {
            tracing::error!("render worker panicked during shutdown");
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    rx: Receiver<Command>,
    mut context: Option<OffscreenContext>,
    opts: RenderServiceOpts,
    stop: Arc<AtomicBool>,
    notifier: Option<Arc<CompletionFn>>,
) {
    tracing::debug!("render worker started");
    let mut dropped = 0u64;
    while let Ok(command) = rx.recv() {
        match command {
            Command::Render(task) => {
                if stop.load(Ordering::Acquire) {
                    // Shutdown outranks FIFO: drain without rendering.
                    dropped += 1;
                    continue;
                }
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    process_task(context.as_mut(), &opts, notifier.as_deref(), &task);
                }));
                if outcome.is_err() {
                    tracing::error!(base = %task.file_base, "task panicked; worker continues");
                }
            }
            Command::Shutdown => break,
        }
    }
    // Tasks queued behind the shutdown marker (or sent concurrently with it)
    // are discarded as well.
    while let Ok(command) = rx.try_recv() {
        if matches!(command, Command::Render(_)) {
            dropped += 1;
        }
    }
    if dropped > 0 {
        tracing::debug!(dropped, "discarded queued tasks at shutdown");
    }
    tracing::debug!("render worker stopped");
}

/// Process one task to completion. Every failure is handled here; nothing
/// escapes to the worker loop.
#[tracing::instrument(skip_all, fields(base = %task.file_base))]
fn process_task(
    context: Option<&mut OffscreenContext>,
    opts: &RenderServiceOpts,
    notifier: Option<&CompletionFn>,
    task: &RenderTask,
) {
    let Some(context) = context else {
        tracing::warn!("render context unavailable; task skipped");
        return;
    };

    let scene = match flatten(&task.groups) {
        Ok(scene) => scene,
        Err(err) => {
            tracing::warn!(%err, "scene rejected; task skipped");
            return;
        }
    };

    let viewport = Viewport {
        width: task.width,
        height: task.height,
    };
    let mut sink = FileSequenceSink::new(task.file_base.clone(), opts.format);
    if let Err(err) = render_orbit(context, &scene, viewport, task.frames, &mut sink) {
        tracing::warn!(%err, "render failed; task skipped");
        return;
    }
    tracing::debug!(frames = task.frames, "task finished");

    if let (Some(notifier), Some(token)) = (notifier, task.callback.as_deref()) {
        if !token.is_empty() {
            let filename = frame_path(&task.file_base, opts.format, FrameIndex(0));
            notifier(&filename.to_string_lossy(), token);
        }
    }
}
