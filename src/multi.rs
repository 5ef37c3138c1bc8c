use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::Result;
use crate::format::{Colorize, DefaultFormat};
use crate::writer::{RedrawSink, TerminalSink};
use crate::ProgressInstance;

/// Repaint interval used by [`MultiProgress::start`].
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

#[cfg(windows)]
const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
const LINE_SEPARATOR: &str = "\n";

/// Renders many [`ProgressInstance`]s as one live-updating block.
///
/// Instances render in the order they were added, one line each. The
/// container never removes, reorders or deduplicates them.
///
/// ```rust,ignore
/// let multi = MultiProgress::new();
/// multi.start();
///
/// for (name, job) in jobs {
///     multi.add_progress(ProgressInstance::new(name).attach_to(job, None));
/// }
///
/// wait_for_jobs().await;
/// multi.stop().await?;
/// ```
///
/// Cloning yields another handle to the same container.
#[derive(Clone)]
pub struct MultiProgress {
    inner: Arc<Inner>,
}

struct Inner {
    instances: Mutex<Vec<ProgressInstance>>,
    renderer: Mutex<Renderer>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

struct Renderer {
    sink: Box<dyn RedrawSink + Send>,
    format: DefaultFormat,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MultiProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MultiProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiProgress")
            .field("count", &self.len())
            .field("running", &self.is_running())
            .finish()
    }
}

impl MultiProgress {
    /// Creates an empty container that redraws to stdout.
    pub fn new() -> Self {
        Self::with_sink(TerminalSink::stdout())
    }

    /// Creates an empty container that hands every frame to `sink`.
    pub fn with_sink(sink: impl RedrawSink + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                instances: Mutex::new(Vec::new()),
                renderer: Mutex::new(Renderer {
                    sink: Box::new(sink),
                    format: DefaultFormat::default(),
                }),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Styles completion messages of the default format with `colors`.
    pub fn colors(self, colors: impl Colorize + 'static) -> Self {
        lock(&self.inner.renderer).format = DefaultFormat::new(colors);
        self
    }

    /// Appends `instance` to the render list.
    ///
    /// Adding the same instance twice renders it twice.
    pub fn add_progress(&self, instance: ProgressInstance) {
        tracing::trace!(task = instance.message(), "adding progress instance");
        lock(&self.inner.instances).push(instance);
    }

    /// Snapshot of the registered instances, in render order.
    pub fn instances(&self) -> Vec<ProgressInstance> {
        lock(&self.inner.instances).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.instances).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner.instances).is_empty()
    }

    /// Starts repainting every [`DEFAULT_INTERVAL`].
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start(&self) {
        self.start_with_interval(DEFAULT_INTERVAL);
    }

    /// Starts repainting every `period`.
    ///
    /// The first repaint happens one `period` after this call. Starting an
    /// already started container cancels the previous timer and replaces it.
    /// Failed repaints are logged and the loop keeps going.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start_with_interval(&self, period: Duration) {
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(render_loop(Arc::downgrade(&self.inner), period));

        if let Some(previous) = lock(&self.inner.timer).replace(handle) {
            previous.abort();
            tracing::debug!("replaced running render timer");
        }
        tracing::debug!(interval_ms = period.as_millis() as u64, "render timer started");
    }

    /// Whether the repaint timer is active.
    pub fn is_running(&self) -> bool {
        lock(&self.inner.timer).as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Cancels the repaint timer and renders one final frame.
    ///
    /// The final frame is rendered even if the timer never ticked or was never
    /// started, so the block always reflects the latest instance states.
    pub async fn stop(&self) -> Result<()> {
        let timer = lock(&self.inner.timer).take();
        if let Some(timer) = timer {
            timer.abort();
            // An in-flight tick must land before the final frame.
            if let Err(error) = timer.await
                && !error.is_cancelled()
            {
                tracing::warn!(%error, "render timer failed");
            }
            tracing::debug!("render timer stopped");
        }
        self.render()
    }

    /// Formats every instance and redraws the block once.
    ///
    /// Does nothing while no instance is registered. Running instances using
    /// the default format consume one animation frame per call.
    pub fn render(&self) -> Result<()> {
        let mut renderer = lock(&self.inner.renderer);
        let instances = self.instances();
        if instances.is_empty() {
            return Ok(());
        }

        let lines: Vec<String> = instances
            .iter()
            .map(|instance| match instance.formatter() {
                Some(formatter) => formatter(instance),
                None => renderer.format.format(instance),
            })
            .collect();

        tracing::trace!(lines = lines.len(), "redrawing progress block");
        renderer.sink.redraw(&lines.join(LINE_SEPARATOR))?;
        Ok(())
    }
}

async fn render_loop(inner: Weak<Inner>, period: Duration) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        // Every handle is gone, nobody can observe or stop us anymore.
        let Some(inner) = inner.upgrade() else {
            tracing::debug!("container dropped, render timer exiting");
            break;
        };
        if let Err(error) = (MultiProgress { inner }).render() {
            tracing::warn!(%error, "render tick failed");
        }
    }
}
