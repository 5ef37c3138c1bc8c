use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::frames;

/// Renders one instance as a single line, replacing the container's default.
pub type Formatter = Arc<dyn Fn(&ProgressInstance) -> String + Send + Sync>;

const DEFAULT_SUCCESS: &str = "OK";
const DEFAULT_FAILURE: &str = "ERROR";

/// One tracked unit of work: a label, a spinner animation and a finish state.
///
/// Cloning is cheap and every clone observes the same state, so one handle can
/// be registered with a [`MultiProgress`](crate::MultiProgress) while another
/// is moved into the task that eventually stops it.
///
/// ```rust,ignore
/// let build = ProgressInstance::new("build").attach_to(run_build(), None);
/// multi.add_progress(build);
/// ```
#[derive(Clone)]
pub struct ProgressInstance {
    inner: Arc<Inner>,
}

struct Inner {
    message: String,
    frames: Vec<String>,
    formatter: Option<Formatter>,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    tick: usize,
    stopped: bool,
    success: bool,
    completion_message: String,
}

impl std::fmt::Debug for ProgressInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("ProgressInstance")
            .field("message", &self.inner.message)
            .field("frames", &self.inner.frames.len())
            .field("custom_formatter", &self.inner.formatter.is_some())
            .field("tick", &state.tick)
            .field("stopped", &state.stopped)
            .field("success", &state.success)
            .field("completion_message", &state.completion_message)
            .finish()
    }
}

impl ProgressInstance {
    /// Creates a running instance animated with [`frames::DOTS7`].
    pub fn new(message: impl Into<String>) -> Self {
        Self::from_parts(message.into(), default_frames(), None)
    }

    /// Starts building an instance with custom frames or a custom formatter.
    pub fn builder(message: impl Into<String>) -> InstanceBuilder {
        InstanceBuilder {
            message: message.into(),
            frames: None,
            formatter: None,
        }
    }

    fn from_parts(message: String, frames: Vec<String>, formatter: Option<Formatter>) -> Self {
        Self {
            inner: Arc::new(Inner {
                message,
                frames,
                formatter,
                state: Mutex::new(State::default()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The display label.
    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// The animation frames, in playback order.
    pub fn frames(&self) -> &[String] {
        &self.inner.frames
    }

    /// The custom formatter, if one was configured.
    pub fn formatter(&self) -> Option<&Formatter> {
        self.inner.formatter.as_ref()
    }

    /// Index of the frame the next [`next_frame`](Self::next_frame) call returns.
    pub fn tick(&self) -> usize {
        self.state().tick
    }

    /// Message shown once finished. Empty while still running.
    pub fn completion_message(&self) -> String {
        self.state().completion_message.clone()
    }

    /// Marks the instance as finished.
    ///
    /// Without a (non-empty) `completion_message` the instance shows `OK` on
    /// success and `ERROR` on failure. Stopping an already stopped instance
    /// overwrites the previous outcome.
    pub fn stop(&self, success: bool, completion_message: Option<&str>) {
        let message = match completion_message.filter(|m| !m.is_empty()) {
            Some(message) => message,
            None if success => DEFAULT_SUCCESS,
            None => DEFAULT_FAILURE,
        };

        let mut state = self.state();
        if state.stopped {
            tracing::trace!(task = %self.inner.message, "overwriting finish state");
        }
        state.completion_message = message.to_string();
        state.success = success;
        state.stopped = true;
        drop(state);

        tracing::debug!(task = %self.inner.message, success, completion = message, "task stopped");
    }

    /// Stops this instance once `operation` settles.
    ///
    /// `Ok` stops with success and `Err` with failure. Both outcomes use the
    /// same `completion_message`; the error value itself is discarded. Use
    /// [`attach_to_with_reason`](Self::attach_to_with_reason) to display it.
    ///
    /// Returns a handle to this instance for chaining.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn attach_to<F, T, E>(&self, operation: F, completion_message: Option<&str>) -> Self
    where
        F: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let instance = self.clone();
        let completion = completion_message.map(str::to_owned);
        tokio::spawn(async move {
            let success = operation.await.is_ok();
            instance.stop(success, completion.as_deref());
        });
        self.clone()
    }

    /// Like [`attach_to`](Self::attach_to), but a failed operation displays
    /// its error instead of `completion_message`.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn attach_to_with_reason<F, T, E>(
        &self, operation: F, completion_message: Option<&str>,
    ) -> Self
    where
        F: Future<Output = std::result::Result<T, E>> + Send + 'static,
        E: std::fmt::Display,
    {
        let instance = self.clone();
        let completion = completion_message.map(str::to_owned);
        tokio::spawn(async move {
            match operation.await {
                Ok(_) => instance.stop(true, completion.as_deref()),
                Err(error) => instance.stop(false, Some(&error.to_string())),
            }
        });
        self.clone()
    }

    /// `None` while running, otherwise whether the task succeeded.
    pub fn is_stopped(&self) -> Option<bool> {
        let state = self.state();
        state.stopped.then_some(state.success)
    }

    /// Consumes one animation frame, returning it and advancing the cursor.
    pub fn next_frame(&self) -> String {
        let mut state = self.state();
        let frame = self.inner.frames[state.tick].clone();
        state.tick = (state.tick + 1) % self.inner.frames.len();
        frame
    }

    /// Whether both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Configures a [`ProgressInstance`] before it starts running.
///
/// ```rust,ignore
/// let task = ProgressInstance::builder("fetch")
///     .frames(frames::LINE.iter().copied())
///     .formatter(|i| format!("[{}] {}", i.next_frame(), i.message()))
///     .build()?;
/// ```
pub struct InstanceBuilder {
    message: String,
    frames: Option<Vec<String>>,
    formatter: Option<Formatter>,
}

impl InstanceBuilder {
    /// Sets the animation frames. Defaults to [`frames::DOTS7`].
    pub fn frames<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frames = Some(frames.into_iter().map(Into::into).collect());
        self
    }

    /// Renders this instance with `f` instead of the container's default.
    pub fn formatter<F>(mut self, f: F) -> Self
    where F: Fn(&ProgressInstance) -> String + Send + Sync + 'static {
        self.formatter = Some(Arc::new(f));
        self
    }

    /// Builds the instance, rejecting an empty frame set.
    pub fn build(self) -> Result<ProgressInstance> {
        let frames = self.frames.unwrap_or_else(default_frames);
        if frames.is_empty() {
            return Err(Error::EmptyFrames);
        }
        Ok(ProgressInstance::from_parts(self.message, frames, self.formatter))
    }
}

fn default_frames() -> Vec<String> {
    frames::DOTS7.iter().map(|f| f.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spinner(frames: &[&str]) -> ProgressInstance {
        ProgressInstance::builder("task").frames(frames.iter().copied()).build().unwrap()
    }

    #[test]
    fn new_instance_is_running_at_first_frame() {
        let task = ProgressInstance::new("fetch");
        assert_eq!(task.message(), "fetch");
        assert_eq!(task.frames().len(), frames::DOTS7.len());
        assert_eq!(task.tick(), 0);
        assert_eq!(task.is_stopped(), None);
        assert_eq!(task.completion_message(), "");
        assert!(task.formatter().is_none());
    }

    #[test]
    fn next_frame_cycles_modulo_frame_count() {
        let frames = ["a", "b", "c"];
        let task = spinner(&frames);
        for n in 0..10 {
            assert_eq!(task.next_frame(), frames[n % frames.len()]);
            assert_eq!(task.tick(), (n + 1) % frames.len());
        }
    }

    #[test]
    fn single_frame_never_advances() {
        let task = spinner(&["*"]);
        assert_eq!(task.next_frame(), "*");
        assert_eq!(task.next_frame(), "*");
        assert_eq!(task.tick(), 0);
    }

    #[test]
    fn empty_frames_are_rejected() {
        let err = ProgressInstance::builder("x").frames(Vec::<String>::new()).build().unwrap_err();
        assert!(matches!(err, Error::EmptyFrames));
    }

    #[test]
    fn stop_uses_default_messages() {
        let ok = ProgressInstance::new("a");
        ok.stop(true, None);
        assert_eq!(ok.is_stopped(), Some(true));
        assert_eq!(ok.completion_message(), "OK");

        let failed = ProgressInstance::new("b");
        failed.stop(false, None);
        assert_eq!(failed.is_stopped(), Some(false));
        assert_eq!(failed.completion_message(), "ERROR");

        let blank = ProgressInstance::new("c");
        blank.stop(true, Some(""));
        assert_eq!(blank.completion_message(), "OK");
    }

    #[test]
    fn second_stop_overwrites_first() {
        let task = ProgressInstance::new("a");
        task.stop(true, Some("done"));
        task.stop(false, Some("broke"));
        assert_eq!(task.is_stopped(), Some(false));
        assert_eq!(task.completion_message(), "broke");
    }

    #[test]
    fn clones_share_state() {
        let task = ProgressInstance::new("a");
        let other = task.clone();
        other.stop(true, None);
        assert_eq!(task.is_stopped(), Some(true));
        assert!(task.ptr_eq(&other));
        assert!(!task.ptr_eq(&ProgressInstance::new("a")));
    }

    async fn settled(task: &ProgressInstance) -> bool {
        while task.is_stopped().is_none() {
            tokio::task::yield_now().await;
        }
        task.is_stopped().unwrap()
    }

    #[tokio::test]
    async fn attach_to_success_uses_message_or_ok() {
        let task = ProgressInstance::new("a").attach_to(async { Ok::<_, ()>(1) }, Some("fetched"));
        assert!(settled(&task).await);
        assert_eq!(task.completion_message(), "fetched");

        let task = ProgressInstance::new("b").attach_to(async { Ok::<_, ()>(()) }, None);
        assert!(settled(&task).await);
        assert_eq!(task.completion_message(), "OK");
    }

    #[tokio::test]
    async fn attach_to_failure_reuses_success_message() {
        let task = ProgressInstance::new("a")
            .attach_to(async { Err::<(), _>("disk full") }, Some("fetched"));
        assert!(!settled(&task).await);
        assert_eq!(task.completion_message(), "fetched");

        let task = ProgressInstance::new("b").attach_to(async { Err::<(), _>("disk full") }, None);
        assert!(!settled(&task).await);
        assert_eq!(task.completion_message(), "ERROR");
    }

    #[tokio::test]
    async fn attach_to_with_reason_shows_error() {
        let task = ProgressInstance::new("a")
            .attach_to_with_reason(async { Err::<(), _>("disk full") }, Some("fetched"));
        assert!(!settled(&task).await);
        assert_eq!(task.completion_message(), "disk full");

        let task = ProgressInstance::new("b")
            .attach_to_with_reason(async { Ok::<_, String>(()) }, Some("fetched"));
        assert!(settled(&task).await);
        assert_eq!(task.completion_message(), "fetched");
    }

    #[tokio::test]
    async fn attach_to_waits_for_settlement() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let task = ProgressInstance::new("a").attach_to(rx, None);
        tokio::task::yield_now().await;
        assert_eq!(task.is_stopped(), None);

        // A dropped sender settles the receiver with an error.
        drop(tx);
        assert!(!settled(&task).await);
    }
}
