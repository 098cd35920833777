//! Cooperative background tasks
//!
//! A task is a named worker thread paired with a shared exit flag. Loops
//! running inside a task poll the flag between ticks and return on their own;
//! nothing is ever interrupted mid-write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Shared cancellation flag handed to a running task
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    exit: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the running state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the task to stop at its next poll
    pub fn cancel(&self) {
        self.exit.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.exit.load(Ordering::SeqCst)
    }
}

/// Handle to a spawned task
#[derive(Debug)]
pub struct TaskHandle {
    name: String,
    token: CancelToken,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// Spawn `body` on a named worker thread
    pub fn spawn<F>(name: &str, body: F) -> Self
    where
        F: FnOnce(CancelToken) + Send + 'static,
    {
        let token = CancelToken::new();
        let worker_token = token.clone();

        let join = match thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(worker_token))
        {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to spawn task '{}': {}", name, e);
                None
            }
        };

        Self {
            name: name.to_string(),
            token,
            join,
        }
    }

    /// Task name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request cancellation without waiting
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the task body has returned
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the task body to return
    pub fn join(mut self) {
        self.join_inner();
    }

    fn join_inner(&mut self) {
        if let Some(handle) = self.join.take() {
            if handle.join().is_err() {
                log::error!("Task '{}' panicked", self.name);
            }
        }
    }
}

/// Holds at most one running task
///
/// Starting a new task cancels and joins the previous one first, so two
/// tasks from the same slot never write concurrently.
#[derive(Debug, Default)]
pub struct TaskSlot {
    current: Option<TaskHandle>,
}

impl TaskSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the running task (if any), wait for it, then start `body`
    pub fn start<F>(&mut self, name: &str, body: F)
    where
        F: FnOnce(CancelToken) + Send + 'static,
    {
        self.cancel();
        self.current = Some(TaskHandle::spawn(name, body));
    }

    /// Cancel the running task and wait for it to exit
    pub fn cancel(&mut self) {
        if let Some(task) = self.current.take() {
            task.cancel();
            log::trace!("Cancelled task '{}'", task.name());
            task.join();
        }
    }

    /// Whether a task is still running
    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Wait for the running task to finish on its own
    pub fn wait(&mut self) {
        if let Some(task) = self.current.take() {
            task.join();
        }
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
