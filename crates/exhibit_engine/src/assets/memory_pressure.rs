//! Memory pressure handling
//!
//! The host forwards platform low-memory notifications through a
//! [`MemoryPressureSignal`]. A [`MemoryPressureObserver`] listens on a
//! background thread and flushes its target on every signal.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{select, unbounded, Receiver, Sender};

/// Something that can drop all of its cached state on demand
pub trait Evictable: Send + Sync {
    /// Drop everything that can be reloaded later
    fn evict_all(&self);
}

/// Host-facing sender for memory pressure notifications
#[derive(Debug, Clone)]
pub struct MemoryPressureSignal {
    sender: Sender<()>,
}

impl MemoryPressureSignal {
    /// Report memory pressure
    ///
    /// Returns `false` once the observer that created this signal is gone.
    pub fn notify(&self) -> bool {
        self.sender.send(()).is_ok()
    }
}

struct Listener {
    shutdown: Sender<()>,
    join: JoinHandle<()>,
}

/// Flushes an [`Evictable`] whenever memory pressure is signalled
pub struct MemoryPressureObserver {
    sender: Sender<()>,
    receiver: Receiver<()>,
    handled: Arc<AtomicUsize>,
    listener: Option<Listener>,
}

impl Default for MemoryPressureObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPressureObserver {
    /// Create an observer that is not listening yet
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            handled: Arc::new(AtomicUsize::new(0)),
            listener: None,
        }
    }

    /// Sender the host uses to report memory pressure
    pub fn signal(&self) -> MemoryPressureSignal {
        MemoryPressureSignal {
            sender: self.sender.clone(),
        }
    }

    /// Start listening, evicting `target` on every signal
    ///
    /// Returns `false` and keeps the current listener if one is running.
    pub fn start(&mut self, target: Arc<dyn Evictable>) -> bool {
        if self.listener.is_some() {
            log::debug!("Memory pressure observer already running");
            return false;
        }

        let (shutdown, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let pressure = self.receiver.clone();
        let handled = Arc::clone(&self.handled);

        let spawned = thread::Builder::new()
            .name("memory-pressure".to_string())
            .spawn(move || loop {
                select! {
                    recv(pressure) -> message => match message {
                        Ok(()) => {
                            log::info!("Memory pressure signalled, evicting cached prototypes");
                            target.evict_all();
                            handled.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(_) => break,
                    },
                    recv(shutdown_rx) -> _ => break,
                }
            });

        match spawned {
            Ok(join) => {
                self.listener = Some(Listener { shutdown, join });
                true
            }
            Err(e) => {
                log::error!("Failed to start memory pressure observer: {}", e);
                false
            }
        }
    }

    /// Stop listening and wait for the listener thread to exit
    ///
    /// Signals sent while stopped queue up until the next `start`.
    pub fn stop(&mut self) {
        if let Some(listener) = self.listener.take() {
            drop(listener.shutdown);
            if listener.join.join().is_err() {
                log::error!("Memory pressure listener panicked");
            }
        }
    }

    /// Whether a listener is running
    pub fn is_running(&self) -> bool {
        self.listener.is_some()
    }

    /// Number of signals handled so far
    pub fn handled_count(&self) -> usize {
        self.handled.load(Ordering::SeqCst)
    }
}

impl Drop for MemoryPressureObserver {
    fn drop(&mut self) {
        self.stop();
    }
}
