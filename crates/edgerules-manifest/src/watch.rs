//! Change-notification types for development mode.
//!
//! The compiler itself never watches anything; [`DevPageSource::watch`]
//! (see [`crate::DevPageSource`]) hands the host a receiver, and the host
//! decides when to trigger a recompile from the drained events.

use std::path::PathBuf;
use std::sync::mpsc;

/// Kind of source-tree change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// A page source file appeared.
    Created,
    /// A page source file changed.
    Modified,
    /// A page source file was deleted.
    Removed,
}

/// A debounced source-tree change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Path relative to the watched source directory.
    pub path: PathBuf,
    /// Kind of change.
    pub kind: ChangeKind,
}

/// Receiver for source-tree changes.
///
/// Wraps an [`mpsc::Receiver`] for synchronous delivery; poll with
/// [`recv`](Self::recv)/[`try_recv`](Self::try_recv) or iterate.
pub struct ChangeReceiver {
    rx: mpsc::Receiver<ChangeEvent>,
}

impl ChangeReceiver {
    pub(crate) fn new(rx: mpsc::Receiver<ChangeEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next change (blocking). `None` once the watcher stops.
    #[must_use]
    pub fn recv(&self) -> Option<ChangeEvent> {
        self.rx.recv().ok()
    }

    /// Receive a change without blocking.
    #[must_use]
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    /// Iterate over changes, blocking between them.
    pub fn iter(&self) -> impl Iterator<Item = ChangeEvent> + '_ {
        self.rx.iter()
    }
}

/// Handle keeping a watcher alive.
///
/// Dropping the handle stops the watcher thread; [`stop`](Self::stop) does
/// so explicitly.
pub struct WatchHandle {
    _shutdown: Option<mpsc::Sender<()>>,
}

impl WatchHandle {
    pub(crate) fn new(shutdown: mpsc::Sender<()>) -> Self {
        Self {
            _shutdown: Some(shutdown),
        }
    }

    /// Stop watching (consumes the handle).
    pub fn stop(mut self) {
        self._shutdown.take();
    }
}
