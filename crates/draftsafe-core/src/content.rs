//! Editor content access for the save path.

use std::sync::{Arc, RwLock};

/// Supplies the editor's current content when a save snapshots it
pub trait ContentSource: Send + Sync + 'static {
    fn snapshot(&self) -> String;
}

impl<F> ContentSource for F
where
    F: Fn() -> String + Send + Sync + 'static,
{
    fn snapshot(&self) -> String {
        self()
    }
}

/// Shared in-memory editor buffer
///
/// Cloning yields another handle to the same buffer, so an editor surface can
/// write while the scheduler snapshots.
#[derive(Debug, Clone, Default)]
pub struct EditorBuffer {
    inner: Arc<RwLock<String>>,
}

impl EditorBuffer {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial.into())),
        }
    }

    /// Replace the buffer contents
    pub fn set(&self, content: impl Into<String>) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = content.into();
    }

    pub fn get(&self) -> String {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ContentSource for EditorBuffer {
    fn snapshot(&self) -> String {
        self.get()
    }
}
