//! Observable value holder used for the view state.

use tokio::sync::watch;

/// Single-writer, multi-reader slot that notifies subscribers on every write.
///
/// The slot starts empty. Writing an equal value still counts as a change.
#[derive(Debug)]
pub struct LiveData<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T> LiveData<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn set(&self, value: Option<T>) {
        self.tx.send_replace(value);
    }

    /// The returned receiver starts with the current value marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.tx.subscribe()
    }
}

impl<T: Clone> LiveData<T> {
    pub fn get(&self) -> Option<T> {
        self.tx.borrow().clone()
    }
}

impl<T> Default for LiveData<T> {
    fn default() -> Self {
        Self::new()
    }
}
