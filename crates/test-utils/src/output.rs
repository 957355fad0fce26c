use std::sync::Arc;

use parking_lot::Mutex;

/// Shared, append-only string that tasks write into, so tests can assert on
/// the order in which tasks ran.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    inner: Arc<Mutex<String>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, s: &str) {
        self.inner.lock().push_str(s);
    }

    pub fn contents(&self) -> String {
        self.inner.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
