//! Search input debouncing.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Lets only the last of a burst of inputs through.
///
/// Each call to [`settle`](Self::settle) waits out the delay and yields its
/// value only if no newer call started in the meantime. Clones share state.
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn settle<T>(&self, value: T) -> Option<T> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        (self.generation.load(Ordering::SeqCst) == ticket).then_some(value)
    }
}
