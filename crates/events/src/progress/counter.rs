//! Lock-free byte accounting shared between a download worker and the reporter

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic byte counter with a read-and-reset delta.
///
/// The worker calls [`ByteCounter::add`] for every chunk; the reporter calls
/// [`ByteCounter::take_delta`] once per tick. Both are single atomic
/// operations, so an increment is counted in exactly one delta.
#[derive(Debug, Default)]
pub struct ByteCounter {
    total: AtomicU64,
    sampled: AtomicU64,
}

impl ByteCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` bytes and return the new total
    pub fn add(&self, n: u64) -> u64 {
        self.total.fetch_add(n, Ordering::Relaxed) + n
    }

    /// Total bytes observed so far
    #[must_use]
    pub fn get(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Total at the last `take_delta` call
    #[must_use]
    pub fn last_sampled(&self) -> u64 {
        self.sampled.load(Ordering::Relaxed)
    }

    /// Bytes added since the previous call, and mark the current total as sampled
    pub fn take_delta(&self) -> u64 {
        let current = self.total.load(Ordering::Acquire);
        let previous = self.sampled.fetch_max(current, Ordering::AcqRel);
        current.saturating_sub(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn delta_resets_after_read() {
        let counter = ByteCounter::new();
        counter.add(1_000);
        counter.add(500);
        assert_eq!(counter.get(), 1_500);
        assert_eq!(counter.take_delta(), 1_500);
        assert_eq!(counter.take_delta(), 0);
        counter.add(7);
        assert_eq!(counter.take_delta(), 7);
        assert_eq!(counter.last_sampled(), 1_507);
    }

    #[test]
    fn concurrent_adds_are_not_lost() {
        let counter = Arc::new(ByteCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    let mut seen = 0;
                    for _ in 0..10_000 {
                        counter.add(3);
                        seen += counter.take_delta();
                    }
                    seen
                })
            })
            .collect();

        let from_deltas: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        let remainder = counter.take_delta();
        assert_eq!(counter.get(), 8 * 10_000 * 3);
        assert_eq!(from_deltas + remainder, counter.get());
    }

    proptest! {
        #[test]
        fn deltas_sum_to_total(chunks in proptest::collection::vec((0u64..1_000_000, any::<bool>()), 0..200)) {
            let counter = ByteCounter::new();
            let mut sum = 0;
            for (n, sample) in chunks {
                counter.add(n);
                if sample {
                    sum += counter.take_delta();
                }
            }
            sum += counter.take_delta();
            prop_assert_eq!(sum, counter.get());
        }
    }
}
