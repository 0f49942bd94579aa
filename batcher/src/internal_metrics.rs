use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub(crate) struct InternalMetrics {
    pub(crate) counter_flushed: Counter,
    pub(crate) counter_flush_failed: Counter,
    pub(crate) flush_processed: Counter,
}

#[derive(Default)]
pub(crate) struct Counter(AtomicUsize);

impl Counter {
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sample(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/**
Counts describing the work done by a [`crate::MetricBatcher`].
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct Metrics {
    /**
    Flushes that have run, including ones with nothing to send.
    */
    pub flush_processed: usize,
    /**
    Counter deltas handed to the sender successfully.
    */
    pub counter_flushed: usize,
    /**
    Counter deltas the sender failed to accept.
    */
    pub counter_flush_failed: usize,
}

impl InternalMetrics {
    pub fn sample(&self) -> Metrics {
        let InternalMetrics {
            counter_flushed,
            counter_flush_failed,
            flush_processed,
        } = self;

        Metrics {
            flush_processed: flush_processed.sample(),
            counter_flushed: counter_flushed.sample(),
            counter_flush_failed: counter_flush_failed.sample(),
        }
    }
}
