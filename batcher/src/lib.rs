/*!
Coalesce counter increments into periodic flushes.

A [`MetricBatcher`] accumulates deltas for named counters in memory, and a background loop hands the accumulated delta for each counter to a [`CounterSender`] once per interval. However often a counter is incremented, it's sent at most once per interval.

```no_run
# fn main() -> Result<(), sonde::Error> {
use std::time::Duration;

let init = sonde::Setup::from_env()?.init()?;

let batcher = sonde_batcher::MetricBatcher::spawn(init.metric_sender(), Duration::from_secs(5))?;

for _ in 0..1000 {
    batcher.batch_increment_counter("requests");
}

// Flush anything outstanding and stop the background loop
batcher.close();
# Ok(())
# }
```
*/

use std::{
    collections::HashMap,
    future::{self, Future},
    mem,
    pin::pin,
    sync::{Arc, Mutex, MutexGuard, OnceLock},
    task, thread,
    time::{Duration, Instant},
};

use sonde::{CounterSender, Error, ErrorKind};

use crate::{internal_metrics::InternalMetrics, sync::Signal};

mod internal_metrics;
mod sync;

#[cfg(feature = "tokio")]
pub mod tokio;

pub use self::internal_metrics::Metrics;

/**
Accumulates counter deltas and flushes them to a [`CounterSender`] on an interval.

Dropping the batcher closes it.
*/
pub struct MetricBatcher {
    shared: Arc<Shared>,
    wait_finished: fn(&Shared),
}

pub(crate) struct Shared {
    counters: Mutex<HashMap<String, u64>>,
    signal: Signal,
    metrics: InternalMetrics,
}

pub(crate) struct Flusher {
    shared: Arc<Shared>,
    interval: Duration,
    _finish: Finish,
}

impl MetricBatcher {
    /**
    Start flushing accumulated deltas to `sender` every `interval` on a dedicated thread.

    This method fails with [`ErrorKind::Config`] if the interval is zero.
    */
    pub fn spawn(
        sender: impl CounterSender + Send + 'static,
        interval: Duration,
    ) -> Result<Self, Error> {
        let (batcher, flusher) = MetricBatcher::new(interval, Shared::wait_finished)?;

        thread::spawn(move || flusher.blocking_exec(sender));

        Ok(batcher)
    }

    pub(crate) fn new(
        interval: Duration,
        wait_finished: fn(&Shared),
    ) -> Result<(Self, Flusher), Error> {
        if interval.is_zero() {
            return Err(Error::msg(
                ErrorKind::Config,
                "the flush interval must be non-zero",
            ));
        }

        let shared = Arc::new(Shared {
            counters: Mutex::new(HashMap::new()),
            signal: Signal::new(),
            metrics: InternalMetrics::default(),
        });

        Ok((
            MetricBatcher {
                shared: shared.clone(),
                wait_finished,
            },
            Flusher {
                shared: shared.clone(),
                interval,
                _finish: Finish(shared),
            },
        ))
    }

    /**
    Add one to the counter called `name`.
    */
    pub fn batch_increment_counter(&self, name: &str) {
        self.batch_add_counter(name, 1);
    }

    /**
    Add `delta` to the counter called `name`.

    Nothing is sent until the next flush. Deltas added after the batcher is closed are never sent.
    */
    pub fn batch_add_counter(&self, name: &str, delta: u64) {
        let mut counters = self.shared.counters();

        match counters.get_mut(name) {
            Some(total) => *total = total.saturating_add(delta),
            None => {
                counters.insert(name.to_owned(), delta);
            }
        }
    }

    /**
    Discard all deltas accumulated since the last flush without sending them.
    */
    pub fn reset(&self) {
        self.shared.counters().clear();
    }

    /**
    Stop the background loop after one final flush.

    When this method returns, every delta added before the call has been handed to the sender. Calling `close` more than once has no further effect.
    */
    pub fn close(&self) {
        self.shared.signal.stop();

        (self.wait_finished)(&self.shared);
    }

    /**
    Sample counts describing the work the batcher has done.
    */
    pub fn metrics(&self) -> Metrics {
        self.shared.metrics.sample()
    }
}

impl Drop for MetricBatcher {
    fn drop(&mut self) {
        self.close();
    }
}

impl Shared {
    fn counters(&self) -> MutexGuard<HashMap<String, u64>> {
        self.counters.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub(crate) fn wait_finished(&self) {
        self.signal.wait_finished()
    }

    fn flush(&self, sender: &impl CounterSender) {
        // Swap under the lock so increments made while sending land in the next flush
        let pending = mem::take(&mut *self.counters());

        for (name, delta) in pending {
            match sender.add_to_counter(&name, delta) {
                Ok(()) => self.metrics.counter_flushed.increment(),
                Err(err) => {
                    self.metrics.counter_flush_failed.increment();

                    emit::warn!(
                        rt: emit::runtime::internal(),
                        "failed to flush {delta} to {name}: {err}",
                        delta,
                        #[emit::as_display]
                        name,
                        err,
                    );
                }
            }
        }

        self.metrics.flush_processed.increment();
    }
}

// Waiters are released when the flusher is dropped, even if it never ran
struct Finish(Arc<Shared>);

impl Drop for Finish {
    fn drop(&mut self) {
        self.0.signal.finish();
    }
}

impl Flusher {
    pub(crate) fn blocking_exec(self, sender: impl CounterSender) {
        static WAKER: OnceLock<Arc<NeverWake>> = OnceLock::new();

        // The waits driven here block the thread instead of yielding,
        // so there's never any notifications to issue
        struct NeverWake;

        impl task::Wake for NeverWake {
            fn wake(self: Arc<Self>) {}
        }

        let shared = self.shared.clone();

        let mut fut = pin!(self.exec(sender, |deadline| future::ready(
            shared.signal.wait_until(deadline)
        )));

        let waker = WAKER.get_or_init(|| Arc::new(NeverWake)).clone().into();
        let mut cx = task::Context::from_waker(&waker);

        loop {
            match fut.as_mut().poll(&mut cx) {
                task::Poll::Ready(()) => return,
                task::Poll::Pending => continue,
            }
        }
    }

    pub(crate) async fn exec<F: Future<Output = bool>>(
        self,
        sender: impl CounterSender,
        mut wait: impl FnMut(Instant) -> F,
    ) {
        let mut deadline = Instant::now() + self.interval;

        loop {
            let stopped = wait(deadline).await;

            if !stopped {
                deadline += self.interval;

                let now = Instant::now();
                if deadline <= now {
                    deadline = now + self.interval;
                }
            }

            self.shared.flush(&sender);

            if stopped {
                emit::debug!(
                    rt: emit::runtime::internal(),
                    "stopped flushing batched counters",
                );

                return;
            }
        }
    }
}
