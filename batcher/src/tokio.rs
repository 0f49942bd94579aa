/*!
Run the flush loop in a `tokio` runtime.
*/

use std::{sync::Arc, time::Duration, time::Instant};

use sonde::{CounterSender, Error};

use crate::{MetricBatcher, Shared};

/**
Start flushing accumulated deltas to `sender` every `interval` on a `tokio` runtime.

If the current thread is a `tokio` thread, then the flush loop will be spawned onto its runtime. If the current thread is not a `tokio` thread, then a single-threaded `tokio` runtime will be set up in a dedicated thread to run it.

Closing the batcher from a thread on a multi-threaded runtime uses [`tokio::task::block_in_place`] to wait for the final flush. Closing it from a thread on a single-threaded runtime doesn't wait, since the loop needs that same thread to finish. If the runtime shuts down before the loop completes, closing doesn't wait and any pending deltas are discarded.

This function fails with [`sonde::ErrorKind::Config`] if the interval is zero.
*/
pub fn spawn(
    sender: impl CounterSender + Send + 'static,
    interval: Duration,
) -> Result<MetricBatcher, Error> {
    let (batcher, flusher) = MetricBatcher::new(interval, wait_finished)?;

    let shared = flusher.shared.clone();

    let flush = async move {
        flusher
            .exec(sender, move |deadline| wait_until(shared.clone(), deadline))
            .await
    };

    match tokio::runtime::Handle::try_current() {
        // If we're on a `tokio` thread then spawn on it
        Ok(handle) => {
            handle.spawn(flush);
        }
        // If we're not on a `tokio` thread then spawn a
        // background thread and run the work there
        Err(_) => {
            std::thread::spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt.block_on(flush),
                    // Dropping the flush loop unpolled releases any waiters
                    Err(err) => {
                        emit::warn!(
                            rt: emit::runtime::internal(),
                            "failed to start a runtime for batched counters: {err}",
                            err,
                        );
                    }
                }
            });
        }
    }

    Ok(batcher)
}

async fn wait_until(shared: Arc<Shared>, deadline: Instant) -> bool {
    let _ = tokio::time::timeout_at(
        tokio::time::Instant::from_std(deadline),
        shared.signal.notify.notified(),
    )
    .await;

    shared.signal.is_stopped()
}

fn wait_finished(shared: &Shared) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| shared.wait_finished())
        }
        Ok(_) => (),
        Err(_) => shared.wait_finished(),
    }
}
