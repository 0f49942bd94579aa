/*!
Periodically emit heartbeats describing an emitter's own counts.

Use [`generator`] to start sending heartbeats from any [`HeartbeatSource`] to a destination [`Emitter`]:

```no_run
# fn main() -> Result<(), sonde::Error> {
use std::{sync::Arc, time::Duration};

use sonde::{heartbeat, Identity, InstrumentedEmitter, UdpEmitter};

let identity = Identity::new("my-app", "cf", "web", "0");

let emitter = Arc::new(InstrumentedEmitter::new(UdpEmitter::new("localhost:42420", identity.clone())?));

let generation = heartbeat::generator(emitter.clone(), UdpEmitter::new("localhost:42420", identity)?)
    .interval(Duration::from_secs(30))
    .spawn()?;

// Emit events through `emitter`

// Stop sending heartbeats and close the destination
generation.close();
# Ok(())
# }
```

For the common case of sending heartbeats for an emitter through the emitter itself, see [`HeartbeatEmitter`].
*/

use std::{
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use crate::{
    stop::Stop, Counts, Emitter, Error, ErrorKind, Event, HeartbeatSource, InstrumentedEmitter,
};

/**
The default time between heartbeats.
*/
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/**
Start building a heartbeat generator.

Heartbeats are pulled from `source` and sent to `destination`. The generator owns `destination` and closes it when generation stops.
*/
pub fn generator<S: HeartbeatSource, E: Emitter>(
    source: S,
    destination: E,
) -> GeneratorBuilder<S, E> {
    GeneratorBuilder {
        source,
        destination,
        interval: DEFAULT_INTERVAL,
    }
}

/**
A builder for a heartbeat generator.
*/
#[must_use = "call `.spawn()` to start sending heartbeats"]
pub struct GeneratorBuilder<S, E> {
    source: S,
    destination: E,
    interval: Duration,
}

impl<S: HeartbeatSource + Send + 'static, E: Emitter + Send + 'static> GeneratorBuilder<S, E> {
    /**
    Set the time between heartbeats.

    The interval is fixed once generation starts, and must be non-zero.
    */
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /**
    Start sending heartbeats on a background thread.

    The first heartbeat is sent after one interval. This method fails with [`ErrorKind::Config`] if the interval is zero.
    */
    pub fn spawn(self) -> Result<Generation, Error> {
        check_interval(self.interval)?;

        Ok(self.spawn_generation())
    }

    fn spawn_generation(self) -> Generation {
        let stop = Stop::new();

        let handle = thread::spawn({
            let stop = stop.clone();

            move || run(self.source, self.destination, self.interval, stop)
        });

        Generation {
            stop,
            thread: handle.thread().id(),
            handle: Mutex::new(Some(handle)),
        }
    }
}

pub(crate) fn check_interval(interval: Duration) -> Result<(), Error> {
    if interval.is_zero() {
        return Err(Error::msg(
            ErrorKind::Config,
            "the heartbeat interval must be non-zero",
        ));
    }

    Ok(())
}

/**
A handle to a running heartbeat generator.

Generation stops when [`Generation::close`] is called or the handle is dropped. A stopped generator can't be restarted.
*/
pub struct Generation {
    stop: Stop,
    thread: thread::ThreadId,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Generation {
    /**
    Stop sending heartbeats.

    When this method returns, the destination emitter has been closed, including when another thread is closing concurrently. Calling `close` more than once has no further effect.
    */
    pub fn close(&self) {
        self.stop.stop();

        // The destination may close its own generation from the loop
        if self.thread == thread::current().id() {
            return;
        }

        // Concurrent callers wait here until the generator has exited
        let mut handle = self.handle.lock().unwrap_or_else(|err| err.into_inner());

        if let Some(handle) = handle.take() {
            let _ = handle.join();
        }
    }

    /**
    Whether generation has been stopped.
    */
    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }
}

impl Drop for Generation {
    fn drop(&mut self) {
        self.close();
    }
}

struct CloseOnExit<E: Emitter>(E);

impl<E: Emitter> Drop for CloseOnExit<E> {
    fn drop(&mut self) {
        self.0.close();
    }
}

fn run<S: HeartbeatSource, E: Emitter>(source: S, destination: E, interval: Duration, stop: Stop) {
    let destination = CloseOnExit(destination);

    let mut deadline = Instant::now() + interval;

    while !stop.wait_until(deadline) {
        deadline += interval;

        // Skip missed ticks instead of sending a burst of them
        let now = Instant::now();
        if deadline <= now {
            deadline = now + interval;
        }

        if let Err(err) = destination.0.emit(source.heartbeat_event()) {
            emit::warn!(
                rt: emit::runtime::internal(),
                "failed to emit heartbeat: {err}",
                err,
            );
        }
    }

    emit::debug!(
        rt: emit::runtime::internal(),
        "stopped heartbeat generation",
    );
}

/**
An [`Emitter`] that counts its events and periodically reports them as heartbeats.

Heartbeats are sent through the wrapped emitter directly, so they aren't counted themselves.
*/
pub struct HeartbeatEmitter<E> {
    instrumented: Arc<InstrumentedEmitter<Arc<E>>>,
    generation: Generation,
}

impl<E: Emitter + Send + Sync + 'static> HeartbeatEmitter<E> {
    /**
    Wrap an emitter, sending heartbeats through it every [`DEFAULT_INTERVAL`].
    */
    pub fn new(inner: E) -> Self {
        HeartbeatEmitter::start(inner, DEFAULT_INTERVAL)
    }

    /**
    Wrap an emitter, sending heartbeats through it every `interval`.

    This method fails with [`ErrorKind::Config`] if the interval is zero.
    */
    pub fn with_interval(inner: E, interval: Duration) -> Result<Self, Error> {
        check_interval(interval)?;

        Ok(HeartbeatEmitter::start(inner, interval))
    }

    fn start(inner: E, interval: Duration) -> Self {
        let inner = Arc::new(inner);
        let instrumented = Arc::new(InstrumentedEmitter::new(inner.clone()));

        let generation = generator(instrumented.clone(), inner)
            .interval(interval)
            .spawn_generation();

        HeartbeatEmitter {
            instrumented,
            generation,
        }
    }

    /**
    Send a heartbeat immediately, outside of the regular interval.
    */
    pub fn respond_to_ping(&self) -> Result<(), Error> {
        self.instrumented
            .inner()
            .emit(self.instrumented.heartbeat_event())
    }

    /**
    A snapshot of the counts of events emitted so far.
    */
    pub fn counts(&self) -> Counts {
        self.instrumented.counts()
    }
}

impl<E: Emitter> Emitter for HeartbeatEmitter<E> {
    fn emit(&self, evt: Event) -> Result<(), Error> {
        self.instrumented.emit(evt)
    }

    fn close(&self) {
        // Stopping generation closes the wrapped emitter
        self.generation.close();
    }
}

impl<E: Emitter> HeartbeatSource for HeartbeatEmitter<E> {
    fn heartbeat_event(&self) -> Event {
        self.instrumented.heartbeat_event()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{
        emitter::FakeEmitter,
        event::{CounterEvent, Heartbeat},
        ErrorKind,
    };

    struct Failing {
        attempts: AtomicUsize,
    }

    impl Emitter for Failing {
        fn emit(&self, _: Event) -> Result<(), Error> {
            self.attempts.fetch_add(1, Ordering::Relaxed);

            Err(Error::msg(ErrorKind::Network, "unreachable"))
        }

        fn close(&self) {}
    }

    struct SlowClose {
        closed: AtomicUsize,
    }

    impl Emitter for SlowClose {
        fn emit(&self, _: Event) -> Result<(), Error> {
            Ok(())
        }

        fn close(&self) {
            thread::sleep(Duration::from_millis(100));

            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn emits_heartbeats_on_interval() {
        let source = Arc::new(InstrumentedEmitter::new(FakeEmitter::new()));
        let destination = Arc::new(FakeEmitter::new());

        let generation = generator(source.clone(), destination.clone())
            .interval(Duration::from_millis(100))
            .spawn()
            .unwrap();

        thread::sleep(Duration::from_millis(250));
        generation.close();

        let messages = destination.messages();

        assert!(messages.len() >= 2, "{}", messages.len());
        assert!(messages
            .iter()
            .all(|evt| matches!(evt, Event::Heartbeat(_))));
    }

    #[test]
    fn heartbeats_carry_source_counts() {
        let source = Arc::new(InstrumentedEmitter::new(FakeEmitter::new()));
        let destination = Arc::new(FakeEmitter::new());

        source.emit(CounterEvent::new("x", 1).into()).unwrap();

        let generation = generator(source.clone(), destination.clone())
            .interval(Duration::from_millis(20))
            .spawn()
            .unwrap();

        while destination.messages().is_empty() {
            thread::sleep(Duration::from_millis(5));
        }
        generation.close();

        assert_eq!(
            Event::from(Heartbeat::new(1, 1, 0)),
            destination.messages()[0]
        );
    }

    #[test]
    fn closes_destination_exactly_once() {
        let source = Arc::new(InstrumentedEmitter::new(FakeEmitter::new()));
        let destination = Arc::new(FakeEmitter::new());

        let generation = generator(source, destination.clone())
            .interval(Duration::from_millis(10))
            .spawn()
            .unwrap();

        assert!(!generation.is_stopped());

        generation.close();
        generation.close();
        assert!(generation.is_stopped());

        drop(generation);

        assert_eq!(1, destination.close_count());
    }

    #[test]
    fn dropping_generation_stops_it() {
        let source = Arc::new(InstrumentedEmitter::new(FakeEmitter::new()));
        let destination = Arc::new(FakeEmitter::new());

        drop(generator(source, destination.clone()).spawn().unwrap());

        assert_eq!(1, destination.close_count());
    }

    #[test]
    fn emit_failures_do_not_stop_generation() {
        let source = Arc::new(InstrumentedEmitter::new(FakeEmitter::new()));
        let destination = Arc::new(Failing {
            attempts: AtomicUsize::new(0),
        });

        let generation = generator(source, destination.clone())
            .interval(Duration::from_millis(20))
            .spawn()
            .unwrap();

        while destination.attempts.load(Ordering::Relaxed) < 3 {
            thread::sleep(Duration::from_millis(5));
        }

        assert!(!generation.is_stopped());
        generation.close();
    }

    #[test]
    fn heartbeat_emitter_does_not_count_heartbeats() {
        let inner = Arc::new(FakeEmitter::new());

        let emitter =
            HeartbeatEmitter::with_interval(inner.clone(), Duration::from_secs(3600)).unwrap();

        emitter.emit(CounterEvent::new("x", 1).into()).unwrap();
        emitter.emit(CounterEvent::new("y", 1).into()).unwrap();

        emitter.respond_to_ping().unwrap();

        let messages = inner.messages();

        assert_eq!(3, messages.len());
        assert_eq!(Event::from(Heartbeat::new(2, 2, 0)), messages[2]);
        assert_eq!(
            Counts {
                sent: 2,
                received: 2,
                error: 0,
            },
            emitter.counts()
        );
    }

    #[test]
    fn heartbeat_emitter_closes_inner_once() {
        let inner = Arc::new(FakeEmitter::new());

        let emitter =
            HeartbeatEmitter::with_interval(inner.clone(), Duration::from_secs(3600)).unwrap();

        emitter.close();
        emitter.close();
        drop(emitter);

        assert_eq!(1, inner.close_count());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let source = Arc::new(InstrumentedEmitter::new(FakeEmitter::new()));
        let destination = Arc::new(FakeEmitter::new());

        let err = generator(source, destination.clone())
            .interval(Duration::ZERO)
            .spawn()
            .err()
            .unwrap();

        assert_eq!(ErrorKind::Config, err.kind());

        let err = HeartbeatEmitter::with_interval(FakeEmitter::new(), Duration::ZERO)
            .err()
            .unwrap();

        assert_eq!(ErrorKind::Config, err.kind());
    }

    #[test]
    fn concurrent_close_waits_for_destination() {
        let source = Arc::new(InstrumentedEmitter::new(FakeEmitter::new()));
        let destination = Arc::new(SlowClose {
            closed: AtomicUsize::new(0),
        });

        let generation = Arc::new(
            generator(source, destination.clone())
                .interval(Duration::from_secs(3600))
                .spawn()
                .unwrap(),
        );

        let closers = (0..2)
            .map(|_| {
                let generation = generation.clone();
                let destination = destination.clone();

                thread::spawn(move || {
                    generation.close();

                    destination.closed.load(Ordering::SeqCst)
                })
            })
            .collect::<Vec<_>>();

        for closer in closers {
            assert_eq!(1, closer.join().unwrap());
        }
    }
}
