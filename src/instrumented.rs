/*!
Count the events passing through an emitter.
*/

use std::sync::{Arc, Mutex};

use crate::{event::Heartbeat, Emitter, Error, Event};

/**
A snapshot of the counts tracked by an [`InstrumentedEmitter`].
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /**
    Events the inner emitter accepted.
    */
    pub sent: u64,
    /**
    Events given to the emitter.
    */
    pub received: u64,
    /**
    Events the inner emitter failed to send.
    */
    pub error: u64,
}

/**
A source of heartbeat events.
*/
pub trait HeartbeatSource {
    /**
    Build a heartbeat describing the current state of the source.
    */
    fn heartbeat_event(&self) -> Event;
}

impl<'a, T: HeartbeatSource + ?Sized> HeartbeatSource for &'a T {
    fn heartbeat_event(&self) -> Event {
        (**self).heartbeat_event()
    }
}

impl<T: HeartbeatSource + ?Sized> HeartbeatSource for Arc<T> {
    fn heartbeat_event(&self) -> Event {
        (**self).heartbeat_event()
    }
}

/**
An [`Emitter`] that counts the events it receives, sends and fails to send.

Counts only ever increase. After any call to [`Emitter::emit`] completes, `received == sent + error`.
*/
pub struct InstrumentedEmitter<E> {
    inner: E,
    counts: Mutex<Counts>,
}

impl<E: Emitter> InstrumentedEmitter<E> {
    /**
    Wrap an emitter, starting all counts at zero.
    */
    pub fn new(inner: E) -> Self {
        InstrumentedEmitter {
            inner,
            counts: Mutex::new(Counts::default()),
        }
    }

    /**
    A consistent snapshot of the current counts.
    */
    pub fn counts(&self) -> Counts {
        *self.counts.lock().unwrap_or_else(|err| err.into_inner())
    }

    /**
    The wrapped emitter.
    */
    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: Emitter> Emitter for InstrumentedEmitter<E> {
    fn emit(&self, evt: Event) -> Result<(), Error> {
        // The lock is held across the inner call so snapshots never see
        // an event that's been received but not yet sent or failed
        let mut counts = self.counts.lock().unwrap_or_else(|err| err.into_inner());

        counts.received += 1;

        let result = self.inner.emit(evt);

        match result {
            Ok(()) => counts.sent += 1,
            Err(_) => counts.error += 1,
        }

        result
    }

    fn close(&self) {
        self.inner.close()
    }
}

impl<E: Emitter> HeartbeatSource for InstrumentedEmitter<E> {
    fn heartbeat_event(&self) -> Event {
        let counts = self.counts();

        Heartbeat::new(counts.sent, counts.received, counts.error).into()
    }
}
