/*!
The [`Emitter`] trait and its network transports.

An emitter accepts [`Event`]s and sends them somewhere. The transports in this module wrap each event in an [`crate::Envelope`] before sending it:

- [`UdpEmitter`]: sends one datagram per event.
- [`TcpEmitter`]: dials a new connection per event.

Emitters compose by wrapping. See [`crate::InstrumentedEmitter`] for counting emitted events.
*/

use std::{sync::Arc, time::Duration};

use crate::{Error, Event};

pub mod fake;
pub mod tcp;
pub mod udp;

pub use self::{fake::FakeEmitter, tcp::TcpEmitter, udp::UdpEmitter};

/**
The default timeout applied to network reads and writes.
*/
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/**
A destination for events.

Emitting is synchronous. [`Emitter::emit`] blocks the calling thread until the event has been handed to the transport or has failed.
*/
pub trait Emitter {
    /**
    Send an event.

    Failures are returned to the caller and aren't retried.
    */
    fn emit(&self, evt: Event) -> Result<(), Error>;

    /**
    Release any resources held by the emitter.

    Calling `close` more than once must not panic. Emitting after `close` returns an error.
    */
    fn close(&self);
}

impl<'a, T: Emitter + ?Sized> Emitter for &'a T {
    fn emit(&self, evt: Event) -> Result<(), Error> {
        (**self).emit(evt)
    }

    fn close(&self) {
        (**self).close()
    }
}

impl<'a, T: Emitter + ?Sized + 'a> Emitter for Box<T> {
    fn emit(&self, evt: Event) -> Result<(), Error> {
        (**self).emit(evt)
    }

    fn close(&self) {
        (**self).close()
    }
}

impl<'a, T: Emitter + ?Sized + 'a> Emitter for Arc<T> {
    fn emit(&self, evt: Event) -> Result<(), Error> {
        (**self).emit(evt)
    }

    fn close(&self) {
        (**self).close()
    }
}
