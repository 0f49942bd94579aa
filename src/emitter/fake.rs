/*!
An in-memory emitter for tests.
*/

use std::sync::Mutex;

use crate::{Emitter, Error, ErrorKind, Event};

/**
An [`Emitter`] that records events instead of sending them.

A `FakeEmitter` can be shared between threads, typically through an [`std::sync::Arc`].
*/
#[derive(Default)]
pub struct FakeEmitter {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    messages: Vec<Event>,
    fail_next: bool,
    close_count: usize,
}

impl FakeEmitter {
    /**
    Create an empty emitter.
    */
    pub fn new() -> Self {
        FakeEmitter::default()
    }

    /**
    A snapshot of the events recorded so far, in the order they were emitted.
    */
    pub fn messages(&self) -> Vec<Event> {
        self.state().messages.clone()
    }

    /**
    Make the next call to [`Emitter::emit`] fail without recording its event.
    */
    pub fn fail_next(&self) {
        self.state().fail_next = true;
    }

    /**
    The number of times [`Emitter::close`] has been called.
    */
    pub fn close_count(&self) -> usize {
        self.state().close_count
    }

    /**
    Whether [`Emitter::close`] has been called.
    */
    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }

    fn state(&self) -> std::sync::MutexGuard<FakeState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl Emitter for FakeEmitter {
    fn emit(&self, evt: Event) -> Result<(), Error> {
        let mut state = self.state();

        if state.fail_next {
            state.fail_next = false;

            return Err(Error::msg(ErrorKind::Network, "failed to emit"));
        }

        state.messages.push(evt);

        Ok(())
    }

    fn close(&self) {
        self.state().close_count += 1;
    }
}
