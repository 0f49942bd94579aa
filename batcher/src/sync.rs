use std::{
    sync::{Condvar, Mutex, MutexGuard},
    time::Instant,
};

/**
Coordinates stopping the flush loop with the batcher waiting for it.

Stopping fires once. The loop then reports when it has finished its last flush.
*/
pub(crate) struct Signal {
    state: Mutex<State>,
    changed: Condvar,
    #[cfg(feature = "tokio")]
    pub(crate) notify: tokio::sync::Notify,
}

#[derive(Default)]
struct State {
    stopped: bool,
    finished: bool,
}

impl Signal {
    pub fn new() -> Self {
        Signal {
            state: Mutex::new(State::default()),
            changed: Condvar::new(),
            #[cfg(feature = "tokio")]
            notify: tokio::sync::Notify::new(),
        }
    }

    fn state(&self) -> MutexGuard<State> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn stop(&self) {
        let mut state = self.state();

        if state.stopped {
            return;
        }

        state.stopped = true;
        self.changed.notify_all();

        // Stores a permit if the loop isn't currently waiting
        #[cfg(feature = "tokio")]
        self.notify.notify_one();
    }

    #[cfg(feature = "tokio")]
    pub fn is_stopped(&self) -> bool {
        self.state().stopped
    }

    /**
    Block until stopped or the deadline passes, returning whether the signal was stopped.
    */
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut state = self.state();

        while !state.stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            state = self
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|err| err.into_inner())
                .0;
        }

        true
    }

    pub fn finish(&self) {
        self.state().finished = true;
        self.changed.notify_all();
    }

    pub fn wait_finished(&self) {
        let mut state = self.state();

        while !state.finished {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(|err| err.into_inner());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{sync::Arc, thread, time::Duration};

    #[test]
    fn wait_until_times_out() {
        let signal = Signal::new();

        assert!(!signal.wait_until(Instant::now() + Duration::from_millis(10)));
    }

    #[test]
    fn stop_then_finish() {
        let signal = Arc::new(Signal::new());

        let runner = {
            let signal = signal.clone();

            thread::spawn(move || {
                let stopped = signal.wait_until(Instant::now() + Duration::from_secs(60));
                signal.finish();

                stopped
            })
        };

        signal.stop();
        signal.stop();
        signal.wait_finished();

        assert!(runner.join().unwrap());
    }
}
