use std::{
    sync::{Arc, Condvar, Mutex},
    time::Instant,
};

/**
A one-shot signal used to stop a background loop.

Once stopped, a signal can't be reset.
*/
#[derive(Clone)]
pub(crate) struct Stop(Arc<(Mutex<bool>, Condvar)>);

impl Stop {
    pub fn new() -> Self {
        Stop(Arc::new((Mutex::new(false), Condvar::new())))
    }

    /**
    Fire the signal, returning `false` if it had already been fired.
    */
    pub fn stop(&self) -> bool {
        let mut stopped = (self.0).0.lock().unwrap_or_else(|err| err.into_inner());

        if *stopped {
            return false;
        }

        *stopped = true;
        (self.0).1.notify_all();

        true
    }

    pub fn is_stopped(&self) -> bool {
        *(self.0).0.lock().unwrap_or_else(|err| err.into_inner())
    }

    /**
    Block until the signal fires or the deadline passes, returning whether the signal fired.
    */
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut stopped = (self.0).0.lock().unwrap_or_else(|err| err.into_inner());

        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            stopped = (self.0)
                .1
                .wait_timeout(stopped, deadline - now)
                .unwrap_or_else(|err| err.into_inner())
                .0;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{thread, time::Duration};

    #[test]
    fn wait_times_out() {
        let stop = Stop::new();

        assert!(!stop.wait_until(Instant::now() + Duration::from_millis(10)));
    }

    #[test]
    fn stop_wakes_waiters() {
        let stop = Stop::new();

        let waiter = {
            let stop = stop.clone();

            thread::spawn(move || stop.wait_until(Instant::now() + Duration::from_secs(60)))
        };

        assert!(stop.stop());
        assert!(!stop.stop());

        assert!(waiter.join().unwrap());
        assert!(stop.is_stopped());
    }
}
