/*!
Send metric events through an emitter.
*/

use std::sync::Arc;

use crate::{
    event::{ContainerMetric, CounterEvent, ValueMetric},
    Emitter, Error,
};

/**
A destination for counter deltas.

This is the interface batched counters are flushed to.
*/
pub trait CounterSender {
    /**
    Add `delta` to the counter called `name`.
    */
    fn add_to_counter(&self, name: &str, delta: u64) -> Result<(), Error>;
}

impl<'a, T: CounterSender + ?Sized> CounterSender for &'a T {
    fn add_to_counter(&self, name: &str, delta: u64) -> Result<(), Error> {
        (**self).add_to_counter(name, delta)
    }
}

impl<T: CounterSender + ?Sized> CounterSender for Arc<T> {
    fn add_to_counter(&self, name: &str, delta: u64) -> Result<(), Error> {
        (**self).add_to_counter(name, delta)
    }
}

/**
Sends value, counter and container metrics through an [`Emitter`].
*/
pub struct MetricSender<E> {
    emitter: E,
}

impl<E: Emitter> MetricSender<E> {
    /**
    Send metrics through `emitter`.
    */
    pub fn new(emitter: E) -> Self {
        MetricSender { emitter }
    }

    /**
    Send a point-in-time value, such as a latency or a queue length.
    */
    pub fn send_value(&self, name: &str, value: f64, unit: &str) -> Result<(), Error> {
        self.emitter.emit(ValueMetric::new(name, value, unit).into())
    }

    /**
    Add one to the counter called `name`.
    */
    pub fn increment_counter(&self, name: &str) -> Result<(), Error> {
        self.add_to_counter(name, 1)
    }

    /**
    Add `delta` to the counter called `name`.

    Receivers accumulate deltas into a running total.
    */
    pub fn add_to_counter(&self, name: &str, delta: u64) -> Result<(), Error> {
        self.emitter.emit(CounterEvent::new(name, delta).into())
    }

    /**
    Send the resource usage of an application container.
    */
    pub fn send_container_metric(
        &self,
        application_id: &str,
        instance_index: i32,
        cpu_percentage: f64,
        memory_bytes: u64,
        disk_bytes: u64,
    ) -> Result<(), Error> {
        self.emitter.emit(
            ContainerMetric {
                application_id: application_id.into(),
                instance_index,
                cpu_percentage,
                memory_bytes,
                disk_bytes,
            }
            .into(),
        )
    }
}

impl<E: Emitter> CounterSender for MetricSender<E> {
    fn add_to_counter(&self, name: &str, delta: u64) -> Result<(), Error> {
        MetricSender::add_to_counter(self, name, delta)
    }
}
