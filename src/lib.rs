/*!
Emit metric, log and heartbeat events to a local collector.

`sonde` wraps events in self-describing envelopes and sends them over UDP or TCP. Emitters count what they send, and a background generator periodically reports those counts as heartbeats.

The quickest way to get started is with [`setup`]:

```no_run
# fn main() -> Result<(), sonde::Error> {
let init = sonde::Setup::from_env()?.init()?;

let metrics = init.metric_sender();

metrics.send_value("latency", 12.5, "ms")?;
metrics.increment_counter("requests")?;

init.close();
# Ok(())
# }
```

Emitters can also be composed by hand:

- [`UdpEmitter`] and [`TcpEmitter`] send envelopes over the network.
- [`InstrumentedEmitter`] counts the events passing through another emitter.
- [`heartbeat::generator`] sends heartbeats from a [`HeartbeatSource`] on a background thread.
- [`FakeEmitter`] records events in memory for tests.

Diagnostics about background failures, such as heartbeats that couldn't be sent, are emitted through `emit`'s internal runtime.
*/

mod data;
mod platform;
mod stop;

pub mod emitter;
pub mod envelope;
pub mod error;
pub mod event;
pub mod heartbeat;
pub mod instrumented;
pub mod log_sender;
pub mod metric_sender;
pub mod setup;

#[doc(inline)]
pub use self::{
    emitter::{Emitter, FakeEmitter, TcpEmitter, UdpEmitter},
    envelope::{wrap, Envelope, Identity},
    error::{Error, ErrorKind},
    event::{Event, EventType, ToEvent},
    heartbeat::{Generation, HeartbeatEmitter},
    instrumented::{Counts, HeartbeatSource, InstrumentedEmitter},
    log_sender::LogSender,
    metric_sender::{CounterSender, MetricSender},
    setup::{setup, Init, Setup},
};
