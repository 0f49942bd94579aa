/*!
Configure and start an emitter with heartbeats.

```no_run
# fn main() -> Result<(), sonde::Error> {
let init = sonde::setup()
    .origin("my-app")
    .deployment("cf")
    .job("web")
    .index("0")
    .init()?;

init.metric_sender().increment_counter("requests")?;

// Stop sending heartbeats and release sockets
init.close();
# Ok(())
# }
```

Configuration can also be read from the environment with [`Setup::from_env`].
*/

use std::{env, sync::Arc, time::Duration};

use crate::{
    heartbeat::{self, Generation},
    Counts, Emitter, Error, ErrorKind, Identity, InstrumentedEmitter, LogSender, MetricSender,
    TcpEmitter, UdpEmitter,
};

/**
The default address events are sent to.
*/
pub const DEFAULT_DESTINATION: &str = "localhost:42420";

/**
The emitter events are sent through after [`Setup::init`].
*/
pub type DefaultEmitter = InstrumentedEmitter<Arc<UdpEmitter>>;

/**
Configuration for an emitter and its heartbeats.
*/
#[derive(Debug, Clone)]
pub struct Setup {
    identity: Identity,
    destination: String,
    heartbeat_destination: Option<String>,
    heartbeat_interval: Duration,
}

impl Default for Setup {
    fn default() -> Self {
        Self::new()
    }
}

impl Setup {
    /**
    Create a configuration with no identity, sending to [`DEFAULT_DESTINATION`].
    */
    pub fn new() -> Self {
        Setup {
            identity: Identity::default(),
            destination: DEFAULT_DESTINATION.into(),
            heartbeat_destination: None,
            heartbeat_interval: heartbeat::DEFAULT_INTERVAL,
        }
    }

    /**
    Read configuration from environment variables.

    The following variables are recognized:

    - `DROPSONDE_ORIGIN`.
    - `DROPSONDE_DEPLOYMENT`.
    - `DROPSONDE_JOB`.
    - `DROPSONDE_INDEX`.
    - `DROPSONDE_DESTINATION`: the UDP address events are sent to.
    - `DROPSONDE_HEARTBEAT_DESTINATION`: a TCP address heartbeats are sent to instead.
    - `DROPSONDE_HEARTBEAT_INTERVAL_SECS`: the time between heartbeats, in fractional seconds.

    Unset variables keep their defaults.
    */
    pub fn from_env() -> Result<Self, Error> {
        Setup::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut setup = Setup::new();

        if let Some(origin) = var("DROPSONDE_ORIGIN") {
            setup.identity.origin = origin;
        }
        if let Some(deployment) = var("DROPSONDE_DEPLOYMENT") {
            setup.identity.deployment = deployment;
        }
        if let Some(job) = var("DROPSONDE_JOB") {
            setup.identity.job = job;
        }
        if let Some(index) = var("DROPSONDE_INDEX") {
            setup.identity.index = index;
        }
        if let Some(destination) = var("DROPSONDE_DESTINATION") {
            setup.destination = destination;
        }

        setup.heartbeat_destination =
            var("DROPSONDE_HEARTBEAT_DESTINATION").filter(|destination| !destination.is_empty());

        if let Some(interval) = var("DROPSONDE_HEARTBEAT_INTERVAL_SECS") {
            setup.heartbeat_interval = parse_interval(&interval)?;
        }

        Ok(setup)
    }

    /**
    Set the name of the emitting process.
    */
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.identity.origin = origin.into();
        self
    }

    /**
    Set the deployment of the emitting process.
    */
    pub fn deployment(mut self, deployment: impl Into<String>) -> Self {
        self.identity.deployment = deployment.into();
        self
    }

    /**
    Set the job of the emitting process.
    */
    pub fn job(mut self, job: impl Into<String>) -> Self {
        self.identity.job = job.into();
        self
    }

    /**
    Set the index of the emitting process within its job.
    */
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.identity.index = index.into();
        self
    }

    /**
    Set the UDP address events are sent to.
    */
    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /**
    Send heartbeats over TCP to `destination` instead of alongside other events.
    */
    pub fn heartbeat_destination(mut self, destination: impl Into<String>) -> Self {
        self.heartbeat_destination = Some(destination.into());
        self
    }

    /**
    Set the time between heartbeats.

    The interval must be non-zero, or [`Setup::init`] will fail.
    */
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /**
    The identity events will be attributed to.
    */
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /**
    Create the emitter and start sending heartbeats.

    The identity and heartbeat interval are validated before any sockets are opened.
    */
    #[must_use = "call `close()` or drop the result to stop sending heartbeats"]
    pub fn init(self) -> Result<Init, Error> {
        self.identity.validate()?;
        heartbeat::check_interval(self.heartbeat_interval)?;

        let udp = Arc::new(UdpEmitter::new(&*self.destination, self.identity.clone())?);
        let emitter = Arc::new(InstrumentedEmitter::new(udp.clone()));

        let generation = match self.heartbeat_destination {
            Some(ref destination) => {
                let tcp = TcpEmitter::new(&**destination, self.identity.clone())?;

                heartbeat::generator(emitter.clone(), tcp)
                    .interval(self.heartbeat_interval)
                    .spawn()?
            }
            // Heartbeats bypass the instrumented emitter so they don't count themselves
            None => heartbeat::generator(emitter.clone(), udp)
                .interval(self.heartbeat_interval)
                .spawn()?,
        };

        emit::debug!(
            rt: emit::runtime::internal(),
            "sending events from {origin} to {destination}",
            #[emit::as_display]
            origin: self.identity.origin,
            #[emit::as_display]
            destination: self.destination,
        );

        Ok(Init {
            emitter,
            generation,
        })
    }
}

fn parse_interval(secs: &str) -> Result<Duration, Error> {
    let secs = secs
        .trim()
        .parse::<f64>()
        .map_err(|err| Error::with_source(ErrorKind::Config, err))?;

    let interval = Duration::try_from_secs_f64(secs)
        .map_err(|err| Error::with_source(ErrorKind::Config, err))?;

    heartbeat::check_interval(interval)?;

    Ok(interval)
}

/**
Start configuring an emitter.
*/
pub fn setup() -> Setup {
    Setup::new()
}

/**
The result of calling [`Setup::init`].

Heartbeats are sent until [`Init::close`] is called or this value is dropped.
*/
pub struct Init {
    emitter: Arc<DefaultEmitter>,
    generation: Generation,
}

impl Init {
    /**
    The emitter to send events through.
    */
    pub fn emitter(&self) -> Arc<DefaultEmitter> {
        self.emitter.clone()
    }

    /**
    A [`MetricSender`] that sends through [`Init::emitter`].
    */
    pub fn metric_sender(&self) -> MetricSender<Arc<DefaultEmitter>> {
        MetricSender::new(self.emitter())
    }

    /**
    A [`LogSender`] that sends through [`Init::emitter`].
    */
    pub fn log_sender(&self) -> LogSender<Arc<DefaultEmitter>> {
        LogSender::new(self.emitter())
    }

    /**
    A snapshot of the counts of events emitted so far.
    */
    pub fn counts(&self) -> Counts {
        self.emitter.counts()
    }

    /**
    Stop sending heartbeats and close the emitter.

    Calling `close` more than once has no further effect.
    */
    pub fn close(&self) {
        self.generation.close();
        self.emitter.close();
    }
}

impl Drop for Init {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{
        collections::HashMap,
        io::Read,
        net::{TcpListener, UdpSocket},
    };

    use prost::Message;

    use crate::{data::proto, EventType};

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();

        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn from_vars_defaults() {
        let setup = Setup::from_vars(vars(&[])).unwrap();

        assert_eq!(&Identity::default(), setup.identity());
        assert_eq!(DEFAULT_DESTINATION, setup.destination);
        assert_eq!(None, setup.heartbeat_destination);
        assert_eq!(heartbeat::DEFAULT_INTERVAL, setup.heartbeat_interval);
    }

    #[test]
    fn from_vars_reads_everything() {
        let setup = Setup::from_vars(vars(&[
            ("DROPSONDE_ORIGIN", "my-app"),
            ("DROPSONDE_DEPLOYMENT", "cf"),
            ("DROPSONDE_JOB", "web"),
            ("DROPSONDE_INDEX", "3"),
            ("DROPSONDE_DESTINATION", "10.0.0.1:3457"),
            ("DROPSONDE_HEARTBEAT_DESTINATION", "10.0.0.1:3458"),
            ("DROPSONDE_HEARTBEAT_INTERVAL_SECS", "0.5"),
        ]))
        .unwrap();

        assert_eq!(
            &Identity::new("my-app", "cf", "web", "3"),
            setup.identity()
        );
        assert_eq!("10.0.0.1:3457", setup.destination);
        assert_eq!(Some("10.0.0.1:3458"), setup.heartbeat_destination.as_deref());
        assert_eq!(Duration::from_millis(500), setup.heartbeat_interval);
    }

    #[test]
    fn from_vars_rejects_bad_intervals() {
        for interval in ["soon", "-1", "0", "NaN"] {
            let err = Setup::from_vars(vars(&[("DROPSONDE_HEARTBEAT_INTERVAL_SECS", interval)]))
                .unwrap_err();

            assert_eq!(ErrorKind::Config, err.kind(), "{interval}");
        }
    }

    #[test]
    fn init_requires_identity() {
        let err = setup().origin("my-app").init().err().unwrap();

        assert_eq!(ErrorKind::MissingDeployment, err.kind());
    }

    #[test]
    fn init_rejects_zero_heartbeat_interval() {
        let err = setup()
            .origin("my-app")
            .deployment("cf")
            .job("web")
            .index("0")
            .heartbeat_interval(Duration::ZERO)
            .init()
            .err()
            .unwrap();

        assert_eq!(ErrorKind::Config, err.kind());
    }

    #[test]
    fn init_sends_events_and_heartbeats_over_udp() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();

        let init = setup()
            .origin("my-app")
            .deployment("cf")
            .job("web")
            .index("0")
            .destination(listener.local_addr().unwrap().to_string())
            .heartbeat_interval(Duration::from_millis(50))
            .init()
            .unwrap();

        init.metric_sender().increment_counter("requests").unwrap();

        let mut buf = vec![0; 65_535];
        let mut saw_counter = false;
        let mut saw_heartbeat = false;

        while !(saw_counter && saw_heartbeat) {
            let (len, _) = listener.recv_from(&mut buf).unwrap();
            let envelope = proto::Envelope::decode(&buf[..len]).unwrap();

            assert_eq!("my-app", envelope.origin);

            if envelope.event_type == EventType::CounterEvent as i32 {
                saw_counter = true;
            }
            if envelope.event_type == EventType::Heartbeat as i32 {
                saw_heartbeat = true;
            }
        }

        assert_eq!(1, init.counts().received);

        init.close();
        init.close();

        assert!(init.metric_sender().increment_counter("requests").is_err());
        assert_eq!(2, init.counts().received);
        assert_eq!(1, init.counts().error);
    }

    #[test]
    fn init_sends_heartbeats_over_tcp() {
        let events = UdpSocket::bind("127.0.0.1:0").unwrap();
        let heartbeats = TcpListener::bind("127.0.0.1:0").unwrap();

        let init = setup()
            .origin("my-app")
            .deployment("cf")
            .job("web")
            .index("0")
            .destination(events.local_addr().unwrap().to_string())
            .heartbeat_destination(heartbeats.local_addr().unwrap().to_string())
            .heartbeat_interval(Duration::from_millis(50))
            .init()
            .unwrap();

        let (mut stream, _) = heartbeats.accept().unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();

        let envelope = proto::Envelope::decode(&*buf).unwrap();

        assert_eq!(EventType::Heartbeat as i32, envelope.event_type);
        assert!(envelope.heartbeat.is_some());

        drop(init);
    }
}
