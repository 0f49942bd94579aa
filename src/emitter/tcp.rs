/*!
Emit envelopes over short-lived TCP connections.
*/

use std::{
    io::Write,
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use crate::{
    emitter::{udp::resolve, DEFAULT_TIMEOUT},
    envelope::wrap,
    Emitter, Error, ErrorKind, Event, Identity,
};

/**
An [`Emitter`] that dials a new connection for each event.

Each connection carries exactly one envelope and is closed after writing it. Connections aren't pooled and no response is read.
*/
pub struct TcpEmitter {
    remote: SocketAddr,
    identity: Identity,
    timeout: Duration,
    closed: AtomicBool,
}

impl TcpEmitter {
    /**
    Create an emitter that connects to `remote`.

    The remote address is resolved once, preferring IPv4 addresses. Nothing is dialed until the first event is emitted.
    */
    pub fn new(remote: impl ToSocketAddrs, identity: Identity) -> Result<Self, Error> {
        let remote = resolve(remote)?;

        emit::debug!(
            rt: emit::runtime::internal(),
            "emitting to {remote} over tcp",
            #[emit::as_display]
            remote,
        );

        Ok(TcpEmitter {
            remote,
            identity,
            timeout: DEFAULT_TIMEOUT,
            closed: AtomicBool::new(false),
        })
    }

    /**
    Bound the time spent connecting and the time spent writing each event.

    The timeout must be non-zero.
    */
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, Error> {
        if timeout.is_zero() {
            return Err(Error::msg(ErrorKind::Config, "the timeout must be non-zero"));
        }

        self.timeout = timeout;
        Ok(self)
    }

    /**
    The resolved address connections are made to.
    */
    pub fn remote(&self) -> SocketAddr {
        self.remote
    }
}

impl Emitter for TcpEmitter {
    fn emit(&self, evt: Event) -> Result<(), Error> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::closed());
        }

        let envelope = wrap(evt, &self.identity)?;
        let buf = envelope.to_protobuf();

        let mut stream =
            TcpStream::connect_timeout(&self.remote, self.timeout).map_err(Error::network)?;

        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(Error::network)?;
        stream.write_all(&buf).map_err(Error::network)?;
        stream.flush().map_err(Error::network)?;

        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{io::Read, net::TcpListener, thread};

    use prost::Message;

    use crate::{data::proto, event::ValueMetric, EventType};

    fn identity() -> Identity {
        Identity::new("job/0", "cf", "router", "0")
    }

    #[test]
    fn emit_writes_one_envelope_per_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = thread::spawn(move || {
            let mut received = Vec::new();

            for _ in 0..2 {
                let (mut stream, _) = listener.accept().unwrap();

                let mut buf = Vec::new();
                stream.read_to_end(&mut buf).unwrap();

                received.push(proto::Envelope::decode(&*buf).unwrap());
            }

            received
        });

        let emitter = TcpEmitter::new(addr, identity()).unwrap();

        emitter
            .emit(ValueMetric::new("latency", 1.5, "ms").into())
            .unwrap();
        emitter
            .emit(ValueMetric::new("latency", 2.5, "ms").into())
            .unwrap();

        let received = accept.join().unwrap();

        assert_eq!(2, received.len());
        for (envelope, value) in received.iter().zip([1.5, 2.5]) {
            assert_eq!(EventType::ValueMetric as i32, envelope.event_type);
            assert_eq!("job/0", envelope.origin);
            assert_eq!(Some(value), envelope.value_metric.as_ref().map(|m| m.value));
        }
    }

    #[test]
    fn emit_after_close_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();

        let emitter = TcpEmitter::new(listener.local_addr().unwrap(), identity()).unwrap();

        emitter.close();
        emitter.close();

        let err = emitter
            .emit(ValueMetric::new("latency", 1.5, "ms").into())
            .unwrap_err();

        assert_eq!(ErrorKind::Closed, err.kind());
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn emit_reports_refused_connections() {
        // Bind and immediately release a port so nothing is listening on it
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();

        let emitter = TcpEmitter::new(addr, identity())
            .unwrap()
            .with_timeout(Duration::from_secs(1))
            .unwrap();

        let err = emitter
            .emit(ValueMetric::new("latency", 1.5, "ms").into())
            .unwrap_err();

        assert_eq!(ErrorKind::Network, err.kind());
    }
}
