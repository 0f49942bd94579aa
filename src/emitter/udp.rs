/*!
Emit envelopes as UDP datagrams.
*/

use std::{
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket},
    sync::RwLock,
    time::Duration,
};

use crate::{emitter::DEFAULT_TIMEOUT, envelope::wrap, Emitter, Error, ErrorKind, Event, Identity};

/**
An [`Emitter`] that sends each event as a single datagram.

Delivery isn't acknowledged or retried.
*/
pub struct UdpEmitter {
    remote: SocketAddr,
    identity: Identity,
    socket: RwLock<Option<UdpSocket>>,
}

impl UdpEmitter {
    /**
    Create an emitter that sends to `remote`.

    The remote address is resolved once, preferring IPv4 addresses. A local socket on an ephemeral port is bound for sending.
    */
    pub fn new(remote: impl ToSocketAddrs, identity: Identity) -> Result<Self, Error> {
        let remote = resolve(remote)?;

        let socket = if remote.is_ipv4() {
            UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            UdpSocket::bind((Ipv6Addr::UNSPECIFIED, 0))
        }
        .map_err(Error::network)?;

        socket
            .set_write_timeout(Some(DEFAULT_TIMEOUT))
            .map_err(Error::network)?;

        emit::debug!(
            rt: emit::runtime::internal(),
            "emitting to {remote} over udp",
            #[emit::as_display]
            remote,
        );

        Ok(UdpEmitter {
            remote,
            identity,
            socket: RwLock::new(Some(socket)),
        })
    }

    /**
    Bound the time spent writing a single datagram.

    The timeout must be non-zero.
    */
    pub fn with_timeout(self, timeout: Duration) -> Result<Self, Error> {
        if timeout.is_zero() {
            return Err(Error::msg(ErrorKind::Config, "the timeout must be non-zero"));
        }

        if let Some(ref socket) = *self.socket.read().unwrap_or_else(|err| err.into_inner()) {
            socket
                .set_write_timeout(Some(timeout))
                .map_err(Error::network)?;
        }

        Ok(self)
    }

    /**
    The resolved address datagrams are sent to.
    */
    pub fn remote(&self) -> SocketAddr {
        self.remote
    }
}

impl Emitter for UdpEmitter {
    fn emit(&self, evt: Event) -> Result<(), Error> {
        let socket = self.socket.read().unwrap_or_else(|err| err.into_inner());

        let Some(ref socket) = *socket else {
            return Err(Error::closed());
        };

        let envelope = wrap(evt, &self.identity)?;

        socket
            .send_to(&envelope.to_protobuf(), self.remote)
            .map_err(Error::network)?;

        Ok(())
    }

    fn close(&self) {
        // Dropping the socket releases its local port
        let _ = self
            .socket
            .write()
            .unwrap_or_else(|err| err.into_inner())
            .take();
    }
}

pub(crate) fn resolve(remote: impl ToSocketAddrs) -> Result<SocketAddr, Error> {
    let addrs = remote
        .to_socket_addrs()
        .map_err(Error::network)?
        .collect::<Vec<_>>();

    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| Error::msg(ErrorKind::Network, "the address didn't resolve"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use prost::Message;

    use crate::{data::proto, event::CounterEvent, EventType};

    fn identity() -> Identity {
        Identity::new("job/0", "cf", "router", "0")
    }

    fn listen() -> UdpSocket {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();

        socket
    }

    #[test]
    fn emit_sends_envelope() {
        let listener = listen();

        let emitter = UdpEmitter::new(listener.local_addr().unwrap(), identity()).unwrap();

        emitter.emit(CounterEvent::new("x", 1).into()).unwrap();

        let mut buf = vec![0; 65_535];
        let (len, _) = listener.recv_from(&mut buf).unwrap();

        let decoded = proto::Envelope::decode(&buf[..len]).unwrap();

        assert_eq!(EventType::CounterEvent as i32, decoded.event_type);
        assert_eq!("job/0", decoded.origin);
        assert_eq!("x", decoded.counter_event.unwrap().name);
    }

    #[test]
    fn emit_after_close_fails() {
        let listener = listen();

        let emitter = UdpEmitter::new(listener.local_addr().unwrap(), identity()).unwrap();

        emitter.close();

        let err = emitter.emit(CounterEvent::new("x", 1).into()).unwrap_err();

        assert_eq!(ErrorKind::Closed, err.kind());
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn close_without_emitting() {
        let listener = listen();

        let emitter = UdpEmitter::new(listener.local_addr().unwrap(), identity()).unwrap();

        emitter.close();
        emitter.close();
    }

    #[test]
    fn emit_validates_identity() {
        let listener = listen();

        let emitter = UdpEmitter::new(
            listener.local_addr().unwrap(),
            Identity::new("", "cf", "router", "0"),
        )
        .unwrap();

        let err = emitter.emit(CounterEvent::new("x", 1).into()).unwrap_err();

        assert_eq!(ErrorKind::MissingOrigin, err.kind());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let listener = listen();

        let err = UdpEmitter::new(listener.local_addr().unwrap(), identity())
            .unwrap()
            .with_timeout(Duration::ZERO)
            .err()
            .unwrap();

        assert_eq!(ErrorKind::Config, err.kind());
    }

    #[test]
    fn resolve_prefers_ipv4() {
        let addr = resolve("localhost:42420").unwrap();

        assert!(addr.is_ipv4());
        assert_eq!(42420, addr.port());
    }
}
