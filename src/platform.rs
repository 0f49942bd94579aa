/*!
Clock and network address lookups used when wrapping envelopes.
*/

use std::{
    net::{IpAddr, Ipv4Addr, UdpSocket},
    sync::OnceLock,
    time::UNIX_EPOCH,
};

use crate::{Error, ErrorKind};

/**
The current time in nanoseconds since the unix epoch.
*/
pub(crate) fn unix_nanos() -> Result<i64, Error> {
    let now = UNIX_EPOCH
        .elapsed()
        .map_err(|err| Error::with_source(ErrorKind::Clock, err))?;

    i64::try_from(now.as_nanos()).map_err(|err| Error::with_source(ErrorKind::Clock, err))
}

// Connecting a UDP socket only selects a route; nothing is sent
const ROUTE_PROBE: (Ipv4Addr, u16) = (Ipv4Addr::new(8, 8, 8, 8), 80);
const LOOPBACK_PROBE: (Ipv4Addr, u16) = (Ipv4Addr::LOCALHOST, 9);

static LOCAL_IP: OnceLock<IpAddr> = OnceLock::new();

/**
The address of the interface this host sends outbound traffic from.

Hosts without an outbound route report their loopback address.
*/
pub(crate) fn local_ip() -> Result<IpAddr, Error> {
    if let Some(ip) = LOCAL_IP.get() {
        return Ok(*ip);
    }

    let ip = probe(ROUTE_PROBE).or_else(|_| probe(LOOPBACK_PROBE))?;

    Ok(*LOCAL_IP.get_or_init(|| ip))
}

fn probe(target: (Ipv4Addr, u16)) -> Result<IpAddr, Error> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(Error::network)?;

    socket.connect(target).map_err(Error::network)?;

    Ok(socket.local_addr().map_err(Error::network)?.ip())
}
