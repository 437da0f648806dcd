//! # Local address detection.
//!
//! [`local_ipv4`] finds the IPv4 address this host would use to reach other
//! machines, which is the address hosts should be advertised with. A UDP
//! socket is "connected" to a documentation address (RFC 5737); connecting a
//! datagram socket only selects a route, no packet leaves the machine.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;

use crate::error::RuntimeError;

/// Route lookup target (TEST-NET-1, never actually contacted).
const PROBE: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 9);

/// Returns the first non-loopback IPv4 address of the default route.
pub async fn local_ipv4() -> Result<Ipv4Addr, RuntimeError> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .await
        .map_err(RuntimeError::AddressDetection)?;
    socket
        .connect(PROBE)
        .await
        .map_err(RuntimeError::AddressDetection)?;

    match socket.local_addr().map_err(RuntimeError::AddressDetection)?.ip() {
        IpAddr::V4(ip) if usable(ip) => Ok(ip),
        other => Err(RuntimeError::AddressDetection(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no usable IPv4 route address (got {other})"),
        ))),
    }
}

fn usable(ip: Ipv4Addr) -> bool {
    !ip.is_loopback() && !ip.is_unspecified()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_and_unspecified_are_rejected() {
        assert!(!usable(Ipv4Addr::LOCALHOST));
        assert!(!usable(Ipv4Addr::UNSPECIFIED));
        assert!(usable(Ipv4Addr::new(192, 168, 1, 20)));
    }

    #[tokio::test]
    async fn detection_never_returns_loopback() {
        // Sandboxes without a route legitimately fail; a success must be usable.
        if let Ok(ip) = local_ipv4().await {
            assert!(usable(ip));
        }
    }
}
