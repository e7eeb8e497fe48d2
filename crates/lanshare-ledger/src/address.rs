//! Origin address normalization.
//!
//! Uploads from the host itself arrive from a loopback address, which is
//! useless to other LAN peers. Those are replaced with the host's LAN-facing
//! address. Proxy chains (`client, proxy1, proxy2`) keep only the first hop.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use tracing::debug;

/// Recorded when the caller supplied no address at all.
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Well-known external endpoint used only to pick the outbound interface.
/// No packet is sent: connecting a UDP socket just binds a route.
const ROUTE_TARGET: (Ipv4Addr, u16) = (Ipv4Addr::new(8, 8, 8, 8), 80);

/// The host's LAN-facing address, or loopback if it cannot be determined.
pub fn lan_address() -> IpAddr {
    let discover = || -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(ROUTE_TARGET)?;
        Ok(socket.local_addr()?.ip())
    };
    match discover() {
        Ok(ip) if !ip.is_unspecified() => ip,
        Ok(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Err(e) => {
            debug!(error = %e, "LAN address lookup failed; using loopback");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

fn is_local(hop: &str) -> bool {
    if hop.eq_ignore_ascii_case("localhost") {
        return true;
    }
    match hop.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_loopback(),
        Ok(IpAddr::V6(v6)) => {
            v6.is_loopback() || v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback())
        }
        Err(_) => false,
    }
}

/// Normalize a raw client address as observed by the serving layer.
pub fn normalize_origin(raw: &str) -> String {
    normalize_with(raw, lan_address)
}

/// Like [`normalize_origin`] with an injectable LAN-address source.
pub fn normalize_with(raw: &str, lan: impl FnOnce() -> IpAddr) -> String {
    let first_hop = raw.split(',').next().unwrap_or_default().trim();
    if first_hop.is_empty() {
        return UNKNOWN_ADDRESS.to_string();
    }
    if is_local(first_hop) {
        return lan().to_string();
    }
    first_hop.to_string()
}
